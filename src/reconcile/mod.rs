//! Folder reconciliation
//!
//! Get-or-create for hierarchical containers. A [`FolderReconciler`] lives for
//! one run and memoizes every resolved (parent, name) pair, so a container is
//! looked up or created at most once per run even when concurrent branches
//! ask for it at the same time.

use crate::abstractions::{ContainerRef, NamespaceClient};
use crate::error::ReconcileError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Whether `ensure` had to create the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    AlreadyExists,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("CREATED"),
            Self::AlreadyExists => f.write_str("EXISTS"),
        }
    }
}

/// Result of ensuring one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured {
    pub container: ContainerRef,
    pub outcome: Outcome,
    /// Same-named siblings that were passed over by the tie-break.
    pub ignored_duplicates: usize,
}

impl Ensured {
    /// Informational note for namespace ambiguity, if any.
    pub fn note(&self) -> Option<String> {
        (self.ignored_duplicates > 0).then(|| {
            format!(
                "{} duplicate container(s) named '{}' ignored; using earliest-created {}",
                self.ignored_duplicates, self.container.name, self.container.id
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    parent: Option<String>,
    name: String,
}

pub struct FolderReconciler {
    client: Arc<dyn NamespaceClient>,
    cache: Mutex<HashMap<CacheKey, Arc<OnceCell<Ensured>>>>,
}

impl FolderReconciler {
    pub fn new(client: Arc<dyn NamespaceClient>) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Ensure a container named `name` exists under `parent` (root when `None`).
    ///
    /// The first successful call for a pair reports what actually happened;
    /// every later call in the same run reports `AlreadyExists` without
    /// touching the namespace. Failed resolutions are not cached.
    pub async fn ensure(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<Ensured, ReconcileError> {
        let key = CacheKey {
            parent: parent.map(|p| p.id.clone()),
            name: name.to_string(),
        };
        let cell = {
            let mut cache = self.cache.lock().await;
            cache.entry(key).or_default().clone()
        };

        let mut resolved_here = false;
        let ensured = cell
            .get_or_try_init(|| {
                resolved_here = true;
                self.resolve(parent, name)
            })
            .await?;

        if resolved_here {
            return Ok(ensured.clone());
        }

        debug!("Container '{}' already resolved in this run", name);
        Ok(Ensured {
            container: ensured.container.clone(),
            outcome: Outcome::AlreadyExists,
            ignored_duplicates: 0,
        })
    }

    async fn resolve(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<Ensured, ReconcileError> {
        let mut matches = self.client.find_containers(parent, name).await?;

        if matches.is_empty() {
            let container = self.client.create_container(parent, name).await?;
            info!("Created container '{}' ({})", name, container.id);
            return Ok(Ensured {
                container,
                outcome: Outcome::Created,
                ignored_duplicates: 0,
            });
        }

        let ignored_duplicates = matches.len() - 1;
        if ignored_duplicates > 0 {
            // Earliest-created wins; containers without a timestamp sort last,
            // id breaks any remaining tie.
            matches.sort_by(|a, b| {
                (a.created_at.is_none(), a.created_at, &a.id).cmp(&(
                    b.created_at.is_none(),
                    b.created_at,
                    &b.id,
                ))
            });
            warn!(
                "Found {} containers named '{}', using {}",
                matches.len(),
                name,
                matches[0].id
            );
        }

        let container = matches.swap_remove(0);
        debug!("Container '{}' exists ({})", name, container.id);
        Ok(Ensured {
            container,
            outcome: Outcome::AlreadyExists,
            ignored_duplicates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockNamespace;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_creates_missing_container() {
        let namespace = Arc::new(MockNamespace::new());
        let reconciler = FolderReconciler::new(namespace.clone());

        let ensured = reconciler.ensure(None, "Finance").await.unwrap();
        assert_eq!(ensured.outcome, Outcome::Created);
        assert_eq!(ensured.container.name, "Finance");
        assert_eq!(namespace.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_second_call_reports_already_exists_and_creates_once() {
        let namespace = Arc::new(MockNamespace::new());
        let reconciler = FolderReconciler::new(namespace.clone());

        let first = reconciler.ensure(None, "Finance").await.unwrap();
        let second = reconciler.ensure(None, "Finance").await.unwrap();

        assert_eq!(first.outcome, Outcome::Created);
        assert_eq!(second.outcome, Outcome::AlreadyExists);
        assert_eq!(first.container, second.container);
        assert_eq!(namespace.create_calls(), 1);
        assert_eq!(namespace.find_calls(), 1);
        assert_eq!(namespace.containers_named("Finance"), 1);
    }

    #[tokio::test]
    async fn test_fresh_reconciler_finds_existing_container() {
        let namespace = Arc::new(MockNamespace::new());
        FolderReconciler::new(namespace.clone())
            .ensure(None, "Finance")
            .await
            .unwrap();

        let ensured = FolderReconciler::new(namespace.clone())
            .ensure(None, "Finance")
            .await
            .unwrap();
        assert_eq!(ensured.outcome, Outcome::AlreadyExists);
        assert_eq!(namespace.containers_named("Finance"), 1);
    }

    #[tokio::test]
    async fn test_same_name_under_different_parents_is_distinct() {
        let namespace = Arc::new(MockNamespace::new());
        let reconciler = FolderReconciler::new(namespace.clone());

        let a = reconciler.ensure(None, "A").await.unwrap().container;
        let b = reconciler.ensure(None, "B").await.unwrap().container;
        let under_a = reconciler.ensure(Some(&a), "Shared").await.unwrap();
        let under_b = reconciler.ensure(Some(&b), "Shared").await.unwrap();

        assert_eq!(under_a.outcome, Outcome::Created);
        assert_eq!(under_b.outcome, Outcome::Created);
        assert_ne!(under_a.container.id, under_b.container.id);
    }

    #[tokio::test]
    async fn test_ambiguity_resolved_to_earliest_created() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let namespace = Arc::new(
            MockNamespace::new()
                .with_container(None, ContainerRef::new("late", "Finance").created_at(late))
                .with_container(None, ContainerRef::new("undated", "Finance"))
                .with_container(None, ContainerRef::new("early", "Finance").created_at(early)),
        );
        let reconciler = FolderReconciler::new(namespace.clone());

        let ensured = reconciler.ensure(None, "Finance").await.unwrap();
        assert_eq!(ensured.outcome, Outcome::AlreadyExists);
        assert_eq!(ensured.container.id, "early");
        assert_eq!(ensured.ignored_duplicates, 2);
        assert!(ensured.note().unwrap().contains("earliest-created"));
        assert_eq!(namespace.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_errors_propagate_and_are_not_cached() {
        let namespace = Arc::new(
            MockNamespace::new().fail_find_once("Finance", ReconcileError::unavailable("503")),
        );
        let reconciler = FolderReconciler::new(namespace.clone());

        let err = reconciler.ensure(None, "Finance").await.unwrap_err();
        assert!(matches!(err, ReconcileError::Unavailable { .. }));

        let ensured = reconciler.ensure(None, "Finance").await.unwrap();
        assert_eq!(ensured.outcome, Outcome::Created);
    }

    #[tokio::test]
    async fn test_concurrent_requests_resolve_once() {
        let namespace = Arc::new(MockNamespace::new());
        let reconciler = Arc::new(FolderReconciler::new(namespace.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reconciler = reconciler.clone();
                tokio::spawn(async move { reconciler.ensure(None, "Finance").await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().outcome == Outcome::Created {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(namespace.create_calls(), 1);
    }
}
