//! In-memory storage namespace for testing

use crate::abstractions::{ContainerRef, NamespaceClient};
use crate::error::ReconcileError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

/// A file written through [`NamespaceClient::write_artifact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub container_id: String,
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct NamespaceState {
    /// (parent id, container) pairs; `None` parent is the root.
    containers: Vec<(Option<String>, ContainerRef)>,
    next_id: usize,
    find_calls: usize,
    create_calls: usize,
    find_failures: HashMap<String, VecDeque<ReconcileError>>,
    artifacts: Vec<WrittenArtifact>,
}

/// Mock implementation of NamespaceClient backed by a flat list of containers
pub struct MockNamespace {
    state: Arc<Mutex<NamespaceState>>,
    always_failing: HashMap<String, ReconcileError>,
    failing_writes: HashSet<String>,
    not_ready: Option<String>,
}

impl Default for MockNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNamespace {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(NamespaceState::default())),
            always_failing: HashMap::new(),
            failing_writes: HashSet::new(),
            not_ready: None,
        }
    }

    /// Seed an existing container under `parent`.
    pub fn with_container(self, parent: Option<&ContainerRef>, container: ContainerRef) -> Self {
        self.state
            .lock()
            .unwrap()
            .containers
            .push((parent.map(|p| p.id.clone()), container));
        self
    }

    /// The next lookup of `name` fails with `error`.
    pub fn fail_find_once(self, name: &str, error: ReconcileError) -> Self {
        self.state
            .lock()
            .unwrap()
            .find_failures
            .entry(name.to_string())
            .or_default()
            .push_back(error);
        self
    }

    /// Every lookup of `name` fails with `error`.
    pub fn fail_find_always(mut self, name: &str, error: ReconcileError) -> Self {
        self.always_failing.insert(name.to_string(), error);
        self
    }

    /// Writes of artifacts named `name` fail.
    pub fn fail_writes_for(mut self, name: &str) -> Self {
        self.failing_writes.insert(name.to_string());
        self
    }

    pub fn not_ready(mut self, message: &str) -> Self {
        self.not_ready = Some(message.to_string());
        self
    }

    pub fn find_calls(&self) -> usize {
        self.state.lock().unwrap().find_calls
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    /// Number of containers named `name`, across all parents.
    pub fn containers_named(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .filter(|(_, c)| c.name == name)
            .count()
    }

    pub fn container_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .map(|(_, c)| c.name.clone())
            .collect()
    }

    pub fn artifacts(&self) -> Vec<WrittenArtifact> {
        self.state.lock().unwrap().artifacts.clone()
    }

    /// Bytes of the artifact `name` placed in the container named `container`.
    pub fn artifact(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        let ids: Vec<&str> = state
            .containers
            .iter()
            .filter(|(_, c)| c.name == container)
            .map(|(_, c)| c.id.as_str())
            .collect();
        state
            .artifacts
            .iter()
            .find(|a| a.name == name && ids.contains(&a.container_id.as_str()))
            .map(|a| a.bytes.clone())
    }
}

#[async_trait]
impl NamespaceClient for MockNamespace {
    async fn check_ready(&self) -> Result<()> {
        match &self.not_ready {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }

    async fn find_containers(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<Vec<ContainerRef>, ReconcileError> {
        let mut state = self.state.lock().unwrap();
        state.find_calls += 1;

        if let Some(error) = self.always_failing.get(name) {
            return Err(error.clone());
        }
        if let Some(error) = state.find_failures.get_mut(name).and_then(VecDeque::pop_front) {
            return Err(error);
        }

        let parent_id = parent.map(|p| p.id.as_str());
        Ok(state
            .containers
            .iter()
            .filter(|(p, c)| p.as_deref() == parent_id && c.name == name)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn create_container(
        &self,
        parent: Option<&ContainerRef>,
        name: &str,
    ) -> Result<ContainerRef, ReconcileError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        state.next_id += 1;
        let container =
            ContainerRef::new(format!("mock-{}", state.next_id), name).created_at(Utc::now());
        state
            .containers
            .push((parent.map(|p| p.id.clone()), container.clone()));
        Ok(container)
    }

    async fn write_artifact(
        &self,
        container: &ContainerRef,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), ReconcileError> {
        if self.failing_writes.contains(name) {
            return Err(ReconcileError::transport(format!(
                "upload of '{name}' rejected"
            )));
        }
        self.state.lock().unwrap().artifacts.push(WrittenArtifact {
            container_id: container.id.clone(),
            name: name.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }
}
