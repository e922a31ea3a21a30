//! Run settings
//!
//! Optional TOML file plus `TAGSYNC_*` environment overrides. Every field has
//! a default, so an absent file yields the reference behavior: three
//! verification attempts, constant delay, strictly sequential traversal.

use crate::error::ConfigError;
use crate::verify::BackoffPolicy;
use directories::ProjectDirs;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub verification: VerificationSettings,
    pub extraction: ExtractionSettings,
    pub execution: ExecutionSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationSettings {
    pub max_attempts: u32,
    pub backoff: BackoffKind,
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffKind::Fixed,
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// How far back the source may look for a successful result set.
    #[serde(with = "humantime_serde")]
    pub lookback: Duration,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            lookback: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Workbook branches processed at once. 1 walks the tree sequentially.
    pub max_concurrent_workbooks: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_concurrent_workbooks: 1,
        }
    }
}

/// Location of the per-user settings file, if a home directory exists.
pub fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "tagsync", "tagsync").map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
}

impl RunSettings {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let settings: RunSettings =
            toml::from_str(raw).map_err(|e| ConfigError::settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content)
    }

    /// Load an explicit file, else the per-user file when present, else
    /// defaults; then apply environment overrides.
    pub async fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match explicit {
            Some(path) => Self::load(path).await?,
            None => match default_settings_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!("Loading settings from {}", path.display());
                    Self::load(&path).await?
                }
                None => Self::default(),
            },
        };
        settings.merge_env_with(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `TAGSYNC_*` overrides from the given lookup.
    pub fn merge_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TAGSYNC_MAX_ATTEMPTS") {
            self.verification.max_attempts = value.parse().map_err(|_| {
                ConfigError::settings(format!("TAGSYNC_MAX_ATTEMPTS is not a number: {value}"))
            })?;
        }

        if let Some(value) = lookup("TAGSYNC_INITIAL_DELAY") {
            self.verification.initial_delay =
                humantime_serde::deserialize(value.as_str().into_deserializer()).map_err(
                    |e: serde::de::value::Error| {
                        ConfigError::settings(format!("TAGSYNC_INITIAL_DELAY: {e}"))
                    },
                )?;
        }

        if let Some(value) = lookup("TAGSYNC_CONCURRENCY") {
            self.execution.max_concurrent_workbooks = value.parse().map_err(|_| {
                ConfigError::settings(format!("TAGSYNC_CONCURRENCY is not a number: {value}"))
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.verification.max_attempts == 0 {
            return Err(ConfigError::settings("verification.max_attempts must be at least 1"));
        }
        if self.verification.multiplier < 1.0 {
            return Err(ConfigError::settings(
                "verification.multiplier must be at least 1.0",
            ));
        }
        if self.verification.backoff == BackoffKind::Exponential
            && self.verification.max_delay < self.verification.initial_delay
        {
            return Err(ConfigError::settings(
                "verification.max_delay must not be shorter than initial_delay",
            ));
        }
        if self.execution.max_concurrent_workbooks == 0 {
            return Err(ConfigError::settings(
                "execution.max_concurrent_workbooks must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        let v = &self.verification;
        match v.backoff {
            BackoffKind::Fixed => BackoffPolicy::Fixed {
                delay: v.initial_delay,
            },
            BackoffKind::Exponential => BackoffPolicy::Exponential {
                initial: v.initial_delay,
                multiplier: v.multiplier,
                max: v.max_delay,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let settings = RunSettings::default();
        assert_eq!(settings.verification.max_attempts, 3);
        assert_eq!(settings.execution.max_concurrent_workbooks, 1);
        assert_eq!(
            settings.backoff_policy(),
            BackoffPolicy::Fixed {
                delay: Duration::from_secs(10)
            }
        );
    }

    #[test]
    fn test_parse_partial_file() {
        let settings = RunSettings::parse(
            r#"
            [verification]
            max_attempts = 5
            backoff = "exponential"
            initial_delay = "500ms"

            [extraction]
            lookback = "2h"
            "#,
        )
        .unwrap();
        assert_eq!(settings.verification.max_attempts, 5);
        assert_eq!(settings.extraction.lookback, Duration::from_secs(7200));
        assert_eq!(
            settings.backoff_policy(),
            BackoffPolicy::Exponential {
                initial: Duration::from_millis(500),
                multiplier: 2.0,
                max: Duration::from_secs(60),
            }
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = RunSettings::parse("[verification]\nmax_attempts = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Settings { .. }));
    }

    #[test]
    fn test_fixed_delay_ignores_max_delay() {
        let settings =
            RunSettings::parse("[verification]\nbackoff = \"fixed\"\ninitial_delay = \"90s\"\n")
                .unwrap();
        assert_eq!(
            settings.backoff_policy(),
            BackoffPolicy::Fixed {
                delay: Duration::from_secs(90)
            }
        );

        let mut settings = RunSettings::default();
        settings
            .merge_env_with(|key| (key == "TAGSYNC_INITIAL_DELAY").then(|| "2m".to_string()))
            .unwrap();
        settings.validate().unwrap();
    }

    #[test]
    fn test_exponential_max_delay_below_initial_rejected() {
        let err = RunSettings::parse(
            "[verification]\nbackoff = \"exponential\"\ninitial_delay = \"90s\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_delay"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TAGSYNC_MAX_ATTEMPTS", "7"),
            ("TAGSYNC_INITIAL_DELAY", "250ms"),
            ("TAGSYNC_CONCURRENCY", "4"),
        ]
        .into_iter()
        .collect();

        let mut settings = RunSettings::default();
        settings
            .merge_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(settings.verification.max_attempts, 7);
        assert_eq!(settings.verification.initial_delay, Duration::from_millis(250));
        assert_eq!(settings.execution.max_concurrent_workbooks, 4);
    }

    #[test]
    fn test_bad_env_override_rejected() {
        let mut settings = RunSettings::default();
        let err = settings
            .merge_env_with(|key| (key == "TAGSYNC_MAX_ATTEMPTS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("TAGSYNC_MAX_ATTEMPTS"));
    }
}
