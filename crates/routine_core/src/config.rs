//! Storage and logging configuration.
//!
//! # Responsibility
//! - Resolve where the routine document and log files live.
//! - Resolve the effective log level.
//!
//! # Invariants
//! - Configuration is an explicit value passed to constructors, never
//!   process-global state.
//! - Resolution order: explicit override, environment, platform default,
//!   temp dir.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "ROUTINE_TRACKER_DATA_DIR";
/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "ROUTINE_TRACKER_LOG";
/// Directory name created under the platform application-data directory.
pub const APP_DIR_NAME: &str = "DailyRoutineTracker";
/// File name of the persisted routine document.
pub const DOCUMENT_FILE_NAME: &str = "routines.json";

const LOG_DIR_NAME: &str = "logs";

/// Resolved on-disk locations for one tracker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolves storage from an optional explicit directory, then
    /// `ROUTINE_TRACKER_DATA_DIR`, then the platform data directory.
    pub fn resolve(override_dir: Option<&Path>) -> Self {
        Self::resolve_with(
            override_dir,
            std::env::var(DATA_DIR_ENV).ok(),
            dirs::data_dir(),
        )
    }

    fn resolve_with(
        override_dir: Option<&Path>,
        env_value: Option<String>,
        platform_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = override_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            return Self::new(absolutize(dir));
        }

        if let Some(raw) = env_value {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Self::new(absolutize(Path::new(trimmed)));
            }
        }

        let base = platform_dir.unwrap_or_else(std::env::temp_dir);
        Self::new(base.join(APP_DIR_NAME))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn document_path(&self) -> PathBuf {
        self.data_dir.join(DOCUMENT_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }
}

/// Resolves the log level from an explicit value, then
/// `ROUTINE_TRACKER_LOG`, then the build-mode default.
pub fn resolve_log_level(explicit: Option<&str>) -> String {
    resolve_log_level_with(explicit, std::env::var(LOG_LEVEL_ENV).ok())
}

fn resolve_log_level_with(explicit: Option<&str>, env_value: Option<String>) -> String {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| {
            env_value
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .unwrap_or_else(|| default_log_level().to_string())
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{resolve_log_level_with, StorageConfig, APP_DIR_NAME};
    use crate::logging::default_log_level;
    use std::path::{Path, PathBuf};

    #[test]
    fn explicit_override_wins() {
        let config = StorageConfig::resolve_with(
            Some(Path::new("/srv/routines")),
            Some("/from/env".to_string()),
            Some(PathBuf::from("/platform")),
        );
        assert_eq!(config.data_dir(), Path::new("/srv/routines"));
        assert_eq!(
            config.document_path(),
            PathBuf::from("/srv/routines/routines.json")
        );
        assert_eq!(config.log_dir(), PathBuf::from("/srv/routines/logs"));
    }

    #[test]
    fn blank_env_falls_back_to_platform_dir() {
        let config = StorageConfig::resolve_with(
            None,
            Some("   ".to_string()),
            Some(PathBuf::from("/platform")),
        );
        assert_eq!(config.data_dir(), Path::new("/platform").join(APP_DIR_NAME));
    }

    #[test]
    fn env_value_is_used_when_no_override() {
        let config = StorageConfig::resolve_with(None, Some(" /from/env ".to_string()), None);
        assert_eq!(config.data_dir(), Path::new("/from/env"));
    }

    #[test]
    fn missing_platform_dir_uses_temp_dir() {
        let config = StorageConfig::resolve_with(None, None, None);
        assert_eq!(config.data_dir(), std::env::temp_dir().join(APP_DIR_NAME));
    }

    #[test]
    fn log_level_prefers_explicit_then_env_then_default() {
        assert_eq!(
            resolve_log_level_with(Some("warn"), Some("trace".to_string())),
            "warn"
        );
        assert_eq!(
            resolve_log_level_with(Some(" "), Some("trace".to_string())),
            "trace"
        );
        assert_eq!(resolve_log_level_with(None, None), default_log_level());
    }
}
