//! Routine repository contract, JSON file and in-memory implementations.
//!
//! # Responsibility
//! - Round-trip the full routine collection to a single JSON document.
//! - Treat a missing or unreadable document as "no data yet".
//!
//! # Invariants
//! - Saves replace the whole document (full snapshot, never a diff).
//! - The document on disk is always a complete snapshot: writes land in a
//!   sibling temp file that is renamed over the target.
//! - One bad record, or a duplicated id, discards the whole document for the
//!   session. No per-record recovery.

use crate::config::StorageConfig;
use crate::logging::error_chain;
use crate::model::routine::{RoutineId, RoutineItem};
use log::{error, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type RepoResult<T> = Result<T, RepoError>;

/// Save failure for routine persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Parent directory could not be created.
    CreateDir { path: PathBuf, source: io::Error },
    /// Document (or its temp file) could not be written or moved in place.
    Write { path: PathBuf, source: io::Error },
    /// Collection could not be encoded as JSON.
    Serialize(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateDir { path, .. } => {
                write!(f, "failed to create data directory `{}`", path.display())
            }
            Self::Write { path, .. } => write!(f, "failed to write `{}`", path.display()),
            Self::Serialize(_) => write!(f, "failed to encode routines"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Write { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Reasons a load falls back to an empty collection. Never leaves this module.
#[derive(Debug)]
enum LoadError {
    Missing,
    Read(io::Error),
    Parse(serde_json::Error),
    DuplicateId(RoutineId),
}

impl LoadError {
    fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Read(_) => "read_failed",
            Self::Parse(_) => "parse_failed",
            Self::DuplicateId(_) => "duplicate_id",
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "document does not exist"),
            Self::Read(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "duplicate routine id {id}"),
        }
    }
}

/// Storage contract for the routine collection.
pub trait RoutineRepository {
    /// Returns the persisted collection, or an empty one when nothing usable
    /// is stored. Never fails.
    fn load(&self) -> Vec<RoutineItem>;

    /// Replaces stored state with `items`.
    fn save(&self, items: &[RoutineItem]) -> RepoResult<()>;
}

/// JSON document repository at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileRoutineRepository {
    path: PathBuf,
}

impl JsonFileRoutineRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Repository at the document path of a resolved storage config.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.document_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Vec<RoutineItem>, LoadError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(LoadError::Missing),
            Err(err) => return Err(LoadError::Read(err)),
        };

        let items: Vec<RoutineItem> = serde_json::from_str(&raw).map_err(LoadError::Parse)?;

        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(LoadError::DuplicateId(item.id()));
            }
        }

        Ok(items)
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("routines.json"));
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}

impl RoutineRepository for JsonFileRoutineRepository {
    fn load(&self) -> Vec<RoutineItem> {
        let started_at = Instant::now();
        match self.read_document() {
            Ok(items) => {
                info!(
                    "event=routine_load module=repo status=ok count={} duration_ms={}",
                    items.len(),
                    started_at.elapsed().as_millis()
                );
                items
            }
            Err(LoadError::Missing) => {
                info!(
                    "event=routine_load module=repo status=empty reason=missing path={}",
                    self.path.display()
                );
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "event=routine_load module=repo status=fallback error_code={} path={} error={}",
                    err.code(),
                    self.path.display(),
                    err
                );
                Vec::new()
            }
        }
    }

    fn save(&self, items: &[RoutineItem]) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = write_snapshot(&self.path, &self.temp_path(), items);
        match &result {
            Ok(()) => info!(
                "event=routine_save module=repo status=ok count={} duration_ms={}",
                items.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=routine_save module=repo status=error path={} duration_ms={} error={}",
                self.path.display(),
                started_at.elapsed().as_millis(),
                error_chain(err)
            ),
        }
        result
    }
}

fn write_snapshot(path: &Path, temp_path: &Path, items: &[RoutineItem]) -> RepoResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| RepoError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(temp_path, json).map_err(|source| RepoError::Write {
        path: temp_path.to_path_buf(),
        source,
    })?;

    if let Err(source) = std::fs::rename(temp_path, path) {
        let _ = std::fs::remove_file(temp_path);
        return Err(RepoError::Write {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

/// Process-local repository. Used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct InMemoryRoutineRepository {
    items: RefCell<Vec<RoutineItem>>,
    save_count: Cell<usize>,
}

impl InMemoryRoutineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-seeded as if `items` had been saved earlier.
    pub fn with_items(items: Vec<RoutineItem>) -> Self {
        Self {
            items: RefCell::new(items),
            save_count: Cell::new(0),
        }
    }

    /// Last saved snapshot.
    pub fn snapshot(&self) -> Vec<RoutineItem> {
        self.items.borrow().clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.save_count.get()
    }
}

impl RoutineRepository for InMemoryRoutineRepository {
    fn load(&self) -> Vec<RoutineItem> {
        self.snapshot()
    }

    fn save(&self, items: &[RoutineItem]) -> RepoResult<()> {
        *self.items.borrow_mut() = items.to_vec();
        self.save_count.set(self.save_count.get() + 1);
        Ok(())
    }
}
