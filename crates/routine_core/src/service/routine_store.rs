//! Routine store: the authoritative, always-sorted routine collection.
//!
//! # Responsibility
//! - Validate input before admitting new routines.
//! - Keep the collection ordered by `(starts_at, ends_at)` after every
//!   mutation.
//! - Flush the full collection through the repository after each mutation.
//!
//! # Invariants
//! - Iteration order equals ascending `schedule_key()`; equal keys keep
//!   insertion order.
//! - Ids are unique within the collection.
//! - A rejected `add` leaves the collection untouched.
//! - A failed save never rolls back or corrupts the in-memory collection.

use crate::logging::error_chain;
use crate::model::routine::{RoutineId, RoutineItem, RoutineValidationError};
use crate::repo::routine_repo::{RepoError, RepoResult, RoutineRepository};
use chrono::{NaiveDate, NaiveTime};
use log::{error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Store operation failure.
#[derive(Debug)]
pub enum RoutineStoreError {
    /// Input rejected; the collection is unchanged.
    Validation(RoutineValidationError),
    /// The mutation was applied in memory but could not be saved.
    Persist(RepoError),
}

impl Display for RoutineStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persist(_) => write!(f, "routine change not saved"),
        }
    }
}

impl Error for RoutineStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(_) => None,
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<RoutineValidationError> for RoutineStoreError {
    fn from(value: RoutineValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for RoutineStoreError {
    fn from(value: RepoError) -> Self {
        Self::Persist(value)
    }
}

/// Input for [`RoutineStore::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoutine {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// `None` records a single instant.
    pub end_time: Option<NaiveTime>,
    /// Raw activity text; normalized by the store.
    pub activity: String,
}

/// Owner of the working routine collection.
pub struct RoutineStore<R: RoutineRepository> {
    repo: R,
    items: Vec<RoutineItem>,
}

impl<R: RoutineRepository> RoutineStore<R> {
    /// Creates an empty store over `repo` without reading it.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            items: Vec::new(),
        }
    }

    /// Creates a store hydrated from `repo.load()`.
    pub fn open(repo: R) -> Self {
        let mut store = Self::new(repo);
        let persisted = store.repo.load();
        store.initialize(persisted);
        store
    }

    /// Replaces the working collection with `items`, sorted by schedule.
    ///
    /// Later duplicates of an id already seen are dropped.
    pub fn initialize(&mut self, items: Vec<RoutineItem>) {
        let total = items.len();
        let mut seen = HashSet::with_capacity(total);
        let mut kept = Vec::with_capacity(total);
        for item in items {
            if seen.insert(item.id()) {
                kept.push(item);
            }
        }
        let dropped = total - kept.len();
        kept.sort_by_key(RoutineItem::schedule_key);
        self.items = kept;

        if dropped > 0 {
            warn!("event=store_init module=service status=dedup dropped_duplicates={dropped}");
        }
        info!(
            "event=store_init module=service status=ok count={}",
            self.items.len()
        );
    }

    /// Validates `request`, inserts the new routine in schedule order and
    /// saves the collection.
    ///
    /// # Errors
    /// - `Validation(EmptyActivity | InvalidInterval)`: nothing changed.
    /// - `Persist`: the routine is in the collection but not on disk.
    pub fn add(&mut self, request: &NewRoutine) -> Result<RoutineItem, RoutineStoreError> {
        let started_at = Instant::now();
        let item = match RoutineItem::with_id(
            self.fresh_id(),
            request.date,
            request.start_time,
            request.end_time,
            &request.activity,
        ) {
            Ok(item) => item,
            Err(err) => {
                info!(
                    "event=routine_add module=service status=rejected reason={}",
                    validation_code(&err)
                );
                return Err(err.into());
            }
        };

        let key = item.schedule_key();
        let index = self
            .items
            .partition_point(|existing| existing.schedule_key() <= key);
        self.items.insert(index, item.clone());

        self.persist("routine_add", item.id(), started_at)?;
        Ok(item)
    }

    /// Removes the routine with `id` and saves the collection.
    ///
    /// Returns `Ok(false)` without touching storage when `id` is absent.
    /// Confirming user intent is the caller's job.
    ///
    /// # Errors
    /// - `Persist`: the routine is gone from memory but still on disk.
    pub fn remove(&mut self, id: RoutineId) -> Result<bool, RoutineStoreError> {
        let started_at = Instant::now();
        let Some(index) = self.items.iter().position(|item| item.id() == id) else {
            info!("event=routine_remove module=service status=noop id={id}");
            return Ok(false);
        };

        self.items.remove(index);
        self.persist("routine_remove", id, started_at)?;
        Ok(true)
    }

    /// Snapshot of the collection in schedule order.
    pub fn list(&self) -> Vec<RoutineItem> {
        self.items.clone()
    }

    pub fn get(&self, id: RoutineId) -> Option<RoutineItem> {
        self.items.iter().find(|item| item.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Saves the full collection; called once more on shutdown.
    pub fn flush(&self) -> RepoResult<()> {
        self.repo.save(&self.items)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn fresh_id(&self) -> RoutineId {
        loop {
            let id = Uuid::new_v4();
            if !self.items.iter().any(|item| item.id() == id) {
                return id;
            }
        }
    }

    fn persist(
        &self,
        event: &str,
        id: RoutineId,
        started_at: Instant,
    ) -> Result<(), RoutineStoreError> {
        match self.repo.save(&self.items) {
            Ok(()) => {
                info!(
                    "event={event} module=service status=ok id={id} count={} duration_ms={}",
                    self.items.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event={event} module=service status=error error_code=save_failed id={id} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    error_chain(&err)
                );
                Err(err.into())
            }
        }
    }
}

fn validation_code(err: &RoutineValidationError) -> &'static str {
    match err {
        RoutineValidationError::EmptyActivity => "empty_activity",
        RoutineValidationError::InvalidInterval { .. } => "invalid_interval",
        RoutineValidationError::InvalidTime { .. } => "invalid_time",
        RoutineValidationError::InvalidDate(_) => "invalid_date",
        RoutineValidationError::NilId => "nil_id",
    }
}
