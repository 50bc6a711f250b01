//! Domain model for dated, timed routine records.
//!
//! # Responsibility
//! - Define the canonical routine record used by store and export paths.
//! - Keep persisted wire shapes separate from the validated domain type.
//!
//! # Invariants
//! - Every routine is identified by a stable, non-nil `RoutineId`.
//! - A `RoutineItem` value is always valid; every construction path validates.

pub mod record;
pub mod routine;
