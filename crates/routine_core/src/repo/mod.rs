//! Repository layer: durable storage for the routine collection.
//!
//! # Responsibility
//! - Define the load/save contract used by the routine store.
//! - Keep file layout and JSON details out of the service layer.
//!
//! # Invariants
//! - `load` is fail-open: absence or corruption yields an empty collection.
//! - `save` is fail-loud: every write failure is returned to the caller.

pub mod routine_repo;
