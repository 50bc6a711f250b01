//! Core use-case services.
//!
//! # Responsibility
//! - Own the working routine collection and mediate every mutation.
//! - Keep callers decoupled from storage details.

pub mod routine_store;
