//! Audit logging for the budget engine
//!
//! Records every create, update and delete of budgets, snapshots,
//! adjustments, categories, merges and transactions with before/after values
//! in an append-only log.
//!
//! # Architecture
//!
//! - `AuditEntry`: one log entry with timestamp, operation, entity
//!   information, and optional before/after values.
//! - `AuditLogger`: appends entries to the log file as line-delimited JSON
//!   (JSONL).
//! - `generate_diff`: builds a human-readable summary of what changed
//!   between two entity states.
//!
//! Entries are normally written through `Storage::log_create`,
//! `Storage::log_update` and `Storage::log_delete`.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
