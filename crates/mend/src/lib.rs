//! Mend - repair and query engine for a JSONL issue-graph mirror.
//!
//! A mirror of an issue tracker lives in a line-delimited record file.
//! This crate loads it into an order-preserving [`store::Store`],
//! applies idempotent edge repairs, derives phase membership from a
//! frozen [`snapshot::Snapshot`], detects orphaned issues, and exposes
//! the [`sync::TrackerClient`] boundary a tracker transport implements.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod detect;
pub mod domain;
pub mod error;
pub mod plan;
pub mod repair;
pub mod report;
pub mod snapshot;
pub mod store;
pub mod sync;

// Public CLI module (needed by binary)
pub mod cli;

pub use error::{Error, Result};
