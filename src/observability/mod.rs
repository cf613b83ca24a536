//! Structured logging used at every warn/error site in the snapshot and
//! replication lifecycle.
//!
//! Observability is read-only: it never influences control flow and never
//! introduces background threads. Every log call is synchronous.

mod logger;

pub use logger::{Logger, Severity};
