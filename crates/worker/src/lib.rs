//! The run-execution worker.
//!
//! Claims jobs from the shared Postgres queue and drives each through the
//! pipeline, bounded by a configured concurrency limit. Any number of
//! worker processes can poll the same queue; `FOR UPDATE SKIP LOCKED`
//! claiming prevents double-dispatch.

pub mod config;
pub mod dispatcher;

pub use config::WorkerConfig;
pub use dispatcher::JobDispatcher;
