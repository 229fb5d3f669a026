//! Basin domain core.
//!
//! Pure domain logic shared by the API, pipeline, and worker crates:
//!
//! - [`model`] / [`run`]: the registry document types (models, runs).
//! - [`template`]: offset-based template substitution for directives and
//!   config files.
//! - [`params`]: validation of user-supplied parameter values against a
//!   model's declared parameters.
//! - [`mounts`]: deduplicated volume-mount planning for a run.
//! - [`workspace`]: the run-scoped filesystem layout under the results root.
//! - [`sentinel`]: the writing-in-progress marker convention used for
//!   completion detection.
//!
//! This crate has no internal dependencies and performs no I/O except for
//! the small filesystem helpers in [`sentinel`].

pub mod error;
pub mod model;
pub mod mounts;
pub mod params;
pub mod run;
pub mod sentinel;
pub mod template;
pub mod types;
pub mod workspace;

pub use error::CoreError;
