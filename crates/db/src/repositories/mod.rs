//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod job_repo;
pub mod model_repo;
pub mod run_repo;

pub use job_repo::JobRepo;
pub use model_repo::ModelRepo;
pub use run_repo::RunRepo;
