//! Domain-level error type shared across crates.

/// Errors raised by domain logic in `basin-core`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A registry document was not found.
    #[error("{entity} with id {id} not found")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    /// Input failed domain validation.
    #[error("{0}")]
    Validation(String),

    /// An unexpected internal failure.
    #[error("{0}")]
    Internal(String),
}
