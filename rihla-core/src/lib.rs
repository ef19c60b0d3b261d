pub mod identity;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    /// Deliberately opaque: must not reveal whether the target exists or
    /// which office owns it.
    #[error("not authorized")]
    Unauthorized,
}

pub type CoreResult<T> = Result<T, CoreError>;
