use thiserror::Error;

/// Error taxonomy for the registry core.
///
/// `CorruptHierarchy` is deliberately distinct from `NotFound`: the former
/// means the location data itself is broken (a cycle in the parent chain)
/// and should page an operator, the latter is ordinary user error.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("corrupt location hierarchy: {0}")]
    CorruptHierarchy(String),

    #[error("database error: {0}")]
    Database(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
