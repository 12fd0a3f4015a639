//! Error types for arvista

use thiserror::Error;

/// Main error type for arvista operations
///
/// Only construction and loading paths produce these. A missing surface or
/// an asset that has not arrived yet is a pending state, not an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("AR unavailable: {0}")]
    PlatformUnavailable(String),

    #[error("POI offsets have already been resolved")]
    AlreadyResolved,

    #[error("POI catalog is empty")]
    EmptyCatalog,

    #[error("Duplicate POI id: {0}")]
    DuplicatePoiId(u32),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type alias for arvista operations
pub type Result<T> = std::result::Result<T, Error>;

/// Rejection reported by the platform AR session when a capability
/// (reference space or hit-test source) cannot be acquired
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PlatformError(pub String);

impl From<PlatformError> for Error {
    fn from(e: PlatformError) -> Self {
        Error::PlatformUnavailable(e.0)
    }
}
