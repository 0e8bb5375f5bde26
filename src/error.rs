//! Error types for the print renderer

use thiserror::Error;

/// Result type alias for print operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or printing a surface
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The requested container does not exist in the host document
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// A hide/show selector would break out of its rule block
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// The host could not create, write or detach a print surface
    #[error("Surface operation failed: {0}")]
    SurfaceError(String),

    /// The platform refused the print action
    #[error("Print failed: {0}")]
    PrintError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to load a host page
    #[error("Failed to load source: {0}")]
    LoadError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error was raised before any surface existed because the
    /// container lookup failed.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Error::ContainerNotFound(_))
    }
}

#[cfg(feature = "web")]
impl From<wasm_bindgen::JsValue> for Error {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Error::SurfaceError(format!("{:?}", value))
    }
}
