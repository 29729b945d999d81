//! Engine error types

use thiserror::Error;

/// Errors raised while observing or repositioning a scroll container
///
/// None of these are fatal to the host: the container controller turns
/// each one into "no repositioning / no classification this cycle".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// An anchor selector matched no rendered element
    #[error("selector `{0}` matched no rendered element")]
    SelectorMiss(String),

    /// A preserve anchor with no displacement recorded for its key
    #[error("no preserved position recorded for anchor `{0}`")]
    AnchorNotSnapshotted(String),

    /// Container or list geometry is not available yet
    #[error("geometry unavailable: {0}")]
    GeometryUnavailable(&'static str),

    /// A point id that is not registered with this container
    #[error("unknown observation point")]
    UnknownPoint,

    /// A configuration value that could not be interpreted
    #[error("malformed configuration: {0}")]
    MalformedConfig(String),

    /// Configuration source could not be read or deserialized
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
