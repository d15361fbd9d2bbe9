// src/error.rs
//! Engine error surface
//!
//! The simulation core has no fatal conditions: bad samples are recovered
//! locally with safe defaults and rendering continues. The errors here cover
//! the host-facing command surface, where a request can be refused outright
//! (unknown rhythm identifier, unusable configuration) while the previous
//! state keeps rendering.

use thiserror::Error;

/// Errors returned on the engine command surface.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A rhythm identifier is not present in the supplied catalog. The engine
    /// keeps rendering the previous rhythm.
    #[error("unknown rhythm identifier: {0}")]
    UnknownRhythm(String),

    /// A configuration or parameter value is unusable even after sanitizing.
    #[error("invalid value for {field}: {reason}")]
    InvalidParameter {
        /// Field that failed validation
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result type alias for engine operations
pub type SimResult<T> = Result<T, EngineError>;
