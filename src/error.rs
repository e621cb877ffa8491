//! Error module for the Rusty GasNet library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq, Clone)]
pub enum GasNetError {
    /// Error for invalid engine parameters, e.g., a non-positive emission radius or propagation speed.
    ConfigurationError(String),
    /// Error for a neuron referenced by a unit or an emitter but absent from the lookup.
    ReferenceError(String),
    /// Error for an operation that is not valid in the current state, e.g., ticking a unit without channel.
    InvalidOperation(String),
    /// Error while (de)serializing a network snapshot.
    SerializationError(String),
}

impl fmt::Display for GasNetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GasNetError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            GasNetError::ReferenceError(e) => write!(f, "Reference error: {}", e),
            GasNetError::InvalidOperation(e) => write!(f, "Invalid operation: {}", e),
            GasNetError::SerializationError(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl Error for GasNetError {}
