//! Error types for conversion operations

use std::fmt;

/// Errors that can occur during HTML to WordprocessingML conversion
#[derive(Debug)]
pub enum ConversionError {
    /// HTML parsing failed
    ParseError(String),
    /// Character encoding error
    EncodingError(String),
    /// Invalid input data
    InvalidInput(String),
    /// Output tree invariant violated (would produce schema-invalid markup)
    StructuralError(String),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConversionError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            ConversionError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ConversionError::StructuralError(msg) => write!(f, "Structural error: {}", msg),
        }
    }
}

impl std::error::Error for ConversionError {}
