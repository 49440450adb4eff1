//! Unified error types for the planning crates
//!
//! [`CdpError`] separates problems with the input data from problems with the
//! model constants. Both are raised before any solver variable is declared.
//!
//! # Example
//!
//! ```ignore
//! use cdp_core::{CdpError, CdpResult};
//!
//! fn plan(path: &str) -> CdpResult<()> {
//!     let store = load_regions(path)?;
//!     params.validate()?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for planning operations.
#[derive(Error, Debug)]
pub enum CdpError {
    /// A region is missing a required field or holds an inconsistent value
    #[error("Data error in {entity}: {message}")]
    Data { entity: String, message: String },

    /// A model constant is invalid (negative, non-finite, unusable divisor)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Region JSON that does not deserialize
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CdpError {
    /// Build a data error attached to an entity such as `"region 10001"`.
    pub fn data(entity: impl Into<String>, message: impl Into<String>) -> Self {
        CdpError::Data {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CdpError::Configuration(message.into())
    }

    /// True for errors that must abort before model construction.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, CdpError::Data { .. } | CdpError::Configuration(_))
    }
}

/// Convenience type alias for Results using CdpError.
pub type CdpResult<T> = Result<T, CdpError>;

impl From<serde_json::Error> for CdpError {
    fn from(err: serde_json::Error) -> Self {
        CdpError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_display() {
        let err = CdpError::data("region 10001", "population0_5 exceeds population0_12");
        let msg = err.to_string();
        assert!(msg.contains("Data error"));
        assert!(msg.contains("region 10001"));
        assert!(msg.contains("population0_5"));
    }

    #[test]
    fn test_construction_errors() {
        assert!(CdpError::config("alpha must be non-negative").is_construction_error());
        assert!(CdpError::data("region 1", "missing").is_construction_error());
        assert!(!CdpError::Parse("expected value".into()).is_construction_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: CdpError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, CdpError::Parse(_)));
        assert!(!err.is_construction_error());
    }
}
