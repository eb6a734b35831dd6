//! Error types and result aliases for the compatibility engine.
//!
//! Provides a unified error type covering the projection, diff, and replay
//! surfaces. Fatal variants abort the operation; recoverable variants are
//! reported and the offending edit is dropped.

use thiserror::Error;

/// Unified error type for all compatibility-engine operations
#[derive(Error, Debug)]
pub enum CompatError {
    // Projection errors
    #[error("Required field '{field}' is missing from [project]")]
    MissingRequiredField { field: String },

    #[error("Unrecognized pyproject schema at '{path}': {reason}")]
    UnrecognizedSchema { path: String, reason: String },

    // Parsing errors
    #[error("Invalid requirement '{line}': {reason}")]
    InvalidRequirement { line: String, reason: String },

    #[error("Invalid dependency descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    #[error("Failed to parse pyproject.toml: {message}")]
    TomlParse { message: String },

    // Replay errors (recovered locally: edit dropped, write continues)
    #[error("Unsupported edit at '{path}': {reason}")]
    UnsupportedEdit { path: String, reason: String },

    #[error("Dependency '{name}' matched {count} entries in the authoritative list")]
    AmbiguousDependencyMatch { name: String, count: usize },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for compatibility-engine operations
pub type CompatResult<T> = Result<T, CompatError>;

impl CompatError {
    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Create an unsupported-edit error for a diff path
    pub fn unsupported_edit(path: &[String], reason: impl Into<String>) -> Self {
        Self::UnsupportedEdit {
            path: path.join("."),
            reason: reason.into(),
        }
    }

    /// Check if this error is recovered by dropping the edit instead of
    /// aborting the whole write
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CompatError::UnsupportedEdit { .. } | CompatError::AmbiguousDependencyMatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let dropped = CompatError::unsupported_edit(&["description".to_string()], "no replay rule");
        assert!(dropped.is_recoverable());

        let ambiguous = CompatError::AmbiguousDependencyMatch {
            name: "foo".to_string(),
            count: 2,
        };
        assert!(ambiguous.is_recoverable());

        let fatal = CompatError::MissingRequiredField {
            field: "name".to_string(),
        };
        assert!(!fatal.is_recoverable());
    }

    #[test]
    fn test_unsupported_edit_path_rendering() {
        let err = CompatError::unsupported_edit(
            &["group".to_string(), "dev".to_string()],
            "no such bucket",
        );
        assert_eq!(
            err.to_string(),
            "Unsupported edit at 'group.dev': no such bucket"
        );
    }
}
