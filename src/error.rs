//! Error types for the grid core.
//!
//! The rendering core itself never fails on layout input; these errors are
//! the non-fatal signals it hands back to the host (out of range reveals,
//! unknown columns, capabilities that were never registered).

/// All errors surfaced by the grid library.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A row reveal or lookup asked for an index outside the display sequence.
    #[error("row index {index} is out of range (display rows: {count})")]
    RowOutOfRange { index: usize, count: usize },

    /// A column was referenced by a field name that is not defined.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// A named formatter/sorter was requested but never registered.
    #[error("unknown {kind} '{name}'")]
    UnknownCapability { kind: &'static str, name: String },

    /// A filter could not be compiled.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Configuration could not be read or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GridError::RowOutOfRange {
            index: 12,
            count: 10,
        };
        assert_eq!(
            err.to_string(),
            "row index 12 is out of range (display rows: 10)"
        );

        let err = GridError::UnknownCapability {
            kind: "formatter",
            name: "money".to_string(),
        };
        assert_eq!(err.to_string(), "unknown formatter 'money'");
    }
}
