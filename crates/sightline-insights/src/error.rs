//! Error types for baseline persistence.
//!
//! An invalid drift-configuration file is deliberately *not* an error:
//! the drift engine logs a warning and falls back to defaults. Only a
//! missing or corrupt baseline aborts a drift check.

use std::path::PathBuf;

/// Errors raised when loading or saving the persisted baseline.
#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    /// No baseline exists at the expected path. Drift commands treat
    /// this as a user error: create a baseline first.
    #[error(
        "Error: No baseline found at {path}\nCause: A drift check needs a stored baseline to compare against\nFix: Create one from the current graph state, then rerun the drift check."
    )]
    Missing {
        /// Path that was checked.
        path: PathBuf,
    },

    /// The baseline file exists but does not parse against the schema.
    #[error(
        "Error: Baseline at {path} is corrupt\nCause: {reason}\nFix: Delete the file and create a fresh baseline."
    )]
    Corrupt {
        /// Path of the corrupt file.
        path: PathBuf,
        /// Parse or validation failure description.
        reason: String,
    },

    /// Reading or writing the baseline file failed.
    #[error(
        "Error: I/O failure on baseline at {path}\nCause: {reason}\nFix: Check permissions and disk space on the target directory."
    )]
    Io {
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying I/O error description.
        reason: String,
    },
}

impl BaselineError {
    /// Machine-readable error code for JSON output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "E5101",
            Self::Corrupt { .. } => "E5102",
            Self::Io { .. } => "E5103",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_baseline_points_to_creation() {
        let err = BaselineError::Missing {
            path: PathBuf::from(".bv/baseline.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Error:"));
        assert!(msg.contains("Fix:"));
        assert!(msg.contains("baseline.json"));
        assert_eq!(err.error_code(), "E5101");
    }

    #[test]
    fn corrupt_baseline_carries_reason() {
        let err = BaselineError::Corrupt {
            path: PathBuf::from("x.json"),
            reason: "missing field `stats`".into(),
        };
        assert!(err.to_string().contains("missing field"));
        assert_eq!(err.error_code(), "E5102");
    }
}
