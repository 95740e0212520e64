//! Error types for the analytics core.
//!
//! Every error explains what went wrong, why, and how to fix it, and
//! carries a stable machine-readable code for programmatic handling by
//! robot consumers.
//!
//! Metric timeouts and truncated cycle enumeration are deliberately *not*
//! errors: they are recorded as per-metric states on the stats object and
//! as a sentinel entry in the cycle list. Only conditions that abort an
//! analysis (malformed input, broken invariants) surface here.

use serde::Serialize;
use std::fmt;

// ---------------------------------------------------------------------------
// Machine-readable error codes
// ---------------------------------------------------------------------------

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InputMalformed,
    DuplicateIssueId,
    InvariantViolation,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InputMalformed => "E2001",
            Self::DuplicateIssueId => "E2002",
            Self::InvariantViolation => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InputMalformed => "Malformed issue record",
            Self::DuplicateIssueId => "Duplicate issue ID",
            Self::InvariantViolation => "Internal invariant violated",
        }
    }

    /// Optional remediation hint surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InputMalformed => {
                Some("Fix the offending issue record in the tracker data and rerun the analysis.")
            }
            Self::DuplicateIssueId => {
                Some("Issue IDs must be unique across the input. Deduplicate upstream.")
            }
            Self::InvariantViolation => {
                Some("This is a bug in the analytics core. Report it with the message text.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// CoreError
// ---------------------------------------------------------------------------

/// Top-level error type for core analysis operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A required field is missing or mistyped on an issue record.
    /// The analysis is aborted; recovery is the caller's responsibility.
    #[error(
        "Error: Malformed issue '{issue_id}': {reason}\nCause: A required field is missing or has an invalid value\nFix: Correct the record in the tracker data and rerun the analysis."
    )]
    InputMalformed {
        /// ID of the offending issue (may be empty when the ID itself is bad).
        issue_id: String,
        /// Description of the malformation.
        reason: String,
    },

    /// Two issue records in one input share an ID.
    #[error(
        "Error: Duplicate issue ID '{issue_id}'\nCause: Issue IDs must be unique across the input\nFix: Deduplicate the issue collection upstream."
    )]
    DuplicateIssueId {
        /// The duplicated ID.
        issue_id: String,
    },

    /// A documented invariant of the stats object was broken. This is a
    /// programming bug; the analysis terminates but the process need not.
    #[error(
        "Error: Internal invariant violated: {what}\nCause: This is a bug in the analytics core\nFix: Report it with this message."
    )]
    InvariantViolation {
        /// Which invariant was broken.
        what: String,
    },
}

impl CoreError {
    /// Machine-readable error code for JSON output (e.g., `"E2001"`).
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InputMalformed { .. } => ErrorCode::InputMalformed.code(),
            Self::DuplicateIssueId { .. } => ErrorCode::DuplicateIssueId.code(),
            Self::InvariantViolation { .. } => ErrorCode::InvariantViolation.code(),
        }
    }

    /// Structured error payload for JSON serialization.
    #[must_use]
    pub fn to_json_error(&self) -> JsonError {
        JsonError {
            error_code: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// JSON-serializable error payload for robot consumers.
#[derive(Debug, Clone, Serialize)]
pub struct JsonError {
    /// Machine-readable error code (e.g., `"E2001"`).
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
