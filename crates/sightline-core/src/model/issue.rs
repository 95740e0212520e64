//! Issue records and typed dependency links.
//!
//! # Overview
//!
//! An [`Issue`] is the immutable input record handed to the analytics core
//! by the external loader. Only dependencies of kind [`DepKind::Blocks`]
//! participate in the dependency graph; other kinds are informational and
//! are carried through untouched for consumers that render them.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Workflow status of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl Status {
    /// Return `true` for statuses that count as "workable": open or
    /// in-progress. Only workable issues can be actionable, and only
    /// workable blockers actually block.
    #[must_use]
    pub const fn is_workable(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    /// Return `true` when the issue is closed.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// Kind of a dependency link.
///
/// Only [`DepKind::Blocks`] edges enter the dependency graph. Unknown kinds
/// from newer writers round-trip through [`DepKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepKind {
    Blocks,
    Related,
    ParentOf,
    DuplicateOf,
    #[serde(untagged)]
    Other(String),
}

/// One typed dependency entry: this issue depends on `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// ID of the issue this one depends on.
    pub depends_on: String,
    /// Link kind.
    pub kind: DepKind,
}

impl Dependency {
    /// Convenience constructor for a `blocks` dependency.
    #[must_use]
    pub fn blocks(depends_on: impl Into<String>) -> Self {
        Self {
            depends_on: depends_on.into(),
            kind: DepKind::Blocks,
        }
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

/// Highest (most urgent) priority value.
pub const PRIORITY_HIGHEST: u8 = 0;
/// Lowest priority value.
pub const PRIORITY_LOWEST: u8 = 4;

/// An immutable issue record as produced by the external loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Opaque non-empty ID, unique across the input.
    pub id: String,
    /// Free-text title.
    #[serde(default)]
    pub title: String,
    /// Workflow status.
    pub status: Status,
    /// Priority 0..=4, 0 highest.
    #[serde(default)]
    pub priority: u8,
    /// Free type tag (task, bug, ...).
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Label set.
    #[serde(default)]
    pub labels: BTreeSet<String>,
    /// Creation timestamp, when known.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp, when known.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Ordered dependency entries.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Originating repository, for prefix filtering.
    #[serde(default)]
    pub source_repo: Option<String>,
}

impl Issue {
    /// Minimal constructor used pervasively in tests and by loaders that
    /// fill optional fields afterwards.
    #[must_use]
    pub fn new(id: impl Into<String>, status: Status) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            status,
            priority: 2,
            kind: "task".into(),
            labels: BTreeSet::new(),
            created_at: None,
            updated_at: None,
            dependencies: Vec::new(),
            source_repo: None,
        }
    }

    /// Iterate over the `blocks` targets of this issue.
    pub fn blocks_targets(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(|d| d.kind == DepKind::Blocks)
            .map(|d| d.depends_on.as_str())
    }

    /// Validate the record's required fields.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InputMalformed`] when the ID is empty, the
    /// priority is out of range, or a dependency target is empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id.is_empty() {
            return Err(CoreError::InputMalformed {
                issue_id: String::new(),
                reason: "issue ID must be non-empty".into(),
            });
        }
        if self.priority > PRIORITY_LOWEST {
            return Err(CoreError::InputMalformed {
                issue_id: self.id.clone(),
                reason: format!(
                    "priority {} out of range {PRIORITY_HIGHEST}..={PRIORITY_LOWEST}",
                    self.priority
                ),
            });
        }
        for dep in &self.dependencies {
            if dep.depends_on.is_empty() {
                return Err(CoreError::InputMalformed {
                    issue_id: self.id.clone(),
                    reason: "dependency target ID must be non-empty".into(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_workability() {
        assert!(Status::Open.is_workable());
        assert!(Status::InProgress.is_workable());
        assert!(!Status::Blocked.is_workable());
        assert!(!Status::Closed.is_workable());
        assert!(Status::Closed.is_closed());
    }

    #[test]
    fn status_serde_snake_case() {
        let json = serde_json::to_string(&Status::InProgress).expect("serialize");
        assert_eq!(json, "\"in_progress\"");
        let back: Status = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, Status::InProgress);
    }

    #[test]
    fn dep_kind_roundtrips_unknown_values() {
        let json = "\"follows\"";
        let kind: DepKind = serde_json::from_str(json).expect("deserialize");
        assert_eq!(kind, DepKind::Other("follows".into()));
    }

    #[test]
    fn blocks_targets_filters_informational_links() {
        let mut issue = Issue::new("a", Status::Open);
        issue.dependencies = vec![
            Dependency::blocks("b"),
            Dependency {
                depends_on: "c".into(),
                kind: DepKind::Related,
            },
            Dependency::blocks("d"),
        ];
        let targets: Vec<&str> = issue.blocks_targets().collect();
        assert_eq!(targets, vec!["b", "d"]);
    }

    #[test]
    fn validate_rejects_empty_id() {
        let issue = Issue::new("", Status::Open);
        let err = issue.validate().expect_err("empty ID must fail");
        assert!(matches!(err, CoreError::InputMalformed { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_priority() {
        let mut issue = Issue::new("a", Status::Open);
        issue.priority = 5;
        let err = issue.validate().expect_err("priority 5 must fail");
        assert!(err.to_string().contains("priority 5"));
    }

    #[test]
    fn validate_rejects_empty_dependency_target() {
        let mut issue = Issue::new("a", Status::Open);
        issue.dependencies = vec![Dependency::blocks("")];
        assert!(issue.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_record() {
        let mut issue = Issue::new("a", Status::Open);
        issue.dependencies = vec![Dependency::blocks("b")];
        issue.priority = 0;
        assert!(issue.validate().is_ok());
    }
}
