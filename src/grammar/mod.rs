//! @ai:module:intent Directive grammar for @sloth comment annotations
//! @ai:module:layer domain
//! @ai:module:public_api lexer, tree, service, slo, Outcome, DirectiveError, FailureKind
//! @ai:module:stateless true
//!
//! A comment block is first classified by [`lexer::classify`] into directive
//! groups. Each group body is read into a [`tree::Node`] and then interpreted
//! by the service or SLO grammar.
//!
//! ```text
//! @sloth service checkout
//!   version: 1.2
//!   labels:
//!     team: payments
//!
//! @sloth slos
//!   - name: availability
//!     objective: 99.9
//!     sli:
//!       error_query: sum(rate(http_requests_total{code=~"5.."}[{{.window}}]))
//!       total_query: sum(rate(http_requests_total[{{.window}}]))
//! ```

pub mod lexer;
pub mod service;
pub mod slo;
pub mod tree;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use lexer::{classify, Classification, DirectiveGroup, DirectiveKind, Span};
pub use service::eval_service;
pub use slo::eval_slos;

/// @ai:intent Result of running the service grammar over one comment block
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The block holds no directive for this grammar.
    Skip,
    Failure(DirectiveError),
    Success(T),
}

impl<T> Outcome<T> {
    /// @ai:intent Check whether the grammar found nothing to parse
    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip)
    }
}

/// @ai:intent A directive marker was found but its content is invalid
/// @ai:post line is relative to the first line of the comment block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("malformed directive at line {line}: {detail}")]
    MalformedDirective { line: usize, detail: String },

    #[error("missing required field `{field}` in directive at line {line}")]
    MissingRequiredField { line: usize, field: String },

    #[error("value `{value}` of `{field}` at line {line} is out of range: {detail}")]
    OutOfRangeValue {
        line: usize,
        field: String,
        value: String,
        detail: String,
    },

    #[error("duplicate key `{key}` at line {line}")]
    DuplicateKeyInEntry { line: usize, key: String },
}

/// @ai:intent Name of a failure category, used in diagnostics and logs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MalformedDirective,
    MissingRequiredField,
    OutOfRangeValue,
    DuplicateKeyInEntry,
    ConflictingService,
}

impl DirectiveError {
    pub fn malformed(line: usize, detail: impl Into<String>) -> Self {
        Self::MalformedDirective {
            line,
            detail: detail.into(),
        }
    }

    pub fn missing(line: usize, field: &str) -> Self {
        Self::MissingRequiredField {
            line,
            field: field.to_string(),
        }
    }

    /// @ai:intent Category of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedDirective { .. } => FailureKind::MalformedDirective,
            Self::MissingRequiredField { .. } => FailureKind::MissingRequiredField,
            Self::OutOfRangeValue { .. } => FailureKind::OutOfRangeValue,
            Self::DuplicateKeyInEntry { .. } => FailureKind::DuplicateKeyInEntry,
        }
    }

    /// @ai:intent Line of the offending text, relative to the block
    pub fn line(&self) -> usize {
        match self {
            Self::MalformedDirective { line, .. }
            | Self::MissingRequiredField { line, .. }
            | Self::OutOfRangeValue { line, .. }
            | Self::DuplicateKeyInEntry { line, .. } => *line,
        }
    }
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MalformedDirective => "malformed_directive",
            FailureKind::MissingRequiredField => "missing_required_field",
            FailureKind::OutOfRangeValue => "out_of_range_value",
            FailureKind::DuplicateKeyInEntry => "duplicate_key_in_entry",
            FailureKind::ConflictingService => "conflicting_service",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
