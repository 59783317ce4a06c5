//! Domain error types.
//!
//! Aggregation and intake failures are typed so callers can decide whether
//! to skip the offending record or abort the whole report.

use thiserror::Error;

/// Problems with the configured set of rating criteria.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("criterion registry must contain at least one criterion")]
    Empty,

    #[error("criterion names must not be blank")]
    BlankName,

    #[error("criterion '{0}' is listed more than once")]
    Duplicate(String),
}

/// Validation failures raised while summarizing a batch of submissions.
///
/// `index` is the position of the offending record in the input batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// A record rated a criterion the registry does not know about.
    #[error("record {index} for faculty '{faculty_id}' uses unknown criterion '{criterion}'")]
    InvalidCriterion {
        index: usize,
        faculty_id: String,
        criterion: String,
    },

    /// A record carried a score outside the registry's scale.
    #[error(
        "record {index} for faculty '{faculty_id}' has score {score} for '{criterion}', expected {min}..={max}"
    )]
    ScoreOutOfRange {
        index: usize,
        faculty_id: String,
        criterion: String,
        score: i32,
        min: i32,
        max: i32,
    },

    /// A record handed to a per-faculty summary belongs to someone else.
    #[error("record {index} belongs to faculty '{found}', not '{expected}'")]
    FacultyMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

impl AggregateError {
    /// Position of the offending record in the input batch.
    pub fn record_index(&self) -> usize {
        match self {
            AggregateError::InvalidCriterion { index, .. }
            | AggregateError::ScoreOutOfRange { index, .. }
            | AggregateError::FacultyMismatch { index, .. } => *index,
        }
    }
}

/// Rejections at the intake boundary, before a record is ever stored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("faculty name is required")]
    MissingFaculty,

    #[error("unknown criterion '{0}'")]
    UnknownCriterion(String),

    #[error("rating for '{criterion}' is not a whole number: '{value}'")]
    InvalidScore { criterion: String, value: String },

    #[error("rating for '{criterion}' must be between {min} and {max}, got {score}")]
    ScoreOutOfRange {
        criterion: String,
        score: i32,
        min: i32,
        max: i32,
    },

    #[error("please provide a rating ({min}-{max}) for '{criterion}'")]
    MissingRating {
        criterion: String,
        min: i32,
        max: i32,
    },
}
