use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One anonymous feedback event.
///
/// There is deliberately no field that points back at the person who
/// submitted it: no user id, no session, no address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub faculty_id: String,
    pub ratings: BTreeMap<String, i32>,
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregated statistics for one faculty member, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacultySummary {
    pub faculty_id: String,
    /// Only criteria with at least one contributing submission appear here.
    pub per_criterion_average: BTreeMap<String, f64>,
    pub per_criterion_count: BTreeMap<String, usize>,
    /// `None` means no data, which is never the same as `0.0`.
    pub overall_average: Option<f64>,
    pub comments: Vec<String>,
    pub submission_count: usize,
}

impl FacultySummary {
    pub fn empty(faculty_id: &str) -> Self {
        Self {
            faculty_id: faculty_id.to_string(),
            per_criterion_average: BTreeMap::new(),
            per_criterion_count: BTreeMap::new(),
            overall_average: None,
            comments: Vec::new(),
            submission_count: 0,
        }
    }

    /// True when nobody has submitted feedback for this faculty member yet.
    pub fn is_empty(&self) -> bool {
        self.submission_count == 0
    }
}
