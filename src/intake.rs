use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::criteria::{CriterionRegistry, MAX_SCORE, MIN_SCORE};
use crate::error::IntakeError;
use crate::models::SubmissionRecord;

/// Raw feedback as it arrives from a form or an import row.
///
/// Anything identifying the submitter is dropped before this is built.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub faculty: String,
    pub ratings: BTreeMap<String, String>,
    pub comment: String,
}

/// Turn a raw form into a validated, immutable record.
///
/// Blank rating values mean the criterion was not rated. With
/// `require_all` every registry criterion must carry a score.
pub fn accept(
    registry: &CriterionRegistry,
    form: &SubmissionForm,
    submitted_at: DateTime<Utc>,
    require_all: bool,
) -> Result<SubmissionRecord, IntakeError> {
    let faculty_id = form.faculty.trim();
    if faculty_id.is_empty() {
        return Err(IntakeError::MissingFaculty);
    }

    let mut ratings = BTreeMap::new();
    for (criterion, raw) in &form.ratings {
        let criterion = criterion.trim();
        if !registry.contains(criterion) {
            return Err(IntakeError::UnknownCriterion(criterion.to_string()));
        }

        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let score: i32 = raw.parse().map_err(|_| IntakeError::InvalidScore {
            criterion: criterion.to_string(),
            value: raw.to_string(),
        })?;
        if !CriterionRegistry::score_in_range(score) {
            return Err(IntakeError::ScoreOutOfRange {
                criterion: criterion.to_string(),
                score,
                min: MIN_SCORE,
                max: MAX_SCORE,
            });
        }
        ratings.insert(criterion.to_string(), score);
    }

    if require_all {
        if let Some(missing) = registry
            .names()
            .iter()
            .find(|name| !ratings.contains_key(name.as_str()))
        {
            return Err(IntakeError::MissingRating {
                criterion: missing.clone(),
                min: MIN_SCORE,
                max: MAX_SCORE,
            });
        }
    }

    let comment = form.comment.trim();
    Ok(SubmissionRecord {
        faculty_id: faculty_id.to_string(),
        ratings,
        comment: (!comment.is_empty()).then(|| comment.to_string()),
        submitted_at,
    })
}

/// Parse `Name=score` pairs as given on the command line.
pub fn parse_rating_pairs(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut ratings = BTreeMap::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected Name=score, got '{pair}'"))?;
        ratings.insert(name.trim().to_string(), value.trim().to_string());
    }
    Ok(ratings)
}
