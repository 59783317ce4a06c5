use std::collections::BTreeMap;

use crate::criteria::{CriterionRegistry, MAX_SCORE, MIN_SCORE};
use crate::error::AggregateError;
use crate::models::{FacultySummary, SubmissionRecord};

/// Summarize every record for a single faculty member.
///
/// All records must already belong to `faculty_id`. The whole batch is
/// validated before anything is computed, so an error never comes with a
/// partial summary.
pub fn summarize(
    registry: &CriterionRegistry,
    faculty_id: &str,
    records: &[SubmissionRecord],
) -> Result<FacultySummary, AggregateError> {
    for (index, record) in records.iter().enumerate() {
        if record.faculty_id != faculty_id {
            return Err(AggregateError::FacultyMismatch {
                index,
                expected: faculty_id.to_string(),
                found: record.faculty_id.clone(),
            });
        }
    }
    validate_batch(registry, records)?;

    let group: Vec<&SubmissionRecord> = records.iter().collect();
    Ok(summarize_group(registry, faculty_id, &group))
}

/// Partition records by faculty and summarize each group.
pub fn summarize_all(
    registry: &CriterionRegistry,
    records: &[SubmissionRecord],
) -> Result<BTreeMap<String, FacultySummary>, AggregateError> {
    validate_batch(registry, records)?;

    let groups = partition(records);
    tracing::debug!(
        records = records.len(),
        faculties = groups.len(),
        "summarizing feedback"
    );

    Ok(groups
        .iter()
        .map(|(faculty_id, group)| {
            (
                faculty_id.to_string(),
                summarize_group(registry, faculty_id, group),
            )
        })
        .collect())
}

/// Summarize only the requested faculty members.
///
/// Requested ids with no records still get an empty summary; records for
/// faculty members that were not requested are validated but otherwise ignored.
pub fn summarize_requested(
    registry: &CriterionRegistry,
    faculty_ids: &[String],
    records: &[SubmissionRecord],
) -> Result<BTreeMap<String, FacultySummary>, AggregateError> {
    validate_batch(registry, records)?;

    let groups = partition(records);
    Ok(faculty_ids
        .iter()
        .map(|faculty_id| {
            let summary = match groups.get(faculty_id.as_str()) {
                Some(group) => summarize_group(registry, faculty_id, group),
                None => FacultySummary::empty(faculty_id),
            };
            (faculty_id.clone(), summary)
        })
        .collect())
}

pub fn validate_batch(
    registry: &CriterionRegistry,
    records: &[SubmissionRecord],
) -> Result<(), AggregateError> {
    for (index, record) in records.iter().enumerate() {
        validate_record(registry, index, record)?;
    }
    Ok(())
}

fn validate_record(
    registry: &CriterionRegistry,
    index: usize,
    record: &SubmissionRecord,
) -> Result<(), AggregateError> {
    for (criterion, &score) in &record.ratings {
        if !registry.contains(criterion) {
            return Err(AggregateError::InvalidCriterion {
                index,
                faculty_id: record.faculty_id.clone(),
                criterion: criterion.clone(),
            });
        }
        if !CriterionRegistry::score_in_range(score) {
            return Err(AggregateError::ScoreOutOfRange {
                index,
                faculty_id: record.faculty_id.clone(),
                criterion: criterion.clone(),
                score,
                min: MIN_SCORE,
                max: MAX_SCORE,
            });
        }
    }
    Ok(())
}

// Exact-match partition; each group keeps input order.
fn partition(records: &[SubmissionRecord]) -> BTreeMap<&str, Vec<&SubmissionRecord>> {
    let mut groups: BTreeMap<&str, Vec<&SubmissionRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.faculty_id.as_str())
            .or_default()
            .push(record);
    }
    groups
}

fn summarize_group(
    registry: &CriterionRegistry,
    faculty_id: &str,
    group: &[&SubmissionRecord],
) -> FacultySummary {
    let mut summary = FacultySummary::empty(faculty_id);
    summary.submission_count = group.len();

    let mut average_total = 0.0;
    let mut present = 0usize;

    for criterion in registry.names() {
        let (total, count) = group
            .iter()
            .filter_map(|record| record.ratings.get(criterion))
            .fold((0i64, 0usize), |(total, count), &score| {
                (total + i64::from(score), count + 1)
            });

        if count == 0 {
            continue;
        }

        let average = total as f64 / count as f64;
        summary
            .per_criterion_average
            .insert(criterion.clone(), average);
        summary.per_criterion_count.insert(criterion.clone(), count);
        average_total += average;
        present += 1;
    }

    if present > 0 {
        summary.overall_average = Some(average_total / present as f64);
    }

    summary.comments = group
        .iter()
        .filter_map(|record| record.comment.as_deref())
        .filter(|comment| !comment.is_empty())
        .map(str::to_string)
        .collect();

    summary
}
