use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::criteria::CriterionRegistry;
use crate::intake::{self, SubmissionForm};
use crate::models::SubmissionRecord;

const FACULTY_COLUMN: &str = "faculty_id";
const SUBMITTED_AT_COLUMN: &str = "submitted_at";
const COMMENT_COLUMN: &str = "comment";
const SOURCE_KEY_COLUMN: &str = "source_key";

/// A validated CSV row ready to store.
#[derive(Debug, Clone)]
pub struct ImportedSubmission {
    pub source_key: Option<String>,
    pub record: SubmissionRecord,
}

/// Read a feedback export.
///
/// Every column other than the fixed ones is a criterion; blank cells mean
/// "not rated". Any invalid row fails the whole file.
pub fn read_csv(
    registry: &CriterionRegistry,
    csv_path: &Path,
) -> anyhow::Result<Vec<ImportedSubmission>> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_rows(registry, reader)
}

fn read_rows<R: std::io::Read>(
    registry: &CriterionRegistry,
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<ImportedSubmission>> {
    let imported_at = Utc::now();
    let mut rows = Vec::new();

    for (position, result) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        // Header is line 1.
        let line = position + 2;
        let mut row = result.with_context(|| format!("malformed CSV at line {line}"))?;

        let faculty = row.remove(FACULTY_COLUMN).unwrap_or_default();
        let comment = row.remove(COMMENT_COLUMN).unwrap_or_default();
        let source_key = row
            .remove(SOURCE_KEY_COLUMN)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let submitted_at = match row.remove(SUBMITTED_AT_COLUMN) {
            Some(raw) if !raw.trim().is_empty() => DateTime::parse_from_rfc3339(raw.trim())
                .with_context(|| format!("invalid submitted_at '{raw}' at line {line}"))?
                .with_timezone(&Utc),
            _ => imported_at,
        };

        let form = SubmissionForm {
            faculty,
            ratings: row.into_iter().collect(),
            comment,
        };
        let record = intake::accept(registry, &form, submitted_at, false)
            .with_context(|| format!("invalid submission at line {line}"))?;

        rows.push(ImportedSubmission { source_key, record });
    }

    tracing::debug!(rows = rows.len(), "read feedback CSV");
    Ok(rows)
}
