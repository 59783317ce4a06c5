use std::collections::BTreeMap;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::import::ImportedSubmission;
use crate::models::SubmissionRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let submissions = vec![
        (
            "seed-001",
            "Dr. Avery Lee",
            vec![("Knowledge", 5), ("Clarity", 4), ("Engagement", 5), ("Punctuality", 4)],
            "Explains difficult topics patiently",
            Utc.with_ymd_and_hms(2026, 2, 2, 10, 15, 0),
        ),
        (
            "seed-002",
            "Dr. Avery Lee",
            vec![("Knowledge", 4), ("Clarity", 3), ("Punctuality", 5)],
            "",
            Utc.with_ymd_and_hms(2026, 2, 3, 14, 40, 0),
        ),
        (
            "seed-003",
            "Prof. Jules Moreno",
            vec![("Knowledge", 3), ("Clarity", 2), ("Engagement", 2), ("Punctuality", 3)],
            "Slides move too quickly",
            Utc.with_ymd_and_hms(2026, 1, 30, 9, 5, 0),
        ),
        (
            "seed-004",
            "Prof. Kiara Patel",
            vec![("Engagement", 5)],
            "Great discussions in every session",
            Utc.with_ymd_and_hms(2026, 1, 28, 16, 20, 0),
        ),
    ];

    let mut inserted = 0usize;
    for (source_key, faculty_id, ratings, comment, submitted_at) in submissions {
        let record = SubmissionRecord {
            faculty_id: faculty_id.to_string(),
            ratings: ratings
                .into_iter()
                .map(|(name, score)| (name.to_string(), score))
                .collect(),
            comment: (!comment.is_empty()).then(|| comment.to_string()),
            submitted_at: submitted_at.single().context("invalid seed timestamp")?,
        };

        if insert_submission(pool, &record, Some(source_key)).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Append one submission. Returns `false` if `source_key` was already imported.
pub async fn insert_submission(
    pool: &PgPool,
    record: &SubmissionRecord,
    source_key: Option<&str>,
) -> anyhow::Result<bool> {
    let ratings = serde_json::to_string(&record.ratings)?;

    let result = sqlx::query(
        r#"
        INSERT INTO faculty_feedback.submissions
        (id, faculty_id, ratings, comment, submitted_at, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&record.faculty_id)
    .bind(ratings)
    .bind(record.comment.as_deref())
    .bind(record.submitted_at)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn fetch_faculties(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows = sqlx::query(
        "SELECT DISTINCT faculty_id FROM faculty_feedback.submissions ORDER BY faculty_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(|row| row.get("faculty_id")).collect())
}

// Rows sharing a timestamp fall back to insertion order via `seq`.
fn submissions_query(filter_by_faculty: bool) -> String {
    let mut query = String::from(
        "SELECT faculty_id, ratings, comment, submitted_at \
         FROM faculty_feedback.submissions",
    );

    if filter_by_faculty {
        query.push_str(" WHERE faculty_id = $1");
    }
    query.push_str(" ORDER BY submitted_at, seq");
    query
}

/// Load submissions in submission order, optionally for a single faculty member.
pub async fn fetch_submissions(
    pool: &PgPool,
    faculty_id: Option<&str>,
) -> anyhow::Result<Vec<SubmissionRecord>> {
    let query = submissions_query(faculty_id.is_some());
    let mut rows = sqlx::query(&query);
    if let Some(value) = faculty_id {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut submissions = Vec::with_capacity(records.len());

    for row in records {
        let faculty_id: String = row.get("faculty_id");
        let raw_ratings: String = row.get("ratings");
        let ratings: BTreeMap<String, i32> = serde_json::from_str(&raw_ratings)
            .with_context(|| format!("stored ratings for '{faculty_id}' are not valid JSON"))?;
        let submitted_at: DateTime<Utc> = row.get("submitted_at");

        submissions.push(SubmissionRecord {
            faculty_id,
            ratings,
            comment: row.get("comment"),
            submitted_at,
        });
    }

    Ok(submissions)
}

pub async fn import_csv(pool: &PgPool, rows: &[ImportedSubmission]) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for row in rows {
        let source_key = row
            .source_key
            .clone()
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO faculty_feedback.submissions
            (id, faculty_id, ratings, comment, submitted_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.record.faculty_id)
        .bind(serde_json::to_string(&row.record.ratings)?)
        .bind(row.record.comment.as_deref())
        .bind(row.record.submitted_at)
        .bind(source_key)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submissions_are_ordered_by_time_then_insertion_sequence() {
        for filtered in [false, true] {
            let query = submissions_query(filtered);
            assert!(query.ends_with(" ORDER BY submitted_at, seq"), "{query}");
            assert!(!query.contains("ORDER BY submitted_at, id"));
        }
    }

    #[test]
    fn faculty_filter_binds_first_parameter() {
        assert!(submissions_query(true).contains(" WHERE faculty_id = $1 ORDER BY"));
        assert!(!submissions_query(false).contains("WHERE"));
    }
}
