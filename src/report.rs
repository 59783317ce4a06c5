use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::criteria::{CriterionRegistry, MAX_SCORE};
use crate::models::FacultySummary;

pub struct ReportOptions {
    pub low_rating_threshold: f64,
    pub generated_at: DateTime<Utc>,
}

/// Star string rounded to the nearest whole star, ties to even, e.g. `★★★★☆`.
pub fn stars(average: f64) -> String {
    let max = MAX_SCORE as usize;
    let filled = (average.round_ties_even().max(0.0) as usize).min(max);
    format!("{}{}", "★".repeat(filled), "☆".repeat(max - filled))
}

pub fn format_average(average: Option<f64>) -> String {
    match average {
        Some(value) => format!("{value:.2}"),
        None => "N/A".to_string(),
    }
}

/// Collapse a free-text comment onto one line so it cannot break list markup.
pub fn single_line(comment: &str) -> String {
    comment
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// File name for a per-faculty report, safe on any filesystem.
pub fn report_file_name(faculty_id: &str) -> String {
    let mut safe = String::new();
    for ch in faculty_id.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            safe.push(ch);
        } else if !safe.ends_with('_') {
            safe.push('_');
        }
    }
    let safe = safe.trim_matches('_');
    let safe = if safe.is_empty() { "faculty" } else { safe };
    format!("feedback_{safe}.md")
}

pub fn build_report(
    registry: &CriterionRegistry,
    summary: &FacultySummary,
    options: &ReportOptions,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Faculty Feedback Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        summary.faculty_id,
        options.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    write_summary_body(&mut output, registry, summary, options);

    output
}

/// One document covering several faculty members, in the order given.
pub fn build_combined_report(
    registry: &CriterionRegistry,
    summaries: &[&FacultySummary],
    options: &ReportOptions,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Faculty Feedback Report");
    let _ = writeln!(
        output,
        "Generated for {} faculty members on {}",
        summaries.len(),
        options.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    if summaries.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "No feedback recorded yet.");
        return output;
    }

    for summary in summaries {
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", summary.faculty_id);
        let _ = writeln!(output);
        write_summary_body(&mut output, registry, summary, options);
    }

    output
}

fn write_summary_body(
    output: &mut String,
    registry: &CriterionRegistry,
    summary: &FacultySummary,
    options: &ReportOptions,
) {
    if summary.is_empty() {
        let _ = writeln!(output, "No feedback available for {}.", summary.faculty_id);
        return;
    }

    let _ = writeln!(output, "- Total responses: {}", summary.submission_count);
    match summary.overall_average {
        Some(overall) => {
            let _ = writeln!(
                output,
                "- Overall rating: {:.2} / {:.2} {}",
                overall,
                MAX_SCORE as f64,
                stars(overall)
            );
        }
        None => {
            let _ = writeln!(output, "- Overall rating: N/A");
        }
    }

    if let Some(overall) = summary.overall_average {
        if overall < options.low_rating_threshold {
            let _ = writeln!(output);
            let _ = writeln!(
                output,
                "_Note: overall rating is below {:.1}. Consider reviewing the feedback details and planning improvements._",
                options.low_rating_threshold
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Criteria");
    let _ = writeln!(output, "| Criterion | Average (1-{MAX_SCORE}) | Responses |");
    let _ = writeln!(output, "|---|---|---|");
    for criterion in registry.names() {
        let average = summary.per_criterion_average.get(criterion).copied();
        let count = summary
            .per_criterion_count
            .get(criterion)
            .copied()
            .unwrap_or(0);
        let _ = writeln!(
            output,
            "| {} | {} | {} |",
            criterion,
            format_average(average),
            count
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Comments");
    if summary.comments.is_empty() {
        let _ = writeln!(output, "No comments submitted.");
    } else {
        for comment in &summary.comments {
            let _ = writeln!(output, "- {}", single_line(comment));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn options() -> ReportOptions {
        ReportOptions {
            low_rating_threshold: 3.0,
            generated_at: Utc.with_ymd_and_hms(2026, 5, 4, 12, 30, 0).unwrap(),
        }
    }

    fn summary(overall: Option<f64>) -> FacultySummary {
        FacultySummary {
            faculty_id: "Dr. Rao".to_string(),
            per_criterion_average: BTreeMap::from([("Knowledge".to_string(), 4.5)]),
            per_criterion_count: BTreeMap::from([("Knowledge".to_string(), 2)]),
            overall_average: overall,
            comments: vec!["Great teacher".to_string()],
            submission_count: 2,
        }
    }

    #[test]
    fn stars_round_to_nearest_whole_star() {
        assert_eq!(stars(4.4), "★★★★☆");
        assert_eq!(stars(4.6), "★★★★★");
        assert_eq!(stars(1.0), "★☆☆☆☆");
    }

    #[test]
    fn half_star_ties_round_to_even() {
        assert_eq!(stars(4.5), "★★★★☆");
        assert_eq!(stars(2.5), "★★☆☆☆");
        assert_eq!(stars(3.5), "★★★★☆");
    }

    #[test]
    fn missing_average_renders_na() {
        assert_eq!(format_average(None), "N/A");
        assert_eq!(format_average(Some(3.456)), "3.46");
    }

    #[test]
    fn report_lists_every_registry_criterion() {
        let registry = CriterionRegistry::default();
        let report = build_report(&registry, &summary(Some(4.5)), &options());

        assert!(report.contains("Generated for Dr. Rao on 2026-05-04 12:30 UTC"));
        assert!(report.contains("- Total responses: 2"));
        assert!(report.contains("- Overall rating: 4.50 / 5.00 ★★★★☆"));
        assert!(report.contains("| Knowledge | 4.50 | 2 |"));
        assert!(report.contains("| Clarity | N/A | 0 |"));
        assert!(report.contains("- Great teacher"));
        assert!(!report.contains("_Note:"));
    }

    #[test]
    fn low_overall_rating_adds_note() {
        let registry = CriterionRegistry::default();
        let report = build_report(&registry, &summary(Some(2.75)), &options());
        assert!(report.contains("_Note: overall rating is below 3.0."));
    }

    #[test]
    fn empty_summary_renders_no_feedback() {
        let registry = CriterionRegistry::default();
        let report = build_report(&registry, &FacultySummary::empty("Dr. Iyer"), &options());
        assert!(report.contains("No feedback available for Dr. Iyer."));
        assert!(!report.contains("### Criteria"));
    }

    #[test]
    fn combined_report_has_a_section_per_faculty() {
        let registry = CriterionRegistry::default();
        let first = summary(Some(4.5));
        let second = FacultySummary::empty("Dr. Iyer");
        let report = build_combined_report(&registry, &[&first, &second], &options());

        assert!(report.contains("Generated for 2 faculty members"));
        assert!(report.contains("## Dr. Rao"));
        assert!(report.contains("## Dr. Iyer"));
        assert!(report.contains("No feedback available for Dr. Iyer."));
    }

    #[test]
    fn multi_line_comments_cannot_inject_markup() {
        let registry = CriterionRegistry::default();
        let mut summary = summary(Some(4.5));
        summary.comments = vec!["ok\n## Fake\r\n\nstill one item".to_string()];

        let report = build_report(&registry, &summary, &options());
        assert!(report.contains("- ok ## Fake still one item\n"));
        assert!(!report.lines().any(|line| line.starts_with("## Fake")));
    }

    #[test]
    fn report_file_names_are_sanitized() {
        assert_eq!(report_file_name("Dr. A. Rao"), "feedback_Dr_A_Rao.md");
        assert_eq!(report_file_name("///"), "feedback_faculty.md");
    }
}
