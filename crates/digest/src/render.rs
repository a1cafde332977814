//! HTML rendering of catalog entries.

use {
    askama::Template,
    chrono::{DateTime, Utc},
    operator_submissions::{CatalogEntry, ValidationReport, extract_tags},
};

use crate::Result;

const FALLBACK_LABEL_COLOR: &str = "ededed";

struct LabelView {
    name: String,
    color: String,
}

struct SubmissionView {
    title: String,
    url: String,
    submitter: String,
    updated: String,
    /// Bracketed title prefixes such as `[Testing]`.
    tags: Vec<String>,
    labels: Vec<LabelView>,
    problems: Vec<String>,
}

impl SubmissionView {
    fn from_entry(entry: &CatalogEntry) -> Self {
        let s = &entry.submission;
        Self {
            title: s.title.clone(),
            url: s.url.clone(),
            submitter: s.submitter.clone(),
            updated: format_time(s.updated_at),
            tags: extract_tags(&s.title),
            labels: s
                .labels
                .iter()
                .map(|l| LabelView {
                    name: l.name.clone(),
                    color: label_color(&l.color),
                })
                .collect(),
            problems: problems(&entry.validation),
        }
    }
}

#[derive(Template)]
#[template(path = "digest.html", escape = "html")]
struct DigestTemplate<'a> {
    submissions: &'a [SubmissionView],
}

#[derive(Template)]
#[template(path = "report.html", escape = "html")]
struct ReportTemplate<'a> {
    generated: &'a str,
    total: usize,
    with_problems: usize,
    submissions: &'a [SubmissionView],
}

/// `02 Jan 06 15:04 UTC`.
fn format_time(t: DateTime<Utc>) -> String {
    t.format("%d %b %y %H:%M UTC").to_string()
}

/// Label colours go into a style attribute, so only bare hex is let through.
fn label_color(color: &str) -> String {
    let color = color.trim_start_matches('#');
    if (color.len() == 3 || color.len() == 6) && color.chars().all(|c| c.is_ascii_hexdigit()) {
        color.to_ascii_lowercase()
    } else {
        FALLBACK_LABEL_COLOR.to_string()
    }
}

/// Human-readable findings for one entry; empty when nothing is wrong.
pub fn problems(validation: &operator_submissions::Result<ValidationReport>) -> Vec<String> {
    let report = match validation {
        Ok(report) => report,
        Err(e) => return vec![format!("Could not validate: {e}")],
    };

    let mut out = Vec::new();
    let required = [
        (report.name_set, "Name"),
        (report.internal_name_set, "InternalName"),
        (report.description_set, "Description"),
        (report.assembly_version_set, "AssemblyVersion"),
        (report.repo_url_set, "RepoUrl"),
        (report.punchline_set, "Punchline"),
    ];
    for (set, field) in required {
        if !set {
            out.push(format!("{field} is not set"));
        }
    }
    if !report.matches_zipped {
        out.push("Manifest does not match the one inside the package archive".into());
    }
    if report.testing && !report.testing_has_tagged_title {
        out.push("Testing submission title does not start with [Testing]".into());
    }
    if !report.icon_set {
        out.push("IconUrl is not set".into());
    } else if !report.icon_exists {
        out.push("IconUrl does not resolve".into());
    }
    for image in report.images.iter().filter(|i| !i.exists) {
        out.push(format!("Image does not resolve: {}", image.url));
    }
    out
}

/// The body of a digest email for the selected entries.
pub fn render_digest(entries: &[&CatalogEntry]) -> Result<String> {
    let submissions: Vec<SubmissionView> = entries
        .iter()
        .map(|e| SubmissionView::from_entry(e))
        .collect();
    Ok(DigestTemplate {
        submissions: &submissions,
    }
    .render()?)
}

/// A full report over the whole catalog.
pub fn render_report(entries: &[CatalogEntry], generated_at: DateTime<Utc>) -> Result<String> {
    let submissions: Vec<SubmissionView> = entries.iter().map(SubmissionView::from_entry).collect();
    let with_problems = submissions.iter().filter(|s| !s.problems.is_empty()).count();
    let generated = format_time(generated_at);
    Ok(ReportTemplate {
        generated: &generated,
        total: submissions.len(),
        with_problems,
        submissions: &submissions,
    }
    .render()?)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::TimeZone,
        operator_submissions::{Error as SubmissionError, ImageCheck, Label, Submission},
        rstest::rstest,
    };

    fn clean_report() -> ValidationReport {
        ValidationReport {
            name_set: true,
            internal_name_set: true,
            description_set: true,
            assembly_version_set: true,
            repo_url_set: true,
            punchline_set: true,
            matches_zipped: true,
            testing: false,
            testing_has_tagged_title: false,
            icon_set: true,
            icon_exists: true,
            images: Vec::new(),
        }
    }

    fn entry(title: &str, validation: operator_submissions::Result<ValidationReport>) -> CatalogEntry {
        CatalogEntry {
            submission: Submission {
                number: 1,
                title: title.into(),
                url: "https://github.example/pull/1".into(),
                diff_url: String::new(),
                labels: vec![Label {
                    name: "new plugin".into(),
                    color: "0E8A16".into(),
                }],
                submitter: "someone".into(),
                updated_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 5, 0).unwrap(),
                base: None,
                head: None,
            },
            validation,
        }
    }

    #[test]
    fn clean_report_has_no_problems() {
        assert!(problems(&Ok(clean_report())).is_empty());
    }

    #[test]
    fn lists_each_problem() {
        let mut report = clean_report();
        report.name_set = false;
        report.matches_zipped = false;
        report.testing = true;
        report.icon_exists = false;
        report.images = vec![
            ImageCheck {
                url: "https://img.example/1.png".into(),
                exists: true,
            },
            ImageCheck {
                url: "https://img.example/2.png".into(),
                exists: false,
            },
        ];
        assert_eq!(problems(&Ok(report)), [
            "Name is not set",
            "Manifest does not match the one inside the package archive",
            "Testing submission title does not start with [Testing]",
            "IconUrl does not resolve",
            "Image does not resolve: https://img.example/2.png",
        ]);
    }

    #[test]
    fn validation_error_is_its_own_problem() {
        let found = problems(&Err(SubmissionError::MissingEntry));
        assert_eq!(found, ["Could not validate: package archive has no metadata entry"]);
    }

    #[rstest]
    #[case("0e8a16", "0e8a16")]
    #[case("#FFF", "fff")]
    #[case("red; background: url(x)", FALLBACK_LABEL_COLOR)]
    #[case("", FALLBACK_LABEL_COLOR)]
    fn sanitizes_label_colors(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(label_color(input), expected);
    }

    #[test]
    fn digest_contains_entry_details() {
        let e = entry("[Testing] Foo <v2>", Ok(clean_report()));
        let html = render_digest(&[&e]).unwrap();
        assert!(html.contains("github.example"));
        assert!(html.contains("[Testing] Foo &#60;v2&#62;"));
        assert!(!html.contains("<v2>"));
        assert!(html.contains("background-color: #0e8a16"));
        assert!(html.contains("new plugin"));
        assert!(html.contains("by someone, updated 01 Mar 26 09:05 UTC"));
        assert!(html.contains("No problems found."));
        assert!(html.contains("Tags: Testing"));
    }

    #[test]
    fn report_counts_problem_entries() {
        let entries = vec![
            entry("Foo", Ok(clean_report())),
            entry("Bar", Err(SubmissionError::MissingEntry)),
        ];
        let generated = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let html = render_report(&entries, generated).unwrap();
        assert!(html.contains("2 open, 1 with problems. Generated 02 Mar 26 00:00 UTC."));
        assert!(html.contains("Could not validate"));
    }
}
