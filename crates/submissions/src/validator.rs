//! Per-submission consistency checks.

use std::sync::Arc;

use {operator_config::UpstreamConfig, tracing::debug, url::Url};

use crate::{
    Result,
    diff::ParsedDiff,
    harvest::harvest,
    metadata::{self, MetadataDocument},
    source::SubmissionSource,
    types::{ImageCheck, Submission, ValidationReport},
};

/// Searched for in every diff header, file paths included, so a submission
/// touching a `testing/` directory counts as a testing submission.
const TESTING_HEADER_MARKER: &str = "testing";
const TESTING_TITLE_PREFIX: &str = "[testing]";

/// Checks a submission's loose manifest against the copy in its package.
pub struct Validator {
    source: Arc<dyn SubmissionSource>,
    raw_base: Url,
}

impl Validator {
    pub fn new(source: Arc<dyn SubmissionSource>, raw_base: Url) -> Self {
        Self { source, raw_base }
    }

    pub fn from_config(source: Arc<dyn SubmissionSource>, config: &UpstreamConfig) -> Result<Self> {
        Ok(Self::new(source, Url::parse(&config.raw_content_url)?))
    }

    pub fn source(&self) -> &Arc<dyn SubmissionSource> {
        &self.source
    }

    /// Build the report for one submission. Any fetch or decode failure fails
    /// the whole report; image and icon probes never do.
    pub async fn validate(&self, submission: &Submission) -> Result<ValidationReport> {
        let harvest = harvest(self.source.as_ref(), &self.raw_base, submission).await?;

        let loose = metadata::decode(
            &self
                .source
                .fetch_bytes(harvest.metadata_url.as_str())
                .await?,
        )?;
        let archived = metadata::decode_archive(
            &self
                .source
                .fetch_bytes(harvest.package_url.as_str())
                .await?,
        )?;

        let mut report = derive_report(submission, &harvest.diff, &loose, &archived);

        for url in &loose.image_urls {
            report.images.push(ImageCheck {
                url: url.clone(),
                exists: self.source.exists(url).await,
            });
        }
        report.icon_exists = report.icon_set && self.source.exists(&loose.icon_url).await;

        debug!(
            number = submission.number,
            matches_zipped = report.matches_zipped,
            testing = report.testing,
            "validated submission"
        );
        Ok(report)
    }
}

/// Everything in the report that needs no further network access.
fn derive_report(
    submission: &Submission,
    diff: &ParsedDiff,
    loose: &MetadataDocument,
    archived: &MetadataDocument,
) -> ValidationReport {
    let testing = diff.headers_mention(TESTING_HEADER_MARKER);
    ValidationReport {
        name_set: !loose.name.is_empty(),
        internal_name_set: !loose.internal_name.is_empty(),
        description_set: !loose.description.is_empty(),
        assembly_version_set: !loose.assembly_version.is_empty(),
        repo_url_set: !loose.repo_url.is_empty(),
        punchline_set: !loose.punchline.is_empty(),
        matches_zipped: metadata::matches(loose, archived),
        testing,
        testing_has_tagged_title: testing
            && submission
                .title
                .to_lowercase()
                .starts_with(TESTING_TITLE_PREFIX),
        icon_set: !loose.icon_url.is_empty(),
        icon_exists: false,
        images: Vec::new(),
    }
}
