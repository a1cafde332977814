//! Fetching a submission's diff and locating its manifest and package.

use {tracing::debug, url::Url};

use crate::{
    Error, Result,
    diff::{ParsedDiff, base_file_url, parse_diff, select_last},
    source::SubmissionSource,
    types::Submission,
};

/// A submission's parsed diff and the base-branch locations of its files.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub diff: ParsedDiff,
    pub metadata_url: Url,
    pub package_url: Url,
}

/// Fetch and parse the diff, pick the last `.json` and last `.zip`, and
/// resolve both against the base branch under `raw_base`.
pub async fn harvest(
    source: &dyn SubmissionSource,
    raw_base: &Url,
    submission: &Submission,
) -> Result<Harvest> {
    let bytes = source.fetch_bytes(&submission.diff_url).await?;
    let diff = parse_diff(&String::from_utf8_lossy(&bytes))?;

    let metadata = select_last(&diff.files, ".json").ok_or(Error::NotFound {
        what: "metadata file",
    })?;
    let package = select_last(&diff.files, ".zip").ok_or(Error::NotFound {
        what: "package archive",
    })?;
    let base = submission
        .base
        .as_ref()
        .ok_or(Error::MissingBranchInfo { side: "base" })?;

    let metadata_url = base_file_url(raw_base, base, metadata)?;
    let package_url = base_file_url(raw_base, base, package)?;
    debug!(
        number = submission.number,
        metadata = %metadata_url,
        package = %package_url,
        "harvested submission diff"
    );

    Ok(Harvest {
        diff,
        metadata_url,
        package_url,
    })
}
