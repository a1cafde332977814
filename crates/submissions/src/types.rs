use chrono::{DateTime, Utc};

/// A label attached to a submission, with its hex colour (no `#`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub color: String,
}

/// Repository and ref on one side of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    /// `owner/name`.
    pub repo_full_name: String,
    pub git_ref: String,
}

/// An open pull request against the plugin repository. Recomputed every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub number: u64,
    pub title: String,
    pub url: String,
    pub diff_url: String,
    pub labels: Vec<Label>,
    pub submitter: String,
    pub updated_at: DateTime<Utc>,
    pub base: Option<BranchRef>,
    pub head: Option<BranchRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCheck {
    pub url: String,
    pub exists: bool,
}

/// Consistency checks for one submission's bundled metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub name_set: bool,
    pub internal_name_set: bool,
    pub description_set: bool,
    pub assembly_version_set: bool,
    pub repo_url_set: bool,
    pub punchline_set: bool,
    /// Loose and archived metadata agree field for field.
    pub matches_zipped: bool,
    pub testing: bool,
    pub testing_has_tagged_title: bool,
    pub icon_set: bool,
    pub icon_exists: bool,
    pub images: Vec<ImageCheck>,
}
