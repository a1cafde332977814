//! Open plugin submissions: listing, diff harvesting, metadata loading and
//! per-submission consistency checks.

pub mod catalog;
pub mod diff;
pub mod error;
pub mod harvest;
pub mod memory;
pub mod metadata;
pub mod source;
pub mod tags;
pub mod types;
pub mod validator;

pub use {
    catalog::{Catalog, CatalogEntry},
    error::{Error, Result},
    memory::StaticSource,
    metadata::MetadataDocument,
    source::{GitHubSource, SubmissionSource},
    tags::extract_tags,
    types::{BranchRef, ImageCheck, Label, Submission, ValidationReport},
    validator::Validator,
};
