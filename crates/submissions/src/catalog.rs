//! Every open submission paired with its validation outcome.

use std::sync::Arc;

use {
    futures::{StreamExt, stream},
    tracing::{info, warn},
};

use crate::{
    Result,
    source::SubmissionSource,
    types::{Submission, ValidationReport},
    validator::Validator,
};

/// One submission and either its report or the reason it has none.
#[derive(Debug)]
pub struct CatalogEntry {
    pub submission: Submission,
    pub validation: Result<ValidationReport>,
}

/// Lists submissions and validates each one.
pub struct Catalog {
    validator: Validator,
    concurrency: usize,
}

impl Catalog {
    pub fn new(validator: Validator, concurrency: usize) -> Self {
        Self {
            validator,
            concurrency: concurrency.max(1),
        }
    }

    pub fn source(&self) -> &Arc<dyn SubmissionSource> {
        self.validator.source()
    }

    /// Build the catalog in listing order.
    ///
    /// A listing failure is returned as an error; a validation failure is kept
    /// on its own entry.
    pub async fn build(&self) -> Result<Vec<CatalogEntry>> {
        let submissions = self.source().list_open().await?;

        let entries: Vec<CatalogEntry> = stream::iter(submissions)
            .map(|submission| async move {
                let validation = self.validator.validate(&submission).await;
                if let Err(e) = &validation {
                    warn!(number = submission.number, error = %e, "submission failed validation");
                }
                CatalogEntry {
                    submission,
                    validation,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let failed = entries.iter().filter(|e| e.validation.is_err()).count();
        info!(count = entries.len(), failed, "built submission catalog");
        Ok(entries)
    }
}
