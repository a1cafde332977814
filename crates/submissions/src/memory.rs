//! A fixed, in-memory submission source.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{Error, Result, source::SubmissionSource, types::Submission};

/// Serves a fixed listing and a table of files. Unknown URLs are 404s.
#[derive(Default)]
pub struct StaticSource {
    submissions: Mutex<Vec<Submission>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    existing: Mutex<HashSet<String>>,
    listing_fails: Mutex<bool>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_submissions(&self, submissions: Vec<Submission>) {
        *self.submissions.lock().unwrap_or_else(|e| e.into_inner()) = submissions;
    }

    pub fn put_file(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let mut files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.insert(url.into(), bytes.into());
    }

    /// Mark `url` as resolving for [`SubmissionSource::exists`].
    pub fn put_existing(&self, url: impl Into<String>) {
        let mut existing = self.existing.lock().unwrap_or_else(|e| e.into_inner());
        existing.insert(url.into());
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.listing_fails.lock().unwrap_or_else(|e| e.into_inner()) = fail;
    }
}

#[async_trait]
impl SubmissionSource for StaticSource {
    async fn list_open(&self) -> Result<Vec<Submission>> {
        if *self.listing_fails.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(Error::message("listing unavailable"));
        }
        Ok(self
            .submissions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.get(url).cloned().ok_or_else(|| Error::Http {
            url: url.to_string(),
            status: 404,
        })
    }

    async fn exists(&self, url: &str) -> bool {
        if self
            .existing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(url)
        {
            return true;
        }
        let files = self.files.lock().unwrap_or_else(|e| e.into_inner());
        files.contains_key(url)
    }
}
