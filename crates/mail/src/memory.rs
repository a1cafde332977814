//! In-memory mail doubles for job tests and dry runs.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    Error, Result,
    transport::{MailFetcher, MailSender},
    types::{InboundMessage, OutgoingMail},
};

/// Records every delivered message. Recipients can be marked as failing.
#[derive(Default)]
pub struct MemoryOutbox {
    sent: Mutex<Vec<OutgoingMail>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `to` fail until cleared.
    pub fn fail_for(&self, to: impl Into<String>) {
        let mut failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        failing.insert(to.into());
    }

    pub fn clear_failures(&self) {
        let mut failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        failing.clear();
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        let sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<OutgoingMail> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }
}

#[async_trait]
impl MailSender for MemoryOutbox {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        {
            let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
            if failing.contains(&mail.to) {
                return Err(Error::message(format!("delivery to {} refused", mail.to)));
            }
        }
        let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
        sent.push(mail.clone());
        Ok(())
    }
}

/// Folders of unread messages. Fetching a folder drains it.
#[derive(Default)]
pub struct MemoryMailbox {
    folders: Mutex<HashMap<String, Vec<InboundMessage>>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliver(&self, folder: &str, message: InboundMessage) {
        let mut folders = self.folders.lock().unwrap_or_else(|e| e.into_inner());
        folders.entry(folder.to_string()).or_default().push(message);
    }

    /// Make fetches of `folder` fail.
    pub fn fail_folder(&self, folder: &str) {
        let mut failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        failing.insert(folder.to_string());
    }

    pub fn unread(&self, folder: &str) -> usize {
        let folders = self.folders.lock().unwrap_or_else(|e| e.into_inner());
        folders.get(folder).map_or(0, Vec::len)
    }
}

#[async_trait]
impl MailFetcher for MemoryMailbox {
    async fn fetch_unread(&self, folder: &str) -> Result<Vec<InboundMessage>> {
        {
            let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
            if failing.contains(folder) {
                return Err(Error::message(format!("folder {folder} unavailable")));
            }
        }
        let mut folders = self.folders.lock().unwrap_or_else(|e| e.into_inner());
        Ok(folders.remove(folder).unwrap_or_default())
    }
}
