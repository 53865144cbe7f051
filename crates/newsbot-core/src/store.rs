//! Seen-article history port.
//!
//! The durable implementation lives in `newsbot-store` (SQLite). The in-memory
//! store here backs tests and dry runs.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    domain::{RecordOutcome, SeenRecord},
    errors::Error,
    Result,
};

#[async_trait]
pub trait SeenStore: Send + Sync {
    async fn is_seen(&self, link: &str) -> Result<bool>;

    /// Idempotent: recording a link that is already present is not an error.
    async fn record(&self, record: &SeenRecord) -> Result<RecordOutcome>;

    async fn count(&self) -> Result<u64>;
}

#[derive(Default)]
pub struct MemorySeenStore {
    records: Mutex<HashMap<String, SeenRecord>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = links
            .into_iter()
            .map(|l| {
                let link = l.into();
                let rec = SeenRecord {
                    link: link.clone(),
                    title: String::new(),
                    published_at: String::new(),
                };
                (link, rec)
            })
            .collect();
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn links(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .records
            .lock()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SeenRecord>>> {
        self.records
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn is_seen(&self, link: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(link))
    }

    async fn record(&self, record: &SeenRecord) -> Result<RecordOutcome> {
        let mut map = self.lock()?;
        if map.contains_key(&record.link) {
            return Ok(RecordOutcome::AlreadyPresent);
        }
        map.insert(record.link.clone(), record.clone());
        Ok(RecordOutcome::Inserted)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.lock()?.len() as u64)
    }
}
