//! Detection history
//!
//! Every completed detection is recorded. A failed write is logged by the
//! engine and never surfaced to the caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use ipveil_core::{Verdict, VerdictResult};

use crate::StoreError;

/// Query filters for the history listing. Pages are 1-based.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryFilter {
    pub verdict: Option<Verdict>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            verdict: None,
            since: None,
            until: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

/// One page of matching detections, newest first
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub items: Vec<VerdictResult>,
    /// Matches across all pages
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record(&self, verdict: &VerdictResult) -> Result<(), StoreError>;
    async fn query(&self, filter: &HistoryFilter) -> Result<HistoryPage, StoreError>;
}

/// In-memory history, append order preserved
#[derive(Default)]
pub struct MemoryHistory {
    entries: RwLock<Vec<VerdictResult>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn record(&self, verdict: &VerdictResult) -> Result<(), StoreError> {
        self.entries.write().push(verdict.clone());
        Ok(())
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<HistoryPage, StoreError> {
        let entries = self.entries.read();
        let matching: Vec<&VerdictResult> = entries
            .iter()
            .rev()
            .filter(|v| filter.verdict.map_or(true, |f| v.verdict == f))
            .filter(|v| filter.since.map_or(true, |s| v.timestamp >= s))
            .filter(|v| filter.until.map_or(true, |u| v.timestamp <= u))
            .collect();

        let total = matching.len();
        let page = filter.page.max(1);
        let per_page = filter.per_page.max(1);
        let items = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        Ok(HistoryPage {
            items,
            total,
            page,
            per_page,
        })
    }
}
