//! Bulk analysis jobs
//!
//! A submitted batch becomes a job that moves pending -> processing ->
//! completed (or failed on rejection). Processing runs on a spawned task;
//! callers poll the store by job id, and a progress sink sees every per-IP
//! step.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use ipveil_core::VerdictResult;

use crate::Detector;

/// Largest accepted batch
pub const MAX_BULK_IPS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkJob {
    pub id: Uuid,
    pub state: JobState,
    pub total: usize,
    pub processed: usize,
    pub results: Vec<VerdictResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BulkJob {
    fn new(id: Uuid, total: usize) -> Self {
        let now = Utc::now();
        Self {
            id,
            state: JobState::Pending,
            total,
            processed: 0,
            results: Vec::with_capacity(total),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Observer for per-IP progress. The no-op implementation serves callers
/// that only poll.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, job_id: Uuid, processed: usize, total: usize);
}

/// Sink that drops every update
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _job_id: Uuid, _processed: usize, _total: usize) {}
}

/// Batch rejected before a task was spawned
#[derive(Debug, thiserror::Error)]
pub enum BulkError {
    #[error("batch is empty")]
    Empty,

    #[error("batch of {0} exceeds the {MAX_BULK_IPS}-address limit")]
    TooLarge(usize),
}

/// All known jobs, keyed by id
#[derive(Default)]
pub struct JobStore {
    jobs: DashMap<Uuid, BulkJob>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<BulkJob> {
        self.jobs.get(&id).map(|j| j.clone())
    }

    fn update<F: FnOnce(&mut BulkJob)>(&self, id: Uuid, apply: F) {
        if let Some(mut job) = self.jobs.get_mut(&id) {
            apply(&mut job);
            job.updated_at = Utc::now();
        } else {
            warn!(%id, "bulk job disappeared from store");
        }
    }
}

/// Validate a batch and spawn its processing task. Returns the job id the
/// caller polls with.
pub fn submit_bulk(
    store: Arc<JobStore>,
    detector: Arc<dyn Detector>,
    sink: Arc<dyn ProgressSink>,
    ips: Vec<IpAddr>,
) -> Result<Uuid, BulkError> {
    if ips.is_empty() {
        return Err(BulkError::Empty);
    }
    if ips.len() > MAX_BULK_IPS {
        return Err(BulkError::TooLarge(ips.len()));
    }

    let id = Uuid::new_v4();
    store.jobs.insert(id, BulkJob::new(id, ips.len()));
    info!(%id, total = ips.len(), "bulk job accepted");

    tokio::spawn(run_job(store, detector, sink, id, ips));
    Ok(id)
}

async fn run_job(
    store: Arc<JobStore>,
    detector: Arc<dyn Detector>,
    sink: Arc<dyn ProgressSink>,
    id: Uuid,
    ips: Vec<IpAddr>,
) {
    let total = ips.len();
    store.update(id, |job| job.state = JobState::Processing);

    // The batch runs on its own task so a panicking detector fails the job
    // instead of leaving it stuck in processing
    let worker = tokio::spawn(process_batch(store.clone(), detector, sink, id, ips));
    match worker.await {
        Ok(()) => {
            store.update(id, |job| job.state = JobState::Completed);
            info!(%id, total, "bulk job completed");
        }
        Err(e) => {
            warn!(%id, error = %e, "bulk job worker aborted");
            store.update(id, |job| {
                job.state = JobState::Failed;
                job.error = Some(e.to_string());
            });
        }
    }
}

async fn process_batch(
    store: Arc<JobStore>,
    detector: Arc<dyn Detector>,
    sink: Arc<dyn ProgressSink>,
    id: Uuid,
    ips: Vec<IpAddr>,
) {
    let total = ips.len();
    for (index, ip) in ips.into_iter().enumerate() {
        let verdict = detector.detect(ip).await;
        let processed = index + 1;
        store.update(id, |job| {
            job.processed = processed;
            job.results.push(verdict);
        });
        sink.on_progress(id, processed, total);
    }
}
