//! Verdict cache
//!
//! Read-through keyed by the IP string. A store error on read counts as a
//! miss and a store error on write is logged, so a broken cache slows
//! detection down but never breaks it.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};

use ipveil_core::VerdictResult;

use crate::StoreError;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<VerdictResult>, StoreError>;
    async fn set(
        &self,
        key: &str,
        verdict: &VerdictResult,
        ttl: Duration,
    ) -> Result<(), StoreError>;
}

/// In-memory TTL cache
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, (VerdictResult, Instant)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<VerdictResult>, StoreError> {
        if let Some(entry) = self.entries.get(key) {
            let (verdict, expires_at) = entry.value();
            if Instant::now() < *expires_at {
                return Ok(Some(verdict.clone()));
            }
        }
        // Expired entries are dropped on the read path
        self.entries
            .remove_if(key, |_, (_, expires_at)| Instant::now() >= *expires_at);
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        verdict: &VerdictResult,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.entries
            .insert(key.to_string(), (verdict.clone(), Instant::now() + ttl));
        Ok(())
    }
}
