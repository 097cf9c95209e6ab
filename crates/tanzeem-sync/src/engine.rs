//! The reconciliation loop shared by Jamaat and Member sync.
//!
//! One run:
//! 1. Fetch the full external set (cancellable, bounded by a timeout)
//! 2. Upsert each record into a `ChangeSet`, isolating per-record failures
//! 3. Flush the `ChangeSet` once
//!
//! Cancellation is observed during the fetch and between records. Once the
//! flush has started it runs to completion, relying on the store's
//! all-or-nothing commit; a run cancelled before that point flushes nothing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tanzeem_protocol::{SyncResult, DEFAULT_FETCH_TIMEOUT_SECS};
use tanzeem_state::{ChangeSet, HierarchyStore};

use crate::{DirectoryError, ItemError, SyncError};

/// Configuration for reconciliation runs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Upper bound on a single directory fetch.
    pub fetch_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

/// Whether an upsert created a new local record or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// A collection that can be reconciled against external records.
pub trait SyncTarget {
    type Record;

    /// Label used in logs and error strings.
    const KIND: &'static str;

    /// The record's natural key as reported by the directory.
    fn record_key(record: &Self::Record) -> String;

    /// Stage the create or update for one record.
    ///
    /// Records already staged in this run take precedence over the store,
    /// so a key repeated within one fetch builds on its earlier version.
    fn upsert(
        store: &dyn HierarchyStore,
        record: Self::Record,
        changes: &mut ChangeSet,
    ) -> Result<Upsert, ItemError>;
}

/// Drives reconciliation runs against a store.
#[derive(Clone)]
pub struct SyncEngine {
    store: Arc<dyn HierarchyStore>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn HierarchyStore>, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Execute one run for target `T` using the given fetch.
    pub async fn run<T, F>(&self, fetch: F, cancel: &CancellationToken) -> Result<SyncResult, SyncError>
    where
        T: SyncTarget,
        F: Future<Output = Result<Vec<T::Record>, DirectoryError>>,
    {
        tracing::info!(kind = T::KIND, "Sync started");

        let timeout = self.config.fetch_timeout;
        let records = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::warn!(kind = T::KIND, "Sync cancelled during fetch");
                return Err(SyncError::Cancelled);
            }
            fetched = tokio::time::timeout(timeout, fetch) => match fetched {
                Ok(Ok(records)) => records,
                Ok(Err(e)) => {
                    tracing::error!(kind = T::KIND, error = %e, "Directory fetch failed");
                    return Err(SyncError::Transport(e));
                }
                Err(_) => {
                    tracing::error!(kind = T::KIND, timeout_secs = timeout.as_secs(), "Directory fetch timed out");
                    return Err(SyncError::Transport(DirectoryError::Timeout(timeout.as_secs())));
                }
            },
        };

        let mut result = SyncResult::new(records.len());
        tracing::info!(kind = T::KIND, fetched = result.total_fetched, "Fetched external records");

        let mut changes = ChangeSet::new();
        for record in records {
            if cancel.is_cancelled() {
                tracing::warn!(
                    kind = T::KIND,
                    processed = result.processed() + result.failed_count,
                    "Sync cancelled before flush, discarding staged records"
                );
                return Err(SyncError::Cancelled);
            }

            let key = T::record_key(&record);
            match T::upsert(self.store.as_ref(), record, &mut changes) {
                Ok(Upsert::Created) => result.new_count += 1,
                Ok(Upsert::Updated) => result.updated_count += 1,
                Err(e) => {
                    tracing::warn!(kind = T::KIND, key = %key, error = %e, "Record failed");
                    result.record_failure(format!("{} {}: {}", T::KIND, key, e));
                }
            }
        }

        if cancel.is_cancelled() {
            tracing::warn!(kind = T::KIND, "Sync cancelled before flush, discarding staged records");
            return Err(SyncError::Cancelled);
        }

        if let Err(e) = self.store.flush(changes).await {
            tracing::error!(kind = T::KIND, error = %e, "Flush failed, batch discarded");
            return Err(SyncError::Persistence(e));
        }

        tracing::info!(
            kind = T::KIND,
            fetched = result.total_fetched,
            new = result.new_count,
            updated = result.updated_count,
            failed = result.failed_count,
            "Sync completed"
        );

        Ok(result)
    }
}

/// Trim a field and drop it when nothing is left.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim a required field, rejecting blank values.
pub(crate) fn required(value: &str, field: &str) -> Result<String, ItemError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ItemError::Invalid(format!("{} is blank", field)));
    }
    Ok(trimmed.to_string())
}
