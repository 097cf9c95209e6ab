//! Scheduled Jamaat and Member syncs.
//!
//! Each sync kind has its own interval and its own lock. A tick that finds
//! the previous run of the same kind still in progress is skipped, so two
//! runs of one kind never overlap. Jamaat and Member runs may overlap.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use tanzeem_protocol::SyncResult;
use tanzeem_sync::{JamaatReconciler, MemberReconciler, SyncError, SyncKind};

use crate::config::ScheduleConfig;

pub struct SyncRunner {
    jamaats: JamaatReconciler,
    members: MemberReconciler,
    jamaat_lock: Mutex<()>,
    member_lock: Mutex<()>,
    schedule: ScheduleConfig,
}

impl SyncRunner {
    pub fn new(jamaats: JamaatReconciler, members: MemberReconciler, schedule: ScheduleConfig) -> Self {
        Self {
            jamaats,
            members,
            jamaat_lock: Mutex::new(()),
            member_lock: Mutex::new(()),
            schedule,
        }
    }

    pub fn schedule(&self) -> &ScheduleConfig {
        &self.schedule
    }

    fn lock_for(&self, kind: SyncKind) -> &Mutex<()> {
        match kind {
            SyncKind::Jamaats => &self.jamaat_lock,
            SyncKind::Members => &self.member_lock,
        }
    }

    /// Run one sync of `kind` unless one is already in progress.
    ///
    /// Returns `Ok(None)` when the run was skipped.
    pub async fn run_once(
        &self,
        kind: SyncKind,
        cancel: &CancellationToken,
    ) -> Result<Option<SyncResult>, SyncError> {
        let Ok(_guard) = self.lock_for(kind).try_lock() else {
            tracing::warn!(kind = %kind, "Previous sync still running, skipping");
            return Ok(None);
        };

        let result = match kind {
            SyncKind::Jamaats => self.jamaats.sync(cancel).await?,
            SyncKind::Members => self.members.sync(cancel).await?,
        };
        Ok(Some(result))
    }

    /// Scheduler loop. Returns once `cancel` fires and in-flight runs end.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut jamaat_tick = self.ticker(SyncKind::Jamaats);
        let mut member_tick = self.ticker(SyncKind::Members);
        let mut tasks = JoinSet::new();

        tracing::info!(
            jamaat_interval_secs = self.schedule.jamaat_interval_secs,
            member_interval_secs = self.schedule.member_interval_secs,
            "Sync scheduler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = jamaat_tick.tick() => {
                    tasks.spawn(Self::scheduled(self.clone(), SyncKind::Jamaats, cancel.clone()));
                }
                _ = member_tick.tick() => {
                    tasks.spawn(Self::scheduled(self.clone(), SyncKind::Members, cancel.clone()));
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Sync task panicked");
                    }
                }
            }
        }

        tracing::info!(in_flight = tasks.len(), "Sync scheduler stopping");
        while tasks.join_next().await.is_some() {}
    }

    fn ticker(&self, kind: SyncKind) -> tokio::time::Interval {
        let period = self.schedule.interval(kind);
        let mut ticker = if self.schedule.run_on_start {
            tokio::time::interval(period)
        } else {
            tokio::time::interval_at(tokio::time::Instant::now() + period, period)
        };
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    async fn scheduled(runner: Arc<Self>, kind: SyncKind, cancel: CancellationToken) {
        match runner.run_once(kind, &cancel).await {
            Ok(Some(result)) if result.has_failures() => {
                tracing::warn!(kind = %kind, failed = result.failed_count, "Scheduled sync finished with failures");
                for error in &result.errors {
                    tracing::warn!(kind = %kind, error = %error, "Sync item error");
                }
            }
            Ok(Some(result)) => {
                tracing::info!(kind = %kind, processed = result.processed(), "Scheduled sync finished");
            }
            Ok(None) => {}
            Err(SyncError::Cancelled) => {
                tracing::info!(kind = %kind, "Scheduled sync cancelled");
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Scheduled sync failed, will retry next interval");
            }
        }
    }
}
