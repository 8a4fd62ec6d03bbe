use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cap_inventory::{fetch_snapshot, FleetRegistrySource, InventoryApi, SnapshotFetchError};
use cap_notify::Notifier;
use cap_reconcile::{
    reconcile_record, ItemOutcome, ItemStatus, MissReason, ReconcileContext, ReconcileOptions,
    RecordOutcome,
};
use cap_schemas::{decode, FleetRegistry};
use cap_store::{Advance, CheckpointError, OffsetCheckpoint, ReportSink};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::source::{RecordSource, StreamRecord};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Conditions that must stop the process. The supervisor restarts it and the
/// loop resumes from the last durable offset.
#[derive(Debug)]
pub enum FatalError {
    SnapshotFetch(SnapshotFetchError),
    Checkpoint(CheckpointError),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::SnapshotFetch(e) => write!(f, "fatal: {e}"),
            FatalError::Checkpoint(e) => write!(f, "fatal: checkpoint failure: {e}"),
        }
    }
}

impl std::error::Error for FatalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FatalError::SnapshotFetch(e) => Some(e),
            FatalError::Checkpoint(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings, state, stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    pub batch_size: usize,
    /// Overall deadline for accumulating one batch.
    pub read_timeout: Duration,
    pub options: ReconcileOptions,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            batch_size: 300,
            read_timeout: Duration::from_secs(10),
            options: ReconcileOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    ReadingBatch,
    ProcessingBatch,
}

/// Per-batch counters, logged once when the batch completes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub records: usize,
    pub decoded: usize,
    pub skipped: usize,
    pub items: usize,
    pub patches_applied: usize,
    pub patch_failures: usize,
    pub notifications_sent: usize,
    pub notification_failures: usize,
    pub rows_written: usize,
    pub report_failures: usize,
    pub misses: usize,
    pub pod_parse_failures: usize,
    pub first_offset: Option<i64>,
    pub last_offset: Option<i64>,
    /// The source reported it will never yield again.
    pub source_closed: bool,
}

/// Every collaborator the loop talks to.
pub struct Collaborators {
    pub source: Box<dyn RecordSource>,
    pub inventory: Arc<dyn InventoryApi>,
    /// `None` runs every batch against an empty registry.
    pub fleet: Option<Arc<dyn FleetRegistrySource>>,
    pub notifier: Arc<dyn Notifier>,
    pub reports: Box<dyn ReportSink>,
    pub checkpoint: Box<dyn OffsetCheckpoint>,
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Sequential batch loop: read, snapshot once, reconcile each record, advance
/// the offset after each record.
pub struct IngestionLoop {
    settings: LoopSettings,
    parts: Collaborators,
    state: LoopState,
}

impl IngestionLoop {
    pub fn new(settings: LoopSettings, parts: Collaborators) -> Self {
        Self {
            settings,
            parts,
            state: LoopState::Idle,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run batches until a fatal error, or until the source closes.
    pub async fn run_forever(&mut self) -> Result<(), FatalError> {
        loop {
            let stats = self.run_once().await?;
            if stats.source_closed && stats.records == 0 {
                info!("record source closed; stopping");
                return Ok(());
            }
        }
    }

    /// One full Idle -> ReadingBatch -> ProcessingBatch -> Idle cycle.
    pub async fn run_once(&mut self) -> Result<BatchStats, FatalError> {
        let span = info_span!(
            "batch",
            batch_id = %Uuid::new_v4(),
            size = tracing::field::Empty
        );
        let result = self.cycle(&span).instrument(span.clone()).await;
        self.state = LoopState::Idle;
        result
    }

    async fn cycle(&mut self, span: &tracing::Span) -> Result<BatchStats, FatalError> {
        let mut stats = BatchStats::default();

        self.state = LoopState::ReadingBatch;
        let (batch, closed) = self.read_batch().await?;
        stats.source_closed = closed;
        span.record("size", batch.len());

        if batch.is_empty() {
            debug!("empty batch");
            return Ok(stats);
        }

        self.state = LoopState::ProcessingBatch;
        let snapshot = fetch_snapshot(self.parts.inventory.as_ref())
            .await
            .map_err(FatalError::SnapshotFetch)?;
        let fleet = fetch_fleet(self.parts.fleet.as_deref()).await;
        let options = self.settings.options.clone();
        let ctx = ReconcileContext {
            snapshot: &snapshot,
            fleet: &fleet,
            options: &options,
        };

        for record in &batch {
            let record_span = info_span!("record", offset = record.offset);
            self.process_record(record, &ctx, &mut stats)
                .instrument(record_span)
                .await?;
        }

        info!(
            records = stats.records,
            decoded = stats.decoded,
            skipped = stats.skipped,
            items = stats.items,
            patches_applied = stats.patches_applied,
            patch_failures = stats.patch_failures,
            notifications_sent = stats.notifications_sent,
            notification_failures = stats.notification_failures,
            rows_written = stats.rows_written,
            report_failures = stats.report_failures,
            misses = stats.misses,
            pod_parse_failures = stats.pod_parse_failures,
            first_offset = ?stats.first_offset,
            last_offset = ?stats.last_offset,
            "batch complete"
        );
        Ok(stats)
    }

    async fn read_batch(&mut self) -> Result<(Vec<StreamRecord>, bool), FatalError> {
        let state = self
            .parts
            .checkpoint
            .read_offset()
            .map_err(FatalError::Checkpoint)?;
        let persisted = state.offset;
        let position = state.resume_position();
        let deadline = Instant::now() + self.settings.read_timeout;

        if let Err(e) = self.parts.source.seek(position).await {
            // Nothing to read yet; pace retries at the batch deadline.
            debug!(persisted, position, error = %e, "stream not readable at resume position");
            tokio::time::sleep_until(deadline).await;
            return Ok((Vec::new(), false));
        }

        let mut batch = Vec::new();
        let mut closed = false;
        while batch.len() < self.settings.batch_size {
            match tokio::time::timeout_at(deadline, self.parts.source.next_record()).await {
                Err(_elapsed) => break,
                Ok(Ok(Some(record))) => batch.push(record),
                Ok(Ok(None)) => {
                    closed = true;
                    break;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, read = batch.len(), "stream read failed; batch truncated");
                    break;
                }
            }
        }
        debug!(persisted, position, read = batch.len(), "batch read");
        Ok((batch, closed))
    }

    async fn process_record(
        &mut self,
        raw: &StreamRecord,
        ctx: &ReconcileContext<'_>,
        stats: &mut BatchStats,
    ) -> Result<(), FatalError> {
        stats.records += 1;
        stats.first_offset.get_or_insert(raw.offset);
        stats.last_offset = Some(raw.offset);

        match decode(&raw.payload) {
            Ok(record) => {
                stats.decoded += 1;
                let outcome = reconcile_record(&record, ctx);
                self.apply(&outcome, stats).await;
            }
            Err(e) => {
                stats.skipped += 1;
                warn!(error = %e, "record skipped");
            }
        }

        self.advance(raw.offset)
    }

    async fn apply(&mut self, outcome: &RecordOutcome, stats: &mut BatchStats) {
        stats.items += outcome.items.len();
        stats.misses += outcome.misses();
        stats.pod_parse_failures += outcome.pod_parse_failures();

        for item in &outcome.items {
            log_item(outcome, item);
        }

        for patch in outcome.patches() {
            match self.parts.inventory.patch(patch).await {
                Ok(()) => {
                    stats.patches_applied += 1;
                    info!(
                        collection = patch.collection.as_str(),
                        target_id = %patch.target_id,
                        paths = ?patch.paths(),
                        "inventory patched"
                    );
                }
                Err(e) => {
                    stats.patch_failures += 1;
                    error!(
                        collection = patch.collection.as_str(),
                        target_id = %patch.target_id,
                        error = %e,
                        "inventory patch failed"
                    );
                }
            }
        }

        for n in outcome.notifications() {
            match self.parts.notifier.notify(n).await {
                Ok(()) => stats.notifications_sent += 1,
                Err(e) => {
                    stats.notification_failures += 1;
                    warn!(title = n.title(), subject = n.subject(), error = %e, "notification failed");
                }
            }
        }

        let rows = outcome.rows();
        if !rows.is_empty() {
            match self.parts.reports.append(outcome.kind, &rows) {
                Ok(n) => stats.rows_written += n,
                Err(e) => {
                    stats.report_failures += 1;
                    error!(kind = outcome.kind.as_str(), error = %format!("{e:#}"), "report append failed");
                }
            }
        }
    }

    fn advance(&mut self, offset: i64) -> Result<(), FatalError> {
        match self
            .parts
            .checkpoint
            .advance(offset)
            .map_err(FatalError::Checkpoint)?
        {
            Advance::Written => Ok(()),
            Advance::Stale { current } => {
                warn!(offset, current, "offset below persisted position; not written");
                Ok(())
            }
        }
    }
}

async fn fetch_fleet(source: Option<&dyn FleetRegistrySource>) -> FleetRegistry {
    let Some(source) = source else {
        return FleetRegistry::default();
    };
    match source.fetch_hosts().await {
        Ok(hosts) => FleetRegistry::new(hosts),
        Err(e) => {
            warn!(error = %e, "fleet registry fetch failed; using an empty registry");
            FleetRegistry::default()
        }
    }
}

fn log_item(outcome: &RecordOutcome, item: &ItemOutcome) {
    let kind = outcome.kind.as_str();
    let subject = item.subject.as_str();
    match &item.status {
        ItemStatus::Matched { inventory_id } if item.patch.is_some() => {
            debug!(kind, subject, inventory_id = %inventory_id, "drift detected");
        }
        ItemStatus::Matched { inventory_id } if outcome.kind.is_patchable() => {
            info!(kind, subject, inventory_id = %inventory_id, "already up to date");
        }
        ItemStatus::Matched { inventory_id } => {
            debug!(kind, subject, inventory_id = %inventory_id, "matched");
        }
        ItemStatus::Ineligible {
            inventory_id,
            profile,
        } => {
            debug!(kind, subject, inventory_id = %inventory_id, profile = %profile, "profile not reconciled");
        }
        ItemStatus::Miss(MissReason::PodUnparsable { raw }) => {
            error!(kind, subject, pod = %raw, "telemetry pod is not an integer; treated as no match");
        }
        ItemStatus::Miss(reason) => {
            info!(kind, subject, reason = reason.as_str(), "no inventory match");
        }
        ItemStatus::WrongStream { version } => {
            debug!(kind, subject, stream = outcome.stream.as_str(), version = %version, "element not reconciled on this stream");
        }
    }
}
