use std::sync::Arc;

use tracing::{Instrument, Span, info, info_span, warn};

use crate::api::api_objects::{HistoricalRecords, TransferRecord, TransferRecordSnapshot};
use crate::config::TransferSettings;
use crate::error::ApiError;
use crate::logging;
use crate::run_gate::RunGate;
use crate::transfer_objects::TransferKind;
use crate::worker::TransferRunner;

// Gate and history for one kind of transfer.
#[derive(Debug)]
struct TransferLane {
    gate: Arc<RunGate>,
    records: HistoricalRecords,
}

impl TransferLane {
    fn new() -> Self {
        TransferLane {
            gate: RunGate::new(),
            records: HistoricalRecords::new(),
        }
    }
}

// ========== ENGINE ==========

/// Starts or joins transfers and answers status lookups.
///
/// Every request gets its own record. At most one porklock process per kind
/// runs at a time; a request arriving while one is in flight is recorded but
/// launches nothing.
#[derive(Debug)]
pub struct TransferEngine {
    runner: TransferRunner,
    uploads: TransferLane,
    downloads: TransferLane,
    span: Span,
}

impl TransferEngine {
    pub fn new(settings: TransferSettings) -> Self {
        let span = logging::service_span(&settings.invocation_id);
        TransferEngine {
            runner: TransferRunner::new(Arc::new(settings)),
            uploads: TransferLane::new(),
            downloads: TransferLane::new(),
            span,
        }
    }

    /// Service identity span. Request handling and jobs log inside it.
    pub fn span(&self) -> &Span {
        &self.span
    }

    fn lane(&self, kind: TransferKind) -> &TransferLane {
        match kind {
            TransferKind::Upload => &self.uploads,
            TransferKind::Download => &self.downloads,
        }
    }

    /// Records a request for `kind` and launches porklock if nothing of that
    /// kind is running. With `blocking` set, waits for the job of that kind
    /// that is in flight once the request is recorded, whether this request
    /// started it or not.
    ///
    /// The returned record is always this request's own. A request that joins
    /// a job started by someone else keeps its own record at `requested`.
    pub async fn request(&self, kind: TransferKind, blocking: bool) -> Arc<TransferRecord> {
        self.coordinate(kind, blocking)
            .instrument(self.span.clone())
            .await
    }

    async fn coordinate(&self, kind: TransferKind, blocking: bool) -> Arc<TransferRecord> {
        info!(%kind, blocking, "received {kind} request");
        let lane = self.lane(kind);

        let record = Arc::new(TransferRecord::new(kind));
        lane.records.append(record.clone()).await;

        let permit = if self.runner.precondition_met(kind).await {
            lane.gate.try_acquire()
        } else {
            warn!(
                path = %self.runner.settings().path_list_file.display(),
                "input path list is missing, not starting {kind}"
            );
            None
        };

        let in_flight = match permit {
            Some(permit) => {
                info!(uuid = %record.uuid(), "starting {kind} job");
                let completion = permit.completion();
                let runner = self.runner.clone();
                let job_record = record.clone();
                let span = info_span!(parent: &self.span, "transfer", %kind, uuid = %record.uuid());
                tokio::spawn(
                    async move { runner.run(kind, job_record, permit).await }.instrument(span),
                );
                Some(completion)
            }
            None => {
                info!(uuid = %record.uuid(), "{kind} not started by this request");
                lane.gate.in_flight()
            }
        };

        if blocking {
            if let Some(job) = in_flight {
                job.wait().await;
            }
        }
        record
    }

    pub async fn find(&self, kind: TransferKind, id: &str) -> Result<Arc<TransferRecord>, ApiError> {
        self.lane(kind)
            .records
            .find(id)
            .await
            .ok_or_else(|| ApiError::NotFound {
                kind,
                id: id.to_string(),
            })
    }

    /// Snapshots of every record of `kind`, oldest first.
    pub async fn records(&self, kind: TransferKind) -> Vec<TransferRecordSnapshot> {
        let mut snapshots = Vec::new();
        for record in self.lane(kind).records.all().await {
            snapshots.push(record.snapshot().await);
        }
        snapshots
    }

    pub fn is_running(&self, kind: TransferKind) -> bool {
        self.lane(kind).gate.is_running()
    }

    /// Waits for the in-flight job of `kind`, if any.
    pub async fn wait_idle(&self, kind: TransferKind) {
        self.lane(kind).gate.wait_idle().await;
    }
}
