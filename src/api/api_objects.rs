use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::transfer_objects::{TransferKind, TransferStatus};

/// Point-in-time copy of a [`TransferRecord`]. This is the JSON body returned
/// by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransferRecordSnapshot {
    pub uuid: Uuid,
    pub start_time: DateTime<Utc>,
    pub completion_time: Option<DateTime<Utc>>,
    pub status: TransferStatus,
    pub kind: TransferKind,
}

#[derive(Debug)]
struct RecordState {
    status: TransferStatus,
    completion_time: Option<DateTime<Utc>>,
}

/// Status of a single upload or download request. The id, kind and start time
/// never change; status and completion time sit behind the record's own lock
/// because the runner updates them while handlers may be serializing.
#[derive(Debug)]
pub struct TransferRecord {
    uuid: Uuid,
    kind: TransferKind,
    start_time: DateTime<Utc>,
    state: Mutex<RecordState>,
}

impl TransferRecord {
    pub fn new(kind: TransferKind) -> Self {
        TransferRecord {
            uuid: Uuid::new_v4(),
            kind,
            start_time: Utc::now(),
            state: Mutex::new(RecordState {
                status: TransferStatus::Requested,
                completion_time: None,
            }),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub async fn status(&self) -> TransferStatus {
        self.state.lock().await.status
    }

    /// Moves the record to `status`. Backwards moves and changes after a
    /// terminal state are ignored; returns whether the status changed.
    pub async fn set_status(&self, status: TransferStatus) -> bool {
        let mut state = self.state.lock().await;
        if !state.status.can_become(status) {
            return false;
        }
        state.status = status;
        true
    }

    /// Puts the record in its terminal `status` and stamps the completion
    /// time under the same lock, so readers never see one without the other.
    pub async fn finish(&self, status: TransferStatus) -> bool {
        debug_assert!(status.is_terminal());
        let mut state = self.state.lock().await;
        if !state.status.can_become(status) {
            return false;
        }
        state.status = status;
        state.completion_time.get_or_insert_with(Utc::now);
        true
    }

    pub async fn snapshot(&self) -> TransferRecordSnapshot {
        let state = self.state.lock().await;
        TransferRecordSnapshot {
            uuid: self.uuid,
            start_time: self.start_time,
            completion_time: state.completion_time,
            status: state.status,
            kind: self.kind,
        }
    }

    pub async fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.snapshot().await)
    }
}

/// Every record of one kind, in arrival order. Nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct HistoricalRecords {
    records: Arc<Mutex<Vec<Arc<TransferRecord>>>>,
}

impl HistoricalRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, record: Arc<TransferRecord>) {
        self.records.lock().await.push(record);
    }

    /// Looks a record up by its hyphenated UUID. Ids that are not UUIDs
    /// simply are not found.
    pub async fn find(&self, id: &str) -> Option<Arc<TransferRecord>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let records = self.records.lock().await;
        records.iter().find(|r| r.uuid == uuid).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn all(&self) -> Vec<Arc<TransferRecord>> {
        self.records.lock().await.clone()
    }
}
