use std::fmt;

use serde::{Deserialize, Serialize};

/// The two independent classes of transfer. Each has its own gate, record
/// history and tool logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Upload,
    Download,
}

impl TransferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferKind::Upload => "upload",
            TransferKind::Download => "download",
        }
    }

    /// The status a record of this kind reports while its tool is running.
    pub fn running_status(&self) -> TransferStatus {
        match self {
            TransferKind::Upload => TransferStatus::Uploading,
            TransferKind::Download => TransferStatus::Downloading,
        }
    }

    /// Prefix of the rolling stdout/stderr logs, e.g. `uploads.stdout.log`.
    pub fn log_prefix(&self) -> &'static str {
        match self {
            TransferKind::Upload => "uploads",
            TransferKind::Download => "downloads",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Requested,
    Uploading,
    Downloading,
    Failed,
    Completed,
}

impl TransferStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TransferStatus::Uploading | TransferStatus::Downloading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Failed | TransferStatus::Completed)
    }

    // requested(0) -> running(1) -> completed|failed(2)
    fn stage(&self) -> u8 {
        match self {
            TransferStatus::Requested => 0,
            TransferStatus::Uploading | TransferStatus::Downloading => 1,
            TransferStatus::Failed | TransferStatus::Completed => 2,
        }
    }

    /// Whether a record may move from `self` to `next`. Terminal states are
    /// final and nothing goes back to `requested`.
    pub fn can_become(&self, next: TransferStatus) -> bool {
        !self.is_terminal() && next.stage() > self.stage()
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Requested => "requested",
            TransferStatus::Uploading => "uploading",
            TransferStatus::Downloading => "downloading",
            TransferStatus::Failed => "failed",
            TransferStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_lowercase() {
        let json = serde_json::to_string(&TransferStatus::Downloading).unwrap();
        assert_eq!(json, "\"downloading\"");
        let kind: TransferKind = serde_json::from_str("\"upload\"").unwrap();
        assert_eq!(kind, TransferKind::Upload);
    }

    #[test]
    fn transitions_only_move_forward() {
        let running = TransferKind::Upload.running_status();
        assert!(TransferStatus::Requested.can_become(running));
        assert!(TransferStatus::Requested.can_become(TransferStatus::Failed));
        assert!(running.can_become(TransferStatus::Completed));
        assert!(!running.can_become(TransferStatus::Requested));
        assert!(!TransferStatus::Completed.can_become(TransferStatus::Failed));
        assert!(!TransferStatus::Failed.can_become(TransferStatus::Completed));
    }

    #[test]
    fn running_status_depends_on_kind() {
        assert_eq!(TransferKind::Download.running_status(), TransferStatus::Downloading);
        assert!(TransferKind::Upload.running_status().is_running());
        assert!(!TransferStatus::Requested.is_running());
    }
}
