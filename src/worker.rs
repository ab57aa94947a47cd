use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use tokio::fs::File;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::api::api_objects::TransferRecord;
use crate::config::TransferSettings;
use crate::error::RunError;
use crate::run_gate::GatePermit;
use crate::transfer_objects::{TransferKind, TransferStatus};

/// Runs porklock for one kind of transfer and records the outcome.
#[derive(Debug, Clone)]
pub struct TransferRunner {
    settings: Arc<TransferSettings>,
}

impl TransferRunner {
    pub fn new(settings: Arc<TransferSettings>) -> Self {
        TransferRunner { settings }
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Full argument vector, program name first.
    pub fn command(&self, kind: TransferKind) -> Vec<String> {
        let s = &self.settings;
        let mut parts = vec![s.porklock_bin.clone(), "-jar".to_string(), s.porklock_jar.clone()];
        match kind {
            TransferKind::Download => parts.extend([
                "get".to_string(),
                "--user".to_string(),
                s.user.clone(),
                "--source-list".to_string(),
                s.path_list_file.display().to_string(),
                "--destination".to_string(),
                s.download_destination.clone(),
            ]),
            TransferKind::Upload => parts.extend([
                "put".to_string(),
                "--user".to_string(),
                s.user.clone(),
                "--source".to_string(),
                s.download_destination.clone(),
                "--destination".to_string(),
                s.upload_destination.clone(),
                "--exclude".to_string(),
                s.excludes_file.display().to_string(),
            ]),
        }
        parts.extend(["-z".to_string(), s.irods_config.display().to_string()]);
        for fm in &s.file_metadata {
            parts.extend(["-m".to_string(), fm.clone()]);
        }
        parts
    }

    /// Downloads need the input path list to exist and be readable.
    /// Uploads have no precondition.
    pub async fn precondition_met(&self, kind: TransferKind) -> bool {
        match kind {
            TransferKind::Download => File::open(&self.settings.path_list_file).await.is_ok(),
            TransferKind::Upload => true,
        }
    }

    pub fn log_paths(&self, kind: TransferKind) -> (PathBuf, PathBuf) {
        let dir = &self.settings.log_directory;
        let prefix = kind.log_prefix();
        (
            dir.join(format!("{prefix}.stdout.log")),
            dir.join(format!("{prefix}.stderr.log")),
        )
    }

    /// Drives `record` through running to a terminal state. The gate is
    /// released when `permit` drops at the end of this call, after the record
    /// is final.
    pub async fn run(&self, kind: TransferKind, record: Arc<TransferRecord>, permit: GatePermit) {
        let _permit = permit;
        info!("running {kind} transfer");
        record.set_status(kind.running_status()).await;

        let status = match self.execute(kind).await {
            Ok(()) => {
                info!("{kind} transfer finished without errors");
                TransferStatus::Completed
            }
            Err(err) => {
                error!(error = %err, "error running porklock for {kind}s");
                TransferStatus::Failed
            }
        };
        record.finish(status).await;
    }

    async fn execute(&self, kind: TransferKind) -> Result<(), RunError> {
        let (stdout_path, stderr_path) = self.log_paths(kind);
        let stdout_file = create_log(stdout_path).await?;
        let stderr_file = create_log(stderr_path).await?;

        let parts = self.command(kind);
        debug!(command = ?parts, "starting porklock");
        let status = Command::new(&parts[0])
            .args(&parts[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file))
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: parts[0].clone(),
                source,
            })?
            .wait()
            .await
            .map_err(|source| RunError::Wait { source })?;

        if !status.success() {
            return Err(RunError::ExitStatus { status });
        }
        Ok(())
    }
}

// Truncates any log left by the previous job of the same kind.
async fn create_log(path: PathBuf) -> Result<std::fs::File, RunError> {
    match File::create(&path).await {
        Ok(file) => Ok(file.into_std().await),
        Err(source) => Err(RunError::LogFile { path, source }),
    }
}
