use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::StartupError;

pub const DEFAULT_PORKLOCK_JAR: &str = "/usr/src/app/porklock-standalone.jar";

/// Command line and environment options for the transfer sidecar.
#[derive(Debug, Clone, Parser)]
#[command(name = "vice-file-transfers")]
#[command(about = "Triggers porklock uploads and downloads over HTTP", long_about = None)]
pub struct Config {
    /// The port to listen on for requests
    #[arg(short = 'l', long, env = "VICE_LISTEN_PORT", default_value_t = 60001)]
    pub listen_port: u16,

    /// The directory in which to write log files
    #[arg(long = "log-dir", env = "VICE_LOG_DIR", default_value = "/input-files")]
    pub log_directory: PathBuf,

    /// The user to run the transfers for
    #[arg(long, env = "VICE_USER")]
    pub user: String,

    /// The destination directory for uploads
    #[arg(long, env = "VICE_UPLOAD_DESTINATION")]
    pub upload_destination: String,

    /// The destination directory for downloads
    #[arg(long, env = "VICE_DOWNLOAD_DESTINATION", default_value = "/input-files")]
    pub download_destination: String,

    /// The path to the excludes file
    #[arg(long, env = "VICE_EXCLUDES_FILE", default_value = "/excludes/excludes-file")]
    pub excludes_file: PathBuf,

    /// The path to the input paths list file
    #[arg(
        long,
        env = "VICE_PATH_LIST_FILE",
        default_value = "/input-paths/input-path-list"
    )]
    pub path_list_file: PathBuf,

    /// The path to the porklock iRODS config file
    #[arg(
        long,
        env = "VICE_IRODS_CONFIG",
        default_value = "/etc/porklock/irods-config.properties"
    )]
    pub irods_config: PathBuf,

    /// The invocation UUID
    #[arg(long, env = "VICE_INVOCATION_ID")]
    pub invocation_id: String,

    /// Metadata to apply to files
    #[arg(short = 'm', long = "file-metadata")]
    pub file_metadata: Vec<String>,

    /// The porklock executable
    #[arg(long, env = "VICE_PORKLOCK_BIN", default_value = "porklock")]
    pub porklock_bin: String,

    /// The porklock jar passed to the executable
    #[arg(long, env = "VICE_PORKLOCK_JAR", default_value = DEFAULT_PORKLOCK_JAR)]
    pub porklock_jar: String,
}

/// Everything the runner needs to build a porklock invocation. Fixed for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub invocation_id: String,
    pub porklock_bin: String,
    pub porklock_jar: String,
    pub log_directory: PathBuf,
    pub user: String,
    pub upload_destination: String,
    pub download_destination: String,
    pub excludes_file: PathBuf,
    pub path_list_file: PathBuf,
    pub irods_config: PathBuf,
    pub file_metadata: Vec<String>,
}

impl Config {
    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            invocation_id: self.invocation_id.clone(),
            porklock_bin: self.porklock_bin.clone(),
            porklock_jar: self.porklock_jar.clone(),
            log_directory: self.log_directory.clone(),
            user: self.user.clone(),
            upload_destination: self.upload_destination.clone(),
            download_destination: self.download_destination.clone(),
            excludes_file: self.excludes_file.clone(),
            path_list_file: self.path_list_file.clone(),
            irods_config: self.irods_config.clone(),
            file_metadata: self.file_metadata.clone(),
        }
    }

    /// Startup checks that must pass before the listener is bound.
    pub fn validate(&self) -> Result<PathBuf, StartupError> {
        if !self.log_directory.is_dir() {
            return Err(StartupError::InvalidLogDirectory(self.log_directory.clone()));
        }
        find_executable(&self.porklock_bin)
            .ok_or_else(|| StartupError::ToolNotFound(self.porklock_bin.clone()))
    }
}

/// Resolves `program` the way a shell would: names containing a path
/// separator are checked directly, bare names are searched on `PATH`.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| is_executable(full))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
