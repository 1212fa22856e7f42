// # Audit Log
//
// Append-only local record of outbound registrar requests and responses.
//
// ## File Format
//
// One entry per append, UTF-8:
//
// ```text
// [2025-01-09T12:00:00.000Z] Sending request to GoDaddy API:
// [{"name":"@","type":"NS","data":"ns1.example.com","ttl":3600}]
// ```
//
// Messages are written verbatim, so a multi-line message spans several lines
// of the file. The log is never truncated or rotated here; operators manage
// its growth externally.

use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;

/// Directory (relative to the working directory) holding the default log
pub const DEFAULT_LOG_DIR: &str = "logs";

/// File name of the default log
pub const DEFAULT_LOG_FILE: &str = "godaddy-api.log";

/// Append-only audit log
///
/// The containing directory and the file are created lazily on the first
/// append. Each append opens the file, writes one entry and drops the handle
/// before returning, so nothing is held open between writes.
///
/// # Example
///
/// ```rust,no_run
/// use netsync_core::AuditLog;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let log = AuditLog::new("/var/log/netsync/registrar.log");
///     log.append("ERROR: API key or secret is missing!").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AuditLog {
    /// Create an audit log writing to `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Audit log at `logs/godaddy-api.log` under the working directory
    pub fn default_location() -> Self {
        Self::new(Path::new(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE))
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry
    pub async fn append(&self, message: &str) -> Result<(), Error> {
        let line = format_entry(&Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true), message);

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::default_location()
    }
}

fn format_entry(timestamp: &str, message: &str) -> String {
    format!("[{}] {}\n", timestamp, message)
}
