use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use super::{MetadataSource, TagMap};
use crate::error::Error;

/// How many paths go into a single exiftool invocation. Process spawn
/// dominates per-file cost, so batches are large.
pub const BATCH_LIMIT: usize = 1000;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

enum BatchFailure {
    Timeout(u64),
    Other(String),
}

/// Metadata source backed by the `exiftool` binary, one invocation per
/// batch, JSON output with group-qualified tag names and numeric values.
pub struct ExifToolSource {
    command: String,
    timeout: Duration,
}

impl ExifToolSource {
    pub fn new() -> Self {
        Self {
            command: "exiftool".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the exiftool binary can be invoked at all.
    pub fn is_available() -> bool {
        Command::new("exiftool")
            .arg("-ver")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn invoke(&self, paths: &[PathBuf]) -> Result<HashMap<String, TagMap>, BatchFailure> {
        let mut command = Command::new(&self.command);
        command.args(["-j", "-G", "-n"]);
        command.args(paths);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let child = command.spawn().map_err(|err| {
            BatchFailure::Other(format!("failed to invoke {}: {err}", self.command))
        })?;
        let stdout = match wait_with_timeout(child, self.timeout) {
            Ok(Some(stdout)) => stdout,
            Ok(None) => return Err(BatchFailure::Timeout(self.timeout.as_secs())),
            Err(err) => return Err(BatchFailure::Other(err.to_string())),
        };
        // exiftool exits non-zero when any one file in the batch is
        // unreadable while still emitting JSON for the rest, so the exit
        // status is ignored; paths missing from the output fail per file.
        parse_output(&stdout)
            .map_err(|err| BatchFailure::Other(format!("unparsable exiftool output: {err}")))
    }
}

impl Default for ExifToolSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for ExifToolSource {
    fn extract(&self, paths: &[PathBuf]) -> Vec<crate::error::Result<TagMap>> {
        match self.invoke(paths) {
            Ok(by_source) => paths
                .iter()
                .map(|path| {
                    by_source
                        .get(path.to_string_lossy().as_ref())
                        .cloned()
                        .ok_or_else(|| Error::Extraction {
                            path: path.clone(),
                            message: "no metadata entry returned".to_string(),
                        })
                })
                .collect(),
            Err(BatchFailure::Timeout(seconds)) => paths
                .iter()
                .map(|path| {
                    Err(Error::ExtractionTimeout {
                        path: path.clone(),
                        seconds,
                    })
                })
                .collect(),
            Err(BatchFailure::Other(message)) => paths
                .iter()
                .map(|path| {
                    Err(Error::Extraction {
                        path: path.clone(),
                        message: message.clone(),
                    })
                })
                .collect(),
        }
    }

    fn name(&self) -> &'static str {
        "exiftool"
    }
}

/// Index exiftool's JSON array by the `SourceFile` each entry reports.
fn parse_output(stdout: &[u8]) -> serde_json::Result<HashMap<String, TagMap>> {
    let entries: Vec<TagMap> = serde_json::from_slice(stdout)?;
    Ok(entries
        .into_iter()
        .filter_map(|tags| {
            let source = tags.get("SourceFile")?.as_str()?.to_string();
            Some((source, tags))
        })
        .collect())
}

/// Poll the child for exit, draining stdout on a separate thread so a full
/// pipe cannot deadlock the wait. Returns `None` when the deadline passes
/// and the child had to be killed.
fn wait_with_timeout(mut child: Child, timeout: Duration) -> std::io::Result<Option<Vec<u8>>> {
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout not captured"))?;
    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });
    let deadline = Instant::now() + timeout;
    loop {
        if child.try_wait()?.is_some() {
            return match reader.join() {
                Ok(Ok(buf)) => Ok(Some(buf)),
                Ok(Err(err)) => Err(err),
                Err(_) => Err(std::io::Error::other("stdout reader panicked")),
            };
        }
        if Instant::now() >= deadline {
            child.kill().ok();
            child.wait().ok();
            reader.join().ok();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
