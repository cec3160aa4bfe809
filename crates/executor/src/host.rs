use crate::error::HostError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Pass-through I/O used by the fetch, file and shell tools. Whether a tool
/// may run at all is decided by the guardrail profile, not here.
#[async_trait]
pub trait HostIo: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, HostError>;

    async fn read_file(&self, path: &Path) -> Result<String, HostError>;

    /// Returns the number of bytes written.
    async fn write_file(&self, path: &Path, content: &str) -> Result<usize, HostError>;

    async fn run_shell(&self, command: &str, limit: Duration) -> Result<ShellOutput, HostError>;
}

pub struct SystemHost {
    client: reqwest::Client,
}

impl SystemHost {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostIo for SystemHost {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, HostError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HostError::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HostError::Http(e.to_string()))?;
        Ok(FetchResponse { status, body })
    }

    async fn read_file(&self, path: &Path) -> Result<String, HostError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HostError::Io(format!("{}: {}", path.display(), e)))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<usize, HostError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HostError::Io(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| HostError::Io(format!("{}: {}", path.display(), e)))?;
        Ok(content.len())
    }

    async fn run_shell(&self, command: &str, limit: Duration) -> Result<ShellOutput, HostError> {
        tracing::info!("Executing shell command: {}", command);

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(limit, cmd.output())
            .await
            .map_err(|_| HostError::Timeout(limit.as_millis() as u64))?
            .map_err(|e| HostError::Io(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(HostError::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }

        Ok(ShellOutput {
            stdout,
            stderr,
            exit_code: output.status.code(),
        })
    }
}
