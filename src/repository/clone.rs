// file: src/repository/clone.rs
// description: shallow, time-bounded repository cloning through the git executable
// reference: https://docs.rs/tokio/latest/tokio/process

use crate::error::AcquisitionError;
use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// The single capability that materialises a remote repository on disk.
///
/// Implementations must leave no running process behind when they return,
/// including on timeout.
pub trait RepositoryCloner: Send + Sync {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        depth: u32,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), AcquisitionError>> + Send;
}

#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
}

impl GitCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl RepositoryCloner for GitCli {
    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        depth: u32,
        timeout: Duration,
    ) -> Result<(), AcquisitionError> {
        info!("Cloning {} (depth {}) into {}", url, depth, dest.display());

        let mut command = Command::new(&self.binary);
        command
            .arg("clone")
            .arg("--depth")
            .arg(depth.to_string())
            .arg("--quiet")
            .arg("--")
            .arg(url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                AcquisitionError::ExecutableNotFound {
                    binary: self.binary.clone(),
                }
            } else {
                AcquisitionError::CloneFailed {
                    exit_code: -1,
                    stderr: format!("failed to spawn {}: {}", self.binary, e),
                }
            }
        })?;

        // Captured before `wait()` reaps the child and `id()` starts returning None.
        let pgid = child.id();
        let deadline = Instant::now() + timeout;

        let stderr = child.stderr.take();
        let mut stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buf).await;
            }
            String::from_utf8_lossy(&buf).trim().to_string()
        });

        let status = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                kill_process_group(pgid);
                stderr_task.abort();
                return Err(AcquisitionError::CloneFailed {
                    exit_code: -1,
                    stderr: format!("failed to wait for git: {}", e),
                });
            }
            Err(_) => {
                warn!("git clone exceeded {}s, terminating", timeout.as_secs());
                terminate(&mut child, pgid).await;
                stderr_task.abort();
                return Err(AcquisitionError::CloneTimeout {
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        // Helpers that outlive git keep the stderr pipe open.
        kill_process_group(pgid);
        let stderr = match tokio::time::timeout_at(deadline, &mut stderr_task).await {
            Ok(joined) => joined.unwrap_or_default(),
            Err(_) => {
                stderr_task.abort();
                return Err(AcquisitionError::CloneTimeout {
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        if status.success() {
            info!("Repository cloned successfully");
            Ok(())
        } else {
            warn!("git clone exited with {}: {}", status, stderr);
            Err(AcquisitionError::CloneFailed {
                exit_code: status.code().unwrap_or(-1),
                stderr,
            })
        }
    }
}

/// Kills the clone and every helper it spawned, then reaps the child.
async fn terminate(child: &mut Child, pgid: Option<u32>) {
    kill_process_group(pgid);
    if let Err(e) = child.kill().await {
        debug!("git process already gone: {}", e);
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: Option<u32>) {
    if let Some(pid) = pgid {
        // SAFETY: the child was spawned with `process_group(0)`, so its pid is
        // also the id of a process group containing only git and its helpers.
        let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                debug!("killpg({}) failed: {}", pid, err);
            }
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: Option<u32>) {}
