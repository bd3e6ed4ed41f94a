//! Process execution collaborator (§6: `exec(path, args, stdin?, { env?,
//! shell?, cwd? }) -> { retc, stdout, stderr }`).
//!
//! The Compiler Prober and Vendor SDK Environment Extractor both suspend
//! at child-process execution; this module is their one point of contact
//! with the OS process API, built on `tokio::process::Command` so probes
//! stay cooperative rather than blocking a worker thread.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{KitError, Result};

/// Per-probe timeout (§5: "a reasonable implementation imposes a
/// per-probe timeout on child-process execution").
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub env: Option<HashMap<String, String>>,
    pub cwd: Option<PathBuf>,
    /// Run `path` through a host shell instead of exec'ing it directly.
    /// Needed for the vendor activation script (§4.D), which is a batch
    /// file rather than a standalone executable.
    pub shell: bool,
    pub timeout: Option<Duration>,
}

/// `{ retc, stdout, stderr }` (§6). `retc` is `None` if the process was
/// killed by a signal rather than exiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub retc: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.retc == Some(0)
    }
}

/// Runs `path args...`, optionally piping `stdin`, and collects both
/// streams. A timeout or spawn failure surfaces as `Err`; a non-zero exit
/// is reported in `retc` and left to the caller to interpret — §4.B and
/// §4.D both absorb that as `None`/failure at their own layer.
pub async fn exec(
    path: &Path,
    args: &[String],
    stdin: Option<&str>,
    opts: &ExecOptions,
) -> Result<ExecOutput> {
    let mut command = if opts.shell {
        let mut c = shell_command();
        c.arg(path.as_os_str());
        c
    } else {
        Command::new(path)
    };
    command.args(args);
    command.stdin(Stdio::piped());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    if let Some(cwd) = &opts.cwd {
        command.current_dir(cwd);
    }
    if let Some(env) = &opts.env {
        command.env_clear();
        command.envs(env);
    }

    let mut child = command
        .spawn()
        .map_err(|e| KitError::ProbeFailed {
            path: path.display().to_string(),
            reason: format!("failed to spawn: {e}"),
        })?;

    if let Some(input) = stdin {
        if let Some(mut pipe) = child.stdin.take() {
            let _ = pipe.write_all(input.as_bytes()).await;
        }
    } else {
        drop(child.stdin.take());
    }

    let timeout = opts.timeout.unwrap_or(DEFAULT_TIMEOUT);
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| KitError::ProbeFailed {
            path: path.display().to_string(),
            reason: format!("timed out after {timeout:?}"),
        })?
        .map_err(|e| KitError::ProbeFailed {
            path: path.display().to_string(),
            reason: format!("failed to collect output: {e}"),
        })?;

    Ok(ExecOutput {
        retc: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(windows)]
fn shell_command() -> Command {
    let mut c = Command::new("cmd.exe");
    c.arg("/C");
    c
}

#[cfg(not(windows))]
fn shell_command() -> Command {
    let mut c = Command::new("sh");
    c.arg("-c");
    c
}
