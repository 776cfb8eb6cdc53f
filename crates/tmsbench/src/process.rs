//! Blocking subprocess helpers shared by the build, inspect and sim layers.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::ToolError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long pipe readers may lag behind the exit of the process group.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Program name of a command, for diagnostics.
pub fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

/// Run a command to completion and return its stdout.
///
/// A non-zero exit is an error carrying the command's stderr.
///
/// # Errors
///
/// Returns [`ToolError::Spawn`] if the program cannot start and
/// [`ToolError::Failed`] on a non-zero exit.
pub fn capture(cmd: &mut Command) -> Result<String, ToolError> {
    let program = program_name(cmd);
    trace!(?cmd, "running");
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;
    if !output.status.success() {
        return Err(ToolError::Failed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Output of a command run under a wall-clock limit.
#[derive(Debug)]
pub enum TimedOutput {
    /// The process exited on its own.
    Finished {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    /// The limit elapsed; the process was killed and reaped.
    TimedOut { stdout: String, stderr: String },
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Output of a reader thread. A reader still blocked after [`DRAIN_GRACE`]
/// (a descendant escaped the process group and holds the pipe) is abandoned.
fn collect(rx: &Receiver<Vec<u8>>) -> String {
    let bytes = rx.recv_timeout(DRAIN_GRACE).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Kill the child and everything it spawned.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    if let Ok(pid) = i32::try_from(child.id()) {
        let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            kill_tree(child);
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Run a command with a timeout, capturing stdout and stderr.
///
/// Both pipes are drained on their own threads while the child is polled, so
/// a chatty process cannot block on a full pipe before the limit expires.
/// On unix the child leads its own process group, and a timeout kills the
/// whole group so wrapper scripts do not leave the real process running.
///
/// # Errors
///
/// Returns an error if the child cannot be spawned or waited on.
pub fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> std::io::Result<TimedOutput> {
    trace!(?cmd, ?timeout, "running with timeout");
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_with_timeout(&mut child, timeout) {
        Ok(status) => status,
        Err(e) => {
            kill_tree(&mut child);
            let _ = child.wait();
            return Err(e);
        }
    };

    let stdout = collect(&stdout);
    let stderr = collect(&stderr);
    match status {
        Some(status) => Ok(TimedOutput::Finished {
            status,
            stdout,
            stderr,
        }),
        None => {
            debug!(program = %program_name(cmd), "killed after timeout");
            Ok(TimedOutput::TimedOut { stdout, stderr })
        }
    }
}
