//! Child processes for external tools, with timeouts and bounded output.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, ScopedJoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Bytes of stderr quoted in a failure message.
const STDERR_TAIL_BYTES: usize = 2_000;

/// A fully described external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub workdir: PathBuf,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, workdir: &Path, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: workdir.to_path_buf(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Program file name without directories, e.g. `curl` for `/usr/bin/curl`.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Value following `flag` in the argument list.
    pub fn arg_after(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(OsString::as_os_str)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured child process output.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal or on timeout.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Tail of stderr, lossily decoded.
    pub fn stderr_tail(&self) -> String {
        let start = self.stderr.len().saturating_sub(STDERR_TAIL_BYTES);
        String::from_utf8_lossy(&self.stderr[start..]).trim().to_string()
    }
}

/// Abstraction over process execution so stages can be driven by fakes.
pub trait CommandRunner {
    /// Run `spec` to completion. Errors only when the process cannot be
    /// started or waited on; a non-zero exit is reported in the output.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runner that spawns real processes.
///
/// Both pipes are drained on scoped threads while the child runs, so a chatty
/// tool cannot block on a full pipe. At most `output_limit_bytes` of each
/// stream is kept.
pub struct SystemCommandRunner {
    pub output_limit_bytes: usize,
}

impl CommandRunner for SystemCommandRunner {
    #[instrument(
        skip_all,
        fields(program = %spec.program_name(), timeout_secs = spec.timeout.as_secs())
    )]
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn {}", spec.program.display()))?;
        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            bail!("{} started without piped output", spec.program.display());
        };
        let limit = self.output_limit_bytes;

        thread::scope(|scope| -> Result<CommandOutput> {
            let stdout = scope.spawn(move || Capture::drain(stdout, limit));
            let stderr = scope.spawn(move || Capture::drain(stderr, limit));

            let waited = wait_or_kill(&mut child, spec.timeout);
            if let Err(wait_err) = &waited {
                debug!(error = %wait_err, "wait failed, killing child");
                if let Err(err) = child.kill() {
                    debug!(error = %err, "kill after failed wait");
                }
            }
            let stdout = Capture::join(stdout).context("capture stdout")?;
            let stderr = Capture::join(stderr).context("capture stderr")?;
            let (status, timed_out) = waited?;

            if stdout.dropped > 0 || stderr.dropped > 0 {
                warn!(
                    stdout_dropped = stdout.dropped,
                    stderr_dropped = stderr.dropped,
                    "output exceeded limit"
                );
            }
            debug!(exit_code = ?status.code(), timed_out, "child exited");
            Ok(CommandOutput {
                exit_code: status.code(),
                stdout: stdout.kept,
                stderr: stderr.kept,
                stdout_truncated: stdout.dropped,
                stderr_truncated: stderr.dropped,
                timed_out,
            })
        })
    }
}

/// Wait up to `timeout`, killing the child when it overruns.
///
/// Returns the exit status and whether the child was killed.
fn wait_or_kill(child: &mut Child, timeout: Duration) -> Result<(ExitStatus, bool)> {
    if let Some(status) = child.wait_timeout(timeout).context("wait for child")? {
        return Ok((status, false));
    }
    warn!(timeout_secs = timeout.as_secs(), "child timed out, killing");
    child.kill().context("kill child")?;
    let status = child.wait().context("reap killed child")?;
    Ok((status, true))
}

/// One drained output stream.
struct Capture {
    kept: Vec<u8>,
    dropped: usize,
}

impl Capture {
    /// Read `reader` to EOF, keeping the first `limit` bytes.
    fn drain(mut reader: impl Read, limit: usize) -> io::Result<Self> {
        let mut kept = Vec::new();
        reader
            .by_ref()
            .take(u64::try_from(limit).unwrap_or(u64::MAX))
            .read_to_end(&mut kept)?;
        let dropped = io::copy(&mut reader, &mut io::sink())?;
        Ok(Self {
            kept,
            dropped: usize::try_from(dropped).unwrap_or(usize::MAX),
        })
    }

    fn join(handle: ScopedJoinHandle<'_, io::Result<Self>>) -> Result<Self> {
        handle
            .join()
            .map_err(|_| anyhow!("output reader panicked"))?
            .map_err(Into::into)
    }
}

/// Run `spec` and turn a failed or timed-out process into an error.
pub fn run_checked(runner: &dyn CommandRunner, spec: &CommandSpec) -> Result<CommandOutput> {
    debug!(command = %spec, "running external command");
    let output = runner.run(spec)?;
    if output.timed_out {
        return Err(anyhow!(
            "`{spec}` timed out after {}s",
            spec.timeout.as_secs()
        ));
    }
    if !output.success() {
        let tail = output.stderr_tail();
        let status = output
            .exit_code
            .map_or_else(|| "signal".to_string(), |code| code.to_string());
        return Err(if tail.is_empty() {
            anyhow!("`{spec}` failed with status {status}")
        } else {
            anyhow!("`{spec}` failed with status {status}:\n{tail}")
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticRunner(CommandOutput);

    impl CommandRunner for StaticRunner {
        fn run(&self, _spec: &CommandSpec) -> Result<CommandOutput> {
            Ok(self.0.clone())
        }
    }

    fn spec() -> CommandSpec {
        CommandSpec::new("/usr/bin/curl", Path::new("/tmp"), Duration::from_secs(3))
            .arg("-o")
            .arg("out.json")
            .arg("https://example.org/x.json")
    }

    #[test]
    fn spec_helpers_describe_invocation() {
        let spec = spec();
        assert_eq!(spec.program_name(), "curl");
        assert_eq!(spec.arg_after("-o"), Some(OsStr::new("out.json")));
        assert_eq!(spec.arg_after("--missing"), None);
        assert_eq!(
            spec.to_string(),
            "/usr/bin/curl -o out.json https://example.org/x.json"
        );
    }

    #[test]
    fn run_checked_reports_status_and_stderr_tail() {
        let runner = StaticRunner(CommandOutput {
            exit_code: Some(22),
            stderr: b"curl: (22) The requested URL returned error: 404\n".to_vec(),
            ..CommandOutput::default()
        });
        let err = run_checked(&runner, &spec()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("failed with status 22"), "{msg}");
        assert!(msg.contains("error: 404"), "{msg}");
    }

    #[test]
    fn run_checked_rejects_timeouts() {
        let runner = StaticRunner(CommandOutput {
            timed_out: true,
            ..CommandOutput::default()
        });
        let err = run_checked(&runner, &spec()).unwrap_err();
        assert!(err.to_string().contains("timed out after 3s"));
    }

    #[test]
    fn run_checked_passes_success_through() {
        let runner = StaticRunner(CommandOutput {
            exit_code: Some(0),
            stdout: b"ok".to_vec(),
            ..CommandOutput::default()
        });
        let output = run_checked(&runner, &spec()).expect("success");
        assert_eq!(output.stdout, b"ok");
    }

    #[test]
    fn capture_keeps_prefix_and_counts_the_rest() {
        let capture = Capture::drain(&b"abcdefgh"[..], 3).expect("read");
        assert_eq!(capture.kept, b"abc");
        assert_eq!(capture.dropped, 5);
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_exit_code() {
        let runner = SystemCommandRunner {
            output_limit_bytes: 1_000,
        };
        let spec = CommandSpec::new("sh", Path::new("."), Duration::from_secs(10))
            .arg("-c")
            .arg("echo out; echo err >&2; exit 3");
        let output = runner.run(&spec).expect("run");
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, b"out\n");
        assert_eq!(output.stderr, b"err\n");
        assert!(!output.success());
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_kills_on_timeout() {
        let runner = SystemCommandRunner {
            output_limit_bytes: 1_000,
        };
        let spec = CommandSpec::new("sh", Path::new("."), Duration::from_millis(200))
            .arg("-c")
            .arg("exec sleep 5");
        let output = runner.run(&spec).expect("run");
        assert!(output.timed_out);
        assert!(!output.success());
    }
}
