use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tutorbot_core::{Tool, ToolError, Value};

pub const DEFAULT_PYTHON_PROGRAM: &str = "python3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 8 * 1024;

const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// How long the output pipes may stay open once the interpreter is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Reads the snippet from stdin, runs it, and echoes a trailing expression.
const REPL_DRIVER: &str = r#"import ast, sys
source = sys.stdin.read()
tree = ast.parse(source, "<snippet>", "exec")
tail = tree.body.pop() if tree.body and isinstance(tree.body[-1], ast.Expr) else None
namespace = {"__name__": "__main__", "__builtins__": __builtins__}
exec(compile(tree, "<snippet>", "exec"), namespace)
if tail is not None:
    value = eval(compile(ast.Expression(tail.value), "<snippet>", "eval"), namespace)
    if value is not None:
        print(repr(value))
"#;

/// Result of one interpreter run. A non-zero exit or a timeout is still an
/// `Ok` result: callers explain failures, they do not abort on them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed (timeout or signal).
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecutionOutput {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runs Python snippets in a child interpreter.
///
/// The snippet runs like a REPL cell: statements execute in order and the
/// `repr` of a trailing expression is printed, unless it is `None`. The code
/// is piped over stdin to a small driver started with `python3 -I -c`
/// (isolated mode ignores `PYTHON*` env vars and the user site dir), and the
/// working directory is a fresh temp dir removed afterwards.
///
/// On unix the interpreter leads its own process group. When the run ends or
/// `timeout` elapses the whole group is killed, so background processes the
/// snippet spawned do not outlive it. stdout and stderr are each capped at
/// `max_output_bytes`.
#[derive(Clone, Debug)]
pub struct PythonInterpreter {
    program: String,
    timeout: Duration,
    max_output_bytes: usize,
}

impl Default for PythonInterpreter {
    fn default() -> Self {
        Self {
            program: DEFAULT_PYTHON_PROGRAM.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

impl PythonInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes.max(1);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Executes `code`. Errors only when the interpreter cannot be started or
    /// its pipes fail.
    pub async fn run(&self, code: &str) -> Result<ExecutionOutput, ToolError> {
        let deadline = Instant::now() + self.timeout;
        let workdir = tempfile::tempdir()?;
        let mut command = Command::new(&self.program);
        command
            .arg("-I")
            .arg("-c")
            .arg(REPL_DRIVER)
            .current_dir(workdir.path())
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command.spawn().map_err(|err| {
            ToolError::ExecutionFailed(format!("failed to start '{}': {err}", self.program))
        })?;
        let pid = child.id();

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(mut stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
            kill_process_group(pid);
            return Err(ToolError::ExecutionFailed(
                "interpreter pipes were not captured".to_string(),
            ));
        };

        let code = code.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            // A script that exits early closes stdin; that is not our error.
            let _ = stdin.write_all(&code).await;
            let _ = stdin.shutdown().await;
        });
        let cap = self.max_output_bytes;
        let stdout_sink = Sink::default();
        let stderr_sink = Sink::default();
        let mut stdout_reader = tokio::spawn(read_capped(stdout, cap, stdout_sink.clone()));
        let mut stderr_reader = tokio::spawn(read_capped(stderr, cap, stderr_sink.clone()));

        let (status, timed_out) = match tokio::time::timeout_at(deadline, child.wait()).await {
            Ok(status) => (Some(status?), false),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "python run timed out, killing interpreter");
                (None, true)
            }
        };
        // Background processes left by the snippet go with it.
        kill_process_group(pid);
        if timed_out {
            child.kill().await?;
        }

        let drained = tokio::time::timeout(DRAIN_GRACE, async {
            let stdout = join_reader(&mut stdout_reader).await;
            let stderr = join_reader(&mut stderr_reader).await;
            stdout.and(stderr)
        })
        .await;
        writer.abort();
        match drained {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("interpreter output pipes still open, keeping what was read");
                stdout_reader.abort();
                stderr_reader.abort();
            }
        }

        let output = ExecutionOutput {
            stdout: stdout_sink.render(),
            stderr: stderr_sink.render(),
            exit_code: status.and_then(|status| status.code()),
            timed_out,
        };
        tracing::debug!(
            exit_code = ?output.exit_code,
            timed_out = output.timed_out,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "python run finished"
        );
        Ok(output)
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers; a negative pid targets the group the
    // interpreter leads. ESRCH just means the group is already gone.
    unsafe {
        libc::kill(-pid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

async fn join_reader(handle: &mut JoinHandle<std::io::Result<()>>) -> Result<(), ToolError> {
    handle
        .await
        .map_err(|err| ToolError::ExecutionFailed(format!("output reader failed: {err}")))?
        .map_err(ToolError::from)
}

/// Output captured from one pipe, shared with its reader task so a reader
/// that never finishes still leaves what it read.
#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Captured>>);

#[derive(Default)]
struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

impl Sink {
    fn push(&self, chunk: &[u8], cap: usize) {
        let mut captured = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let room = cap.saturating_sub(captured.bytes.len());
        if chunk.len() > room {
            captured.truncated = true;
        }
        captured.bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    fn render(&self) -> String {
        let captured = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let mut text = String::from_utf8_lossy(&captured.bytes).into_owned();
        if captured.truncated {
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

/// Drains `reader` to the end, keeping at most `cap` bytes, so a chatty child
/// never blocks on a full pipe.
async fn read_capped<R>(mut reader: R, cap: usize, sink: Sink) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        let read = reader.read(&mut buf).await?;
        if read == 0 {
            return Ok(());
        }
        sink.push(&buf[..read], cap);
    }
}

#[async_trait::async_trait]
impl Tool for PythonInterpreter {
    fn name(&self) -> &str {
        "python_interpreter"
    }

    fn description(&self) -> &str {
        "Executes a Python 3 snippet and returns its stdout, stderr and exit code."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": { "type": "string", "description": "Python source to execute" }
            },
            "required": ["code"]
        })
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let code = match &args {
            Value::String(code) => code.as_str(),
            _ => args
                .get("code")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidInput("expected a string field 'code'".to_string()))?,
        };
        let output = self.run(code).await?;
        Ok(serde_json::to_value(output)?)
    }
}
