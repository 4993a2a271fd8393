use crate::error::{Error, ErrorKind};
use crate::request::{self, RequestDescriptor};
use crate::utils::{ApiProfile, truncate_chars};
use serde_json::Value;
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// How much of a non-JSON response is echoed back in diagnostics.
pub const RAW_PREVIEW_CHARS: usize = 200;

const HINT_FORBIDDEN: &str = "Authentication failed (403 Forbidden). Your session may have expired; capture a fresh request from DevTools.";
const HINT_NOT_FOUND: &str =
    "API endpoint not found (404). Check that the URL in the captured request is correct.";

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success { payload: Value },
    Failure { reason: ErrorKind, diagnostic: String },
}

impl ExecutionResult {
    fn failure(reason: ErrorKind, diagnostic: impl Into<String>) -> Self {
        ExecutionResult::Failure {
            reason,
            diagnostic: diagnostic.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn into_result(self) -> crate::error::Result<Value> {
        match self {
            ExecutionResult::Success { payload } => Ok(payload),
            ExecutionResult::Failure { reason, diagnostic } => Err(match reason {
                ErrorKind::Parse => Error::Parse(diagnostic),
                ErrorKind::Validation => Error::Validation(diagnostic),
                ErrorKind::TransportFailure => Error::Transport(diagnostic),
                ErrorKind::MalformedResponse => Error::MalformedResponse(diagnostic),
                ErrorKind::Derivation => Error::Derivation(diagnostic),
                ErrorKind::DataShape => Error::DataShape(diagnostic),
            }),
        }
    }
}

/// Captured result of one client process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when killed by a signal or on timeout.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

/// Runs a token sequence as a child process. `args[0]` is the program.
pub trait CommandRunner {
    fn run(&self, args: &[String], timeout: Option<Duration>) -> io::Result<ProcessOutput>;
}

/// Spawns the real process, draining both pipes on helper threads so a
/// large response cannot stall the child while we wait on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, args: &[String], timeout: Option<Duration>) -> io::Result<ProcessOutput> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let (status, timed_out) = match timeout {
            Some(limit) => match child.wait_timeout(limit)? {
                Some(status) => (status.code(), false),
                None => {
                    let _ = child.kill();
                    child.wait()?;
                    (None, true)
                }
            },
            None => (child.wait()?.code(), false),
        };

        Ok(ProcessOutput {
            status,
            stdout: collect(stdout),
            stderr: collect(stderr),
            timed_out,
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Replays descriptors through a [`CommandRunner`] and normalises the outcome.
pub struct Executor<R = ProcessRunner> {
    runner: R,
    timeout: Option<Duration>,
}

impl Executor<ProcessRunner> {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self::with_runner(ProcessRunner, timeout)
    }
}

impl<R: CommandRunner> Executor<R> {
    pub fn with_runner(runner: R, timeout: Option<Duration>) -> Self {
        Self { runner, timeout }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn execute(&self, descriptor: &RequestDescriptor) -> ExecutionResult {
        log::debug!("{} {}", descriptor.method(), descriptor.url());
        match self.runner.run(descriptor.args(), self.timeout) {
            Ok(output) => interpret(output, self.timeout),
            Err(e) => ExecutionResult::failure(
                ErrorKind::TransportFailure,
                format!("could not run {}: {}", descriptor.args()[0], e),
            ),
        }
    }

    /// List conversations, forcing the `limit` query parameter first.
    pub fn get_chat_conversations(
        &self,
        descriptor: &RequestDescriptor,
        limit: u32,
    ) -> ExecutionResult {
        self.execute(&descriptor.with_limit(limit))
    }

    /// Cheap connectivity check: the same request with `limit=1`.
    pub fn probe(&self, descriptor: &RequestDescriptor) -> ExecutionResult {
        self.get_chat_conversations(descriptor, 1)
    }

    /// Fetch one conversation's message tree using the base request's auth.
    pub fn fetch_messages(
        &self,
        base: &RequestDescriptor,
        conversation_id: &str,
        profile: &ApiProfile,
    ) -> ExecutionResult {
        match request::build_message_request(base, conversation_id, profile) {
            Ok(derived) => self.execute(&derived),
            Err(e) => ExecutionResult::failure(e.kind(), e.to_string()),
        }
    }
}

/// Map raw process output onto success, transport failure or malformed response.
pub fn interpret(output: ProcessOutput, timeout: Option<Duration>) -> ExecutionResult {
    if output.timed_out {
        let after = timeout
            .map(|t| format!(" after {}s", t.as_secs_f64()))
            .unwrap_or_default();
        return ExecutionResult::failure(
            ErrorKind::TransportFailure,
            format!("request timed out{}", after),
        );
    }

    if output.status != Some(0) {
        let mut diagnostic = match output.status {
            Some(code) => format!("curl failed with exit code {}", code),
            None => "curl was terminated before exiting".to_string(),
        };
        if let Some(hint) = failure_hint(&output.stderr) {
            diagnostic.push('\n');
            diagnostic.push_str(hint);
        }
        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            diagnostic.push_str("\nstderr: ");
            diagnostic.push_str(stderr);
        }
        return ExecutionResult::failure(ErrorKind::TransportFailure, diagnostic);
    }

    match serde_json::from_str::<Value>(&output.stdout) {
        Ok(payload) => ExecutionResult::Success { payload },
        Err(e) => ExecutionResult::failure(
            ErrorKind::MalformedResponse,
            format!(
                "failed to parse response as JSON: {}\nresponse: {}",
                e,
                truncate_chars(output.stdout.trim(), RAW_PREVIEW_CHARS)
            ),
        ),
    }
}

fn failure_hint(stderr: &str) -> Option<&'static str> {
    if stderr.contains("403") || stderr.contains("Forbidden") {
        Some(HINT_FORBIDDEN)
    } else if stderr.contains("404") {
        Some(HINT_NOT_FOUND)
    } else {
        None
    }
}
