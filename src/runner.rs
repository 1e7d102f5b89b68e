//! External command execution capability.
//!
//! The toolchain and the image build backend are opaque external tools: the
//! orchestrator hands them a command line, a working directory, and an
//! environment, and observes exit status plus captured output. Keeping that
//! surface behind [`CommandRunner`] lets every stage run against a recording
//! fake in tests instead of real toolchains and registries.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// A single external command invocation.
#[derive(Clone)]
pub struct CommandRequest {
    /// Program to execute
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Extra environment variables for the child
    pub envs: Vec<(String, String)>,
    /// Working directory, or inherit the parent's
    pub cwd: Option<PathBuf>,
    /// Bytes piped to the child's stdin. Redacted from Debug output.
    pub stdin: Option<Vec<u8>>,
    /// Stream stdout line-by-line to the log instead of capturing it
    pub stream_output: bool,
}

impl CommandRequest {
    /// Create a request for `program` with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
            stdin: None,
            stream_output: false,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Pipe `bytes` to the child's stdin
    pub fn stdin_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.stdin = Some(bytes);
        self
    }

    /// Stream stdout line-by-line through the log as it is produced
    pub fn streamed(mut self) -> Self {
        self.stream_output = true;
        self
    }

    /// Render the command line for diagnostics. Never includes stdin.
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

// stdin may carry registry credentials, so Debug keeps it opaque.
impl fmt::Debug for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRequest")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("envs", &self.envs)
            .field("cwd", &self.cwd)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .field("stream_output", &self.stream_output)
            .finish()
    }
}

/// Observed result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
    /// Captured stdout (empty when streamed)
    pub stdout: String,
    /// Captured stderr (empty when streamed)
    pub stderr: String,
}

/// Capability interface over external tool execution.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute one command to completion and observe its outcome.
    ///
    /// A non-zero exit is not an `Err`: callers interpret the exit status
    /// against their own error domain. `Err` means the command could not be
    /// spawned or its output could not be collected.
    async fn run(&self, request: CommandRequest) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, request: CommandRequest) -> std::io::Result<CommandOutput> {
        log::debug!("exec: {}", request.display_line());

        let mut command = Command::new(&request.program);
        command.args(&request.args);
        for (key, value) in &request.envs {
            command.env(key, value);
        }
        if let Some(dir) = &request.cwd {
            command.current_dir(dir);
        }

        command.stdin(if request.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        if request.stream_output {
            // Long-running builds stream stdout through the log; stderr goes
            // straight to the terminal so progress bars stay visible.
            command.stdout(Stdio::piped()).stderr(Stdio::inherit());

            let mut child = command.spawn()?;
            feed_stdin(&mut child, request.stdin).await?;

            if let Some(stdout) = child.stdout.take() {
                let mut lines = BufReader::new(stdout).lines();
                while let Some(line) = lines.next_line().await? {
                    log::info!(target: "lodestone_release::exec", "{line}");
                }
            }

            let status = child.wait().await?;
            Ok(CommandOutput {
                success: status.success(),
                code: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            })
        } else {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());

            let mut child = command.spawn()?;
            feed_stdin(&mut child, request.stdin).await?;

            let output = child.wait_with_output().await?;
            Ok(CommandOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

/// Write `bytes` to the child's stdin and close the pipe.
async fn feed_stdin(
    child: &mut tokio::process::Child,
    bytes: Option<Vec<u8>>,
) -> std::io::Result<()> {
    if let Some(bytes) = bytes
        && let Some(mut stdin) = child.stdin.take()
    {
        stdin.write_all(&bytes).await?;
        stdin.shutdown().await?;
    }
    Ok(())
}
