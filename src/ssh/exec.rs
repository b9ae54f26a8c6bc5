//! Remote command execution.
//!
//! Provides non-interactive command execution with stdout/stderr capture and
//! the [`ExecutionResult`] every filesystem operation is interpreted from.

use russh::client::Handle;
use russh::ChannelMsg;

use crate::error::{Result, SshCliError};
use crate::ssh::client::ClientHandler;
use crate::ssh::RemoteSession;

/// Exit code recorded when the channel closes without reporting a status,
/// e.g. when the remote process was killed by a signal.
pub const MISSING_EXIT_STATUS: i32 = -1;

/// Streams exactly as they came off the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub exit_status: Option<u32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl RawOutput {
    pub fn new(exit_status: u32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_status: Some(exit_status),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Outcome of one remote command.
///
/// Streams are decoded as UTF-8 and right-trimmed. A stream that is empty
/// after trimming, or that is not valid UTF-8, is stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    exit_code: i32,
    stdout: Option<String>,
    stderr: Option<String>,
}

impl ExecutionResult {
    pub fn new(exit_code: i32, stdout: Option<String>, stderr: Option<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.filter(|s| !s.is_empty()),
            stderr: stderr.filter(|s| !s.is_empty()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stdout(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    /// Stdout, or the empty string when there was none.
    pub fn output(&self) -> &str {
        self.stdout.as_deref().unwrap_or("")
    }

    /// Exit code was zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Exit code was non-zero, or anything was written to stderr.
    ///
    /// Not the negation of [`is_success`](Self::is_success): a zero exit with
    /// stderr output is both.
    pub fn is_failure(&self) -> bool {
        self.exit_code != 0 || self.stderr.is_some()
    }
}

impl From<RawOutput> for ExecutionResult {
    fn from(raw: RawOutput) -> Self {
        let exit_code = raw
            .exit_status
            .map(|status| i32::try_from(status).unwrap_or(i32::MAX))
            .unwrap_or(MISSING_EXIT_STATUS);

        Self::new(exit_code, decode_stream(raw.stdout), decode_stream(raw.stderr))
    }
}

fn decode_stream(bytes: Vec<u8>) -> Option<String> {
    let text = String::from_utf8(bytes).ok()?;
    let trimmed = text.trim_end();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Run `command` on `session` and interpret the streams.
pub async fn execute(session: &mut dyn RemoteSession, command: &str) -> Result<ExecutionResult> {
    tracing::debug!("Executing remote command: {}", command);

    let result = ExecutionResult::from(session.exec(command).await?);

    tracing::debug!(
        "Remote command finished with exit code {}",
        result.exit_code()
    );

    Ok(result)
}

/// Execute a command on the remote host (non-interactive).
pub async fn exec_command(session: &Handle<ClientHandler>, command: &str) -> Result<RawOutput> {
    let wrapped_command = format!(
        "bash --norc --noprofile -c '{}'",
        command.replace('\'', "'\\''")
    );

    let mut channel = session
        .channel_open_session()
        .await
        .map_err(|e| SshCliError::Ssh(format!("Failed to open channel: {}", e)))?;

    channel
        .exec(true, wrapped_command.as_bytes())
        .await
        .map_err(|e| SshCliError::Ssh(format!("Failed to execute command: {}", e)))?;

    let mut output = RawOutput::default();

    // The exit status may arrive after EOF, so only a close ends the loop.
    loop {
        match channel.wait().await {
            Some(ChannelMsg::Data { data }) => {
                output.stdout.extend_from_slice(&data);
            }
            Some(ChannelMsg::ExtendedData { data, ext }) => {
                if ext == 1 {
                    output.stderr.extend_from_slice(&data);
                }
            }
            Some(ChannelMsg::ExitStatus { exit_status }) => {
                output.exit_status = Some(exit_status);
            }
            Some(ChannelMsg::Close) | None => {
                break;
            }
            _ => {}
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_result_success() {
        let result = ExecutionResult::from(RawOutput::new(0, "hello\n", ""));

        assert!(result.is_success());
        assert!(!result.is_failure());
        assert_eq!(result.stdout(), Some("hello"));
        assert_eq!(result.stderr(), None);
    }

    #[test]
    fn test_execution_result_failure() {
        let result = ExecutionResult::from(RawOutput::new(1, "", "error\n"));

        assert!(!result.is_success());
        assert!(result.is_failure());
        assert_eq!(result.stderr(), Some("error"));
        assert_eq!(result.output(), "");
    }

    #[test]
    fn test_zero_exit_with_stderr_is_success_and_failure() {
        let result = ExecutionResult::from(RawOutput::new(0, "done", "warning: deprecated"));

        assert!(result.is_success());
        assert!(result.is_failure());
    }

    #[test]
    fn test_whitespace_only_stream_is_absent() {
        let result = ExecutionResult::from(RawOutput::new(0, " \n\t\n", "\n"));

        assert_eq!(result.stdout(), None);
        assert_eq!(result.stderr(), None);
    }

    #[test]
    fn test_trailing_whitespace_trimmed_leading_kept() {
        let result = ExecutionResult::from(RawOutput::new(0, "  indented\nlast  \n\n", ""));

        assert_eq!(result.stdout(), Some("  indented\nlast"));
    }

    #[test]
    fn test_invalid_utf8_stream_is_absent() {
        let result = ExecutionResult::from(RawOutput::new(0, vec![0xff, 0xfe, b'a'], "ok"));

        assert_eq!(result.stdout(), None);
        assert_eq!(result.stderr(), Some("ok"));
    }

    #[test]
    fn test_missing_exit_status() {
        let raw = RawOutput {
            exit_status: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
        };
        let result = ExecutionResult::from(raw);

        assert_eq!(result.exit_code(), MISSING_EXIT_STATUS);
        assert!(!result.is_success());
        assert!(result.is_failure());
    }

    #[test]
    fn test_new_normalizes_empty_strings() {
        let result = ExecutionResult::new(0, Some(String::new()), Some(String::new()));

        assert_eq!(result.stdout(), None);
        assert_eq!(result.stderr(), None);
    }
}
