//! Stateful filesystem facade over one SSH session.
//!
//! Every command runs in a fresh remote shell, so the "current directory" is
//! kept here on the client and every composed command starts with an
//! explicit `cd` into it.

mod archive;
mod fs;
mod transfer;

#[cfg(test)]
pub(crate) mod testing;

pub use archive::{strip_archive_suffix, ARCHIVE_SUFFIX};
pub use fs::{parse_glob_output, LinkTarget};

use crate::error::Result;
use crate::ssh::{
    execute, ConnectParams, ExecutionResult, RemoteSession, RusshProvider, SessionProvider,
    TransferChannel,
};
use crate::utils::{join, normalize};

/// Argument to [`RemoteShell::change_dir`] that selects the home directory.
pub const HOME_MARKER: &str = "~/";

/// Argument to [`RemoteShell::change_dir`] that selects the root directory.
pub const ROOT_MARKER: &str = "/";

/// The session and its transfer channel. They are opened and dropped
/// together, so one is never live without the other.
struct Connection {
    session: Box<dyn RemoteSession>,
    transfer: Box<dyn TransferChannel>,
}

/// Remote host driven through shell commands.
///
/// Connects lazily on the first operation. Operations take `&mut self`, so a
/// single instance is always driven sequentially. Dropping the instance drops
/// the session, which disconnects it.
pub struct RemoteShell<P: SessionProvider = RusshProvider> {
    params: ConnectParams,
    provider: P,
    connection: Option<Connection>,
    cwd: String,
}

impl RemoteShell<RusshProvider> {
    pub fn new(params: ConnectParams) -> Self {
        Self::with_provider(params, RusshProvider)
    }
}

impl<P: SessionProvider> RemoteShell<P> {
    pub fn with_provider(params: ConnectParams, provider: P) -> Self {
        Self {
            params,
            provider,
            connection: None,
            cwd: String::new(),
        }
    }

    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Connect if not already connected.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        self.connection().await.map(|_| ())
    }

    /// Disconnect. The next operation reconnects.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(mut connection) = self.connection.take() {
            drop(connection.transfer);
            connection.session.close().await?;
        }

        Ok(())
    }

    async fn connection(&mut self) -> Result<&mut Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => self.open().await?,
        };

        Ok(self.connection.insert(connection))
    }

    async fn open(&mut self) -> Result<Connection> {
        tracing::debug!("Opening session to {}", self.params.target());

        let mut session = self.provider.connect(&self.params).await?;
        let transfer = session.open_transfer().await?;

        // The tracked directory starts wherever the remote shell starts.
        let pwd = execute(session.as_mut(), "pwd").await?;
        self.cwd = pwd.output().to_string();

        tracing::debug!("Remote working directory: {}", self.cwd);

        Ok(Connection { session, transfer })
    }

    /// Run `command` as is, without anchoring it at the tracked directory.
    pub async fn execute(&mut self, command: &str) -> Result<ExecutionResult> {
        let connection = self.connection().await?;
        execute(connection.session.as_mut(), command).await
    }

    /// Run `action` after a `cd` into the tracked directory.
    pub async fn execute_in_cwd(&mut self, action: &str) -> Result<ExecutionResult> {
        self.ensure_connected().await?;
        let command = format!("cd {}; {}", self.cwd, action);
        self.execute(&command).await
    }

    /// The tracked working directory, as held on the client.
    pub async fn current_dir(&mut self) -> Result<&str> {
        self.ensure_connected().await?;
        Ok(&self.cwd)
    }

    /// Overwrite the tracked working directory without checking that it
    /// exists. Use [`change_dir`](Self::change_dir) for a checked change.
    pub fn set_dir(&mut self, path: &str) {
        self.cwd = normalize(path);
        tracing::debug!("Tracked working directory set to {}", self.cwd);
    }

    /// Ask the remote shell for the tracked directory, optionally joined with
    /// `suffix`.
    pub async fn cwd(&mut self, suffix: Option<&str>) -> Result<String> {
        self.ensure_connected().await?;
        let command = format!("cd {}; pwd", self.cwd);
        let result = self.execute(&command).await?;

        Ok(with_suffix(result.output(), suffix))
    }

    /// The remote user's home directory, optionally joined with `suffix`.
    pub async fn home(&mut self, suffix: Option<&str>) -> Result<String> {
        let result = self.execute("eval echo ~$USER").await?;

        Ok(with_suffix(result.output(), suffix))
    }

    /// Change the tracked directory.
    ///
    /// `~` and `~/` go to the home directory and `/` to the root, both
    /// unchecked. Anything else is resolved against the tracked directory and
    /// only committed when it is a directory; otherwise nothing changes.
    pub async fn change_dir(&mut self, path: &str) -> Result<()> {
        self.ensure_connected().await?;

        if path == HOME_MARKER || path == "~" {
            let home = self.home(None).await?;
            self.set_dir(&home);
            return Ok(());
        }

        if path == ROOT_MARKER {
            self.set_dir(ROOT_MARKER);
            return Ok(());
        }

        let resolved = join(&self.cwd, path);

        if self.dir_exists(&resolved, true).await? {
            self.set_dir(&resolved);
        } else {
            tracing::debug!("Not changing directory: {} is not a directory", resolved);
        }

        Ok(())
    }
}

// An absolute suffix replaces the base instead of being nested under it, so
// `cwd(Some("/etc"))` is `/etc` rather than `<cwd>/etc`.
fn with_suffix(base: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) if !suffix.is_empty() => join(base, suffix),
        _ => base.to_string(),
    }
}
