//! Pure Rust SSH transport for sshcli.
//!
//! The rest of the crate only talks to the traits defined here, so the
//! facade in [`crate::remote`] can run against russh in production and
//! against in-process fakes in tests.
//!
//! ## Modules
//!
//! - [`client`] - russh connection management and authentication
//! - [`config`] - connection parameters
//! - [`exec`] - remote command execution and [`ExecutionResult`]
//! - [`sftp`] - file transfer via SFTP

mod client;
pub mod config;
mod exec;
mod sftp;

use std::path::Path;

use async_trait::async_trait;

pub use client::{ClientHandler, RusshProvider, RusshSession};
pub use config::ConnectParams;
pub use exec::{execute, ExecutionResult, RawOutput};
pub use sftp::SftpClient;

use crate::error::Result;

/// Opens authenticated sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Perform the handshake and authenticate.
    ///
    /// Fails with [`crate::error::SshCliError::Connection`].
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn RemoteSession>>;
}

/// One live, authenticated session.
#[async_trait]
pub trait RemoteSession: Send {
    /// Run `command` to completion and return its raw streams.
    async fn exec(&mut self, command: &str) -> Result<RawOutput>;

    /// Open the file transfer sub-channel on this session.
    async fn open_transfer(&mut self) -> Result<Box<dyn TransferChannel>>;

    /// Disconnect. Calling it twice is harmless.
    async fn close(&mut self) -> Result<()>;
}

/// Bulk file transfer by path.
#[async_trait]
pub trait TransferChannel: Send {
    /// Copy `remote_path` from the host to `local_path`.
    async fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()>;

    /// Copy `local_path` to `remote_path` on the host.
    async fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()>;
}

/// Check if SSH agent is running and accessible.
///
/// Verifies that SSH_AUTH_SOCK environment variable is set and the socket exists.
pub fn is_ssh_agent_running() -> bool {
    if let Ok(sock) = std::env::var("SSH_AUTH_SOCK") {
        Path::new(&sock).exists()
    } else {
        false
    }
}
