//! SFTP file transfer implementation.
//!
//! Replaces `scp` binary with native SFTP over SSH.

use std::path::Path;

use async_trait::async_trait;
use russh::client::Handle;
use russh_sftp::client::SftpSession;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{Result, SshCliError};
use crate::ssh::client::ClientHandler;
use crate::ssh::TransferChannel;

/// SFTP client for file transfers.
pub struct SftpClient {
    session: SftpSession,
}

impl SftpClient {
    /// Create a new SFTP client from an SSH session.
    pub async fn new(ssh_session: &Handle<ClientHandler>) -> Result<Self> {
        let channel = ssh_session
            .channel_open_session()
            .await
            .map_err(|e| SshCliError::Transfer(format!("Failed to open SFTP channel: {}", e)))?;

        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| {
                SshCliError::Transfer(format!("Failed to request SFTP subsystem: {}", e))
            })?;

        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|e| SshCliError::Transfer(format!("Failed to initialize SFTP: {}", e)))?;

        Ok(Self { session: sftp })
    }

    /// Upload a file to the remote host.
    ///
    /// Replaces: `scp local_path user@host:remote_path`
    pub async fn upload(&self, local_path: impl AsRef<Path>, remote_path: &str) -> Result<()> {
        let local_path = local_path.as_ref();

        let content = tokio::fs::read(local_path).await.map_err(|e| {
            SshCliError::Transfer(format!(
                "Failed to read local file {}: {}",
                local_path.display(),
                e
            ))
        })?;

        let mut remote_file = self
            .session
            .create(remote_path)
            .await
            .map_err(|e| SshCliError::Transfer(format!("Failed to create remote file: {}", e)))?;

        remote_file
            .write_all(&content)
            .await
            .map_err(|e| SshCliError::Transfer(format!("Failed to write to remote file: {}", e)))?;

        // Ensure data is flushed
        remote_file
            .shutdown()
            .await
            .map_err(|e| SshCliError::Transfer(format!("Failed to close remote file: {}", e)))?;

        tracing::debug!(
            "Uploaded {} ({} bytes) to {}",
            local_path.display(),
            content.len(),
            remote_path
        );

        Ok(())
    }

    /// Download a file from the remote host.
    ///
    /// Replaces: `scp user@host:remote_path local_path`
    pub async fn download(&self, remote_path: &str, local_path: impl AsRef<Path>) -> Result<()> {
        let local_path = local_path.as_ref();

        let mut remote_file = self.session.open(remote_path).await.map_err(|e| {
            SshCliError::Transfer(format!("Failed to open remote file {}: {}", remote_path, e))
        })?;

        let mut content = Vec::new();
        remote_file
            .read_to_end(&mut content)
            .await
            .map_err(|e| SshCliError::Transfer(format!("Failed to read remote file: {}", e)))?;

        tokio::fs::write(local_path, &content).await.map_err(|e| {
            SshCliError::Transfer(format!(
                "Failed to write local file {}: {}",
                local_path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Downloaded {} ({} bytes) to {}",
            remote_path,
            content.len(),
            local_path.display()
        );

        Ok(())
    }
}

#[async_trait]
impl TransferChannel for SftpClient {
    async fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()> {
        self.download(remote_path, local_path).await
    }

    async fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()> {
        self.upload(local_path, remote_path).await
    }
}
