//! File transfer through the session's SFTP sub-channel.
//!
//! Paths go to the channel untouched: the tracked directory does not apply
//! and nothing is checked beforehand.

use std::path::Path;

use super::RemoteShell;
use crate::error::Result;
use crate::ssh::SessionProvider;

impl<P: SessionProvider> RemoteShell<P> {
    /// Copy `remote_path` from the host to `local_path`.
    pub async fn download(&mut self, remote_path: &str, local_path: impl AsRef<Path>) -> Result<()> {
        let connection = self.connection().await?;
        connection.transfer.get(remote_path, local_path.as_ref()).await
    }

    /// Copy `local_path` to `remote_path` on the host.
    pub async fn upload(&mut self, local_path: impl AsRef<Path>, remote_path: &str) -> Result<()> {
        let connection = self.connection().await?;
        connection.transfer.put(local_path.as_ref(), remote_path).await
    }
}
