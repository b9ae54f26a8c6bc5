//! SSH client implementation using russh.
//!
//! Provides connection management and authentication.

use std::net::ToSocketAddrs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle};
use tokio::net::UnixStream;

use crate::error::{Result, SshCliError};
use crate::ssh::config::ConnectParams;
use crate::ssh::exec::{exec_command, RawOutput};
use crate::ssh::sftp::SftpClient;
use crate::ssh::{is_ssh_agent_running, RemoteSession, SessionProvider, TransferChannel};

/// Opens sessions with russh.
#[derive(Debug, Clone, Copy, Default)]
pub struct RusshProvider;

#[async_trait]
impl SessionProvider for RusshProvider {
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn RemoteSession>> {
        let session = RusshSession::connect(params).await?;
        Ok(Box::new(session))
    }
}

/// Live russh session.
pub struct RusshSession {
    session: Handle<ClientHandler>,
    target: String,
    closed: bool,
}

impl RusshSession {
    /// Connect to an SSH server.
    pub async fn connect(params: &ConnectParams) -> Result<Self> {
        let russh_config = Arc::new(client::Config {
            // No inactivity timeout - keep connection alive indefinitely
            inactivity_timeout: None,
            // Send keep-alive every 15 seconds
            keepalive_interval: Some(std::time::Duration::from_secs(15)),
            // Allow up to 4 missed keep-alives before disconnect (60 seconds)
            keepalive_max: 4,
            ..Default::default()
        });

        // Resolve hostname to IP
        let addr = format!("{}:{}", params.hostname, params.port)
            .to_socket_addrs()
            .map_err(|e| {
                SshCliError::Connection(format!("Failed to resolve {}: {}", params.hostname, e))
            })?
            .next()
            .ok_or_else(|| {
                SshCliError::Connection(format!("No address found for {}", params.hostname))
            })?;

        let handler = ClientHandler {
            host: params.hostname.clone(),
        };

        tracing::debug!("Connecting to {}", params.target());

        let mut session = client::connect(russh_config, addr, handler)
            .await
            .map_err(|e| SshCliError::Connection(format!("Connection failed: {}", e)))?;

        Self::authenticate(&mut session, params).await?;

        tracing::debug!("Authenticated as {}", params.target());

        Ok(Self {
            session,
            target: params.target(),
            closed: false,
        })
    }

    /// Authenticate with the SSH server.
    ///
    /// A configured password is the only method tried. Without one, the agent
    /// is tried first and then the key file.
    async fn authenticate(
        session: &mut Handle<ClientHandler>,
        params: &ConnectParams,
    ) -> Result<()> {
        if let Some(password) = &params.password {
            return Self::auth_with_password(session, &params.username, password).await;
        }

        if is_ssh_agent_running() {
            match Self::auth_with_agent(session, &params.username).await {
                Ok(true) => return Ok(()),
                Ok(false) => {
                    tracing::debug!("Agent authentication: server rejected all keys");
                }
                Err(e) => {
                    tracing::debug!("Agent authentication failed: {}", e);
                }
            }
        }

        let key_path = params
            .key_path
            .clone()
            .or_else(default_key_path)
            .ok_or_else(|| {
                SshCliError::Connection(
                    "No password, agent identity or key file available".to_string(),
                )
            })?;

        Self::auth_with_key_file(session, &params.username, &key_path).await
    }

    async fn auth_with_password(
        session: &mut Handle<ClientHandler>,
        username: &str,
        password: &str,
    ) -> Result<()> {
        let auth_result = session
            .authenticate_password(username, password)
            .await
            .map_err(|e| SshCliError::Connection(format!("Password auth failed: {}", e)))?;

        if auth_result {
            Ok(())
        } else {
            Err(SshCliError::Connection(format!(
                "Server rejected password for {}",
                username
            )))
        }
    }

    /// Authenticate using SSH agent.
    async fn auth_with_agent(session: &mut Handle<ClientHandler>, username: &str) -> Result<bool> {
        let socket_path = std::env::var("SSH_AUTH_SOCK")
            .map_err(|_| SshCliError::Connection("SSH_AUTH_SOCK not set".to_string()))?;

        let stream = UnixStream::connect(&socket_path)
            .await
            .map_err(|e| SshCliError::Connection(format!("Failed to connect to agent: {}", e)))?;

        let mut agent = russh_keys::agent::client::AgentClient::connect(stream);

        let identities = agent.request_identities().await.map_err(|e| {
            SshCliError::Connection(format!("Failed to get agent identities: {}", e))
        })?;

        tracing::debug!("Agent has {} identities", identities.len());

        for identity in identities {
            let auth_result = session
                .authenticate_publickey_with(username, identity, &mut agent)
                .await;

            match auth_result {
                Ok(true) => return Ok(true),
                Ok(false) => continue,
                Err(e) => {
                    tracing::debug!("Agent auth error: {}", e);
                    continue;
                }
            }
        }

        Ok(false)
    }

    /// Authenticate using key file directly.
    async fn auth_with_key_file(
        session: &mut Handle<ClientHandler>,
        username: &str,
        key_path: &Path,
    ) -> Result<()> {
        let key = russh_keys::load_secret_key(key_path, None).map_err(|e| {
            SshCliError::Connection(format!(
                "Failed to load key {}: {}",
                key_path.display(),
                e
            ))
        })?;

        let auth_result = session
            .authenticate_publickey(username, Arc::new(key))
            .await
            .map_err(|e| SshCliError::Connection(format!("Authentication failed: {}", e)))?;

        if auth_result {
            Ok(())
        } else {
            Err(SshCliError::Connection(
                "Authentication failed. Key may require passphrase - use ssh-add first."
                    .to_string(),
            ))
        }
    }
}

#[async_trait]
impl RemoteSession for RusshSession {
    async fn exec(&mut self, command: &str) -> Result<RawOutput> {
        exec_command(&self.session, command).await
    }

    async fn open_transfer(&mut self) -> Result<Box<dyn TransferChannel>> {
        let sftp = SftpClient::new(&self.session).await?;
        Ok(Box::new(sftp))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        tracing::debug!("Disconnecting from {}", self.target);

        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await?;

        Ok(())
    }
}

fn default_key_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ssh").join("id_ed25519"))
}

/// Client handler for russh connection callbacks.
///
/// Every server key is accepted; its fingerprint is logged so the key that
/// was trusted can be recovered from the logs.
pub struct ClientHandler {
    pub host: String,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = SshCliError;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh_keys::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        tracing::info!(
            "Accepting {} host key for {}: {}",
            server_public_key.algorithm(),
            self.host,
            server_public_key.fingerprint(Default::default())
        );

        Ok(true)
    }
}
