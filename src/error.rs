use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshCliError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Handshake or authentication failed. Never retried.
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// A path required before running a remote command does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote command ran but did not produce what it should have.
    #[error("Creation failed: {0}")]
    CreationFailed(String),

    #[error("SSH channel error: {0}")]
    Ssh(String),

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("SSH protocol error: {0}")]
    SshProtocol(#[from] russh::Error),
}

pub type Result<T> = std::result::Result<T, SshCliError>;
