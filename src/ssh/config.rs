//! SSH connection parameters.

use std::path::PathBuf;

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Everything needed to open a session to one host.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Remote hostname or address.
    pub hostname: String,

    /// Remote SSH port.
    pub port: u16,

    /// Login user.
    pub username: String,

    /// Password for password authentication. When absent, the agent and
    /// key file are tried instead.
    pub password: Option<String>,

    /// Private key used when no password is set and the agent has no
    /// accepted identity.
    pub key_path: Option<PathBuf>,
}

impl ConnectParams {
    /// Create parameters for `username@hostname` on the default port.
    pub fn new(hostname: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_PORT,
            username: username.into(),
            password: None,
            key_path: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_key_path(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(key_path.into());
        self
    }

    /// `user@host:port`, used in log lines and error messages.
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.username, self.hostname, self.port)
    }
}

// Passwords never reach logs through `{:?}`.
impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("key_path", &self.key_path)
            .finish()
    }
}

impl From<&crate::config::AppConfig> for ConnectParams {
    fn from(app_config: &crate::config::AppConfig) -> Self {
        let mut params = Self::new(
            app_config.hostname.clone().unwrap_or_default(),
            app_config.username.clone(),
        )
        .with_port(app_config.port);

        if let Some(password) = &app_config.password {
            params = params.with_password(password.clone());
        }
        if let Some(key_path) = app_config.expanded_key_path() {
            params = params.with_key_path(key_path);
        }

        params
    }
}
