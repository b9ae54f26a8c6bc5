use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SshCliError};
use crate::ssh::config::DEFAULT_PORT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    /// Stored in plain text when set. Prefer `SSHCLI_PASSWORD` or the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_username() -> String {
    std::env::var("USER").unwrap_or_else(|_| "root".to_string())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hostname: None,
            port: default_port(),
            username: default_username(),
            password: None,
            key_path: None,
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| SshCliError::Config("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home).join(".config").join("sshcli"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Load the config file, or the defaults when there is none.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| SshCliError::Config(format!("Invalid config: {}", e)))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| SshCliError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Apply values given on the command line or through the environment.
    pub fn with_overrides(
        mut self,
        hostname: Option<String>,
        port: Option<u16>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        if hostname.is_some() {
            self.hostname = hostname;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(username) = username {
            self.username = username;
        }
        if password.is_some() {
            self.password = password;
        }
        self
    }

    /// Tilde-expanded key path.
    pub fn expanded_key_path(&self) -> Option<PathBuf> {
        self.key_path
            .as_deref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
    }

    /// Validate the configuration.
    ///
    /// Returns an error if there is no host to connect to or the port is zero.
    pub fn validate(&self) -> Result<()> {
        match self.hostname.as_deref() {
            None | Some("") => {
                return Err(SshCliError::Config(
                    "No hostname configured. Use --host, SSHCLI_HOST or 'sshcli init'".to_string(),
                ));
            }
            Some(_) => {}
        }

        if self.port == 0 {
            return Err(SshCliError::Config("Invalid port 0".to_string()));
        }

        if self.username.is_empty() {
            return Err(SshCliError::Config("No username configured".to_string()));
        }

        Ok(())
    }
}
