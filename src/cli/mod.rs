pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::Password;

use crate::config::AppConfig;
use crate::error::Result;
use crate::remote::RemoteShell;
use crate::ssh::ConnectParams;

#[derive(Parser)]
#[command(name = "sshcli")]
#[command(version)]
#[command(about = "Filesystem-style operations on a remote host over SSH")]
#[command(long_about = "Run file operations on a remote host over a single SSH session.\n\nEvery command runs relative to a working directory tracked on this side of the connection.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Remote host
    #[arg(short = 'H', long, global = true, env = "SSHCLI_HOST")]
    pub host: Option<String>,

    /// Remote SSH port (default: 22)
    #[arg(short, long, global = true, env = "SSHCLI_PORT")]
    pub port: Option<u16>,

    /// Remote user
    #[arg(short, long, global = true, env = "SSHCLI_USER")]
    pub user: Option<String>,

    /// Password for password authentication
    #[arg(long, global = true, env = "SSHCLI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Prompt for the password instead of reading it from flags or config
    #[arg(long, global = true)]
    pub ask_password: bool,

    /// Remote directory to change into before running the command
    #[arg(long, global = true)]
    pub cd: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize sshcli configuration
    Init,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Read operations from stdin, one per line, over a single connection
    Session,

    #[command(flatten)]
    Op(Operation),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,
}

/// Operations on the remote host. Also the grammar of `session` lines.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Operation {
    /// Run a raw shell command
    Exec {
        /// Command to execute
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print the working directory, optionally joined with a path
    Cwd { path: Option<String> },

    /// Print the remote home directory, optionally joined with a path
    Home { path: Option<String> },

    /// Change the working directory (`~/` for home, `/` for root)
    Cd { path: String },

    /// Test whether a path exists
    Exists {
        path: String,

        /// Kind of entry to test for
        #[arg(short, long, value_enum, default_value = "any")]
        kind: EntryKind,

        /// Do not count symlinks as files or directories
        #[arg(long)]
        no_symlink: bool,

        /// For `--kind link`: what the link must point to
        #[arg(long, value_enum)]
        to: Option<LinkTo>,
    },

    /// Print a remote file
    Cat { path: String },

    /// Create an empty file or update its timestamp
    Touch { name: String },

    /// Create a directory and its parents
    Mkdir { path: String },

    /// Create or replace a symlink
    Ln { target: String, link: String },

    /// Remove a file or directory recursively
    Rm { path: String },

    /// Copy recursively, overwriting without prompting
    Cp { source: String, dest: String },

    /// Move or rename
    Mv { source: String, dest: String },

    /// List paths matching a glob pattern (`**` supported)
    Glob { pattern: String },

    /// Pack a path into <ARCHIVE>.tar.xz
    Compress { path: String, archive: String },

    /// Unpack <ARCHIVE>.tar.xz, into a directory named after it by default
    Extract {
        archive: String,
        target: Option<String>,
    },

    /// Upload a local file
    Upload { local: String, remote: String },

    /// Download a remote file
    Download { remote: String, local: String },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Any,
    File,
    Dir,
    Link,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTo {
    File,
    Dir,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Init => commands::init::execute().await,
            Commands::Config { ref command } => match command {
                ConfigCommands::Show => commands::config::show().await,
                ConfigCommands::Set { key, value } => {
                    commands::config::set(key.clone(), value.clone()).await
                }
                ConfigCommands::Edit => commands::config::edit().await,
            },
            Commands::Session => {
                let mut remote = self.connect().await?;
                let result = commands::session::execute(&mut remote).await;
                remote.close().await?;
                result
            }
            Commands::Op(ref op) => {
                let op = op.clone();
                let mut remote = self.connect().await?;
                let result = commands::ops::run(&mut remote, op).await;
                remote.close().await?;
                result
            }
        }
    }

    fn app_config(&self) -> Result<AppConfig> {
        let mut password = self.password.clone();

        if self.ask_password {
            password = Some(
                Password::new()
                    .with_prompt("SSH password")
                    .interact()?,
            );
        }

        let config = AppConfig::load()?.with_overrides(
            self.host.clone(),
            self.port,
            self.user.clone(),
            password,
        );
        config.validate()?;

        Ok(config)
    }

    async fn connect(&self) -> Result<RemoteShell> {
        let config = self.app_config()?;
        let mut remote = RemoteShell::new(ConnectParams::from(&config));

        tracing::debug!("Using {:?}", remote.params());

        remote.ensure_connected().await?;

        if let Some(dir) = &self.cd {
            commands::ops::change_dir(&mut remote, dir).await?;
        }

        Ok(remote)
    }
}

/// Print a warning line the way every command does.
pub(crate) fn warn(message: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), message);
}
