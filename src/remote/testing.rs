//! In-process session providers for tests.
//!
//! [`ScriptedProvider`] records every command and answers from a closure,
//! typically a [`FakeTree`]. [`LocalProvider`] runs commands with the local
//! `bash` inside a fixture directory, so shell semantics are real.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Result, SshCliError};
use crate::ssh::{ConnectParams, RawOutput, RemoteSession, SessionProvider, TransferChannel};
use crate::utils::join;

type Handler = Arc<dyn Fn(&str) -> RawOutput + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOp {
    Get { remote: String, local: PathBuf },
    Put { local: PathBuf, remote: String },
}

#[derive(Default)]
struct Log {
    commands: Vec<String>,
    transfers: Vec<TransferOp>,
    connects: usize,
    transfer_channels: usize,
    closes: usize,
}

#[derive(Clone)]
pub struct ScriptedProvider {
    handler: Handler,
    log: Arc<Mutex<Log>>,
    connect_error: Option<String>,
    exec_error_on: Option<String>,
}

impl ScriptedProvider {
    pub fn new(tree: FakeTree) -> Self {
        Self::with_handler(move |command| tree.respond(command))
    }

    pub fn with_handler(handler: impl Fn(&str) -> RawOutput + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            log: Arc::default(),
            connect_error: None,
            exec_error_on: None,
        }
    }

    /// Every connect attempt fails with `message`.
    pub fn failing(message: &str) -> Self {
        let mut provider = Self::with_handler(|_| RawOutput::new(0, "", ""));
        provider.connect_error = Some(message.to_string());
        provider
    }

    /// Executing exactly `command` fails at the transport level.
    pub fn failing_exec_on(mut self, command: &str) -> Self {
        self.exec_error_on = Some(command.to_string());
        self
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }

    pub fn commands(&self) -> Vec<String> {
        self.log().commands.clone()
    }

    pub fn transfers(&self) -> Vec<TransferOp> {
        self.log().transfers.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.log().connects
    }

    pub fn transfer_count(&self) -> usize {
        self.log().transfer_channels
    }

    pub fn close_count(&self) -> usize {
        self.log().closes
    }
}

#[async_trait]
impl SessionProvider for ScriptedProvider {
    async fn connect(&self, _params: &ConnectParams) -> Result<Box<dyn RemoteSession>> {
        if let Some(message) = &self.connect_error {
            return Err(SshCliError::Connection(message.clone()));
        }

        self.log().connects += 1;

        Ok(Box::new(ScriptedSession {
            provider: self.clone(),
        }))
    }
}

struct ScriptedSession {
    provider: ScriptedProvider,
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn exec(&mut self, command: &str) -> Result<RawOutput> {
        self.provider.log().commands.push(command.to_string());

        if self.provider.exec_error_on.as_deref() == Some(command) {
            return Err(SshCliError::Ssh("channel closed".to_string()));
        }

        Ok((self.provider.handler)(command))
    }

    async fn open_transfer(&mut self) -> Result<Box<dyn TransferChannel>> {
        self.provider.log().transfer_channels += 1;

        Ok(Box::new(ScriptedTransfer {
            log: self.provider.log.clone(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.provider.log().closes += 1;
        Ok(())
    }
}

struct ScriptedTransfer {
    log: Arc<Mutex<Log>>,
}

#[async_trait]
impl TransferChannel for ScriptedTransfer {
    async fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()> {
        self.log.lock().unwrap().transfers.push(TransferOp::Get {
            remote: remote_path.to_string(),
            local: local_path.to_path_buf(),
        });
        Ok(())
    }

    async fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()> {
        self.log.lock().unwrap().transfers.push(TransferOp::Put {
            local: local_path.to_path_buf(),
            remote: remote_path.to_string(),
        });
        Ok(())
    }
}

/// Read-only remote filesystem that understands the type-test, `pwd` and
/// home queries. Any other command succeeds with no output.
#[derive(Debug, Clone)]
pub struct FakeTree {
    start_dir: String,
    home: String,
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
    links: BTreeSet<String>,
}

impl FakeTree {
    pub fn new(start_dir: &str, home: &str) -> Self {
        Self {
            start_dir: start_dir.to_string(),
            home: home.to_string(),
            files: BTreeSet::new(),
            dirs: BTreeSet::new(),
            links: BTreeSet::new(),
        }
        .dir(start_dir)
        .dir(home)
    }

    /// Add a directory and all of its ancestors.
    pub fn dir(mut self, path: &str) -> Self {
        let mut current = path.to_string();
        loop {
            self.dirs.insert(current.clone());
            match current.rfind('/') {
                Some(0) | None => break,
                Some(index) => current.truncate(index),
            }
        }
        self.dirs.insert("/".to_string());
        self
    }

    /// Add a regular file, creating its parent directories.
    pub fn file(mut self, path: &str) -> Self {
        if let Some(index) = path.rfind('/') {
            if index > 0 {
                self = self.dir(&path[..index]);
            }
        }
        self.files.insert(path.to_string());
        self
    }

    /// Mark `path` as a symlink. Whatever it was added as is what it
    /// resolves to; a path added only as a link is dangling.
    pub fn link(mut self, path: &str) -> Self {
        self.links.insert(path.to_string());
        self
    }

    pub fn respond(&self, command: &str) -> RawOutput {
        match command {
            "pwd" => return RawOutput::new(0, format!("{}\n", self.start_dir), ""),
            "eval echo ~$USER" => return RawOutput::new(0, format!("{}\n", self.home), ""),
            _ => {}
        }

        let Some((dir, action)) = command
            .strip_prefix("cd ")
            .and_then(|rest| rest.split_once("; "))
        else {
            return RawOutput::new(0, "", "");
        };

        if action == "pwd" {
            return RawOutput::new(0, format!("{}\n", dir), "");
        }

        let test = action
            .strip_prefix("[ -")
            .and_then(|rest| rest.strip_suffix(" ] && exit 0"))
            .and_then(|rest| rest.split_once(' '));

        match test {
            Some((flag, path)) => {
                let path = join(dir, path);
                let hit = match flag {
                    "f" => self.files.contains(&path),
                    "d" => self.dirs.contains(&path),
                    "L" => self.links.contains(&path),
                    _ => false,
                };
                RawOutput::new(if hit { 0 } else { 1 }, "", "")
            }
            None => RawOutput::new(0, "", ""),
        }
    }
}

/// Runs commands with the local bash, rooted at a fixture directory.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    pub fn new(root: &Path) -> Self {
        // Canonical so that `pwd` output matches what tests compute.
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        Self { root }
    }
}

#[async_trait]
impl SessionProvider for LocalProvider {
    async fn connect(&self, _params: &ConnectParams) -> Result<Box<dyn RemoteSession>> {
        Ok(Box::new(LocalSession {
            root: self.root.clone(),
        }))
    }
}

struct LocalSession {
    root: PathBuf,
}

#[async_trait]
impl RemoteSession for LocalSession {
    async fn exec(&mut self, command: &str) -> Result<RawOutput> {
        let output = tokio::process::Command::new("bash")
            .arg("-c")
            .arg(command)
            .current_dir(&self.root)
            .output()
            .await?;

        Ok(RawOutput {
            exit_status: output.status.code().and_then(|code| u32::try_from(code).ok()),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn open_transfer(&mut self) -> Result<Box<dyn TransferChannel>> {
        Ok(Box::new(LocalTransfer {
            root: self.root.clone(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct LocalTransfer {
    root: PathBuf,
}

#[async_trait]
impl TransferChannel for LocalTransfer {
    async fn get(&mut self, remote_path: &str, local_path: &Path) -> Result<()> {
        tokio::fs::copy(self.root.join(remote_path), local_path)
            .await
            .map_err(|e| SshCliError::Transfer(format!("get {}: {}", remote_path, e)))?;
        Ok(())
    }

    async fn put(&mut self, local_path: &Path, remote_path: &str) -> Result<()> {
        tokio::fs::copy(local_path, self.root.join(remote_path))
            .await
            .map_err(|e| SshCliError::Transfer(format!("put {}: {}", remote_path, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_tree_adds_ancestors() {
        let tree = FakeTree::new("/home/user", "/home/user").file("/srv/www/index.html");

        assert!(tree.dirs.contains("/srv/www"));
        assert!(tree.dirs.contains("/srv"));
        assert!(tree.dirs.contains("/"));
        assert!(tree.dirs.contains("/home"));
    }

    #[test]
    fn test_fake_tree_resolves_relative_tests() {
        let tree = FakeTree::new("/home/user", "/home/user").file("/home/user/a.txt");

        let hit = tree.respond("cd /home/user; [ -f a.txt ] && exit 0");
        let miss = tree.respond("cd /home/user; [ -d a.txt ] && exit 0");

        assert_eq!(hit.exit_status, Some(0));
        assert_eq!(miss.exit_status, Some(1));
    }
}
