//! `.tar.xz` archives built and unpacked on the remote host.

use super::RemoteShell;
use crate::error::{Result, SshCliError};
use crate::ssh::SessionProvider;
use crate::utils::normalize;

pub const ARCHIVE_SUFFIX: &str = ".tar.xz";

/// Archive name without a trailing `.tar.xz`, so the suffix is never doubled.
pub fn strip_archive_suffix(name: &str) -> &str {
    name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(name)
}

impl<P: SessionProvider> RemoteShell<P> {
    /// Pack `path` into `<archive_name>.tar.xz` in the tracked directory at
    /// maximum compression.
    ///
    /// Fails with `NotFound` before running anything when `path` is neither a
    /// file nor a directory, and with `CreationFailed` when no archive exists
    /// afterwards.
    pub async fn compress(&mut self, path: &str, archive_name: &str) -> Result<()> {
        let normalized = normalize(path);

        if !self.exists(&normalized).await? {
            return Err(SshCliError::NotFound(format!(
                "The path \"{}\" does not exist",
                normalized
            )));
        }

        let name = strip_archive_suffix(archive_name);
        let archive = format!("{}{}", name, ARCHIVE_SUFFIX);

        let result = self
            .execute_in_cwd(&format!("XZ_OPT=-9 tar -cvpJf {} {}", archive, normalized))
            .await?;
        tracing::debug!("tar listed:\n{}", result.output());

        let archive_path = self.cwd(Some(&archive)).await?;

        if !self.file_exists(&archive_path, true).await? {
            return Err(SshCliError::CreationFailed(format!(
                "The archive \"{}\" was not created",
                archive
            )));
        }

        tracing::info!("Created {}", archive_path);
        Ok(())
    }

    /// Unpack `<archive_name>.tar.xz` into `target_dir`, which defaults to
    /// the archive's base name and is created when missing.
    pub async fn extract(&mut self, archive_name: &str, target_dir: Option<&str>) -> Result<()> {
        let name = strip_archive_suffix(archive_name);
        let archive = format!("{}{}", name, ARCHIVE_SUFFIX);
        let archive_path = self.cwd(Some(&archive)).await?;

        if !self.file_exists(&archive_path, true).await? {
            return Err(SshCliError::NotFound(format!(
                "Archive \"{}\" does not exist",
                archive
            )));
        }

        let target = match target_dir {
            Some(dir) => normalize(dir),
            None => name.to_string(),
        };

        if !self.dir_exists(&target, true).await? {
            self.mkdir(&target).await?;
        }

        let result = self
            .execute_in_cwd(&format!("tar -xf {} -C {}", archive, target))
            .await?;

        if result.is_failure() {
            tracing::warn!(
                "tar exited with {} while extracting {}: {}",
                result.exit_code(),
                archive,
                result.stderr().unwrap_or("")
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeTree, LocalProvider, ScriptedProvider};
    use super::*;
    use crate::ssh::ConnectParams;

    #[test]
    fn test_strip_archive_suffix() {
        assert_eq!(strip_archive_suffix("backup.tar.xz"), "backup");
        assert_eq!(strip_archive_suffix("backup"), "backup");
        assert_eq!(strip_archive_suffix("a.tar.xz.tar.xz"), "a.tar.xz");
        assert_eq!(strip_archive_suffix("my.tar.xz.d"), "my.tar.xz.d");
    }

    #[tokio::test]
    async fn test_compress_missing_source_runs_nothing() {
        let provider = ScriptedProvider::new(FakeTree::new("/home/user", "/home/user"));
        let mut remote =
            RemoteShell::with_provider(ConnectParams::new("fake.host", "user"), provider.clone());

        let err = remote.compress("data", "backup").await.unwrap_err();

        assert!(matches!(err, SshCliError::NotFound(_)));
        assert!(!provider.commands().iter().any(|c| c.contains("tar")));
    }

    #[tokio::test]
    async fn test_compress_without_archive_is_creation_failed() {
        // The fake tree never gains the archive, so the post-check fails.
        let tree = FakeTree::new("/home/user", "/home/user").dir("/home/user/data");
        let provider = ScriptedProvider::new(tree);
        let mut remote =
            RemoteShell::with_provider(ConnectParams::new("fake.host", "user"), provider.clone());

        let err = remote.compress("data/", "backup.tar.xz").await.unwrap_err();

        assert!(matches!(err, SshCliError::CreationFailed(_)));
        assert!(provider
            .commands()
            .contains(&"cd /home/user; XZ_OPT=-9 tar -cvpJf backup.tar.xz data".to_string()));
        assert!(provider
            .commands()
            .contains(&"cd /home/user; [ -f /home/user/backup.tar.xz ] && exit 0".to_string()));
    }

    #[tokio::test]
    async fn test_extract_missing_archive() {
        let provider = ScriptedProvider::new(FakeTree::new("/home/user", "/home/user"));
        let mut remote =
            RemoteShell::with_provider(ConnectParams::new("fake.host", "user"), provider.clone());

        let err = remote.extract("backup", None).await.unwrap_err();

        assert!(matches!(err, SshCliError::NotFound(_)));
        assert!(!provider.commands().iter().any(|c| c.contains("mkdir")));
    }

    #[tokio::test]
    async fn test_extract_command_shape() {
        let tree = FakeTree::new("/home/user", "/home/user").file("/home/user/backup.tar.xz");
        let provider = ScriptedProvider::new(tree);
        let mut remote =
            RemoteShell::with_provider(ConnectParams::new("fake.host", "user"), provider.clone());

        remote.extract("backup.tar.xz", Some("out/./x/")).await.unwrap();

        let commands = provider.commands();
        assert!(commands.contains(&"cd /home/user; mkdir -p out/x".to_string()));
        assert_eq!(
            commands.last().map(String::as_str),
            Some("cd /home/user; tar -xf backup.tar.xz -C out/x")
        );
    }

    // Needs `tar` and `xz` on the host. Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore = "requires tar with xz support on the host"]
    async fn test_local_compress_extract_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(data.join("nested")).unwrap();
        std::fs::write(data.join("one.txt"), "1").unwrap();
        std::fs::write(data.join("nested").join("two.txt"), "2").unwrap();

        let mut remote = RemoteShell::with_provider(
            ConnectParams::new("localhost", "user"),
            LocalProvider::new(dir.path()),
        );

        remote.compress("data", "backup").await.unwrap();
        assert!(remote.file_exists("backup.tar.xz", true).await.unwrap());

        remote.extract("backup", None).await.unwrap();

        let restored = dir.path().join("backup").join("data");
        assert_eq!(std::fs::read_to_string(restored.join("one.txt")).unwrap(), "1");
        assert_eq!(
            std::fs::read_to_string(restored.join("nested").join("two.txt")).unwrap(),
            "2"
        );
    }
}
