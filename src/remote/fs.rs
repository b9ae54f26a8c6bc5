//! Filesystem operations expressed as shell commands.
//!
//! Type tests are `[ -f ]`, `[ -d ]` and `[ -L ]` conditionals whose exit
//! code is the answer. Mutations report nothing: a failed `rm` or `mkdir`
//! is only logged, and callers that need certainty check existence after.

use super::RemoteShell;
use crate::error::Result;
use crate::ssh::SessionProvider;
use crate::utils::normalize;

/// What a symlink has to resolve to for [`RemoteShell::symlink_exists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkTarget {
    /// Any symlink, dangling ones included.
    #[default]
    Any,
    /// A symlink that resolves to a regular file.
    File,
    /// A symlink that resolves to a directory.
    Dir,
}

impl<P: SessionProvider> RemoteShell<P> {
    /// `[ -<flag> <path> ] && exit 0`, run in the tracked directory.
    async fn test_path(&mut self, flag: char, path: &str) -> Result<bool> {
        let result = self
            .execute_in_cwd(&format!("[ -{} {} ] && exit 0", flag, path))
            .await?;

        Ok(result.exit_code() == 0)
    }

    /// Run a mutation whose failure is deliberately not reported.
    async fn run_unchecked(&mut self, action: &str) -> Result<()> {
        let result = self.execute_in_cwd(action).await?;

        if result.is_failure() {
            tracing::warn!(
                "Ignoring failure of '{}' (exit code {}): {}",
                action,
                result.exit_code(),
                result.stderr().unwrap_or("")
            );
        }

        Ok(())
    }

    /// Whether `path` is a regular file. Symlinks to files count unless
    /// `include_symlink` is false.
    pub async fn file_exists(&mut self, path: &str, include_symlink: bool) -> Result<bool> {
        let normalized = normalize(path);
        let exists = self.test_path('f', &normalized).await?;

        if !include_symlink && exists {
            return Ok(!self.test_path('L', &normalized).await?);
        }

        Ok(exists)
    }

    /// Whether `path` is a directory. Symlinks to directories count unless
    /// `include_symlink` is false.
    pub async fn dir_exists(&mut self, path: &str, include_symlink: bool) -> Result<bool> {
        let normalized = normalize(path);
        let exists = self.test_path('d', &normalized).await?;

        if !include_symlink && exists {
            return Ok(!self.test_path('L', &normalized).await?);
        }

        Ok(exists)
    }

    /// Whether `path` is a symlink resolving to `target`.
    pub async fn symlink_exists(&mut self, path: &str, target: LinkTarget) -> Result<bool> {
        let normalized = normalize(path);
        let is_symlink = self.test_path('L', &normalized).await?;

        if !is_symlink {
            return Ok(false);
        }

        match target {
            LinkTarget::Any => Ok(true),
            LinkTarget::File => self.test_path('f', &normalized).await,
            LinkTarget::Dir => self.test_path('d', &normalized).await,
        }
    }

    /// Whether `path` is a file or a directory.
    pub async fn exists(&mut self, path: &str) -> Result<bool> {
        Ok(self.file_exists(path, true).await? || self.dir_exists(path, true).await?)
    }

    /// Contents of `path`, or the empty string when there is nothing to show.
    pub async fn read_file(&mut self, path: &str) -> Result<String> {
        let result = self
            .execute_in_cwd(&format!("cat {}", normalize(path)))
            .await?;

        Ok(result.output().to_string())
    }

    /// Print the contents of `path` to stdout.
    pub async fn cat(&mut self, path: &str) -> Result<()> {
        let content = self.read_file(path).await?;
        println!("{}", content);
        Ok(())
    }

    pub async fn touch(&mut self, name: &str) -> Result<()> {
        self.run_unchecked(&format!("touch {}", name)).await
    }

    /// Create `path` and any missing parents. An existing directory is fine.
    pub async fn mkdir(&mut self, path: &str) -> Result<()> {
        self.run_unchecked(&format!("mkdir -p {}", path)).await
    }

    /// Point `link_path` at `target`, replacing an existing link.
    pub async fn symlink(&mut self, target: &str, link_path: &str) -> Result<()> {
        self.run_unchecked(&format!("ln -sfn {} {}", target, link_path))
            .await
    }

    /// Remove `path` recursively. A missing path is fine.
    pub async fn rm(&mut self, path: &str) -> Result<()> {
        self.run_unchecked(&format!("rm -rf {}", path)).await
    }

    /// Copy recursively, answering yes to any overwrite prompt.
    pub async fn cp(&mut self, source: &str, dest: &str) -> Result<()> {
        self.run_unchecked(&format!("yes | cp -rf {} {}", source, dest))
            .await
    }

    pub async fn mv(&mut self, source: &str, dest: &str) -> Result<()> {
        self.run_unchecked(&format!("mv {} {}", source, dest)).await
    }

    /// Expand `pattern` remotely with bash globbing (`**` included).
    pub async fn glob(&mut self, pattern: &str) -> Result<Vec<String>> {
        let result = self
            .execute_in_cwd(&format!("shopt -s globstar; ls {}", pattern))
            .await?;

        Ok(parse_glob_output(result.output()))
    }
}

/// Turn `ls` output into names.
///
/// Blank lines are dropped. When a pattern matches a directory, `ls` prints a
/// `dir:` header before its entries; the trailing colon is removed.
pub fn parse_glob_output(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.strip_suffix(':').unwrap_or(line).to_string())
        .collect()
}
