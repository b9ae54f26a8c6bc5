use console::style;

use crate::cli::{warn, EntryKind, LinkTo, Operation};
use crate::error::Result;
use crate::remote::{LinkTarget, RemoteShell, HOME_MARKER, ROOT_MARKER};
use crate::ssh::SessionProvider;

/// Run one operation and print its outcome.
pub async fn run<P: SessionProvider>(remote: &mut RemoteShell<P>, op: Operation) -> Result<()> {
    match op {
        Operation::Exec { command } => {
            let result = remote.execute_in_cwd(&command.join(" ")).await?;

            if let Some(stdout) = result.stdout() {
                println!("{}", stdout);
            }
            if let Some(stderr) = result.stderr() {
                eprintln!("{}", style(stderr).red());
            }
            if !result.is_success() {
                eprintln!(
                    "{}",
                    style(format!("exit code {}", result.exit_code())).dim()
                );
            }
        }
        Operation::Cwd { path } => {
            println!("{}", remote.cwd(path.as_deref()).await?);
        }
        Operation::Home { path } => {
            println!("{}", remote.home(path.as_deref()).await?);
        }
        Operation::Cd { path } => {
            change_dir(remote, &path).await?;
            println!("{}", remote.current_dir().await?);
        }
        Operation::Exists {
            path,
            kind,
            no_symlink,
            to,
        } => {
            let found = exists(remote, &path, kind, no_symlink, to).await?;

            if found {
                println!("{} {}", style("✓").green().bold(), path);
            } else {
                println!("{} {}", style("✗").red().bold(), style(&path).dim());
            }
        }
        Operation::Cat { path } => remote.cat(&path).await?,
        Operation::Touch { name } => remote.touch(&name).await?,
        Operation::Mkdir { path } => remote.mkdir(&path).await?,
        Operation::Ln { target, link } => remote.symlink(&target, &link).await?,
        Operation::Rm { path } => remote.rm(&path).await?,
        Operation::Cp { source, dest } => remote.cp(&source, &dest).await?,
        Operation::Mv { source, dest } => remote.mv(&source, &dest).await?,
        Operation::Glob { pattern } => {
            for name in remote.glob(&pattern).await? {
                println!("{}", name);
            }
        }
        Operation::Compress { path, archive } => {
            remote.compress(&path, &archive).await?;
            println!(
                "{} Created {}",
                style("✓").green().bold(),
                style(remote.cwd(Some(&archive_file(&archive))).await?).cyan()
            );
        }
        Operation::Extract { archive, target } => {
            remote.extract(&archive, target.as_deref()).await?;
            println!("{} Extracted {}", style("✓").green().bold(), archive);
        }
        Operation::Upload { local, remote: dest } => {
            remote.upload(&local, &dest).await?;
            println!("{} {} → {}", style("↑").cyan().bold(), local, dest);
        }
        Operation::Download { remote: source, local } => {
            remote.download(&source, &local).await?;
            println!("{} {} → {}", style("↓").cyan().bold(), source, local);
        }
    }

    Ok(())
}

/// Change directory, warning when the target was not a directory.
pub async fn change_dir<P: SessionProvider>(remote: &mut RemoteShell<P>, path: &str) -> Result<()> {
    let before = remote.current_dir().await?.to_string();
    remote.change_dir(path).await?;

    let unchanged = remote.current_dir().await? == before;
    let is_marker = path == HOME_MARKER || path == "~" || path == ROOT_MARKER;

    if unchanged && !is_marker && crate::utils::join(&before, path) != before {
        warn(&format!("No such directory: {}", path));
    }

    Ok(())
}

async fn exists<P: SessionProvider>(
    remote: &mut RemoteShell<P>,
    path: &str,
    kind: EntryKind,
    no_symlink: bool,
    to: Option<LinkTo>,
) -> Result<bool> {
    match kind {
        EntryKind::Any => remote.exists(path).await,
        EntryKind::File => remote.file_exists(path, !no_symlink).await,
        EntryKind::Dir => remote.dir_exists(path, !no_symlink).await,
        EntryKind::Link => {
            let target = match to {
                None => LinkTarget::Any,
                Some(LinkTo::File) => LinkTarget::File,
                Some(LinkTo::Dir) => LinkTarget::Dir,
            };
            remote.symlink_exists(path, target).await
        }
    }
}

fn archive_file(archive: &str) -> String {
    format!(
        "{}{}",
        crate::remote::strip_archive_suffix(archive),
        crate::remote::ARCHIVE_SUFFIX
    )
}
