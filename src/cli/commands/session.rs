use std::io::IsTerminal;

use clap::Parser;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{warn, Operation};
use crate::error::{Result, SshCliError};
use crate::remote::RemoteShell;
use crate::ssh::SessionProvider;

/// Grammar of one `session` line: an operation without the global flags.
#[derive(Parser, Debug)]
#[command(name = "session", no_binary_name = true)]
struct SessionLine {
    #[command(subcommand)]
    op: Operation,
}

/// What a single input line asks for.
#[derive(Debug, PartialEq)]
enum Line {
    Empty,
    Quit,
    Op(Operation),
}

fn parse_line(line: &str) -> std::result::Result<Line, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();

    match words.first() {
        None => Ok(Line::Empty),
        Some(word) if word.starts_with('#') => Ok(Line::Empty),
        Some(&"exit") | Some(&"quit") => Ok(Line::Quit),
        Some(_) => SessionLine::try_parse_from(words).map(|parsed| Line::Op(parsed.op)),
    }
}

/// Read operations from stdin until EOF or `exit`.
///
/// Errors from a single operation are reported and the loop continues,
/// except connection errors, which end the session.
pub async fn execute<P: SessionProvider>(remote: &mut RemoteShell<P>) -> Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive {
            eprint!("{} ", style(format!("{}>", remote.current_dir().await?)).cyan());
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let op = match parse_line(&line) {
            Ok(Line::Empty) => continue,
            Ok(Line::Quit) => break,
            Ok(Line::Op(op)) => op,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        tracing::debug!("Session operation: {:?}", op);

        match super::ops::run(remote, op).await {
            Ok(()) => {}
            Err(e @ SshCliError::Connection(_)) => return Err(e),
            Err(e) => warn(&e.to_string()),
        }
    }

    Ok(())
}
