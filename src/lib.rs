//! Filesystem-style operations on a remote host over one SSH session.
//!
//! [`remote::RemoteShell`] is the entry point: it connects lazily, tracks a
//! working directory on the client side and turns each call into a shell
//! command whose exit code and output become the result.

pub mod cli;
pub mod config;
pub mod error;
pub mod remote;
pub mod ssh;
pub mod utils;
