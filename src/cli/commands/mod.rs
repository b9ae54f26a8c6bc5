pub mod config;
pub mod init;
pub mod ops;
pub mod session;
