//! Command implementations.

pub mod common;
pub mod config;
pub mod init;
pub mod plan;
pub mod process;
pub mod serve;
