//! Shared configuration for Clipstore.
//!
//! This crate provides configuration types used across all other crates:
//! - SFTP connection and storage layout settings
//! - Logging settings

pub mod config;

pub use config::{AppConfig, LogSettings, SftpSettings};
