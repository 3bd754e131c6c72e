//! Core logic for Clipstore.
//!
//! This crate stores attachment files on SFTP servers. It has no async
//! runtime and no web dependencies; the transport sits behind the
//! [`storage::RemoteFs`] trait so everything above it runs against the
//! in-memory [`storage::MemoryFs`] in tests.
//!
//! # Modules
//!
//! - `storage` - Path resolution, queued writes and deletes, existence checks
//!   and public URLs for files on an SFTP server

pub mod storage;
