//! SFTP storage for styled file attachments.
//!
//! Each attachment style maps to one file under a configured root directory
//! on an SFTP server. Writes and deletes are queued and applied in batches;
//! directories are created on demand and pruned once empty.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SftpStorage                              │
//! │   queue_write / flush_writes      queue_delete / flush_deletes   │
//! │   exists / copy_to_local_file     public_url / remote_path       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ writer ─ dirs::ensure_dir        │ deleter ─ dirs::prune_empty_… │
//! ├─────────────────────────────────────────────────────────────────┤
//! │              Connection  (one lazily opened session)             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   RemoteFs:  Ssh2Session (feature `sftp`)  │  MemoryFs           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod attachment;
mod config;
mod connection;
mod deleter;
mod dirs;
mod error;
mod memory;
mod paths;
mod reader;
mod remote;
mod service;
#[cfg(feature = "sftp")]
mod sftp;
mod url;
mod writer;

pub use attachment::{Attachment, TemplatePaths};
pub use config::{Auth, SftpOptions};
pub use connection::Connection;
pub use deleter::{DeleteQueue, DeleteReport, Removal, delete_all, delete_path};
pub use dirs::{ensure_dir, prune_empty_ancestors};
pub use error::{StatusCode, StatusError, StorageError, StorageResult};
pub use memory::{MemoryFile, MemoryFs, Op, OpCounts};
pub use paths::{
    FsRoot, PUBLIC_URL_PLACEHOLDER, STYLE_TOKEN, base_name, ensure_resolved, normalize_templates,
    parent,
};
pub use reader::{download_to, file_exists};
pub use remote::{Connector, DirEntry, RemoteFs};
pub use service::SftpStorage;
#[cfg(feature = "sftp")]
pub use sftp::{Ssh2Connector, Ssh2Session};
pub use url::{HostFn, PublicHost, public_url};
pub use writer::{FILE_MODE, QueuedWrite, WriteQueue, upload_all, upload_style};
