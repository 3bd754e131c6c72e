//! Remote filesystem capability contract.
//!
//! Any transport able to list, create and remove directories, move file
//! contents both ways, remove files and set permission bits can back the
//! adapter. Every call may fail with a [`StorageError::Status`].
//!
//! [`StorageError::Status`]: super::error::StorageError::Status

use std::path::Path;

use super::config::SftpOptions;
use super::error::StorageResult;

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name without its directory.
    pub name: String,
}

impl DirEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Whether the name starts with `.` (including `.` and `..`).
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// An established remote filesystem session.
///
/// Sessions are stateful and serve one request at a time, hence `&mut self`.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteFs {
    /// List the entries of `dir`.
    fn list(&mut self, dir: &str) -> StorageResult<Vec<DirEntry>>;

    /// Create the directory `path`. Its parent must exist.
    fn mkdir(&mut self, path: &str) -> StorageResult<()>;

    /// Remove the empty directory `path`.
    fn rmdir(&mut self, path: &str) -> StorageResult<()>;

    /// Copy a local file to `remote`, replacing any existing file.
    fn upload(&mut self, local: &Path, remote: &str) -> StorageResult<()>;

    /// Copy `remote` into a local file.
    fn download(&mut self, remote: &str, local: &Path) -> StorageResult<()>;

    /// Remove the file `path`.
    fn remove(&mut self, path: &str) -> StorageResult<()>;

    /// Set the permission bits of `path`.
    fn set_permissions(&mut self, path: &str, mode: u32) -> StorageResult<()>;
}

/// Opens [`RemoteFs`] sessions.
#[cfg_attr(test, mockall::automock(type Session = MockRemoteFs;))]
pub trait Connector {
    /// Session type produced by this connector.
    type Session: RemoteFs;

    /// Perform the handshake and authenticate.
    fn connect(&self, options: &SftpOptions) -> StorageResult<Self::Session>;
}
