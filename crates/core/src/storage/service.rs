//! SFTP storage adapter tying the components together.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::attachment::Attachment;
use super::config::SftpOptions;
use super::connection::Connection;
use super::deleter::{DeleteQueue, DeleteReport, delete_all};
use super::dirs;
use super::error::StorageResult;
use super::paths::ensure_resolved;
use super::reader::{download_to, file_exists};
use super::remote::Connector;
use super::url;
use super::writer::{QueuedWrite, WriteQueue, upload_all};

/// Stores attachment styles as files on an SFTP server.
///
/// One adapter owns one session and serves one caller at a time; give each
/// concurrent user its own adapter.
pub struct SftpStorage<C: Connector> {
    options: SftpOptions,
    connection: Connection<C>,
    queued_for_write: WriteQueue,
    queued_for_delete: DeleteQueue,
}

impl<C: Connector> SftpStorage<C> {
    /// Create an adapter. No connection is made until the first remote call.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the options are invalid.
    pub fn new(options: SftpOptions, connector: C) -> StorageResult<Self> {
        options.validate()?;
        Ok(Self {
            options,
            connection: Connection::new(connector),
            queued_for_write: WriteQueue::default(),
            queued_for_delete: DeleteQueue::default(),
        })
    }

    /// Get the configuration.
    #[must_use]
    pub fn options(&self) -> &SftpOptions {
        &self.options
    }

    /// The live session, connecting on first call.
    pub fn connection(&mut self) -> StorageResult<&mut C::Session> {
        self.connection.session(&self.options)
    }

    /// Whether the session has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Interpolated root-relative path of `style`.
    pub fn resolve_path<A: Attachment>(&self, attachment: &A, style: &str) -> String {
        attachment.path(style)
    }

    /// Absolute remote path of `style`.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpolated path still has placeholders.
    pub fn remote_path<A: Attachment>(&self, attachment: &A, style: &str) -> StorageResult<String> {
        let path = attachment.path(style);
        ensure_resolved(&path)?;
        Ok(self.options.fs_root.join(&path))
    }

    /// Public URL of `style`.
    pub fn public_url<A: Attachment>(&self, attachment: &A, style: &str) -> String {
        url::public_url(self.options.public_host.as_ref(), attachment, style)
    }

    /// Create every missing segment of the root-relative directory `dir`.
    pub fn ensure_dir(&mut self, dir: &str) -> StorageResult<()> {
        let session = self.connection.session(&self.options)?;
        dirs::ensure_dir(session, &self.options.fs_root, dir)
    }

    /// Stage `local` as the new file for `style`.
    pub fn queue_write(&mut self, style: impl Into<String>, local: impl Into<PathBuf>) {
        self.queued_for_write.push(style, local);
    }

    /// Stage a root-relative path for deletion.
    pub fn queue_delete(&mut self, path: impl Into<String>) {
        self.queued_for_delete.push(path);
    }

    /// Stage the files of `styles` for deletion.
    ///
    /// Does nothing for an attachment that never had a file.
    pub fn queue_all_for_delete<A, I, S>(&mut self, attachment: &A, styles: I)
    where
        A: Attachment,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if attachment.original_filename().is_none() {
            return;
        }
        for style in styles {
            self.queued_for_delete.push(attachment.path(style.as_ref()));
        }
    }

    /// Writes waiting for [`flush_writes`](Self::flush_writes).
    #[must_use]
    pub fn queued_writes(&self) -> &[QueuedWrite] {
        self.queued_for_write.entries()
    }

    /// Deletes waiting for [`flush_deletes`](Self::flush_deletes).
    #[must_use]
    pub fn queued_deletes(&self) -> &[String] {
        self.queued_for_delete.paths()
    }

    /// Upload every staged file, then notify the attachment and clear the queue.
    ///
    /// # Errors
    ///
    /// Returns the first connection, mkdir, upload or permission error. The
    /// queue is kept so the flush can be repeated.
    pub fn flush_writes<A: Attachment>(&mut self, attachment: &mut A) -> StorageResult<()> {
        if !self.queued_for_write.is_empty() {
            let session = self.connection.session(&self.options)?;
            upload_all(session, &self.options.fs_root, &*attachment, &self.queued_for_write)?;
            info!(count = self.queued_for_write.entries().len(), "flushed writes");
        }

        attachment.after_flush_writes(self.queued_for_write.entries());
        self.queued_for_write.clear();
        Ok(())
    }

    /// Delete every staged path and prune emptied directories.
    ///
    /// Per-path failures are logged and counted, never returned. The queue is
    /// cleared once every path has been attempted.
    ///
    /// # Errors
    ///
    /// Returns an error only when no session can be established; the queue is
    /// kept in that case since nothing was attempted.
    pub fn flush_deletes(&mut self) -> StorageResult<DeleteReport> {
        if self.queued_for_delete.is_empty() {
            return Ok(DeleteReport::default());
        }

        let session = self.connection.session(&self.options)?;
        let report = delete_all(session, &self.options.fs_root, &self.queued_for_delete);
        info!(
            removed = report.removed,
            missing = report.missing,
            failed = report.failed,
            pruned_dirs = report.pruned_dirs,
            "flushed deletes"
        );

        self.queued_for_delete.clear();
        Ok(report)
    }

    /// Whether the file for `style` is on the server.
    ///
    /// An attachment without an original filename is reported missing without
    /// any remote call. Failures to confirm are reported as missing.
    pub fn exists<A: Attachment>(&mut self, attachment: &A, style: &str) -> bool {
        if attachment.original_filename().is_none() {
            return false;
        }

        let path = attachment.path(style);
        let result = self
            .connection
            .session(&self.options)
            .and_then(|session| file_exists(session, &self.options.fs_root, &path));

        match result {
            Ok(found) => found,
            Err(err) => {
                debug!(path = %path, error = %err, "cannot confirm existence");
                false
            }
        }
    }

    /// Download the file for `style` into `dest`.
    ///
    /// Best effort: failures are logged and reported as `false`.
    pub fn copy_to_local_file<A: Attachment>(&mut self, attachment: &A, style: &str, dest: &Path) -> bool {
        let path = attachment.path(style);
        let result = self
            .connection
            .session(&self.options)
            .and_then(|session| download_to(session, &self.options.fs_root, &path, dest));

        match result {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    path = %path,
                    local = %dest.display(),
                    error = %err,
                    "cannot copy to local file"
                );
                false
            }
        }
    }
}
