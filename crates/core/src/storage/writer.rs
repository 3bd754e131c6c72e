//! Queued uploads.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::attachment::Attachment;
use super::dirs::ensure_dir;
use super::error::StorageResult;
use super::paths::{FsRoot, ensure_resolved, parent};
use super::remote::RemoteFs;

/// Permission bits applied to every uploaded file (`rw-r--r--`).
pub const FILE_MODE: u32 = 0o644;

/// A local file staged for one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedWrite {
    /// Style the file belongs to.
    pub style: String,
    /// Local file to upload.
    pub local: PathBuf,
}

/// Styles staged for upload, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct WriteQueue {
    entries: Vec<QueuedWrite>,
}

impl WriteQueue {
    /// Stage `local` for `style`. Restaging a style replaces its file in place.
    pub fn push(&mut self, style: impl Into<String>, local: impl Into<PathBuf>) {
        let style = style.into();
        let local = local.into();
        match self.entries.iter_mut().find(|entry| entry.style == style) {
            Some(entry) => entry.local = local,
            None => self.entries.push(QueuedWrite { style, local }),
        }
    }

    /// Staged entries.
    #[must_use]
    pub fn entries(&self) -> &[QueuedWrite] {
        &self.entries
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every staged entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Upload one staged file: parent directory, content, then permissions.
pub fn upload_style<S, A>(
    session: &mut S,
    root: &FsRoot,
    attachment: &A,
    style: &str,
    local: &Path,
) -> StorageResult<()>
where
    S: RemoteFs + ?Sized,
    A: Attachment + ?Sized,
{
    let relative = attachment.path(style);
    ensure_resolved(&relative)?;
    let remote = root.join(&relative);

    ensure_dir(session, root, parent(&relative))?;
    debug!(style, local = %local.display(), remote = %remote, "uploading");
    session.upload(local, &remote)?;
    session.set_permissions(&remote, FILE_MODE)?;
    Ok(())
}

/// Upload every entry in order, stopping at the first error.
pub fn upload_all<S, A>(
    session: &mut S,
    root: &FsRoot,
    attachment: &A,
    queue: &WriteQueue,
) -> StorageResult<()>
where
    S: RemoteFs + ?Sized,
    A: Attachment + ?Sized,
{
    for entry in queue.entries() {
        upload_style(session, root, attachment, &entry.style, &entry.local)?;
    }
    Ok(())
}
