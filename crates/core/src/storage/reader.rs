//! Existence probing and downloads.

use std::path::Path;

use tracing::debug;

use super::error::StorageResult;
use super::paths::{FsRoot, base_name, ensure_resolved, parent};
use super::remote::RemoteFs;

/// Whether the root-relative `path` is present in its parent's listing.
pub fn file_exists<S>(session: &mut S, root: &FsRoot, path: &str) -> StorageResult<bool>
where
    S: RemoteFs + ?Sized,
{
    ensure_resolved(path)?;
    let dir = root.join(parent(path));
    let name = base_name(path);

    let entries = session.list(&dir)?;
    let found = entries.iter().any(|entry| entry.name == name);
    debug!(dir = %dir, name, found, "checked remote file");
    Ok(found)
}

/// Download the root-relative `path` into `dest`.
pub fn download_to<S>(session: &mut S, root: &FsRoot, path: &str, dest: &Path) -> StorageResult<()>
where
    S: RemoteFs + ?Sized,
{
    ensure_resolved(path)?;
    let remote = root.join(path);
    debug!(remote = %remote, local = %dest.display(), "copying to local file");
    session.download(&remote, dest)
}
