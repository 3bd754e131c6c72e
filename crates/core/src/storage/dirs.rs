//! Remote directory tree maintenance.

use tracing::debug;

use super::error::StorageResult;
use super::paths::{FsRoot, parent};
use super::remote::RemoteFs;

/// Create every missing segment of the root-relative directory `dir`.
///
/// Costs one listing per segment. A failing mkdir (including a concurrent
/// creator winning the race) is returned to the caller.
pub fn ensure_dir<S>(session: &mut S, root: &FsRoot, dir: &str) -> StorageResult<()>
where
    S: RemoteFs + ?Sized,
{
    debug!(root = %root, dir, "ensuring remote directory");
    let mut current = root.as_str().to_string();

    for segment in dir.split('/').filter(|s| !s.is_empty()) {
        let entries = session.list(&current)?;
        if !entries.iter().any(|entry| entry.name == segment) {
            let target = format!("{current}{segment}");
            debug!(path = %target, "creating remote directory");
            session.mkdir(&target)?;
        }
        current.push_str(segment);
        current.push('/');
    }

    Ok(())
}

/// Remove now-empty ancestors of the root-relative `path`, bottom-up.
///
/// Entries whose name starts with `.` do not count as content. Stops at the
/// first non-empty directory and never removes `root` itself. Returns the
/// number of directories removed before stopping or failing.
pub fn prune_empty_ancestors<S>(
    session: &mut S,
    root: &FsRoot,
    path: &str,
    removed: &mut usize,
) -> StorageResult<()>
where
    S: RemoteFs + ?Sized,
{
    let mut dir = parent(path);

    while !dir.trim_matches('/').is_empty() {
        let full = root.join(dir);
        let entries = session.list(&full)?;
        if entries.iter().any(|entry| !entry.is_hidden()) {
            debug!(path = %full, "directory not empty, stopping prune");
            break;
        }

        debug!(path = %full, "removing empty directory");
        session.rmdir(&full)?;
        *removed += 1;
        dir = parent(dir);
    }

    Ok(())
}
