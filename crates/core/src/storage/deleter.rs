//! Queued deletes with ancestor pruning.

use tracing::{debug, warn};

use super::dirs::prune_empty_ancestors;
use super::error::{StorageError, StorageResult};
use super::paths::FsRoot;
use super::remote::RemoteFs;

/// Outcome of removing one remote file.
#[derive(Debug)]
pub enum Removal {
    /// The file was removed.
    Removed,
    /// The file was already gone.
    Missing,
    /// Any other failure.
    Failed(StorageError),
}

impl From<StorageResult<()>> for Removal {
    fn from(result: StorageResult<()>) -> Self {
        match result {
            Ok(()) => Self::Removed,
            Err(err) if err.is_not_found() => Self::Missing,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Totals for one delete flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Files removed.
    pub removed: usize,
    /// Files that were already gone.
    pub missing: usize,
    /// Files whose removal failed for another reason.
    pub failed: usize,
    /// Empty directories pruned.
    pub pruned_dirs: usize,
}

/// Root-relative paths staged for deletion, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DeleteQueue {
    paths: Vec<String>,
}

impl DeleteQueue {
    /// Stage `path` for deletion.
    pub fn push(&mut self, path: impl Into<String>) {
        self.paths.push(path.into());
    }

    /// Staged paths.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Drop every staged path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

/// Delete one file and prune the directories it leaves empty.
///
/// Never fails: problems are logged and counted in `report`.
pub fn delete_path<S>(session: &mut S, root: &FsRoot, path: &str, report: &mut DeleteReport)
where
    S: RemoteFs + ?Sized,
{
    let remote = root.join(path);
    debug!(path = %remote, "deleting file");

    match Removal::from(session.remove(&remote)) {
        Removal::Removed => report.removed += 1,
        Removal::Missing => {
            debug!(path = %remote, "file already gone");
            report.missing += 1;
        }
        Removal::Failed(err) => {
            warn!(path = %remote, error = %err, "failed to delete file, continuing");
            report.failed += 1;
        }
    }

    if let Err(err) = prune_empty_ancestors(session, root, path, &mut report.pruned_dirs) {
        warn!(path = %remote, error = %err, "stopped pruning parent directories");
    }
}

/// Delete every queued path; one failure never blocks the rest.
pub fn delete_all<S>(session: &mut S, root: &FsRoot, queue: &DeleteQueue) -> DeleteReport
where
    S: RemoteFs + ?Sized,
{
    let mut report = DeleteReport::default();
    for path in queue.paths() {
        delete_path(session, root, path, &mut report);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::error::StatusCode;
    use crate::storage::remote::{DirEntry, MockRemoteFs};

    #[test]
    fn test_removal_classification() {
        assert!(matches!(Removal::from(Ok(())), Removal::Removed));
        assert!(matches!(
            Removal::from(Err(StorageError::status(StatusCode::NoSuchFile, "/x", "gone"))),
            Removal::Missing
        ));
        assert!(matches!(
            Removal::from(Err(StorageError::status(StatusCode::PermissionDenied, "/x", "no"))),
            Removal::Failed(_)
        ));
    }

    #[test]
    fn test_missing_file_still_prunes() {
        let mut fs = MockRemoteFs::new();
        fs.expect_remove()
            .returning(|path| Err(StorageError::status(StatusCode::NoSuchFile, path, "gone")));
        fs.expect_list().returning(|_| Ok(vec![DirEntry::new("."), DirEntry::new("..")]));
        fs.expect_rmdir().times(2).returning(|_| Ok(()));

        let mut queue = DeleteQueue::default();
        queue.push("photos/42/original.jpg");

        let report = delete_all(&mut fs, &FsRoot::new("/uploads"), &queue);
        assert_eq!(
            report,
            DeleteReport {
                removed: 0,
                missing: 1,
                failed: 0,
                pruned_dirs: 2,
            }
        );
    }

    #[test]
    fn test_failures_do_not_abort_remaining_paths() {
        let mut fs = MockRemoteFs::new();
        fs.expect_remove()
            .withf(|path| path == "/a/one.txt")
            .returning(|path| Err(StorageError::status(StatusCode::PermissionDenied, path, "no")));
        fs.expect_remove()
            .withf(|path| path == "/b/two.txt")
            .returning(|_| Ok(()));
        fs.expect_list()
            .withf(|dir| dir == "/a")
            .returning(|dir| Err(StorageError::status(StatusCode::PermissionDenied, dir, "no")));
        fs.expect_list()
            .withf(|dir| dir == "/b")
            .returning(|_| Ok(vec![DirEntry::new("three.txt")]));
        fs.expect_rmdir().never();

        let mut queue = DeleteQueue::default();
        queue.push("a/one.txt");
        queue.push("b/two.txt");

        let report = delete_all(&mut fs, &FsRoot::default(), &queue);
        assert_eq!(report.removed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.pruned_dirs, 0);
    }
}
