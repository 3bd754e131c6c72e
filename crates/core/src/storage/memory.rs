//! In-memory remote filesystem (tests and dry runs).
//!
//! Behaves like a strict SFTP server: listings include `.` and `..`, mkdir
//! fails on existing paths, rmdir fails on non-empty directories, and every
//! operation on a missing path reports [`StatusCode::NoSuchFile`]. Clones
//! share one tree so a test can keep a handle while the adapter owns the
//! session.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::config::SftpOptions;
use super::error::{StatusCode, StorageError, StorageResult};
use super::remote::{Connector, DirEntry, RemoteFs};

/// Mode given to newly uploaded files before any permission change.
const DEFAULT_FILE_MODE: u32 = 0o600;

/// Remote operation kinds, for counters and injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    /// Directory listing.
    List,
    /// Directory creation.
    Mkdir,
    /// Directory removal.
    Rmdir,
    /// Upload.
    Upload,
    /// Download.
    Download,
    /// File removal.
    Remove,
    /// Permission change.
    SetPermissions,
}

/// Number of calls per operation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// Sessions opened.
    pub connects: usize,
    /// Listings.
    pub list: usize,
    /// Directory creations.
    pub mkdir: usize,
    /// Directory removals.
    pub rmdir: usize,
    /// Uploads.
    pub upload: usize,
    /// Downloads.
    pub download: usize,
    /// File removals.
    pub remove: usize,
    /// Permission changes.
    pub set_permissions: usize,
}

impl OpCounts {
    fn bump(&mut self, op: Op) {
        let counter = match op {
            Op::List => &mut self.list,
            Op::Mkdir => &mut self.mkdir,
            Op::Rmdir => &mut self.rmdir,
            Op::Upload => &mut self.upload,
            Op::Download => &mut self.download,
            Op::Remove => &mut self.remove,
            Op::SetPermissions => &mut self.set_permissions,
        };
        *counter += 1;
    }

    /// Calls that reached the remote filesystem, excluding connects.
    #[must_use]
    pub fn total(&self) -> usize {
        self.list
            + self.mkdir
            + self.rmdir
            + self.upload
            + self.download
            + self.remove
            + self.set_permissions
    }
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    /// File content.
    pub contents: Vec<u8>,
    /// Permission bits.
    pub mode: u32,
}

#[derive(Debug)]
struct Tree {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, MemoryFile>,
    failures: BTreeMap<(Op, String), StatusCode>,
    refuse_connections: bool,
    ops: OpCounts,
}

impl Default for Tree {
    fn default() -> Self {
        Self {
            dirs: BTreeSet::from(["/".to_string()]),
            files: BTreeMap::new(),
            failures: BTreeMap::new(),
            refuse_connections: false,
            ops: OpCounts::default(),
        }
    }
}

impl Tree {
    fn begin(&mut self, op: Op, path: &str) -> StorageResult<()> {
        self.ops.bump(op);
        match self.failures.get(&(op, path.to_string())) {
            Some(code) => Err(StorageError::status(*code, path, "injected failure")),
            None => Ok(()),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.dirs.contains(path) || self.files.contains_key(path)
    }

    fn has_children(&self, dir: &str) -> bool {
        self.dirs
            .iter()
            .map(String::as_str)
            .chain(self.files.keys().map(String::as_str))
            .any(|path| path != dir && parent_of(path) == dir)
    }

    fn require_parent_dir(&self, path: &str) -> StorageResult<()> {
        if self.dirs.contains(parent_of(path)) {
            Ok(())
        } else {
            Err(StorageError::status(StatusCode::NoSuchFile, path, "no such file or directory"))
        }
    }
}

/// Collapse duplicate and trailing slashes; relative paths hang off `/`.
fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
    format!("/{}", segments.join("/"))
}

fn parent_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((head, _)) => head,
        None => "/",
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, tail)| tail)
}

/// Shared in-memory remote tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    tree: Arc<Mutex<Tree>>,
}

impl MemoryFs {
    /// Create a tree holding only `/`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `path` and all of its ancestors without counting operations.
    pub fn create_dir_all(&self, path: &str) {
        let path = normalize(path);
        let mut tree = self.tree();
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            tree.dirs.insert(current.clone());
        }
    }

    /// Place a file (creating its directories) without counting operations.
    pub fn put_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let path = normalize(path);
        self.create_dir_all(parent_of(&path));
        self.tree().files.insert(
            path,
            MemoryFile {
                contents: contents.into(),
                mode: DEFAULT_FILE_MODE,
            },
        );
    }

    /// Whether `path` is a directory.
    #[must_use]
    pub fn has_dir(&self, path: &str) -> bool {
        self.tree().dirs.contains(&normalize(path))
    }

    /// The file stored at `path`.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<MemoryFile> {
        self.tree().files.get(&normalize(path)).cloned()
    }

    /// Every directory and file path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let tree = self.tree();
        let mut paths: Vec<String> = tree.dirs.iter().chain(tree.files.keys()).cloned().collect();
        paths.sort();
        paths
    }

    /// Operation counters since creation or the last reset.
    #[must_use]
    pub fn ops(&self) -> OpCounts {
        self.tree().ops
    }

    /// Reset the operation counters.
    pub fn reset_ops(&self) {
        self.tree().ops = OpCounts::default();
    }

    /// Make every `op` on `path` fail with `code` until cleared.
    pub fn fail_on(&self, op: Op, path: &str, code: StatusCode) {
        self.tree().failures.insert((op, normalize(path)), code);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.tree().failures.clear();
    }

    /// Make [`Connector::connect`] fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.tree().refuse_connections = refuse;
    }
}

impl RemoteFs for MemoryFs {
    fn list(&mut self, dir: &str) -> StorageResult<Vec<DirEntry>> {
        let dir = normalize(dir);
        let mut tree = self.tree();
        tree.begin(Op::List, &dir)?;

        if !tree.dirs.contains(&dir) {
            let code = if tree.files.contains_key(&dir) {
                StatusCode::Failure
            } else {
                StatusCode::NoSuchFile
            };
            return Err(StorageError::status(code, dir, "cannot open directory"));
        }

        let mut entries = vec![DirEntry::new("."), DirEntry::new("..")];
        let children = tree
            .dirs
            .iter()
            .chain(tree.files.keys())
            .filter(|path| **path != dir && parent_of(path) == dir)
            .map(|path| DirEntry::new(name_of(path)));
        entries.extend(children);
        Ok(entries)
    }

    fn mkdir(&mut self, path: &str) -> StorageResult<()> {
        let path = normalize(path);
        let mut tree = self.tree();
        tree.begin(Op::Mkdir, &path)?;

        if tree.exists(&path) {
            return Err(StorageError::status(StatusCode::Failure, path, "file already exists"));
        }
        tree.require_parent_dir(&path)?;
        tree.dirs.insert(path);
        Ok(())
    }

    fn rmdir(&mut self, path: &str) -> StorageResult<()> {
        let path = normalize(path);
        let mut tree = self.tree();
        tree.begin(Op::Rmdir, &path)?;

        if !tree.dirs.contains(&path) {
            return Err(StorageError::status(StatusCode::NoSuchFile, path, "no such directory"));
        }
        if path == "/" || tree.has_children(&path) {
            return Err(StorageError::status(StatusCode::Failure, path, "directory not empty"));
        }
        tree.dirs.remove(&path);
        Ok(())
    }

    fn upload(&mut self, local: &Path, remote: &str) -> StorageResult<()> {
        let remote = normalize(remote);
        let mut tree = self.tree();
        tree.begin(Op::Upload, &remote)?;

        if tree.dirs.contains(&remote) {
            return Err(StorageError::status(StatusCode::Failure, remote, "is a directory"));
        }
        tree.require_parent_dir(&remote)?;

        let contents = std::fs::read(local)?;
        let mode = tree
            .files
            .get(&remote)
            .map_or(DEFAULT_FILE_MODE, |file| file.mode);
        tree.files.insert(remote, MemoryFile { contents, mode });
        Ok(())
    }

    fn download(&mut self, remote: &str, local: &Path) -> StorageResult<()> {
        let remote = normalize(remote);
        let contents = {
            let mut tree = self.tree();
            tree.begin(Op::Download, &remote)?;
            match tree.files.get(&remote) {
                Some(file) => file.contents.clone(),
                None => {
                    return Err(StorageError::status(StatusCode::NoSuchFile, remote, "no such file"));
                }
            }
        };

        std::fs::write(local, contents)?;
        Ok(())
    }

    fn remove(&mut self, path: &str) -> StorageResult<()> {
        let path = normalize(path);
        let mut tree = self.tree();
        tree.begin(Op::Remove, &path)?;

        if tree.dirs.contains(&path) {
            return Err(StorageError::status(StatusCode::Failure, path, "is a directory"));
        }
        match tree.files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(StorageError::status(StatusCode::NoSuchFile, path, "no such file")),
        }
    }

    fn set_permissions(&mut self, path: &str, mode: u32) -> StorageResult<()> {
        let path = normalize(path);
        let mut guard = self.tree();
        let tree = &mut *guard;
        tree.begin(Op::SetPermissions, &path)?;

        match tree.files.get_mut(&path) {
            Some(file) => {
                file.mode = mode;
                Ok(())
            }
            None if tree.dirs.contains(&path) => Ok(()),
            None => Err(StorageError::status(StatusCode::NoSuchFile, path, "no such file")),
        }
    }
}

impl Connector for MemoryFs {
    type Session = MemoryFs;

    fn connect(&self, options: &SftpOptions) -> StorageResult<Self::Session> {
        let mut tree = self.tree();
        tree.ops.connects += 1;
        if tree.refuse_connections {
            return Err(StorageError::connection(format!(
                "{}:{} refused the connection",
                options.host, options.port
            )));
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/uploads/"), "/uploads");
        assert_eq!(normalize("uploads//photos/./42"), "/uploads/photos/42");
        assert_eq!(parent_of("/uploads"), "/");
        assert_eq!(parent_of("/uploads/photos"), "/uploads");
    }

    #[test]
    fn test_listing_includes_dot_entries() {
        let mut fs = MemoryFs::new();
        fs.put_file("/uploads/a.txt", "a");
        fs.create_dir_all("/uploads/photos");

        let entries = fs.list("/uploads/").expect("listing");
        assert_eq!(names(&entries), [".", "..", "photos", "a.txt"]);
    }

    #[test]
    fn test_missing_paths_report_no_such_file() {
        let mut fs = MemoryFs::new();
        assert!(fs.list("/nope").unwrap_err().is_not_found());
        assert!(fs.remove("/nope.txt").unwrap_err().is_not_found());
        assert!(fs.rmdir("/nope").unwrap_err().is_not_found());
        assert!(fs.mkdir("/a/b").unwrap_err().is_not_found());
    }

    #[test]
    fn test_mkdir_and_rmdir_rules() {
        let mut fs = MemoryFs::new();
        fs.mkdir("/a").expect("mkdir");
        assert_eq!(fs.mkdir("/a").unwrap_err().status_code(), Some(StatusCode::Failure));

        fs.put_file("/a/x", "x");
        assert_eq!(fs.rmdir("/a").unwrap_err().status_code(), Some(StatusCode::Failure));
        fs.remove("/a/x").expect("remove");
        fs.rmdir("/a").expect("rmdir");
        assert!(!fs.has_dir("/a"));
        assert_eq!(fs.rmdir("/").unwrap_err().status_code(), Some(StatusCode::Failure));
    }

    #[test]
    fn test_upload_download_and_permissions() {
        let mut local = tempfile::NamedTempFile::new().expect("temp file");
        local.write_all(b"hello").expect("write");

        let mut fs = MemoryFs::new();
        fs.create_dir_all("/data");
        fs.upload(local.path(), "/data/greeting.txt").expect("upload");
        assert_eq!(fs.file("/data/greeting.txt").map(|f| f.mode), Some(DEFAULT_FILE_MODE));

        fs.set_permissions("/data/greeting.txt", 0o644).expect("chmod");
        let dest = tempfile::NamedTempFile::new().expect("temp file");
        fs.download("/data/greeting.txt", dest.path()).expect("download");
        assert_eq!(std::fs::read(dest.path()).expect("read"), b"hello");
        assert_eq!(fs.file("/data/greeting.txt").map(|f| f.mode), Some(0o644));

        let counts = fs.ops();
        assert_eq!((counts.upload, counts.download, counts.set_permissions), (1, 1, 1));
    }

    #[test]
    fn test_set_permissions_on_directories_and_missing_paths() {
        let mut fs = MemoryFs::new();
        fs.create_dir_all("/data/photos");
        fs.put_file("/data/photos/a.jpg", "a");

        fs.set_permissions("/data/photos", 0o755).expect("chmod dir");
        fs.set_permissions("/data/photos/a.jpg", 0o644).expect("chmod file");
        assert_eq!(fs.file("/data/photos/a.jpg").map(|f| f.mode), Some(0o644));
        assert!(fs.set_permissions("/data/missing.jpg", 0o644).unwrap_err().is_not_found());
        assert_eq!(fs.ops().set_permissions, 3);
    }

    #[test]
    fn test_injected_failures_and_refused_connections() {
        let mut fs = MemoryFs::new();
        fs.fail_on(Op::List, "/", StatusCode::PermissionDenied);
        assert_eq!(
            fs.list("/").unwrap_err().status_code(),
            Some(StatusCode::PermissionDenied)
        );
        fs.clear_failures();
        assert!(fs.list("/").is_ok());

        let options = SftpOptions::new("h", "u", crate::storage::config::Auth::Password("p".into()));
        fs.refuse_connections(true);
        assert!(matches!(fs.connect(&options), Err(StorageError::Connection(_))));
        fs.refuse_connections(false);
        assert!(fs.connect(&options).is_ok());
        assert_eq!(fs.ops().connects, 2);
    }
}
