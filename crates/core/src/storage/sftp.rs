//! SFTP transport backed by libssh2.

use std::fs::File;
use std::io;
use std::net::TcpStream;
use std::path::Path;

use ssh2::{ErrorCode, FileStat, Session, Sftp};
use tracing::debug;

use super::config::{Auth, SftpOptions};
use super::error::{StatusCode, StorageError, StorageResult};
use super::remote::{Connector, DirEntry, RemoteFs};

/// Mode for directories created on the server.
const DIR_MODE: i32 = 0o755;

/// Opens authenticated libssh2 SFTP sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ssh2Connector;

/// A libssh2 SFTP channel and the SSH session carrying it.
pub struct Ssh2Session {
    sftp: Sftp,
    _session: Session,
}

fn connection_error(options: &SftpOptions, err: impl std::fmt::Display) -> StorageError {
    StorageError::connection(format!("{}@{}:{}: {err}", options.user, options.host, options.port))
}

/// Map a libssh2 error to a status error for `path`.
fn status(err: &ssh2::Error, path: &str) -> StorageError {
    let code = match err.code() {
        ErrorCode::SFTP(raw) => u32::try_from(raw).map_or(StatusCode::Failure, StatusCode::from_raw),
        ErrorCode::Session(_) => StatusCode::Failure,
    };
    StorageError::status(code, path, err.message())
}

impl Connector for Ssh2Connector {
    type Session = Ssh2Session;

    fn connect(&self, options: &SftpOptions) -> StorageResult<Ssh2Session> {
        let tcp = TcpStream::connect((options.host.as_str(), options.port))
            .map_err(|e| connection_error(options, e))?;

        let mut session = Session::new().map_err(|e| connection_error(options, e))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| connection_error(options, e))?;

        match &options.auth {
            Auth::Password(password) => session.userauth_password(&options.user, password),
            Auth::PrivateKey(key) => session.userauth_pubkey_file(&options.user, None, key, None),
        }
        .map_err(|e| connection_error(options, e))?;

        if !session.authenticated() {
            return Err(connection_error(options, "authentication rejected"));
        }

        let sftp = session.sftp().map_err(|e| connection_error(options, e))?;
        Ok(Ssh2Session {
            sftp,
            _session: session,
        })
    }
}

impl RemoteFs for Ssh2Session {
    fn list(&mut self, dir: &str) -> StorageResult<Vec<DirEntry>> {
        let entries = self
            .sftp
            .readdir(Path::new(dir))
            .map_err(|e| status(&e, dir))?;

        Ok(entries
            .into_iter()
            .filter_map(|(path, _)| {
                path.file_name()
                    .map(|name| DirEntry::new(name.to_string_lossy()))
            })
            .collect())
    }

    fn mkdir(&mut self, path: &str) -> StorageResult<()> {
        self.sftp
            .mkdir(Path::new(path), DIR_MODE)
            .map_err(|e| status(&e, path))
    }

    fn rmdir(&mut self, path: &str) -> StorageResult<()> {
        self.sftp.rmdir(Path::new(path)).map_err(|e| status(&e, path))
    }

    fn upload(&mut self, local: &Path, remote: &str) -> StorageResult<()> {
        let mut source = File::open(local)?;
        let mut target = self
            .sftp
            .create(Path::new(remote))
            .map_err(|e| status(&e, remote))?;
        let bytes = io::copy(&mut source, &mut target)?;
        debug!(remote, bytes, "upload complete");
        Ok(())
    }

    fn download(&mut self, remote: &str, local: &Path) -> StorageResult<()> {
        let mut source = self
            .sftp
            .open(Path::new(remote))
            .map_err(|e| status(&e, remote))?;
        let mut target = File::create(local)?;
        let bytes = io::copy(&mut source, &mut target)?;
        debug!(remote, bytes, "download complete");
        Ok(())
    }

    fn remove(&mut self, path: &str) -> StorageResult<()> {
        self.sftp.unlink(Path::new(path)).map_err(|e| status(&e, path))
    }

    fn set_permissions(&mut self, path: &str, mode: u32) -> StorageResult<()> {
        let stat = FileStat {
            size: None,
            uid: None,
            gid: None,
            perm: Some(mode),
            atime: None,
            mtime: None,
        };
        self.sftp
            .setstat(Path::new(path), stat)
            .map_err(|e| status(&e, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_sftp_codes() {
        let err = status(&ssh2::Error::new(ErrorCode::SFTP(2), "no such file"), "/a/b.jpg");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "remote operation failed: no such file (/a/b.jpg): no such file");

        let err = status(&ssh2::Error::new(ErrorCode::SFTP(3), "denied"), "/a");
        assert_eq!(err.status_code(), Some(StatusCode::PermissionDenied));
    }

    #[test]
    fn test_status_maps_session_errors_to_failure() {
        let err = status(&ssh2::Error::new(ErrorCode::Session(-7), "socket send"), "/a");
        assert_eq!(err.status_code(), Some(StatusCode::Failure));

        let err = status(&ssh2::Error::new(ErrorCode::SFTP(-1), "bogus"), "/a");
        assert_eq!(err.status_code(), Some(StatusCode::Failure));
    }
}
