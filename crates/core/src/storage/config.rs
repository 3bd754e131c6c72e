//! Storage configuration types.

use std::fmt;
use std::path::PathBuf;

use clipstore_shared::SftpSettings;

use super::error::{StorageError, StorageResult};
use super::paths::FsRoot;
use super::url::PublicHost;

/// How the session authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Password authentication.
    Password(String),
    /// Public key authentication with a private key file.
    PrivateKey(PathBuf),
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::PrivateKey(path) => f.debug_tuple("PrivateKey").field(path).finish(),
        }
    }
}

/// SFTP storage adapter configuration.
#[derive(Debug, Clone)]
pub struct SftpOptions {
    /// Remote host name or address.
    pub host: String,
    /// Remote SSH port.
    pub port: u16,
    /// Login user.
    pub user: String,
    /// Credential.
    pub auth: Auth,
    /// Root every remote path is prefixed with.
    pub fs_root: FsRoot,
    /// Host used for public URLs, if any.
    pub public_host: Option<PublicHost>,
}

impl SftpOptions {
    /// Default SSH port.
    pub const DEFAULT_PORT: u16 = 22;

    /// Create options with the default port and root.
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>, auth: Auth) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            user: user.into(),
            auth,
            fs_root: FsRoot::default(),
            public_host: None,
        }
    }

    /// Set the SSH port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the remote filesystem root. Blank roots fall back to `/`.
    #[must_use]
    pub fn with_fs_root(mut self, root: &str) -> Self {
        self.fs_root = FsRoot::new(root);
        self
    }

    /// Set the public URL host.
    #[must_use]
    pub fn with_public_host(mut self, host: PublicHost) -> Self {
        self.public_host = Some(host);
        self
    }

    /// Build options from the loaded application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the settings are incomplete.
    pub fn from_settings(settings: &SftpSettings) -> StorageResult<Self> {
        let auth = match (&settings.password, &settings.private_key) {
            (Some(password), _) => Auth::Password(password.clone()),
            (None, Some(key)) => Auth::PrivateKey(PathBuf::from(key)),
            (None, None) => {
                return Err(StorageError::configuration(
                    "either sftp.password or sftp.private_key must be set",
                ));
            }
        };

        let mut options = Self::new(&settings.host, &settings.user, auth)
            .with_port(settings.port)
            .with_fs_root(&settings.fs_root);
        if let Some(host) = &settings.public_host {
            options = options.with_public_host(PublicHost::fixed(host));
        }

        options.validate()?;
        Ok(options)
    }

    /// Check the options are usable.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a blank host or user, or a malformed
    /// static public host.
    pub fn validate(&self) -> StorageResult<()> {
        if self.host.trim().is_empty() {
            return Err(StorageError::configuration("sftp host must not be empty"));
        }
        if self.user.trim().is_empty() {
            return Err(StorageError::configuration("sftp user must not be empty"));
        }
        if let Some(PublicHost::Static(host)) = &self.public_host {
            if host.trim().is_empty() {
                return Err(StorageError::configuration("public host must not be empty"));
            }
            if host.chars().any(char::is_whitespace) {
                return Err(StorageError::configuration(format!(
                    "public host contains whitespace: {host:?}"
                )));
            }
        }
        Ok(())
    }
}
