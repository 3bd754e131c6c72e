//! Lazily established session.

use tracing::{debug, info};

use super::config::SftpOptions;
use super::error::StorageResult;
use super::remote::Connector;

/// Owns at most one session, created on first use.
///
/// There is no reconnect: a dropped session surfaces as a status error on the
/// next operation.
pub struct Connection<C: Connector> {
    connector: C,
    session: Option<C::Session>,
}

impl<C: Connector> Connection<C> {
    /// Create an unconnected manager.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            session: None,
        }
    }

    /// The live session, connecting on first call.
    pub fn session(&mut self, options: &SftpOptions) -> StorageResult<&mut C::Session> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                debug!(host = %options.host, port = options.port, user = %options.user, "opening sftp session");
                let session = self.connector.connect(options)?;
                info!(host = %options.host, "sftp session established");
                session
            }
        };
        Ok(self.session.insert(session))
    }

    /// Whether a session has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }
}
