//! Ownership and recovery of the single shared hypervisor connection.
//!
//! The process holds exactly one connection to the daemon. Both collectors
//! obtain it through [`ConnectionManager::ensure_live`], which checks
//! liveness and transparently replaces a connection the daemon reports as
//! dead. The check-then-swap sequence runs under an exclusive lock; callers
//! receive a shared handle to whichever connection was current, so a
//! concurrent swap never exposes a half-replaced one. A replaced connection
//! is closed once its last holder drops it.

use std::sync::{Arc, Mutex};

use crate::hypervisor::{self, Connection};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The liveness check itself failed. Deliberately not treated as a dead
    /// connection: the scrape is abandoned and the same handle is probed
    /// again next cycle.
    #[error("hypervisor liveness check failed: {0}")]
    Liveness(#[source] hypervisor::Error),

    /// The connection is dead and its URI could not be recovered, so there
    /// is no identity left to reconnect to.
    #[error("hypervisor connection is dead and its URI cannot be recovered: {0}")]
    IdentityLost(#[source] hypervisor::Error),

    /// Reconnecting to the recovered URI failed. The dead handle stays in
    /// place and the next scrape retries the same recovery.
    #[error("failed to reconnect to hypervisor at `{uri}`: {source}")]
    Reconnect {
        uri: String,
        #[source]
        source: hypervisor::Error,
    },
}

impl Error {
    /// True when no recovery is possible without outside intervention.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::IdentityLost(_))
    }
}

/// Owns the shared connection and performs reconnect-on-failure.
pub struct ConnectionManager<C: Connection> {
    conn: Mutex<Arc<C>>,
}

impl<C: Connection> ConnectionManager<C> {
    pub fn new(conn: C) -> Self {
        Self {
            conn: Mutex::new(Arc::new(conn)),
        }
    }

    /// Returns a connection the daemon just confirmed alive.
    ///
    /// A connection reported dead is replaced in place: its URI is
    /// recovered, a new connection is opened against it, and the old handle
    /// is dropped. Reconnection is attempted once per call; the retry
    /// cadence is the scrape interval.
    ///
    /// # Errors
    ///
    /// [`Error::Liveness`] if the check itself failed, [`Error::IdentityLost`]
    /// if the dead connection's URI is unavailable (fatal, see
    /// [`Error::is_fatal`]), or [`Error::Reconnect`] if reopening failed.
    pub fn ensure_live(&self) -> Result<Arc<C>, Error> {
        let mut held = self.conn.lock().expect("connection lock poisoned");

        match held.is_alive() {
            Ok(true) => return Ok(Arc::clone(&*held)),
            Ok(false) => {}
            Err(source) => return Err(Error::Liveness(source)),
        }

        let uri = held.uri().map_err(Error::IdentityLost)?;
        log::warn!("hypervisor connection to `{uri}` reported dead, reconnecting");

        let fresh = C::connect(&uri).map_err(|source| Error::Reconnect {
            uri: uri.clone(),
            source,
        })?;
        let fresh = Arc::new(fresh);
        *held = Arc::clone(&fresh);
        log::info!("reconnected to hypervisor at `{uri}`");

        Ok(fresh)
    }
}
