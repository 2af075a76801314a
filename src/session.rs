//! Scoped ownership of the messaging-platform connection.

use async_trait::async_trait;

use crate::error::Result;

/// Establishes and releases connections to the messaging platform.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The authenticated connection handle.
    type Handle: Send + Sync;

    /// Opens a new authenticated connection.
    async fn connect(&self) -> Result<Self::Handle>;

    /// Releases a handle obtained from [`connect`](Self::connect).
    ///
    /// Called exactly once per handle. Must not fail; problems are logged.
    fn release(&self, handle: Self::Handle);
}

/// Owns at most one live connection and releases it when dropped.
///
/// [`connect`](Self::connect) is idempotent: the first call opens the
/// connection and every later call returns the same handle.
pub struct SessionManager<C: Connector> {
    connector: C,
    handle: Option<C::Handle>,
}

impl<C: Connector> SessionManager<C> {
    #[must_use]
    pub const fn new(connector: C) -> Self {
        Self {
            connector,
            handle: None,
        }
    }

    /// Connects if not already connected and returns the shared handle.
    ///
    /// # Errors
    ///
    /// Propagates the connector's error. Nothing is retried, and a later
    /// call will attempt a fresh connection.
    pub async fn connect(&mut self) -> Result<&C::Handle> {
        let handle = match self.handle.take() {
            Some(handle) => handle,
            None => {
                log::debug!("Opening messaging session");
                self.connector.connect().await?
            }
        };
        Ok(&*self.handle.insert(handle))
    }

    /// Returns the handle if connected.
    #[must_use]
    pub const fn handle(&self) -> Option<&C::Handle> {
        self.handle.as_ref()
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the connection now instead of at drop.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::debug!("Releasing messaging session");
            self.connector.release(handle);
        }
    }
}

impl<C: Connector> Drop for SessionManager<C> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        releases: AtomicUsize,
    }

    struct CountingConnector {
        counters: Arc<Counters>,
        fail: bool,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        type Handle = usize;

        async fn connect(&self) -> Result<usize> {
            if self.fail {
                return Err(Error::Telegram("network unreachable".to_string()));
            }
            Ok(self.counters.connects.fetch_add(1, Ordering::SeqCst) + 1)
        }

        fn release(&self, _handle: usize) {
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn manager(fail: bool) -> (SessionManager<CountingConnector>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let connector = CountingConnector {
            counters: Arc::clone(&counters),
            fail,
        };
        (SessionManager::new(connector), counters)
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let (mut session, counters) = manager(false);
        assert_eq!(*session.connect().await.unwrap(), 1);
        assert_eq!(*session.connect().await.unwrap(), 1);
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn released_exactly_once_on_drop() {
        let (mut session, counters) = manager(false);
        session.connect().await.unwrap();
        drop(session);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn explicit_close_is_not_repeated_by_drop() {
        let (mut session, counters) = manager(false);
        session.connect().await.unwrap();
        session.close();
        session.close();
        drop(session);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn released_when_run_fails() {
        let (mut session, counters) = manager(false);
        let outcome: Result<()> = async {
            session.connect().await?;
            Err(Error::Config("boom".to_string()))
        }
        .await;
        assert!(outcome.is_err());
        drop(session);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connect_failure_propagates_without_release() {
        let (mut session, counters) = manager(true);
        assert!(matches!(session.connect().await, Err(Error::Telegram(_))));
        assert!(session.handle().is_none());
        drop(session);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 0);
    }
}
