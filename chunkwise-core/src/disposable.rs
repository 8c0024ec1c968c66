//! Scoped acquisition of a backend connection
//!
//! A [`DisposableStore`] is only handed out once the whole lifecycle ran. From then on its
//! connection is released exactly once: by [`DisposableStore::dispose`], at the end of
//! [`DisposableStore::using`], or when the handle is dropped on any other exit path.
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

use crate::VectorStore;

#[derive(Debug)]
pub struct DisposableStore<S: VectorStore + 'static> {
    store: Arc<S>,
    disposed: AtomicBool,
}

impl<S: VectorStore + 'static> DisposableStore<S> {
    /// Connects and readies a store
    ///
    /// Runs `connect`, `create_namespace`, `load_namespace`, `create_collection` and
    /// `load_collection` in order. If any step after connecting fails, the connection is released
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// Errors if any step of the lifecycle fails
    #[tracing::instrument(skip_all, name = "store.acquire", fields(store = store.name()))]
    pub async fn acquire(store: S) -> Result<Self> {
        store
            .connect()
            .await
            .with_context(|| format!("Failed to connect {}", store.name()))?;

        let handle = DisposableStore {
            store: Arc::new(store),
            disposed: AtomicBool::new(false),
        };

        if let Err(err) = handle.init().await {
            if let Err(release_err) = handle.release().await {
                tracing::warn!(error = %release_err, "Failed to release connection after failed setup");
            }
            return Err(err);
        }

        tracing::debug!("Store ready");
        Ok(handle)
    }

    async fn init(&self) -> Result<()> {
        let name = self.store.name();

        self.store
            .create_namespace()
            .await
            .with_context(|| format!("Failed to create namespace for {name}"))?;
        self.store
            .load_namespace()
            .await
            .with_context(|| format!("Failed to load namespace for {name}"))?;
        self.store
            .create_collection()
            .await
            .with_context(|| format!("Failed to create collection for {name}"))?;
        self.store
            .load_collection()
            .await
            .with_context(|| format!("Failed to load collection for {name}"))?;

        Ok(())
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Releases the connection
    ///
    /// # Errors
    ///
    /// Errors if the store fails to disconnect
    pub async fn dispose(self) -> Result<()> {
        self.release().await
    }

    /// Runs `f` with the store, then releases the connection
    ///
    /// The connection is released whether `f` succeeds or not. An error from `f` takes precedence
    /// over an error while disconnecting.
    ///
    /// # Errors
    ///
    /// Errors if `f` fails or the store fails to disconnect
    pub async fn using<F, Fut, T>(self, f: F) -> Result<T>
    where
        F: FnOnce(Arc<S>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let result = f(self.store()).await;
        let released = self.release().await;

        let value = result?;
        released?;
        Ok(value)
    }

    async fn release(&self) -> Result<()> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::debug!(store = self.store.name(), "Disconnecting store");
        self.store
            .disconnect()
            .await
            .with_context(|| format!("Failed to disconnect {}", self.store.name()))
    }
}

impl<S: VectorStore + 'static> Deref for DisposableStore<S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<S: VectorStore + 'static> Drop for DisposableStore<S> {
    fn drop(&mut self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let store = Arc::clone(&self.store);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                store = store.name(),
                "Store dropped outside of a runtime, connection not released"
            );
            return;
        };

        runtime.spawn(async move {
            if let Err(err) = store.disconnect().await {
                tracing::warn!(store = store.name(), error = %err, "Failed to disconnect dropped store");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct CountingStore {
        calls: std::sync::Mutex<Vec<&'static str>>,
        disconnects: Arc<AtomicUsize>,
        fail_at: Option<&'static str>,
    }

    impl CountingStore {
        fn failing_at(step: &'static str) -> Self {
            CountingStore {
                fail_at: Some(step),
                ..Default::default()
            }
        }

        fn step(&self, step: &'static str) -> Result<()> {
            self.calls.lock().unwrap().push(step);
            if self.fail_at == Some(step) {
                anyhow::bail!("{step} failed");
            }
            Ok(())
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorStore for CountingStore {
        async fn connect(&self) -> Result<()> {
            self.step("connect")
        }

        fn is_connected(&self) -> bool {
            self.disconnects.load(Ordering::SeqCst) == 0
        }

        async fn create_namespace(&self) -> Result<()> {
            self.step("create_namespace")
        }

        async fn load_namespace(&self) -> Result<()> {
            self.step("load_namespace")
        }

        async fn create_collection(&self) -> Result<()> {
            self.step("create_collection")
        }

        async fn load_collection(&self) -> Result<()> {
            self.step("load_collection")
        }

        async fn disconnect(&self) -> Result<()> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            self.step("disconnect")
        }
    }

    async fn wait_for(counter: &AtomicUsize, expected: usize) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while counter.load(Ordering::SeqCst) != expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("counter never reached expected value");
    }

    #[test_log::test(tokio::test)]
    async fn test_acquire_runs_lifecycle_in_order() {
        let handle = DisposableStore::acquire(CountingStore::default())
            .await
            .unwrap();

        assert_eq!(
            handle.calls(),
            vec![
                "connect",
                "create_namespace",
                "load_namespace",
                "create_collection",
                "load_collection"
            ]
        );
        assert!(handle.is_connected());
    }

    #[test_log::test(tokio::test)]
    async fn test_dispose_disconnects_once() {
        let handle = DisposableStore::acquire(CountingStore::default())
            .await
            .unwrap();
        let disconnects = Arc::clone(&handle.disconnects);

        handle.dispose().await.unwrap();
        tokio::task::yield_now().await;

        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_setup_releases_connection() {
        let store = CountingStore::failing_at("create_collection");
        let disconnects = Arc::clone(&store.disconnects);

        let err = DisposableStore::acquire(store).await.unwrap_err();

        assert!(format!("{err:#}").contains("create_collection failed"));
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_connect_does_not_disconnect() {
        let store = CountingStore::failing_at("connect");
        let disconnects = Arc::clone(&store.disconnects);

        assert!(DisposableStore::acquire(store).await.is_err());
        assert_eq!(disconnects.load(Ordering::SeqCst), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_using_releases_on_error() {
        let handle = DisposableStore::acquire(CountingStore::default())
            .await
            .unwrap();
        let disconnects = Arc::clone(&handle.disconnects);

        let result: Result<()> = handle
            .using(|_store| async { anyhow::bail!("caller failed") })
            .await;

        assert_eq!(result.unwrap_err().to_string(), "caller failed");
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_using_returns_value() {
        let handle = DisposableStore::acquire(CountingStore::default())
            .await
            .unwrap();
        let disconnects = Arc::clone(&handle.disconnects);

        let value = handle
            .using(|store| async move { Ok(store.calls().len()) })
            .await
            .unwrap();

        assert_eq!(value, 5);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_drop_releases_connection() {
        let handle = DisposableStore::acquire(CountingStore::default())
            .await
            .unwrap();
        let disconnects = Arc::clone(&handle.disconnects);

        drop(handle);

        wait_for(&disconnects, 1).await;
    }

    #[test_log::test(tokio::test)]
    async fn test_cancelled_scope_releases_connection() {
        let handle = DisposableStore::acquire(CountingStore::default())
            .await
            .unwrap();
        let disconnects = Arc::clone(&handle.disconnects);

        let scope = handle.using(|_store| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        assert!(
            tokio::time::timeout(Duration::from_millis(10), scope)
                .await
                .is_err()
        );

        wait_for(&disconnects, 1).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }
}
