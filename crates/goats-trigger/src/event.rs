//! Fetch events handed from the trigger to the registered handler.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::Request;
use tokio::task::JoinHandle;

use crate::convert;

/// One inbound request awaiting a response.
///
/// Owned by the host for the duration of the request and moved into the
/// handler. Work scheduled through [`FetchEvent::wait_until`] may outlive
/// the response.
#[derive(Debug)]
pub struct FetchEvent {
    request: Request<Bytes>,
    peer_addr: Option<SocketAddr>,
    waiter: WaitUntil,
}

impl FetchEvent {
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            peer_addr: None,
            waiter: WaitUntil::new(),
        }
    }

    pub fn with_peer_addr(mut self, peer_addr: SocketAddr) -> Self {
        self.peer_addr = Some(peer_addr);
        self
    }

    /// Attach the host's background-task handle.
    pub fn with_waiter(mut self, waiter: WaitUntil) -> Self {
        self.waiter = waiter;
        self
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Absolute URL of the request, rebuilt from the `host` header.
    pub fn url(&self) -> String {
        convert::request_url(&self.request)
    }

    /// Keep the event alive until `task` finishes, without delaying the response.
    pub fn wait_until<F>(&self, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.waiter.spawn(task);
    }

    pub fn waiter(&self) -> WaitUntil {
        self.waiter.clone()
    }

    pub fn into_parts(self) -> (Request<Bytes>, WaitUntil) {
        (self.request, self.waiter)
    }
}

/// Background tasks registered against a fetch event.
#[derive(Debug, Clone, Default)]
pub struct WaitUntil {
    tasks: Arc<Mutex<Vec<JoinHandle<anyhow::Result<()>>>>>,
}

impl WaitUntil {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.lock().push(handle);
    }

    /// Number of tasks not yet collected by [`WaitUntil::join_all`].
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Await every registered task, including ones spawned while draining.
    ///
    /// Returns the failures; a panicked task is reported as an error.
    pub async fn join_all(&self) -> Vec<anyhow::Error> {
        let mut errors = Vec::new();
        loop {
            let batch: Vec<_> = self.lock().drain(..).collect();
            if batch.is_empty() {
                return errors;
            }
            for handle in batch {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => errors.push(e),
                    Err(e) => errors.push(anyhow::anyhow!("background task panicked: {e}")),
                }
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<anyhow::Result<()>>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn get(uri: &str) -> Request<Bytes> {
        Request::builder()
            .uri(uri)
            .header("host", "goats.test")
            .body(Bytes::new())
            .unwrap()
    }

    #[test]
    fn event_url_is_absolute() {
        let event = FetchEvent::new(get("/favorites?x=1"));
        assert_eq!(event.url(), "http://goats.test/favorites?x=1");
    }

    #[tokio::test]
    async fn wait_until_tasks_are_joined() {
        let counter = Arc::new(AtomicUsize::new(0));
        let event = FetchEvent::new(get("/"));

        for _ in 0..3 {
            let counter = counter.clone();
            event.wait_until(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        let waiter = event.waiter();
        assert_eq!(waiter.pending(), 3);

        let errors = waiter.join_all().await;
        assert!(errors.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(waiter.pending(), 0);
    }

    #[tokio::test]
    async fn wait_until_failures_are_reported() {
        let waiter = WaitUntil::new();
        waiter.spawn(async { Ok(()) });
        waiter.spawn(async { anyhow::bail!("delete failed") });

        let errors = waiter.join_all().await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "delete failed");
    }

    #[tokio::test]
    async fn tasks_spawned_while_draining_are_joined() {
        let waiter = WaitUntil::new();
        let inner = waiter.clone();
        let done = Arc::new(AtomicUsize::new(0));
        let done_inner = done.clone();
        waiter.spawn(async move {
            inner.spawn(async move {
                done_inner.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        assert!(waiter.join_all().await.is_empty());
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
