//! Request forwarder — initialize the backing module, then delegate.
//!
//! The forwarder is deliberately thin: it owns no request state, never
//! inspects the event, and neither retries nor logs. A failure from the
//! initializer or the entry point is returned as-is for the host to turn
//! into its default error response.

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::Response;
use thiserror::Error;
use tokio::sync::OnceCell;

use goats_core::InitPolicy;

use crate::event::FetchEvent;
use crate::handler::{BoxFuture, RequestHandler};

/// The backing module the forwarder delegates to.
///
/// `initialize` performs one-time setup and must complete successfully
/// before `main` is called. `main` is the request entry point.
pub trait Module: Send + Sync + 'static {
    fn initialize(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn main(&self, event: FetchEvent) -> impl Future<Output = anyhow::Result<Response<Bytes>>> + Send;
}

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("module initialization failed: {0:#}")]
    Initialize(#[source] anyhow::Error),

    #[error("module entry point failed: {0:#}")]
    Entry(#[source] anyhow::Error),
}

/// Forwards fetch events to a [`Module`].
pub struct Forwarder<M> {
    module: Arc<M>,
    policy: InitPolicy,
    initialized: OnceCell<()>,
}

impl<M: Module> Forwarder<M> {
    pub fn new(module: M, policy: InitPolicy) -> Self {
        Self::from_arc(Arc::new(module), policy)
    }

    pub fn from_arc(module: Arc<M>, policy: InitPolicy) -> Self {
        Self {
            module,
            policy,
            initialized: OnceCell::new(),
        }
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn policy(&self) -> InitPolicy {
        self.policy
    }

    /// Whether the once-guarded initializer has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Run initialization ahead of serving.
    ///
    /// Under [`InitPolicy::Once`] this completes the guarded initializer so
    /// every later event skips it. Under [`InitPolicy::PerEvent`] it is a
    /// single startup check; events still re-run the initializer.
    pub async fn warm_up(&self) -> Result<(), ForwardError> {
        self.ensure_initialized().await
    }

    /// Handle one event: initialize, then invoke the entry point.
    pub async fn handle(&self, event: FetchEvent) -> Result<Response<Bytes>, ForwardError> {
        self.ensure_initialized().await?;
        self.module.main(event).await.map_err(ForwardError::Entry)
    }

    async fn ensure_initialized(&self) -> Result<(), ForwardError> {
        match self.policy {
            // A failed attempt leaves the cell empty; the next event retries.
            InitPolicy::Once => self
                .initialized
                .get_or_try_init(|| self.module.initialize())
                .await
                .map(|_| ())
                .map_err(ForwardError::Initialize),
            InitPolicy::PerEvent => self
                .module
                .initialize()
                .await
                .map_err(ForwardError::Initialize),
        }
    }

    /// Adapt into the trigger's handler callback.
    pub fn into_handler(self) -> RequestHandler {
        let forwarder = Arc::new(self);
        Arc::new(move |event: FetchEvent| {
            let forwarder = forwarder.clone();
            let fut: BoxFuture =
                Box::pin(async move { forwarder.handle(event).await.map_err(anyhow::Error::from) });
            fut
        })
    }
}
