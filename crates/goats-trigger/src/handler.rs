//! HTTP trigger — the host side of the fetch-event contract.
//!
//! `HttpTrigger` owns a hyper HTTP server and dispatches every request as
//! a [`FetchEvent`] to the single registered handler.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::convert;
use crate::event::{FetchEvent, WaitUntil};

/// Callback type for handling fetch events.
pub type RequestHandler = Arc<dyn Fn(FetchEvent) -> BoxFuture + Send + Sync>;

pub type BoxFuture = std::pin::Pin<
    Box<dyn std::future::Future<Output = anyhow::Result<http::Response<Bytes>>> + Send>,
>;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("a fetch handler is already registered")]
    AlreadyRegistered,

    #[error("no fetch handler registered")]
    NoHandler,

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(std::io::Error),
}

/// HTTP trigger server.
///
/// Exactly one fetch handler can be registered, and it stays registered
/// for the trigger's lifetime.
pub struct HttpTrigger {
    bind_addr: SocketAddr,
    handler: OnceLock<RequestHandler>,
}

impl HttpTrigger {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            handler: OnceLock::new(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Register the fetch handler. Fails if one is already registered.
    pub fn register(&self, handler: RequestHandler) -> Result<(), TriggerError> {
        self.handler
            .set(handler)
            .map_err(|_| TriggerError::AlreadyRegistered)?;
        debug!(addr = %self.bind_addr, "fetch handler registered");
        Ok(())
    }

    pub fn is_registered(&self) -> bool {
        self.handler.get().is_some()
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn serve(
        self,
        shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<(), TriggerError> {
        let listener = TcpListener::bind(self.bind_addr)
            .await
            .map_err(|source| TriggerError::Bind {
                addr: self.bind_addr,
                source,
            })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve on an already-bound listener until the shutdown signal.
    ///
    /// Spawns a tokio task per connection using HTTP/1.1.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> Result<(), TriggerError> {
        let handler = self.handler.get().cloned().ok_or(TriggerError::NoHandler)?;
        let local_addr = listener.local_addr().unwrap_or(self.bind_addr);

        info!(addr = %local_addr, "HTTP trigger listening");

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, peer_addr) = accept_result.map_err(TriggerError::Accept)?;
                    let handler = handler.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let handler = handler.clone();
                            async move {
                                Ok::<_, hyper::Error>(dispatch(handler, req, peer_addr).await)
                            }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("HTTP trigger shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Run one request through the handler, applying the host defaults.
async fn dispatch(
    handler: RequestHandler,
    req: Request<Incoming>,
    peer_addr: SocketAddr,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(%peer_addr, error = %e, "failed to read request body");
            return convert::plain_response(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();
    let waiter = WaitUntil::new();
    let event = FetchEvent::new(Request::from_parts(parts, body))
        .with_peer_addr(peer_addr)
        .with_waiter(waiter.clone());

    let response = match handler(event).await {
        Ok(resp) => {
            debug!(%peer_addr, %method, %path, status = %resp.status(), "request handled");
            resp.map(Full::new)
        }
        Err(e) => {
            error!(%peer_addr, %method, %path, error = %e, "request handler failed");
            convert::internal_error()
        }
    };

    if waiter.pending() > 0 {
        tokio::spawn(async move {
            for e in waiter.join_all().await {
                warn!(%peer_addr, error = %e, "background task failed");
            }
        });
    }

    response
}
