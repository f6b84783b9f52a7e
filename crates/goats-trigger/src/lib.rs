//! goats-trigger — fetch-event host and request forwarder.
//!
//! Bridges inbound HTTP requests to a backing [`Module`]. The trigger
//! owns the listener and plays the host runtime; the [`Forwarder`] is the
//! single registered fetch handler, which initializes the module and then
//! delegates each event to its `main` entry point.
//!
//! # Architecture
//!
//! ```text
//! HTTP client
//!   │
//!   ▼
//! hyper server (HttpTrigger)
//!   │
//!   ├── Collect body, build FetchEvent
//!   ├── Forwarder::handle(event)
//!   │     ├── module.initialize()   (once, or per event)
//!   │     └── module.main(event)
//!   ├── Err → 500 Internal Server Error
//!   ├── Drain WaitUntil tasks in the background
//!   │
//!   ▼
//! HTTP response
//! ```

pub mod convert;
pub mod event;
pub mod forwarder;
pub mod handler;

pub use event::{FetchEvent, WaitUntil};
pub use forwarder::{ForwardError, Forwarder, Module};
pub use goats_core::InitPolicy;
pub use handler::{HttpTrigger, RequestHandler, TriggerError};
