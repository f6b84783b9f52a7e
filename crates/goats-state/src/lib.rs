//! goats-state — key-value namespaces for the Best Goats site.
//!
//! Backed by [redb](https://docs.rs/redb). Two namespaces are kept as
//! separate tables: the goat catalogue and per-visitor favorites. Values
//! are JSON-serialized into `&[u8]` columns.
//!
//! The `KvStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across request tasks.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::KvStore;
