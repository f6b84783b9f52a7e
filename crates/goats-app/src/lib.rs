//! goats-app — the Best Goats site.
//!
//! `GoatsModule` is the backing module behind the request forwarder: a
//! server-rendered catalogue of goats where visitors keep a list of
//! favorites. Visitors are identified by a `user_id` cookie; both the
//! catalogue and the favorites live in the `goats-state` namespaces.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Featured goats |
//! | GET | `/favorites` | The visitor's favorite goats |
//! | POST | `/add-favorite` | Add form field `id` to favorites |
//! | POST | `/remove-favorite` | Remove form field `id` from favorites |
//! | GET | `/images/...` | Proxied from the image origin |

pub mod auth;
pub mod favorites;
pub mod form;
pub mod images;
pub mod pages;
pub mod response;
pub mod router;

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use http::Response;
use tracing::{info, warn};

use goats_core::{GoatId, GoatsConfig};
use goats_state::{KvStore, StateError};
use goats_trigger::{FetchEvent, Module};

use crate::images::ImageProxy;

/// Site-wide presentation and cookie settings.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub title: String,
    pub cookie_max_age: Duration,
    pub secure_cookies: bool,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "The Best Goats".to_string(),
            cookie_max_age: Duration::from_secs(365 * 20 * 24 * 60 * 60),
            secure_cookies: true,
        }
    }
}

impl SiteSettings {
    pub fn from_config(config: &GoatsConfig) -> Self {
        Self {
            title: config.site.title.clone(),
            cookie_max_age: Duration::from_secs(config.site.cookie_max_age_days * 24 * 60 * 60),
            secure_cookies: config.site.secure_cookies,
        }
    }
}

pub struct GoatsModule {
    store: KvStore,
    settings: SiteSettings,
    images: ImageProxy,
}

impl GoatsModule {
    pub fn new(store: KvStore, settings: SiteSettings, images: ImageProxy) -> Self {
        Self {
            store,
            settings,
            images,
        }
    }

    pub fn from_config(store: KvStore, config: &GoatsConfig) -> anyhow::Result<Self> {
        let images = ImageProxy::new(&config.images.origin, config.image_timeout()?)?;
        Ok(Self::new(store, SiteSettings::from_config(config), images))
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    pub fn images(&self) -> &ImageProxy {
        &self.images
    }

    /// Favorites for a visitor; no cookie or no record means none.
    pub fn favorites_for(&self, user_id: Option<&str>) -> anyhow::Result<Vec<GoatId>> {
        let Some(user_id) = user_id else {
            return Ok(Vec::new());
        };
        let favorites = self
            .store
            .get_favorites(user_id)
            .context("couldn't load favorites")?;
        Ok(favorites.unwrap_or_default())
    }
}

impl Module for GoatsModule {
    async fn initialize(&self) -> anyhow::Result<()> {
        let visitors = self
            .store
            .favorites_count()
            .context("favorites namespace unavailable")?;
        match self.store.featured_goats() {
            Ok(goats) => info!(goats = goats.len(), visitors, "goats module initialized"),
            Err(StateError::NotFound(_)) => {
                warn!(visitors, "goats module initialized without a featured catalogue")
            }
            Err(e) => return Err(e).context("goats namespace unavailable"),
        }
        Ok(())
    }

    async fn main(&self, event: FetchEvent) -> anyhow::Result<Response<Bytes>> {
        router::route(self, event).await
    }
}
