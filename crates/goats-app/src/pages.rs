//! Page handlers.
//!
//! Each handler loads what it needs from the store, builds the list items,
//! and renders an Askama template. Render failures propagate.

use anyhow::Context;
use askama::Template;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use tracing::debug;

use goats_core::{GoatListItem, goat_list_items};

use crate::response::html;
use crate::{GoatsModule, SiteSettings, auth};

// ── Home ────────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate<'a> {
    title: &'a str,
    site_title: &'a str,
    show_favorites: bool,
    fav_count: usize,
    goats: Vec<GoatListItem>,
}

pub fn home(module: &GoatsModule, req: &Request<Bytes>) -> anyhow::Result<Response<Bytes>> {
    let user_id = auth::user_id(req);
    debug!(has_user_id = user_id.is_some(), "rendering home");
    let favorites = module.favorites_for(user_id.as_deref())?;
    let goats = module
        .store()
        .featured_goats()
        .context("couldn't load goats from the goats namespace")?;

    let settings = module.settings();
    let body = HomeTemplate {
        title: &settings.title,
        site_title: &settings.title,
        show_favorites: true,
        fav_count: favorites.len(),
        goats: goat_list_items(goats, &favorites),
    }
    .render()
    .context("failed to render home page")?;

    html(StatusCode::OK, body)
}

// ── Favorites ───────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "favorites.html")]
struct FavoritesTemplate<'a> {
    title: String,
    site_title: &'a str,
    show_favorites: bool,
    fav_count: usize,
    has_favorites: bool,
    goats: Vec<GoatListItem>,
}

pub fn favorites(
    module: &GoatsModule,
    req: &Request<Bytes>,
) -> anyhow::Result<Response<Bytes>> {
    let user_id = auth::user_id(req);
    let favorites = module.favorites_for(user_id.as_deref())?;
    let goats = module
        .store()
        .featured_goats()
        .context("couldn't load goats from the goats namespace")?;

    let favorite_goats = goats
        .into_iter()
        .filter(|goat| favorites.contains(&goat.id))
        .collect();

    let settings = module.settings();
    let body = FavoritesTemplate {
        title: format!("Favorites - {}", settings.title),
        site_title: &settings.title,
        show_favorites: true,
        fav_count: favorites.len(),
        has_favorites: !favorites.is_empty(),
        goats: goat_list_items(favorite_goats, &favorites),
    }
    .render()
    .context("failed to render favorites page")?;

    html(StatusCode::OK, body)
}

// ── Errors ──────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    title: String,
    site_title: &'a str,
    show_favorites: bool,
    fav_count: usize,
    error_message: String,
}

/// Render an error page. Without `message` the status line is shown.
pub fn error_page(
    settings: &SiteSettings,
    status: StatusCode,
    message: Option<&str>,
) -> anyhow::Result<Response<Bytes>> {
    let status_line = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Error")
    );
    let body = ErrorTemplate {
        title: format!("{status_line} - {}", settings.title),
        site_title: &settings.title,
        show_favorites: false,
        fav_count: 0,
        error_message: message.map(str::to_string).unwrap_or_else(|| status_line.clone()),
    }
    .render()
    .context("failed to render error page")?;

    html(status, body)
}
