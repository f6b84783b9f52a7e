//! Request routing on the first path segment.

use bytes::Bytes;
use http::{Method, Response, StatusCode};
use tracing::debug;

use goats_core::FavoritesAction;
use goats_trigger::FetchEvent;

use crate::pages::{self, error_page};
use crate::{GoatsModule, favorites, images};

/// Route one event. Path and method are matched case-insensitively.
pub async fn route(module: &GoatsModule, event: FetchEvent) -> anyhow::Result<Response<Bytes>> {
    let req = event.request();
    let path = req.uri().path().to_lowercase();
    let method = req.method().as_str().to_uppercase();
    let is = |expected: Method| method == expected.as_str();
    let not_allowed = || error_page(module.settings(), StatusCode::METHOD_NOT_ALLOWED, None);
    let not_found = || error_page(module.settings(), StatusCode::NOT_FOUND, None);

    debug!(%method, %path, "routing request");

    match path.split('/').nth(1) {
        Some("") if is(Method::GET) => pages::home(module, req),
        Some("favorites") if is(Method::GET) => pages::favorites(module, req),
        Some("add-favorite") if is(Method::POST) => {
            favorites::modify(module, event, FavoritesAction::Add).await
        }
        Some("remove-favorite") if is(Method::POST) => {
            favorites::modify(module, event, FavoritesAction::Remove).await
        }
        Some("images") if is(Method::GET) => {
            let raw = req.uri().path();
            if images::has_dot_segment(raw) {
                return not_found();
            }
            // The file part keeps its casing; the prefix is normalized.
            let file = raw
                .get(1..)
                .and_then(|rest| rest.find('/').map(|i| &rest[i..]))
                .unwrap_or_default();
            module.images().fetch(&format!("/images{file}")).await
        }
        Some("" | "favorites" | "add-favorite" | "remove-favorite" | "images") => not_allowed(),
        _ => not_found(),
    }
}
