//! Adding and removing favorites.
//!
//! Every change stores the list under a freshly generated user id and
//! hands the visitor a new cookie; the previous record is deleted in the
//! background once the response is on its way.

use bytes::Bytes;
use http::header::REFERER;
use http::{Response, StatusCode};
use tracing::{debug, warn};

use goats_core::{FavoritesAction, GoatId};
use goats_trigger::FetchEvent;

use crate::pages::error_page;
use crate::response::redirect;
use crate::{GoatsModule, auth, form};

/// The referrer if there is one, otherwise the request URL.
fn referrer_or_url(event: &FetchEvent) -> String {
    event
        .request()
        .headers()
        .get(REFERER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| event.url())
}

pub async fn modify(
    module: &GoatsModule,
    event: FetchEvent,
    action: FavoritesAction,
) -> anyhow::Result<Response<Bytes>> {
    let req = event.request();
    let orig_user_id = auth::user_id(req);
    let redirect_url = referrer_or_url(&event);
    let goat_id = form::field(req.body(), "id");
    let mut favorites = module.favorites_for(orig_user_id.as_deref())?;

    let settings = module.settings();
    let Some(goat_id) = goat_id else {
        return error_page(settings, StatusCode::BAD_REQUEST, Some("Missing id parameter"));
    };
    let Ok(goat_id) = goat_id.parse::<GoatId>() else {
        return error_page(settings, StatusCode::BAD_REQUEST, Some("Invalid id parameter"));
    };

    if !action.apply(&mut favorites, goat_id) {
        debug!(goat_id, ?action, "favorites unchanged");
        return redirect(&redirect_url, None);
    }

    let new_user_id = auth::random_user_id();
    if let Err(e) = module.store().put_favorites(&new_user_id, &favorites) {
        warn!(error = %e, "failed to store favorites");
        return error_page(
            settings,
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("Error updating favorites"),
        );
    }
    debug!(goat_id, ?action, count = favorites.len(), "favorites updated");

    if let Some(old_user_id) = orig_user_id {
        let store = module.store().clone();
        event.wait_until(async move {
            store.delete_favorites(&old_user_id)?;
            Ok(())
        });
    }

    let cookie = auth::user_id_cookie(
        &new_user_id,
        settings.cookie_max_age,
        settings.secure_cookies,
    );
    redirect(&redirect_url, Some(&cookie))
}
