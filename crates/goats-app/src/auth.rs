//! Visitor identity via the `user_id` cookie.

use std::time::Duration;

use http::Request;
use http::header::COOKIE;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use tracing::debug;

pub const USER_ID_COOKIE: &str = "user_id";

const USER_ID_LEN: usize = 30;

/// Extract the user id from the request's cookies, if one exists.
pub fn user_id<B>(req: &Request<B>) -> Option<String> {
    let user_id = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == USER_ID_COOKIE)
        .map(|(_, value)| value.trim_matches('"').to_string());
    debug!(has_user_id = user_id.is_some(), "read visitor cookie");
    user_id
}

/// Build the `set-cookie` value carrying a user id.
pub fn user_id_cookie(user_id: &str, max_age: Duration, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!(
        "{USER_ID_COOKIE}={user_id}; HttpOnly{secure_flag}; Path=/; Max-Age={}",
        max_age.as_secs()
    )
}

/// A fresh random user id.
pub fn random_user_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(USER_ID_LEN)
        .map(char::from)
        .collect()
}
