//! Response builders shared by the page handlers.

use anyhow::Context;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use http::{Response, StatusCode};

pub fn html(status: StatusCode, body: String) -> anyhow::Result<Response<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/html")
        .body(Bytes::from(body))
        .context("failed to build html response")
}

/// `302 Found` to `location`, optionally setting a cookie.
pub fn redirect(location: &str, cookie: Option<&str>) -> anyhow::Result<Response<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location);
    if let Some(cookie) = cookie {
        builder = builder.header(SET_COOKIE, cookie);
    }
    builder
        .body(Bytes::new())
        .with_context(|| format!("invalid redirect target {location:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_sets_content_type() {
        let resp = html(StatusCode::OK, "<p>hi</p>".to_string()).unwrap();
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html");
        assert_eq!(resp.body(), &Bytes::from("<p>hi</p>"));
    }

    #[test]
    fn redirect_with_and_without_cookie() {
        let plain = redirect("/favorites", None).unwrap();
        assert_eq!(plain.status(), StatusCode::FOUND);
        assert_eq!(plain.headers()[LOCATION], "/favorites");
        assert!(plain.headers().get(SET_COOKIE).is_none());

        let with_cookie = redirect("/", Some("user_id=abc")).unwrap();
        assert_eq!(with_cookie.headers()[SET_COOKIE], "user_id=abc");
    }

    #[test]
    fn redirect_rejects_invalid_location() {
        assert!(redirect("/bad\nheader", None).is_err());
    }
}
