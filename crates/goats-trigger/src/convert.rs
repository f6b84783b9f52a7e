//! Small conversions between hyper types and fetch-event values.

use bytes::Bytes;
use http::{HeaderValue, Request, Response, StatusCode, Uri, header};
use http_body_util::Full;

/// A plain-text response with the given status.
pub fn plain_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

/// The host's default response for an unhandled handler failure.
pub fn internal_error() -> Response<Full<Bytes>> {
    plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Extract the path and query from a URI.
pub fn uri_path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}

/// Rebuild the absolute URL of a request.
///
/// Absolute-form request targets are returned unchanged; origin-form
/// targets are joined with the `host` header.
pub fn request_url<B>(req: &Request<B>) -> String {
    let uri = req.uri();
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}{}", uri_path_and_query(uri))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_is_plain_500() {
        let resp = internal_error();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn uri_path_and_query_full() {
        let uri: Uri = "http://localhost:8080/api/v1?foo=bar".parse().unwrap();
        assert_eq!(uri_path_and_query(&uri), "/api/v1?foo=bar");
    }

    #[test]
    fn uri_path_and_query_root() {
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(uri_path_and_query(&uri), "/");
    }

    #[test]
    fn request_url_joins_host_header() {
        let req = Request::builder()
            .uri("/favorites")
            .header("host", "goats.example:8787")
            .body(())
            .unwrap();
        assert_eq!(request_url(&req), "http://goats.example:8787/favorites");
    }

    #[test]
    fn request_url_keeps_absolute_form() {
        let req = Request::builder()
            .uri("https://goats.example/images/a.jpg")
            .body(())
            .unwrap();
        assert_eq!(request_url(&req), "https://goats.example/images/a.jpg");
    }

    #[test]
    fn request_url_without_host_falls_back() {
        let req = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(request_url(&req), "http://localhost/");
    }
}
