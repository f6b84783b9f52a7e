//! Image proxy — serves `/images/...` from the configured origin.

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use http::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, LAST_MODIFIED};
use http::Response;
use reqwest::{Client, Url};
use tracing::debug;

/// Upstream headers copied onto the proxied response.
const FORWARDED_HEADERS: [http::HeaderName; 4] = [CONTENT_TYPE, CACHE_CONTROL, ETAG, LAST_MODIFIED];

#[derive(Debug, Clone)]
pub struct ImageProxy {
    client: Client,
    origin: String,
    /// Path of the origin without a trailing slash; every upstream URL stays below it.
    base_path: String,
}

impl ImageProxy {
    pub fn new(origin: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build image client")?;
        let origin = origin.trim_end_matches('/').to_string();
        let base_path = Url::parse(&origin)
            .with_context(|| format!("invalid image origin: {origin}"))?
            .path()
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            origin,
            base_path,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Upstream URL for a request path such as `/images/billy.jpg`.
    ///
    /// Fails when the resolved URL would leave the origin's path.
    pub fn upstream_url(&self, path: &str) -> anyhow::Result<Url> {
        let url = Url::parse(&format!("{}{}", self.origin, path))
            .with_context(|| format!("invalid image path: {path}"))?;
        let prefix = format!("{}/", self.base_path);
        anyhow::ensure!(
            url.path().starts_with(&prefix),
            "image path escapes origin: {path}"
        );
        Ok(url)
    }

    /// Fetch `path` from the origin and relay status, body and cache headers.
    ///
    /// Non-2xx upstream responses are relayed as-is; transport failures
    /// are errors.
    pub async fn fetch(&self, path: &str) -> anyhow::Result<Response<Bytes>> {
        let url = self.upstream_url(path)?;
        let upstream = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("image fetch failed: {url}"))?;

        let status = upstream.status();
        debug!(%url, %status, "image fetched");

        let mut builder = Response::builder().status(status.as_u16());
        for name in FORWARDED_HEADERS {
            if let Some(value) = upstream.headers().get(&name) {
                builder = builder.header(name, value.as_bytes());
            }
        }
        let body = upstream
            .bytes()
            .await
            .with_context(|| format!("image body read failed: {url}"))?;

        builder.body(body).context("failed to build image response")
    }
}

/// True when `path` has a `.` or `..` segment, raw or percent-encoded.
///
/// Backslashes count as separators since URL parsing treats them as `/`
/// for http(s).
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_url_joins_origin_and_path() {
        let proxy = ImageProxy::new("https://cdn.example/best_goats/", Duration::from_secs(1)).unwrap();
        assert_eq!(proxy.origin(), "https://cdn.example/best_goats");
        assert_eq!(
            proxy.upstream_url("/images/billy.jpg").unwrap().as_str(),
            "https://cdn.example/best_goats/images/billy.jpg"
        );
    }

    #[test]
    fn upstream_url_stays_below_origin_path() {
        let proxy = ImageProxy::new("https://cdn.example/best_goats", Duration::from_secs(1)).unwrap();
        assert!(proxy.upstream_url("/images/../../other_bucket/secret").is_err());
        assert!(proxy.upstream_url("/images/%2e%2e/%2E%2E/other_bucket/secret").is_err());
        assert!(proxy.upstream_url("/../best_goats_private/x").is_err());
        assert_eq!(
            proxy.upstream_url("/images/./billy.jpg").unwrap().path(),
            "/best_goats/images/billy.jpg"
        );
    }

    #[test]
    fn invalid_origin_is_rejected() {
        assert!(ImageProxy::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn dot_segments_are_detected() {
        assert!(has_dot_segment("/images/../x"));
        assert!(has_dot_segment("/images/%2e%2E/x"));
        assert!(has_dot_segment("/images/.%2e/x"));
        assert!(has_dot_segment("/images/./x"));
        assert!(has_dot_segment("/images/..\\x"));
        assert!(!has_dot_segment("/images/billy.jpg"));
        assert!(!has_dot_segment("/images/..billy.jpg"));
    }
}
