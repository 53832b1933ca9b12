// src/page/http.rs
// =============================================================================
// Downloads pages over HTTP(S) with reqwest.
//
// The client is built once from the Strategy and reused for every request
// (connection pooling). It carries:
// - the Strategy's headers as default headers
// - the Strategy's cookies as a single "Cookie" header
// - the per-request timeout
// - TLS verification switched on or off
//
// Anything other than a 2xx answer is a FetchError. There are no retries.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Client;

use super::{FetchedPage, Fetcher};
use crate::crawl::Strategy;
use crate::error::{CrawlError, FetchError};

/// reqwest-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(strategy: &Strategy) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .default_headers(build_headers(strategy)?)
            .timeout(strategy.per_request_timeout())
            .danger_accept_invalid_certs(!strategy.verify_tls())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let encoding = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let body = response.bytes().await?.to_vec();
        Ok(FetchedPage { body, encoding })
    }
}

fn build_headers(strategy: &Strategy) -> Result<HeaderMap, CrawlError> {
    let mut headers = HeaderMap::new();
    for (name, value) in strategy.headers() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CrawlError::InvalidConfig(format!("header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| CrawlError::InvalidConfig(format!("header value for '{name}': {e}")))?;
        headers.insert(name, value);
    }

    if !strategy.cookies().is_empty() {
        // Sorted so the header is the same on every run
        let mut pairs: Vec<_> = strategy.cookies().iter().collect();
        pairs.sort();
        let cookie = pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| CrawlError::InvalidConfig(format!("cookie header: {e}")))?;
        headers.insert(COOKIE, value);
    }

    Ok(headers)
}

// "text/html; charset=GBK" -> Some("gbk")
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_ascii_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::io::Write;

    #[test]
    fn test_charset_from_content_type() {
        assert_eq!(
            charset_from_content_type("text/html; charset=GBK"),
            Some("gbk".to_string())
        );
        assert_eq!(
            charset_from_content_type("text/html;charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_from_content_type("text/html"), None);
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_charset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page")
            .match_header("cookie", "session=abc")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<a href=\"/next\">next</a>")
            .create_async()
            .await;

        let strategy = Strategy::builder().cookie("session", "abc").build().unwrap();
        let fetcher = HttpFetcher::new(&strategy).unwrap();
        let page = fetcher
            .fetch(&format!("{}/page", server.url()))
            .await
            .unwrap();

        assert_eq!(page.encoding.as_deref(), Some("utf-8"));
        assert_eq!(page.body, b"<a href=\"/next\">next</a>");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_without_charset() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html></html>")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&Strategy::default()).unwrap();
        let page = fetcher.fetch(&server.url()).await.unwrap();
        assert_eq!(page.encoding, None);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&Strategy::default()).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(StatusCode::NOT_FOUND)));
    }

    #[tokio::test]
    async fn test_sends_default_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("user-agent", "link-spider/0.1")
            .match_header("accept-charset", "GBK,utf-8;q=0.7,*;q=0.3")
            .with_status(200)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&Strategy::default()).unwrap();
        fetcher.fetch(&server.url()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_slow_body_hits_request_timeout() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/slow")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(std::time::Duration::from_secs(1));
                w.write_all(b"<html></html>")
            })
            .create_async()
            .await;

        let strategy = Strategy::builder()
            .per_request_timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        let fetcher = HttpFetcher::new(&strategy).unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request(ref e) if e.is_timeout()), "{err:?}");
    }
}
