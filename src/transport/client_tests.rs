//! Tests for `ReqwestClient`.
//!
//! These cover construction and the error mapping for unreachable hosts.
//! Behaviour against live endpoints is exercised through the dispatcher
//! with a mock client.

use std::time::Duration;

use super::*;

mod reqwest_client {
    use super::*;

    #[test]
    fn new_creates_client_with_fixed_timeout() {
        let client = ReqwestClient::new().unwrap();
        let debug = format!("{client:?}");

        assert!(debug.contains("ReqwestClient"));
    }

    #[test]
    fn from_client_accepts_custom_client() {
        let custom = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        let client = ReqwestClient::from_client(custom);

        let _ = format!("{client:?}");
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestClient>();
    }

    #[tokio::test]
    async fn request_to_invalid_host_returns_error_or_proxy_response() {
        let client = ReqwestClient::with_timeout(Duration::from_secs(2)).unwrap();
        let url = url::Url::parse("http://invalid.invalid.invalid/").unwrap();
        let req = HttpRequest::new(http::Method::GET, url);

        let result = client.request(req).await;

        // In environments with a proxy, the proxy may answer with an HTTP
        // error response (e.g. 502) instead of a connection error.
        match result {
            Err(HttpError::Connection(_) | HttpError::Timeout) => {}
            Ok(resp) if !resp.is_success() => {}
            other => panic!("Expected connection error or proxy error response, got {other:?}"),
        }
    }
}
