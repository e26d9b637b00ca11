use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use crate::error::{Result, ScienceError};

// ─── HttpClient ───────────────────────────────────────────────────────────────

/// JSON-over-HTTP client with a fixed per-request timeout. Never retries.
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// GETs `url` and decodes the body as JSON.
    ///
    /// A non-2xx response whose body carries an `"error"` string becomes
    /// [`ScienceError::Remote`]; other non-2xx responses become
    /// [`ScienceError::ApiError`].
    pub async fn get_json(&self, url: &Url) -> Result<Value> {
        let endpoint = redacted_endpoint(url);
        let resp = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                ScienceError::Timeout(endpoint.clone())
            } else {
                ScienceError::Http(e)
            }
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                ScienceError::Timeout(endpoint.clone())
            } else {
                ScienceError::Http(e)
            }
        })?;

        if !status.is_success() {
            if let Some(message) = embedded_error(&body) {
                return Err(ScienceError::Remote(message));
            }
            return Err(ScienceError::ApiError(
                endpoint,
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }

        serde_json::from_str(&body).map_err(|e| ScienceError::Parse(e.to_string()))
    }
}

/// Scheme, host and path only; query strings may carry credentials.
fn redacted_endpoint(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

fn embedded_error(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_secs(5), "scholarfeed-test/0.1").unwrap()
    }

    #[tokio::test]
    async fn get_json_decodes_success_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value": 42}"#)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/ok", server.url())).unwrap();
        let json = client().get_json(&url).await.unwrap();
        assert_eq!(json["value"], 42);
    }

    #[tokio::test]
    async fn error_status_with_error_field_is_remote() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search.json")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body(r#"{"error": "Invalid API key."}"#)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/search.json?api_key=secret", server.url())).unwrap();
        let err = client().get_json(&url).await.unwrap_err();
        assert!(matches!(err, ScienceError::Remote(ref m) if m == "Invalid API key."));
        assert!(err.is_remote());
    }

    #[tokio::test]
    async fn error_status_without_error_field_is_api_error_without_credentials() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search.json")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body("upstream down")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/search.json?api_key=secret", server.url())).unwrap();
        let err = client().get_json(&url).await.unwrap_err();
        match err {
            ScienceError::ApiError(endpoint, message) => {
                assert!(!endpoint.contains("secret"));
                assert!(message.contains("503"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn connection_failure_is_transport() {
        let url = Url::parse("http://127.0.0.1:1/search.json").unwrap();
        let err = client().get_json(&url).await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn unanswered_request_times_out_as_transport() {
        // Accepts connections into the backlog but never replies.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = HttpClient::new(Duration::from_millis(200), "scholarfeed-test/0.1").unwrap();
        let url = Url::parse(&format!("http://{addr}/search.json?api_key=secret")).unwrap();
        let err = client.get_json(&url).await.unwrap_err();

        assert!(matches!(err, ScienceError::Timeout(_)), "unexpected error: {err}");
        assert!(err.is_transport());
        assert!(!err.to_string().contains("secret"));
        drop(listener);
    }

    #[tokio::test]
    async fn invalid_json_is_parse_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/garbage", server.url())).unwrap();
        let err = client().get_json(&url).await.unwrap_err();
        assert!(matches!(err, ScienceError::Parse(_)));
    }
}
