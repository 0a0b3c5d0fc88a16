//! Thin reqwest wrapper bound to one backend base URL.
//! Maps transport failures, timeouts and non-2xx statuses onto `BeesyncError`.

use std::time::Duration;

use beesync_common::{BeesyncError, Result};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base: String,
}

impl BackendClient {
    /// Creates a client for `base_url` with a default per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| BeesyncError::Config(format!("Invalid backend URL {base_url}: {e}")))?;

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| BeesyncError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    /// Absolute URL for an endpoint path such as `/api/hives`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Send and return the raw response, failing on transport errors only.
    pub async fn send_raw(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        req.send().await.map_err(|e| transport_error(e, what))
    }

    /// Send, require a 2xx status, and return the response.
    pub async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
        let resp = self.send_raw(req, what).await?;
        let status = resp.status();
        if status.is_success() {
            debug!(%status, what, "backend call succeeded");
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        warn!(%status, what, "backend call failed");
        Err(BeesyncError::Status { status: status.as_u16(), body })
    }

    /// Send, require a 2xx status, and decode the JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
        let resp = self.send(req, what).await?;
        let bytes = resp.bytes().await.map_err(|e| transport_error(e, what))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send, require a 2xx status, and discard the body.
    pub async fn send_unit(&self, req: RequestBuilder, what: &str) -> Result<()> {
        self.send(req, what).await.map(|_| ())
    }

    /// Decode a JSON array body; any other JSON shape yields an empty list.
    pub async fn send_list<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<Vec<T>> {
        let value: serde_json::Value = self.send_json(req, what).await?;
        if value.is_array() {
            Ok(serde_json::from_value(value)?)
        } else {
            warn!(what, "expected a JSON array, treating as empty");
            Ok(Vec::new())
        }
    }
}

fn transport_error(err: reqwest::Error, what: &str) -> BeesyncError {
    if err.is_timeout() {
        BeesyncError::Timeout(what.to_string())
    } else {
        BeesyncError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = BackendClient::new("http://127.0.0.1:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/api/hives"), "http://127.0.0.1:5000/api/hives");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = BackendClient::new("127.0.0.1 port 5000", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, BeesyncError::Config(_)));
    }

    #[tokio::test]
    async fn test_non_2xx_becomes_status_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/hives")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let client = BackendClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let err = client.send_unit(client.get("/api/hives"), "list hives").await.unwrap_err();
        match err {
            BeesyncError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_array_list_is_empty() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/hives")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "db offline"}"#)
            .create_async()
            .await;

        let client = BackendClient::new(&server.url(), Duration::from_secs(5)).unwrap();
        let hives: Vec<serde_json::Value> = client.send_list(client.get("/api/hives"), "list hives").await.unwrap();
        assert!(hives.is_empty());
    }
}
