//! Shared HTTP request helper
//!
//! Every search tool goes through [`HttpHelper::send`], which never fails:
//! transport errors, non-2xx statuses and undecodable bodies are logged and
//! come back as [`ApiResponse::Unavailable`].

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use ss_core::SearchConfig;

/// Outcome of one upstream call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 2xx response with a JSON body
    Document(Value),
    /// Any failure; already logged
    Unavailable,
}

impl ApiResponse {
    pub fn into_document(self) -> Option<Value> {
        match self {
            Self::Document(doc) => Some(doc),
            Self::Unavailable => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }
}

/// A single outbound request. A JSON body makes it a POST, otherwise GET.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    url: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            body: Some(body),
            ..Self::get(url)
        }
    }

    /// Append a query parameter
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a header; overrides a default header of the same name
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_post(&self) -> bool {
        self.body.is_some()
    }
}

#[derive(Debug, Error)]
enum RequestError {
    #[error("HTTP error: {0}")]
    Status(reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(reqwest::Error),

    #[error("Invalid JSON response: {0}")]
    Decode(reqwest::Error),

    #[error("Invalid header {0}")]
    Header(String),
}

/// Performs outbound JSON requests with a fixed timeout and default headers
#[derive(Debug, Clone)]
pub struct HttpHelper {
    user_agent: String,
    timeout: Duration,
}

impl HttpHelper {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.user_agent.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform the request. Never returns an error; failures are logged
    /// with the target URL and mapped to [`ApiResponse::Unavailable`].
    pub async fn send(&self, request: ApiRequest) -> ApiResponse {
        match self.try_send(&request).await {
            Ok(doc) => ApiResponse::Document(doc),
            Err(e) => {
                error!(url = %request.url, error = %e, "Upstream request failed");
                ApiResponse::Unavailable
            }
        }
    }

    async fn try_send(&self, request: &ApiRequest) -> Result<Value, RequestError> {
        let headers = self.merged_headers(&request.headers)?;

        // One client per call: nothing is pooled between tool invocations.
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(RequestError::Transport)?;

        let builder = match &request.body {
            Some(body) => client.post(&request.url).json(body),
            None => client.get(&request.url),
        };

        debug!(url = %request.url, post = request.is_post(), "Sending upstream request");

        let response = builder
            .query(&request.query)
            .headers(headers)
            .send()
            .await
            .map_err(RequestError::Transport)?
            .error_for_status()
            .map_err(RequestError::Status)?;

        response.json::<Value>().await.map_err(RequestError::Decode)
    }

    fn merged_headers(&self, overrides: &[(String, String)]) -> Result<HeaderMap, RequestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|_| RequestError::Header(USER_AGENT.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in overrides {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RequestError::Header(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| RequestError::Header(name.to_string()))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

impl Default for HttpHelper {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn helper() -> HttpHelper {
        HttpHelper::new("search-app/1.0", Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_get_with_query_and_default_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("q", "rust"))
            .and(header("user-agent", "search-app/1.0"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::get(format!("{}/api", server.uri())).query("q", "rust");
        let response = helper().send(request).await;

        assert_eq!(response, ApiResponse::Document(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_body_selects_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_json(json!({"query": "rust"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::post_json(format!("{}/search", server.uri()), json!({"query": "rust"}));
        assert!(request.is_post());

        let response = helper().send(request).await;
        assert!(!response.is_unavailable());
    }

    #[tokio::test]
    async fn test_caller_header_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("accept", "text/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::get(server.uri()).header("Accept", "text/plain");
        let response = helper().send(request).await;

        assert_eq!(response, ApiResponse::Document(json!({})));
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let response = helper().send(ApiRequest::get(server.uri())).await;
        assert!(response.is_unavailable());
    }

    #[tokio::test]
    async fn test_invalid_json_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let response = helper().send(ApiRequest::get(server.uri())).await;
        assert!(response.is_unavailable());
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let helper = HttpHelper::new("search-app/1.0", Duration::from_millis(50));
        let response = helper.send(ApiRequest::get(server.uri())).await;
        assert!(response.is_unavailable());
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let response = helper()
            .send(ApiRequest::get("http://127.0.0.1:1/unreachable"))
            .await;
        assert!(response.is_unavailable());
    }

    #[tokio::test]
    async fn test_invalid_header_is_unavailable() {
        let request = ApiRequest::get("http://127.0.0.1:1/").header("bad header", "x");
        assert!(helper().send(request).await.is_unavailable());
    }

    #[test]
    fn test_from_config() {
        let helper = HttpHelper::from_config(&SearchConfig::default());
        assert_eq!(helper.timeout(), Duration::from_secs(30));
    }
}
