//! HTTP transport backed by reqwest with a cookie jar.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, Method, StatusCode, Url, header};
use tracing::{debug, warn};

use crate::domain::entities::SessionCookie;
use crate::domain::errors::ApiError;
use crate::domain::ports::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport that keeps the session in a cookie jar, like a browser would.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings and no session.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    fn method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn map_error(e: &reqwest::Error) -> ApiError {
        warn!(error = %e, "HTTP request failed");
        if e.is_timeout() {
            ApiError::network("request timed out")
        } else if e.is_connect() {
            ApiError::network("failed to connect to server")
        } else {
            ApiError::network(e.to_string())
        }
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
    session: Option<(SessionCookie, String)>,
}

impl ReqwestTransportBuilder {
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Seeds the jar with a session cookie scoped to `api_url`.
    #[must_use]
    pub fn session(mut self, cookie: SessionCookie, api_url: impl Into<String>) -> Self {
        self.session = Some((cookie, api_url.into()));
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    /// Returns error if the API URL is invalid or HTTP client creation fails.
    pub fn build(self) -> Result<ReqwestTransport, ApiError> {
        let jar = Arc::new(Jar::default());

        if let Some((cookie, api_url)) = &self.session {
            let url = Url::parse(api_url)
                .map_err(|e| ApiError::network(format!("invalid API URL: {e}")))?;
            jar.add_cookie_str(&cookie.header_value(), &url);
            debug!(cookie = ?cookie, "Session cookie loaded");
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("{}/{}", crate::NAME, crate::VERSION));

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .cookie_provider(jar)
            .build()
            .map_err(|e| ApiError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(ReqwestTransport { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(Self::method(request.method), &request.url)
            .header(header::CONTENT_TYPE, "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| Self::map_error(&e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| Self::map_error(&e))?;

        debug!(status = status.as_u16(), len = body.len(), "Response received");

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: reason(status),
            body,
        })
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use serde::de::IgnoredAny;
    use serde_json::json;
    use wiremock::matchers::{body_json, header as header_is, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::application::routes::ApiRoutes;
    use crate::application::services::{ApiClient, SessionStore};
    use crate::application::CallOptions;
    use crate::domain::ports::MockToastPort;

    #[tokio::test]
    async fn test_send_posts_json_with_session_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subscriptions/check"))
            .and(header_is("content-type", "application/json"))
            .and(header_is("cookie", "sid=abc123"))
            .and(body_json(json!({ "endpoint": "https://push.example/1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "isOwner": true }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::builder()
            .session(SessionCookie::parse("sid=abc123").unwrap(), server.uri())
            .build()
            .unwrap();

        let response = transport
            .send(
                HttpRequest::new(HttpMethod::Post, format!("{}/subscriptions/check", server.uri()))
                    .with_body(Bytes::from_static(br#"{"endpoint":"https://push.example/1"}"#)),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body["data"]["isOwner"], true);
    }

    #[tokio::test]
    async fn test_non_success_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(HttpRequest::new(HttpMethod::Get, server.uri()))
            .await
            .unwrap();

        assert_eq!(response.status, 503);
        assert_eq!(response.status_text, "Service Unavailable");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let transport = ReqwestTransport::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let err = transport
            .send(HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/unreachable"))
            .await
            .unwrap_err();

        assert!(err.is_network_error());
    }

    #[tokio::test]
    async fn test_refresh_cookie_is_used_on_replay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(header_is("cookie", "sid=fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": []
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "sid=fresh; Path=/")
                    .set_body_json(json!({ "success": true, "data": null })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::builder()
            .session(SessionCookie::parse("sid=stale").unwrap(), server.uri())
            .build()
            .unwrap();
        let mut toast = MockToastPort::new();
        toast.expect_show().never();
        let client = ApiClient::new(
            Arc::new(transport),
            Arc::new(SessionStore::new()),
            Arc::new(toast),
            ApiRoutes::new(server.uri(), server.uri()),
            Duration::from_secs(5),
        );

        let items: Vec<IgnoredAny> = client
            .call::<(), _>(&format!("{}/items", server.uri()), CallOptions::get())
            .await
            .unwrap();

        assert!(items.is_empty());
    }
}
