//! Authenticated HTTP client builder with middleware.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};

use super::RequestTimer;
use crate::api_key::{ApiKeyProvider, ProviderAuth};
use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Deadline for establishing the TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Deadline for the whole request once sent, including reading the body.
    pub read_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            user_agent: format!("meeting-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client that applies provider authentication to every request it builds.
///
/// Requests are never retried here; callers decide whether a failure is worth
/// another attempt.
pub struct AuthenticatedClient {
    client: ClientWithMiddleware,
    auth: Box<dyn ProviderAuth>,
}

impl AuthenticatedClient {
    /// Start an authenticated GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.auth.authenticate(self.client.get(url))
    }

    /// Start an authenticated POST request.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.auth.authenticate(self.client.post(url))
    }

    /// The provider whose credentials this client sends.
    pub fn provider(&self) -> ApiKeyProvider {
        self.auth.provider()
    }
}

/// Builder for creating authenticated HTTP clients with middleware.
///
/// Provides a fluent API for constructing HTTP clients with:
/// - Authentication (API key headers, bearer tokens)
/// - Connect and read timeouts
/// - Request timing logs
pub struct AuthenticatedClientBuilder {
    config: HttpClientConfig,
    auth: Option<Box<dyn ProviderAuth>>,
}

impl AuthenticatedClientBuilder {
    /// Create a new client builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
            auth: None,
        }
    }

    /// Set the authentication provider.
    pub fn with_auth(mut self, auth: Box<dyn ProviderAuth>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.config.user_agent = user_agent;
        self
    }

    /// Build the configured HTTP client.
    ///
    /// Fails if no authentication provider was set or the underlying
    /// reqwest client cannot be built.
    pub fn build(self) -> Result<AuthenticatedClient, Error> {
        let auth = self.auth.ok_or_else(|| {
            api_key_error(
                ApiKeyErrorKind::Missing,
                "no authentication configured for HTTP client",
            )
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .timeout(self.config.read_timeout)
            .user_agent(self.config.user_agent)
            .build()?;

        let client_with_middleware = ClientBuilder::new(client)
            .with(RequestTimer::new(auth.provider().as_str()))
            .build();

        Ok(AuthenticatedClient {
            client: client_with_middleware,
            auth,
        })
    }
}

impl Default for AuthenticatedClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_key::ApiKeyAuth;
    use crate::error::ErrorKind;
    use secrecy::SecretString;

    fn fathom_auth() -> Box<dyn ProviderAuth> {
        Box::new(
            ApiKeyAuth::new(
                ApiKeyProvider::Fathom,
                SecretString::new("fathom_key".to_string()),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_builder_default() {
        let builder = AuthenticatedClientBuilder::new();
        assert_eq!(builder.config.connect_timeout, Duration::from_secs(5));
        assert_eq!(builder.config.read_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_with_timeouts() {
        let builder = AuthenticatedClientBuilder::new()
            .with_connect_timeout(Duration::from_secs(2))
            .with_read_timeout(Duration::from_secs(60));
        assert_eq!(builder.config.connect_timeout, Duration::from_secs(2));
        assert_eq!(builder.config.read_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_build_without_auth_fails() {
        let result = AuthenticatedClientBuilder::new().build();
        let err = result.err().unwrap();
        assert_eq!(err.error_kind, ErrorKind::ApiKey(ApiKeyErrorKind::Missing));
    }

    #[tokio::test]
    async fn test_build_client() {
        let client = AuthenticatedClientBuilder::new()
            .with_auth(fathom_auth())
            .build()
            .unwrap();
        assert_eq!(client.provider(), ApiKeyProvider::Fathom);
    }

    #[tokio::test]
    async fn test_requests_carry_provider_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/external/v1/meetings")
            .match_header("x-api-key", "fathom_key")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new()
            .with_auth(fathom_auth())
            .build()
            .unwrap();
        let response = client
            .get(&format!("{}/external/v1/meetings", server.url()))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_airtable_requests_use_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v0/app123/People")
            .match_header("authorization", "Bearer pat_123")
            .with_status(200)
            .with_body(r#"{"id":"rec1","fields":{}}"#)
            .create_async()
            .await;

        let client = AuthenticatedClientBuilder::new()
            .with_auth(Box::new(
                ApiKeyAuth::new(
                    ApiKeyProvider::Airtable,
                    SecretString::new("pat_123".to_string()),
                )
                .unwrap(),
            ))
            .build()
            .unwrap();
        let response = client
            .post(&format!("{}/v0/app123/People", server.url()))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        mock.assert_async().await;
    }
}
