//! API key authentication trait and implementation.

use reqwest_middleware::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{api_key_error, ApiKeyErrorKind, Error};

/// Known API providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyProvider {
    Fathom,
    Airtable,
}

impl ApiKeyProvider {
    /// Get the provider identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyProvider::Fathom => "fathom",
            ApiKeyProvider::Airtable => "airtable",
        }
    }
}

/// Authentication method for HTTP requests.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMethod {
    /// Custom header with optional prefix (e.g., "X-Api-Key: xxx")
    ApiKeyHeader {
        header_name: String,
        prefix: Option<String>,
    },
    /// Standard Bearer token
    BearerToken,
}

/// Trait for authenticating HTTP requests with API keys or bearer tokens.
///
/// Implementations handle provider-specific authentication patterns like:
/// - Fathom: `X-Api-Key: xxx`
/// - Airtable: `Authorization: Bearer xxx`
pub trait ProviderAuth: Send + Sync {
    /// Get the provider identifier.
    fn provider(&self) -> ApiKeyProvider;

    /// Get the authentication method used by this provider.
    fn auth_method(&self) -> AuthMethod;

    /// Apply authentication to a request builder.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}

/// API key authentication implementation.
///
/// Sends the key in a provider-specific header, optionally behind a prefix.
///
/// # Examples
///
/// ```rust,ignore
/// // Fathom: X-Api-Key: xxx
/// let auth = ApiKeyAuth::new(ApiKeyProvider::Fathom, SecretString::new("api_key_here".to_string()))?;
/// ```
pub struct ApiKeyAuth {
    provider: ApiKeyProvider,
    api_key: SecretString,
    header_name: String,
    prefix: Option<String>,
}

impl ApiKeyAuth {
    /// Create a new API key authenticator.
    ///
    /// Fails when the key is blank or cannot be sent as a header value.
    pub fn new(provider: ApiKeyProvider, api_key: SecretString) -> Result<Self, Error> {
        let key = api_key.expose_secret().trim();
        if key.is_empty() {
            return Err(api_key_error(
                ApiKeyErrorKind::Missing,
                &format!("empty {} API key", provider.as_str()),
            ));
        }
        if reqwest::header::HeaderValue::from_str(key).is_err() {
            return Err(api_key_error(
                ApiKeyErrorKind::InvalidFormat,
                &format!("{} API key contains invalid characters", provider.as_str()),
            ));
        }

        let (header_name, prefix) = match provider {
            ApiKeyProvider::Fathom => ("X-Api-Key".to_string(), None),
            ApiKeyProvider::Airtable => ("Authorization".to_string(), Some("Bearer".to_string())),
        };

        Ok(Self {
            provider,
            api_key,
            header_name,
            prefix,
        })
    }

    /// Get a reference to the API key.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }
}

impl ProviderAuth for ApiKeyAuth {
    fn provider(&self) -> ApiKeyProvider {
        self.provider
    }

    fn auth_method(&self) -> AuthMethod {
        AuthMethod::ApiKeyHeader {
            header_name: self.header_name.clone(),
            prefix: self.prefix.clone(),
        }
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret().trim();
        let auth_value = if let Some(prefix) = &self.prefix {
            format!("{} {}", prefix, key)
        } else {
            key.to_string()
        };

        request.header(&self.header_name, auth_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_api_key_provider_as_str() {
        assert_eq!(ApiKeyProvider::Fathom.as_str(), "fathom");
        assert_eq!(ApiKeyProvider::Airtable.as_str(), "airtable");
    }

    #[test]
    fn test_fathom_auth_uses_x_api_key_header() {
        let auth =
            ApiKeyAuth::new(ApiKeyProvider::Fathom, SecretString::new("test_key".to_string()))
                .unwrap();

        assert_eq!(auth.provider(), ApiKeyProvider::Fathom);
        assert_eq!(
            auth.auth_method(),
            AuthMethod::ApiKeyHeader {
                header_name: "X-Api-Key".to_string(),
                prefix: None,
            }
        );
    }

    #[test]
    fn test_blank_key_is_rejected() {
        let result = ApiKeyAuth::new(ApiKeyProvider::Fathom, SecretString::new("  ".to_string()));
        let err = result.err().unwrap();
        assert_eq!(err.error_kind, ErrorKind::ApiKey(ApiKeyErrorKind::Missing));
    }

    #[test]
    fn test_key_with_newline_is_rejected() {
        let result = ApiKeyAuth::new(
            ApiKeyProvider::Fathom,
            SecretString::new("abc\ndef".to_string()),
        );
        let err = result.err().unwrap();
        assert_eq!(
            err.error_kind,
            ErrorKind::ApiKey(ApiKeyErrorKind::InvalidFormat)
        );
    }
}
