//! # meeting-auth
//!
//! Authentication and HTTP plumbing shared by the outbound API clients:
//! - API key authentication for the Fathom meetings API (`X-Api-Key`)
//! - Bearer token authentication for the Airtable API
//! - HTTP client building with connect/read timeouts and request timing middleware
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meeting_auth::{
//!     api_key::{ApiKeyAuth, ApiKeyProvider},
//!     http::AuthenticatedClientBuilder,
//! };
//!
//! let client = AuthenticatedClientBuilder::new()
//!     .with_auth(Box::new(ApiKeyAuth::new(ApiKeyProvider::Fathom, key)?))
//!     .build()?;
//! ```

pub mod api_key;
pub mod error;
pub mod http;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
