//! API key authentication for the external data providers.
//!
//! Provides the trait and implementation for authenticating requests to services
//! that use API keys or personal access tokens (Fathom, Airtable).

mod auth;

pub use auth::{ApiKeyAuth, ApiKeyProvider, AuthMethod, ProviderAuth};
