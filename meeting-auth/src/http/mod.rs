//! HTTP client building with middleware.

mod client;
mod timing;

pub use client::{AuthenticatedClient, AuthenticatedClientBuilder, HttpClientConfig};
pub use timing::RequestTimer;
