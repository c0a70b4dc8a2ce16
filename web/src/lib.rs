//! HTTP surface of the sync: the Fathom webhook, a health check and the last
//! received payload for debugging.

use domain::{RecordStore, RecordingSource};
use log::*;
use service::config::Config;
use service::PayloadSnapshot;
use std::sync::Arc;
use tokio::net::TcpListener;

mod controller;
mod error;
pub mod router;

pub use error::{Error, Result};

/// State shared by every handler.
///
/// The outbound clients sit behind trait objects so router tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub recording_source: Arc<dyn RecordingSource>,
    pub record_store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        recording_source: Arc<dyn RecordingSource>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            service_state,
            recording_source,
            record_store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }

    pub fn payload_snapshot(&self) -> &PayloadSnapshot {
        &self.service_state.payload_snapshot
    }
}

/// Binds `interface:port` from the configuration and serves the router until the process exits.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state
        .config()
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{}:{}", host, app_state.config().port);

    let listener = TcpListener::bind(&listen_addr).await?;
    info!(
        "Server starting... listening for connections on http://{}",
        listen_addr
    );

    axum::serve(listener, router::define_routes(app_state)).await
}
