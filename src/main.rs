use domain::{AirtableClient, FathomClient};
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting Fathom to Airtable sync [{}]...",
        config.runtime_env()
    );

    let fathom = match FathomClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Fathom client: {e}");
            std::process::exit(1);
        }
    };

    let airtable = match AirtableClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Airtable client: {e}");
            std::process::exit(1);
        }
    };

    if let Some(filter) = config.fathom_participant_filter() {
        info!("Only syncing Fathom meetings with participant matching \"{filter}\"");
    }

    let app_state = web::AppState::new(
        service::AppState::new(config),
        Arc::new(fathom),
        Arc::new(airtable),
    );

    if let Err(e) = web::init_server(app_state).await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }
}
