//! Fable REST API server binary.
//!
//! Resolves configuration from the environment once at startup, builds the
//! tale service and (if configured) the narrative-generator client, and
//! serves the REST router with OpenAPI/Swagger UI.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use fable_core::{FableConfig, GeneratorConfig, NarrativeClient, TaleService};

/// Main entry point for the Fable REST API server.
///
/// # Environment Variables
/// - `FABLE_ADDR`: server address (default: "0.0.0.0:3000")
/// - `TALE_DATA_DIR`: directory for tale storage (default: "/tale_data"; must exist)
/// - `GENERATOR_URL`: chat-completions endpoint of the narrative generator
///   (generation requests fail when unset; the rest of the API works)
/// - `GENERATOR_API_KEY`: bearer key for the generator endpoint
/// - `GENERATOR_MODEL`: model name to request (default: "gpt-4o-mini")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory is missing,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fable_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FABLE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_dir = std::env::var("TALE_DATA_DIR").unwrap_or_else(|_| "/tale_data".into());
    let data_path = Path::new(&data_dir);
    if !data_path.exists() {
        anyhow::bail!("Tale data directory does not exist: {}", data_path.display());
    }

    let generator = match std::env::var("GENERATOR_URL") {
        Ok(endpoint) => {
            let api_key = std::env::var("GENERATOR_API_KEY").unwrap_or_default();
            let model = std::env::var("GENERATOR_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
            Some(GeneratorConfig::new(endpoint, api_key, model)?)
        }
        Err(_) => {
            tracing::warn!("GENERATOR_URL not set; story generation is disabled");
            None
        }
    };

    let cfg = Arc::new(FableConfig::new(data_path.to_path_buf(), generator)?);

    let narrator = cfg
        .generator()
        .cloned()
        .map(|generator_cfg| Arc::new(NarrativeClient::new(generator_cfg)));

    let state = AppState {
        tale_service: TaleService::new(cfg),
        narrator,
    };

    tracing::info!("-- Starting Fable REST API on {}", addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
