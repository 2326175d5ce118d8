//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, OpenAiRecipeAdapter, PgCatalogSource, PgCookingStore, PgGeneratedSource,
        UnconfiguredGenerator,
    },
    config::Config,
    error::ApiError,
    web::{build_router, AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use cooking_assistant_core::{
    engine::CookingEngine, ports::RecipeGenerationService, recipe::RecipeResolver,
};
use sqlx::postgres::PgPoolOptions;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_open_conns)
        .idle_timeout(config.db_idle_timeout)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let generator: Arc<dyn RecipeGenerationService> = match &config.openai_api_key {
        Some(api_key) => {
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(base_url) = &config.openai_base_url {
                openai_config = openai_config.with_api_base(base_url);
            }
            Arc::new(OpenAiRecipeAdapter::new(
                Client::with_config(openai_config),
                config.generation_model.clone(),
            ))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; recipe generation is disabled");
            Arc::new(UnconfiguredGenerator)
        }
    };

    let cooking = CookingEngine::new(
        RecipeResolver::new(
            Arc::new(PgCatalogSource::new(db_pool.clone())),
            Arc::new(PgGeneratedSource::new(db_pool.clone())),
        ),
        Arc::new(PgCookingStore::new(db_pool.clone())),
        db_adapter.clone(),
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        accounts: db_adapter.clone(),
        catalog: db_adapter.clone(),
        generated: db_adapter,
        generator,
        cooking,
    });

    // --- 5. Create the Web Router ---
    let app = build_router(app_state)?;

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future(),
    );

    let grace = config.shutdown_grace;
    tokio::select! {
        joined = &mut server => {
            joined.map_err(|e| ApiError::Internal(format!("Server task failed: {}", e)))??;
        }
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("In-flight requests did not finish within {:?}; exiting", grace);
            server.abort();
        }
    }

    db_pool.close().await;
    info!("Server stopped.");
    Ok(())
}

/// Cancels `token` on Ctrl-C or SIGTERM.
async fn wait_for_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received; draining in-flight requests...");
    token.cancel();
}
