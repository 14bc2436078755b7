use tracing_subscriber::EnvFilter;

use tree_browse::api;
use tree_browse::config::Config;
use tree_browse::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Instance directory: {}", config.instance_dir.display());

    let state = AppState::new(&config)?;
    tracing::info!(
        "Serving {} tree(s) under '{}/'",
        state.site.registry.len(),
        state.site.www_root
    );

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
