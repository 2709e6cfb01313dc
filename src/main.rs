use std::sync::Arc;

use tracing::info;

use printhouse_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::logging::init_tracing(&cfg.log_level);

    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    api::db::run_migrations(&db_pool).await?;
    let db_pool = Arc::new(db_pool);

    let (event_sender, event_rx) = api::events::channel(1024);
    api::events::spawn_event_logger(event_rx);

    let state = api::AppState::new(db_pool, Arc::new(event_sender));
    let app = api::app_router(state);

    let addr = cfg.bind_address();
    info!(%addr, "printhouse api listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
