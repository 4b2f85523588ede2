// gateway/src/main.rs
use std::sync::Arc;

use actix_web::HttpServer;
use common::{setup_tracing, GatewayConfig};
use gateway::build_app;
use gateway::session_store::{MemorySessionStore, SessionStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    setup_tracing();

    let config = GatewayConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    tracing::info!("Starting gateway on {}", bind_addr);
    for app in &config.apps {
        tracing::info!("- {}: http://{}{}", app.name, bind_addr, app.prefix);
    }
    tracing::info!(
        "- agent API: {} -> {}",
        config.upstream.prefix,
        config.upstream.origin
    );

    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());

    HttpServer::new(move || build_app(config.clone(), store.clone()))
        .bind(&bind_addr)?
        .run()
        .await
}
