use anyhow::Result;
use formentor::bridge::{BridgeContext, CupraBridge};
use formentor::web::{self, AppState};
use tracing::error;

#[tokio::main]
async fn main() -> Result<()> {
    let config = formentor::Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    formentor::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let web_host = config.web.host.clone();
    let web_port = config.web.port;

    let ctx = BridgeContext::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create gateway: {}", e))?;
    let mut bridge = CupraBridge::new(ctx.clone());

    let state = AppState {
        ctx,
        snapshot_rx: bridge.subscribe_snapshot(),
        status_tx: bridge.status_sender(),
    };
    let web_task = tokio::spawn(async move {
        if let Err(e) = web::serve(state, &web_host, web_port).await {
            error!("Web server error: {}", e);
        }
    });

    // Ctrl-C becomes a shutdown request for the bridge loop
    let shutdown = bridge.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(());
        }
    });

    let result = bridge.run().await;
    web_task.abort();
    result.map_err(|e| anyhow::anyhow!("Bridge error: {}", e))
}
