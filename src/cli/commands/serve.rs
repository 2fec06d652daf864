//! HTTP API server with the background message processor.

use crate::api;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::context::AppContext;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the HTTP API server until Ctrl+C.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    match preflight::check(Operation::Serve) {
        Ok(warnings) => warnings.iter().for_each(|w| Output::warning(w)),
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    }

    let host = host.unwrap_or(&settings.server.host).to_string();
    let port = port.unwrap_or(settings.server.port);

    let ctx = Arc::new(AppContext::from_settings(settings)?);
    let processor = ctx.processor();
    let mut handle = processor.start();

    let app = api::router(ctx.clone());
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Poke API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Create User", "POST /users");
    Output::kv("Get User", "GET  /users/{user_id}");
    Output::kv("Memory", "GET  /users/{user_id}/memory");
    Output::kv("Conversations", "GET  /users/{user_id}/conversations");
    Output::kv("Link Account", "POST /connections/initiate");
    Output::kv("Link Status", "GET  /connections/{connection_id}/status");
    Output::kv("Send Message", "POST /messages");
    Output::kv("Get Reply", "GET  /messages/{message_id}/response");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("HTTP server shutting down");
        })
        .await?;

    handle.stop().await?;
    let pending = ctx.queue.len();
    if pending > 0 {
        Output::warning(&format!("{} queued message(s) were not processed", pending));
    }
    Output::info("Server stopped.");

    Ok(())
}
