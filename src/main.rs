//! lwm2m-event-gateway server entry point.
//!
//! Starts the Axum HTTP server exposing the event stream endpoint with no
//! producers attached. A device-management server integrates through the
//! library instead: it builds an [`EventHub`], registers the adapters with
//! [`lwm2m_event_gateway::listeners::install`], forwards intercepted CoAP
//! messages to [`CoapMessageTracer::trace`], and mounts
//! [`api::build_router`].

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use lwm2m_event_gateway::api;
use lwm2m_event_gateway::app_state::AppState;
use lwm2m_event_gateway::config::{GatewayConfig, LogFormat};
use lwm2m_event_gateway::hub::{CoapMessageTracer, EventHub, ProtocolTracer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting lwm2m-event-gateway");

    // Build the hub
    let coap_tracer: Arc<dyn ProtocolTracer> = Arc::new(CoapMessageTracer::new());
    let hub = EventHub::new(coap_tracer, config.subscriber_queue_capacity);

    // Build application state
    let app_state = AppState {
        hub,
        keep_alive: config.keep_alive,
    };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
