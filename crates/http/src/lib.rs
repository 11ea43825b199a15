//! HTTP server facade for FOLIO with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{routing::get, Router};

use folio_kernel::ModuleRegistry;

pub mod error;
pub mod router;

use router::RouterBuilder;

/// Start the HTTP server with the given module registry
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &folio_kernel::settings::Settings,
) -> anyhow::Result<()> {
    let app = build_router(registry, settings)
        .await
        .context("failed to build HTTP router")?;

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", settings.server.host, settings.server.port))
            .await
            .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Build the main HTTP router with all module routes mounted under
/// `/api/{module_name}`. Public so integration tests can assemble the
/// application without binding a socket.
pub async fn build_router(
    registry: &ModuleRegistry,
    settings: &folio_kernel::settings::Settings,
) -> anyhow::Result<Router> {
    let mut builder = RouterBuilder::new()
        .with_tracing()
        .with_cors()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .route("/healthz", get(health_check));

    for module in registry.modules() {
        tracing::info!(
            module = module.name(),
            "mounting module routes under /api/{}",
            module.name()
        );
        builder = builder.mount_module(module.name(), module.routes());
    }

    Ok(builder.with_openapi(registry).build())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
