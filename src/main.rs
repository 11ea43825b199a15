mod modules;

use std::sync::Arc;

use anyhow::Context;
use folio_kernel::settings::{LogFormat, Settings};
use folio_kernel::{InitCtx, ModuleRegistry};
use folio_store::memory::MemoryStore;
use folio_store::EntityStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load FOLIO settings")?;
    init_tracing(&settings);

    tracing::info!(
        env = ?settings.environment,
        engine = %settings.storage.engine,
        "folio-app bootstrap starting"
    );

    let store = build_store(&settings)?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &store);

    for (module, kind) in registry.collect_kinds() {
        tracing::info!(module = %module, kind = kind.kind, "content kind registered");
    }

    let ctx = InitCtx {
        settings: &settings,
        store: &store,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    folio_http::start_server(&registry, &settings).await?;

    registry.stop_modules().await?;
    Ok(())
}

fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn EntityStore>> {
    match settings.storage.engine.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => anyhow::bail!("unsupported storage engine '{other}'"),
    }
}

fn init_tracing(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match settings.telemetry.log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .try_init()
                .ok();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .try_init()
                .ok();
        }
    }
}
