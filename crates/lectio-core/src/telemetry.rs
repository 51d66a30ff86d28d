use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with an env-filter and a fmt layer.
///
/// Filter defaults to `lectio=debug` when `RUST_LOG` is unset. Call once at
/// process start; calling again returns an error from the subscriber guard.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "lectio=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
