use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter applied when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "strata_core=debug,strata_storage=debug";

/// Initialize tracing with an `EnvFilter` and the fmt layer.
///
/// `RUST_LOG` wins over `default_filter`. Returns an error when a global
/// subscriber is already installed, so tests may call this repeatedly.
pub fn init_telemetry(default_filter: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let fallback = default_filter.unwrap_or(DEFAULT_LOG_FILTER).to_string();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!("Telemetry initialized with standard tracing");
    Ok(())
}
