use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,sqlx=warn";

/// Where and how much the service logs. Console output is always on; Loki is
/// added when enabled and the `loki` feature is compiled in.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            loki_enabled: lookup("LOKI_ENABLED").map(|v| is_truthy(&v)).unwrap_or(false),
            loki_url: lookup("LOKI_URL").filter(|url| !url.trim().is_empty()),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "tradesim".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        Ok(())
    }

    /// Stream labels attached to every entry shipped to Loki.
    pub fn loki_labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("service", self.service_name.clone()),
            ("environment", self.environment.clone()),
            ("version", env!("CARGO_PKG_VERSION").to_string()),
        ]
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_level)?)
        .with(fmt::layer());

    #[cfg(feature = "loki")]
    {
        if let (true, Some(loki_url)) = (config.loki_enabled, config.loki_url.as_deref()) {
            registry.with(loki_layer(&config, loki_url)?).try_init()?;
            tracing::info!(
                service = %config.service_name,
                environment = %config.environment,
                "✅ Logging to console and Loki at {}",
                loki_url
            );
            return Ok(());
        }
    }

    registry.try_init()?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "📊 Logging to console"
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(config: &LoggingConfig, loki_url: &str) -> Result<tracing_loki::Layer, Box<dyn std::error::Error>> {
    let mut builder = tracing_loki::builder();
    for (key, value) in config.loki_labels() {
        builder = builder.label(key, value)?;
    }
    let (layer, task) = builder.build_url(url::Url::parse(loki_url)?)?;

    // Ships buffered events to Loki for the lifetime of the process.
    tokio::spawn(task);
    Ok(layer)
}
