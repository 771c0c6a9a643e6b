use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
///
/// Console output goes to stderr so it never mixes with command output.
/// `RUST_LOG` wins over `LOG_LEVEL`; when `LOG_DIR` is set a daily rolling
/// JSON log is written there as well.
pub fn init_tracing() -> anyhow::Result<()> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(format!(
            "{name}={level},schoolbook_client={level},reqwest=warn,hyper=warn",
            name = env!("CARGO_CRATE_NAME"),
        ))
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact()
        .with_filter(console_filter);

    let log_dir = std::env::var("LOG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from);

    // JSON file layer for structured logs (can be ingested by Loki)
    let json_layer = match &log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let json_appender = RollingFileAppender::new(Rotation::DAILY, dir, "schoolbook.json");
            Some(
                fmt::layer()
                    .json()
                    .with_writer(json_appender)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(EnvFilter::new("info")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(json_layer)
        .try_init()?;

    if let Some(dir) = log_dir {
        info!(log_dir = %dir.display(), "File logging enabled");
    }
    Ok(())
}
