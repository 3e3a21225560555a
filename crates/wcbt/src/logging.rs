//! `tracing` initialization. No file rotation here, everything goes to
//! stderr so the CLI's own human-readable summary can still use stdout.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

pub fn init(log_arg: Option<&str>) -> Result<(), anyhow::Error> {
    let filter_str = if let Some(filter) = log_arg {
        filter.to_string()
    } else if let Ok(filter) = std::env::var("RUST_LOG") {
        filter
    } else {
        "info".to_string()
    };

    let filter = tracing_subscriber::EnvFilter::try_new(filter_str)?;
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}
