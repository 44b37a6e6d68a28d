use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::PanelConfig;

pub const DEFAULT_FILTER: &str = "docspot_panel=info";

/// Installs the global subscriber: stderr (plain or JSON) plus a daily
/// rolling JSON file when `log_dir` is set. Keep the returned guard alive
/// for the life of the process or buffered file lines are lost.
pub fn init_tracing(config: &PanelConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if config.log_json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(fmt::layer().with_target(false).with_writer(std::io::stderr).boxed());
    }

    let guard = config.log_dir.as_ref().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "docspot-panel.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(fmt::layer().json().with_ansi(false).with_writer(writer).boxed());
        guard
    });

    // A subscriber may already be installed (tests, embedding apps).
    let _ = tracing_subscriber::registry().with(layers).with(filter).try_init();
    guard
}
