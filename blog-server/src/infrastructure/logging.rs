use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStyle {
    /// Long-running server: thread, file and line on every event.
    Server,
    /// One-shot command-line tools: bare messages.
    Cli,
}

/// Installs the global subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_logging(style: LogStyle, default_filter: &str) {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter_layer);

    let result = match style {
        LogStyle::Server => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogStyle::Cli => registry
            .with(fmt::layer().with_target(false).without_time().compact())
            .try_init(),
    };

    match result {
        Ok(()) => tracing::debug!("Logging initialized ({:?})", style),
        Err(e) => eprintln!("Logging already initialized: {}", e),
    }
}
