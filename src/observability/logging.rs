//! Structured logging with a runtime-reloadable level filter.

use crate::config::root::{ChangeHandler, ConfigurationRoot};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Handle to the installed level filter, used to apply configuration
/// changes without restarting.
#[derive(Clone)]
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the filter starts at
/// `default_level` until a configuration change adjusts it.
pub fn init(app_name: &str, default_level: &str, development: bool) -> LogLevelHandle {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));
    let (filter, handle) = reload::Layer::new(filter);

    let registry = tracing_subscriber::registry().with(filter);
    if development {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    }

    tracing::info!(app = app_name, development, "Logging initialized");
    LogLevelHandle { handle }
}

impl LogLevelHandle {
    /// Change handler that follows the `log.level` key.
    ///
    /// Registered on a [`ConfigurationRoot`], this re-applies the filter
    /// whenever any watched source changes, so a ConfigMap edit takes
    /// effect on the next log event.
    pub fn change_handler(&self, default_level: &str) -> ChangeHandler {
        let handle = self.handle.clone();
        let default_level = default_level.to_string();

        Box::new(move |config: &ConfigurationRoot| {
            let level = config.get_string("log.level", &default_level);
            let filter = EnvFilter::try_new(&level)
                .map_err(|error| format!("invalid log level {level:?}: {error}"))?;

            handle
                .reload(filter)
                .map_err(|error| format!("cannot apply log level {level:?}: {error}"))?;

            tracing::debug!(level = %level, "Log level applied");
            Ok(())
        })
    }
}
