//! Ordered configuration root and change-notification dispatch.

use crate::config::provider::{Provider, Snapshot};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Error surfaced by a change handler; logged at the dispatch boundary
/// and never propagated further.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked with the current root once at registration and again
/// on every detected change, for the life of the root.
///
/// Handlers must not register further handlers from inside the callback;
/// registration and dispatch share one lock.
pub type ChangeHandler = Box<dyn Fn(&ConfigurationRoot) -> Result<(), HandlerError> + Send + Sync>;

/// Ordered chain of configuration providers with first-match-wins lookup.
///
/// The provider sequence is fixed at build time; only the internal
/// snapshots of remote providers mutate afterwards. One mutual-exclusion
/// lock serializes every handler pass across all observable providers, so
/// handlers never see interleaved partial views.
pub struct ConfigurationRoot {
    providers: Vec<Arc<dyn Provider>>,
    handlers: Mutex<Vec<ChangeHandler>>,
}

impl ConfigurationRoot {
    pub(crate) fn new(providers: Vec<Arc<dyn Provider>>) -> Arc<Self> {
        Arc::new(Self {
            providers,
            handlers: Mutex::new(Vec::new()),
        })
    }

    /// Providers in priority order, for diagnostics and readiness
    /// reporting via [`Provider::describe`].
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// First found value for `key`, or `default` if no provider has it.
    pub fn get_string(&self, key: &str, default: &str) -> String {
        for provider in &self.providers {
            if let Some(value) = provider.try_get(key) {
                return value;
            }
        }

        default.to_string()
    }

    /// First found value for `key` that parses as an integer. Unparsable
    /// values are skipped, not errors.
    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        for provider in &self.providers {
            if let Some(value) = provider.try_get(key) {
                if let Ok(parsed) = value.trim().parse::<i64>() {
                    return parsed;
                }
            }
        }

        default
    }

    /// First found value for `key` that parses as a boolean
    /// (case-insensitive `true`/`false`, or `1`/`0`).
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        for provider in &self.providers {
            if let Some(value) = provider.try_get(key) {
                if let Some(parsed) = parse_bool(&value) {
                    return parsed;
                }
            }
        }

        default
    }

    /// Register a change handler and invoke it once with the current
    /// state, so callers never need a separate read-then-subscribe step.
    ///
    /// Taking the dispatch lock for the append means the initial call can
    /// neither race with nor be duplicated by a concurrent change event.
    pub fn register_change_handler(&self, handler: ChangeHandler) {
        let mut handlers = self.lock_handlers();
        handlers.push(handler);

        if let Some(handler) = handlers.last() {
            if let Err(error) = handler(self) {
                tracing::error!(%error, "Change handler failed on initial invocation");
            }
        }
    }

    /// Run one change-notification pass for `provider`.
    fn dispatch(&self, provider: &str, snapshot: &Snapshot) {
        let handlers = self.lock_handlers();

        tracing::debug!(
            provider = %provider,
            keys = snapshot.len(),
            handlers = handlers.len(),
            "Configuration changed"
        );

        for (index, handler) in handlers.iter().enumerate() {
            // A failing handler is logged and skipped; it neither aborts
            // the remaining handlers nor gets retried for this event.
            if let Err(error) = handler(self) {
                tracing::error!(
                    provider = %provider,
                    handler = index,
                    %error,
                    "Change handler failed"
                );
            }
        }
    }

    fn lock_handlers(&self) -> MutexGuard<'_, Vec<ChangeHandler>> {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Forward one observable provider's updates into handler dispatch.
    /// The task ends when the provider's channel closes.
    pub(crate) fn spawn_forwarder(
        self: &Arc<Self>,
        provider: &str,
        mut updates: mpsc::Receiver<Snapshot>,
    ) {
        let root = Arc::clone(self);
        let provider = provider.to_string();

        tokio::spawn(async move {
            while let Some(snapshot) = updates.recv().await {
                root.dispatch(&provider, &snapshot);
            }
        });
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
