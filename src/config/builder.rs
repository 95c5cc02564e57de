//! Ordered assembly of the configuration root.

use crate::config::environment::EnvironmentProvider;
use crate::config::memory::InMemoryProvider;
use crate::config::provider::{ObservableProvider, Provider, Snapshot};
use crate::config::remote::{ConfigMapProvider, SecretProvider};
use crate::config::root::{ChangeHandler, ConfigurationRoot};
use crate::watch::client::WatchClient;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Assembles a [`ConfigurationRoot`] from providers in caller-declared
/// order: earlier declarations win lookups.
///
/// Observable providers start their watch tasks when constructed; their
/// buffered update channels are wired into the root at [`build`]. Every
/// callback added via [`on_change`] fires exactly once, synchronously,
/// with the fully assembled root before `build` returns: static provider
/// values are populated by then, remote ones may still be mid initial
/// sync.
///
/// [`build`]: ConfigurationBuilder::build
/// [`on_change`]: ConfigurationBuilder::on_change
pub struct ConfigurationBuilder {
    development: bool,
    entries: Vec<Entry>,
    callbacks: Vec<ChangeHandler>,
}

struct Entry {
    provider: Arc<dyn Provider>,
    updates: Option<mpsc::Receiver<Snapshot>>,
}

impl ConfigurationBuilder {
    pub fn new(development: bool) -> Self {
        Self {
            development,
            entries: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    pub fn add_provider<P: Provider + 'static>(mut self, provider: P) -> Self {
        self.entries.push(Entry {
            provider: Arc::new(provider),
            updates: None,
        });
        self
    }

    pub fn add_observable_provider<P: ObservableProvider + 'static>(mut self, provider: P) -> Self {
        let updates = provider.take_updates();
        if updates.is_none() {
            tracing::warn!(
                name = provider.name(),
                "Observable provider has no update channel left, attaching as static"
            );
        }

        self.entries.push(Entry {
            provider: Arc::new(provider),
            updates,
        });
        self
    }

    /// Drop every provider added so far, keeping registered callbacks.
    pub fn clear_providers(mut self) -> Self {
        self.entries.clear();
        self
    }

    pub fn with_in_memory(self, name: &str, data: Snapshot) -> Self {
        self.add_provider(InMemoryProvider::new(name, data))
    }

    pub fn with_environment(self, prefix: &str) -> Self {
        self.add_provider(EnvironmentProvider::new(prefix))
    }

    pub fn with_config_map(self, client: Arc<dyn WatchClient>, name: &str) -> Self {
        self.add_observable_provider(ConfigMapProvider::new(client, name))
    }

    pub fn with_secret(self, client: Arc<dyn WatchClient>, name: &str) -> Self {
        self.add_observable_provider(SecretProvider::new(client, name))
    }

    /// Register a callback to run at build time and on every subsequent
    /// change.
    pub fn on_change(mut self, callback: ChangeHandler) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Construct the root: attach providers in declaration order, start
    /// one forwarding task per observable provider, then register the
    /// callbacks, each of which replays synchronously against the
    /// assembled chain.
    pub fn build(self) -> Arc<ConfigurationRoot> {
        let mut forwarders = Vec::new();
        let mut providers: Vec<Arc<dyn Provider>> = Vec::with_capacity(self.entries.len());

        for entry in self.entries {
            if self.development {
                tracing::info!(
                    name = entry.provider.name(),
                    kind = entry.provider.kind(),
                    observable = entry.updates.is_some(),
                    "Loaded provider"
                );
            }

            if let Some(updates) = entry.updates {
                forwarders.push((entry.provider.name().to_string(), updates));
            }
            providers.push(entry.provider);
        }

        let root = ConfigurationRoot::new(providers);

        for (name, updates) in forwarders {
            root.spawn_forwarder(&name, updates);
        }

        for callback in self.callbacks {
            root.register_change_handler(callback);
        }

        root
    }
}
