//! ConfigMap- and Secret-backed observable providers.
//!
//! Thin adapters over one [`ObjectWatcher`] each: lookups read the
//! watcher's current snapshot, notifications are the watcher's channel
//! forwarded unmodified, and `describe` mirrors whether the last event
//! showed the object present.

use crate::config::provider::{ObservableProvider, Provider, ProviderStatus, Snapshot};
use crate::watch::client::{ObjectKind, WatchClient};
use crate::watch::object::ObjectWatcher;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct ConfigMapProvider {
    watcher: ObjectWatcher,
}

impl ConfigMapProvider {
    /// Watch the named ConfigMap in the client's default namespace.
    pub fn new(client: Arc<dyn WatchClient>, name: &str) -> Self {
        Self::in_namespace(client, None, name)
    }

    pub fn in_namespace(
        client: Arc<dyn WatchClient>,
        namespace: Option<String>,
        name: &str,
    ) -> Self {
        Self {
            watcher: ObjectWatcher::spawn(client, ObjectKind::ConfigMap, namespace, name),
        }
    }

    /// True once a sync has seen the object present.
    pub fn exists(&self) -> bool {
        self.watcher.exists()
    }
}

impl Provider for ConfigMapProvider {
    fn name(&self) -> &str {
        self.watcher.name()
    }

    fn kind(&self) -> &'static str {
        "KubernetesConfigMap"
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.watcher.get(key)
    }

    fn describe(&self) -> ProviderStatus {
        ProviderStatus {
            kind: self.kind(),
            exists: self.watcher.exists(),
        }
    }
}

impl ObservableProvider for ConfigMapProvider {
    fn take_updates(&self) -> Option<mpsc::Receiver<Snapshot>> {
        self.watcher.take_updates()
    }
}

pub struct SecretProvider {
    watcher: ObjectWatcher,
}

impl SecretProvider {
    /// Watch the named Secret in the client's default namespace.
    pub fn new(client: Arc<dyn WatchClient>, name: &str) -> Self {
        Self::in_namespace(client, None, name)
    }

    pub fn in_namespace(
        client: Arc<dyn WatchClient>,
        namespace: Option<String>,
        name: &str,
    ) -> Self {
        Self {
            watcher: ObjectWatcher::spawn(client, ObjectKind::Secret, namespace, name),
        }
    }

    pub fn exists(&self) -> bool {
        self.watcher.exists()
    }
}

impl Provider for SecretProvider {
    fn name(&self) -> &str {
        self.watcher.name()
    }

    fn kind(&self) -> &'static str {
        "KubernetesSecret"
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.watcher.get(key)
    }

    fn describe(&self) -> ProviderStatus {
        ProviderStatus {
            kind: self.kind(),
            exists: self.watcher.exists(),
        }
    }
}

impl ObservableProvider for SecretProvider {
    fn take_updates(&self) -> Option<mpsc::Receiver<Snapshot>> {
        self.watcher.take_updates()
    }
}
