//! Provider capability contracts.

use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Complete key/value state of one provider at a point in time.
///
/// Snapshots are always replaced wholesale, never patched, so a reader
/// observes either the previous or the next state but no mix of the two.
pub type Snapshot = HashMap<String, String>;

/// Diagnostic view of a provider, consumed by readiness reporting.
///
/// Collaborators query this instead of downcasting to concrete provider
/// types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    /// Source classification tag, e.g. `"KubernetesConfigMap"`.
    pub kind: &'static str,
    /// Whether the backing object is currently present. Always `true` for
    /// static providers; mirrors the last watch event for remote ones.
    pub exists: bool,
}

/// A named, read-only key/value source participating in ordered lookup.
pub trait Provider: Send + Sync {
    /// Stable identifier, used for priority matching and diagnostics.
    fn name(&self) -> &str;

    /// Source classification tag (e.g. `"InMemory"`, `"Environment"`).
    fn kind(&self) -> &'static str;

    /// Look the key up in the provider's current snapshot. No side effects.
    fn try_get(&self, key: &str) -> Option<String>;

    /// Capability query for readiness reporting.
    fn describe(&self) -> ProviderStatus {
        ProviderStatus {
            kind: self.kind(),
            exists: true,
        }
    }
}

/// A [`Provider`] that additionally emits full-state change notifications.
///
/// The channel carries one full [`Snapshot`] per detected external change.
/// It is bounded; a slow consumer applies backpressure to the producer
/// rather than dropping updates.
pub trait ObservableProvider: Provider {
    /// Hand over the receiving half of the notification channel.
    ///
    /// Returns `Some` exactly once; the configuration root takes the
    /// channel when the provider is attached.
    fn take_updates(&self) -> Option<mpsc::Receiver<Snapshot>>;
}
