//! Fixed in-memory configuration provider.

use crate::config::provider::{Provider, Snapshot};

/// Provider over an explicit key/value snapshot, immutable after
/// construction. Used for defaults and for tests.
pub struct InMemoryProvider {
    name: String,
    data: Snapshot,
}

impl InMemoryProvider {
    pub fn new(name: &str, data: Snapshot) -> Self {
        Self {
            name: name.to_string(),
            data,
        }
    }
}

impl Provider for InMemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "InMemory"
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }
}
