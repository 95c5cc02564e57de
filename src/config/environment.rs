//! Environment-derived configuration provider.

use crate::config::provider::{Provider, Snapshot};

/// Provider backed by process environment variables sharing a prefix.
///
/// The environment is enumerated once at construction; the provider is
/// immutable thereafter. Keys are normalized so that `PREFIX_LOG_LEVEL`
/// becomes `log.level`: the prefix is stripped, `_` and `-` map to `.`
/// (runs collapse to a single `.`), and the result is lower-cased. Values
/// keep their content but lose surrounding whitespace.
pub struct EnvironmentProvider {
    prefix: String,
    data: Snapshot,
}

impl EnvironmentProvider {
    /// Import all environment variables starting with `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self::from_vars(
            prefix,
            std::env::vars_os().filter_map(|(key, value)| {
                Some((key.into_string().ok()?, value.into_string().ok()?))
            }),
        )
    }

    fn from_vars(prefix: &str, vars: impl Iterator<Item = (String, String)>) -> Self {
        let mut data = Snapshot::new();

        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                data.insert(normalize_key(stripped), value.trim().to_string());
            }
        }

        Self {
            prefix: prefix.to_string(),
            data,
        }
    }
}

fn normalize_key(key: &str) -> String {
    let mut normalized = String::with_capacity(key.len());

    for ch in key.chars() {
        match ch {
            '_' | '-' | '.' => {
                if !normalized.ends_with('.') {
                    normalized.push('.');
                }
            }
            other => normalized.extend(other.to_lowercase()),
        }
    }

    normalized
}

impl Provider for EnvironmentProvider {
    fn name(&self) -> &str {
        &self.prefix
    }

    fn kind(&self) -> &'static str {
        "Environment"
    }

    fn try_get(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }
}
