//! Streaming watch client contract.

use crate::config::provider::Snapshot;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::fmt;

/// Object kinds the watch subsystem knows how to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::ConfigMap => write!(f, "ConfigMap"),
            ObjectKind::Secret => write!(f, "Secret"),
        }
    }
}

/// One change observed on a watched object.
///
/// Creation and modification both collapse to [`ObjectEvent::Applied`]
/// carrying the object's full data; consumers replace state wholesale
/// either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectEvent {
    Applied(Snapshot),
    Deleted,
}

/// Stream of events for a single watched object.
///
/// The stream ending means the server closed the watch. That is routine
/// steady-state behavior; the consumer reopens the watch.
pub type EventStream = BoxStream<'static, ObjectEvent>;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The backing client cannot watch this object kind. The only error
    /// that permanently stops a watcher.
    #[error("unsupported object kind: {0}")]
    Unsupported(ObjectKind),

    /// Transport or auth failure while opening the watch. Retried.
    #[error("failed to open watch: {0}")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Access to a remote streaming watch API keyed by kind, namespace and
/// name.
///
/// `namespace: None` selects the client's default namespace.
#[async_trait]
pub trait WatchClient: Send + Sync {
    async fn open_watch(
        &self,
        kind: ObjectKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<EventStream, WatchError>;
}
