//! Perpetual watch loop maintaining a live local snapshot of one remote
//! object.

use crate::config::provider::Snapshot;
use crate::watch::client::{EventStream, ObjectEvent, ObjectKind, WatchClient, WatchError};
use arc_swap::ArcSwap;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Delay between reconnect attempts after a failed watch open.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Capacity of the update channel. The publisher awaits when the consumer
/// falls this far behind.
const UPDATE_BUFFER: usize = 10;

/// Handle to one watched remote object.
///
/// `spawn` starts a background task that holds an open watch against the
/// object, replaces the local snapshot wholesale on every `Applied` or
/// `Deleted` event, and publishes a copy of the new snapshot on a bounded
/// channel. The task reopens the watch whenever the server closes the
/// stream and retries failed opens forever; it only exits if the client
/// reports the object kind as unsupported.
///
/// The last known snapshot stays readable throughout reconnect gaps.
pub struct ObjectWatcher {
    kind: ObjectKind,
    namespace: Option<String>,
    name: String,
    state: Arc<WatchState>,
    updates: Mutex<Option<mpsc::Receiver<Snapshot>>>,
}

struct WatchState {
    snapshot: ArcSwap<Snapshot>,
    exists: AtomicBool,
    connected: AtomicBool,
}

impl ObjectWatcher {
    pub fn spawn(
        client: Arc<dyn WatchClient>,
        kind: ObjectKind,
        namespace: Option<String>,
        name: &str,
    ) -> Self {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let state = Arc::new(WatchState {
            snapshot: ArcSwap::from_pointee(Snapshot::new()),
            exists: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        });

        let task = WatchTask {
            client,
            kind,
            namespace: namespace.clone(),
            name: name.to_string(),
            state: Arc::clone(&state),
            tx,
        };
        tokio::spawn(task.run());

        Self {
            kind,
            namespace,
            name: name.to_string(),
            state,
            updates: Mutex::new(Some(rx)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Read one key from the current snapshot.
    pub fn get(&self, key: &str) -> Option<String> {
        self.state.snapshot.load().get(key).cloned()
    }

    /// Whether the last observed event showed the object present.
    pub fn exists(&self) -> bool {
        self.state.exists.load(Ordering::SeqCst)
    }

    /// Whether the watch stream is currently open.
    pub fn connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    /// Hand over the update channel. `Some` on the first call only.
    pub fn take_updates(&self) -> Option<mpsc::Receiver<Snapshot>> {
        self.updates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

struct WatchTask {
    client: Arc<dyn WatchClient>,
    kind: ObjectKind,
    namespace: Option<String>,
    name: String,
    state: Arc<WatchState>,
    tx: mpsc::Sender<Snapshot>,
}

impl WatchTask {
    async fn run(self) {
        // The server routinely closes long-lived watch streams, so the
        // open/consume cycle repeats for the life of the process.
        loop {
            let stream = match self
                .client
                .open_watch(self.kind, self.namespace.as_deref(), &self.name)
                .await
            {
                Ok(stream) => stream,
                Err(WatchError::Unsupported(kind)) => {
                    tracing::warn!(
                        name = %self.name,
                        kind = %kind,
                        "Unsupported object kind. Aborting watch sequence."
                    );
                    return;
                }
                Err(error) => {
                    tracing::error!(
                        name = %self.name,
                        kind = %self.kind,
                        %error,
                        "Cannot open watch, retrying"
                    );
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };

            self.state.connected.store(true, Ordering::SeqCst);
            self.consume(stream).await;
            self.state.connected.store(false, Ordering::SeqCst);

            tracing::debug!(name = %self.name, kind = %self.kind, "Watch stream closed, reopening");
        }
    }

    async fn consume(&self, mut stream: EventStream) {
        while let Some(event) = stream.next().await {
            match event {
                ObjectEvent::Applied(data) => {
                    self.state.snapshot.store(Arc::new(data.clone()));
                    self.state.exists.store(true, Ordering::SeqCst);
                    tracing::debug!(
                        name = %self.name,
                        kind = %self.kind,
                        keys = data.len(),
                        "Resource changed"
                    );
                    self.publish(data).await;
                }
                ObjectEvent::Deleted => {
                    // Downstream lookups fall back to later providers or
                    // the caller's default.
                    self.state.snapshot.store(Arc::new(Snapshot::new()));
                    self.state.exists.store(false, Ordering::SeqCst);
                    tracing::debug!(name = %self.name, kind = %self.kind, "Resource deleted");
                    self.publish(Snapshot::new()).await;
                }
            }
        }
    }

    async fn publish(&self, snapshot: Snapshot) {
        // A closed channel means nothing is consuming updates; keep the
        // snapshot current for readers and drop the notification.
        if self.tx.send(snapshot).await.is_err() {
            tracing::debug!(name = %self.name, "Update channel closed, notification dropped");
        }
    }
}
