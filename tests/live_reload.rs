//! End-to-end tests for the live-reload pipeline, driven by a scripted
//! watch client standing in for the remote control plane.

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use live_config::config::builder::ConfigurationBuilder;
use live_config::config::provider::Snapshot;
use live_config::config::remote::ConfigMapProvider;
use live_config::config::root::ChangeHandler;
use live_config::watch::client::{EventStream, ObjectEvent, ObjectKind, WatchClient, WatchError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

enum Connection {
    Stream(EventStream),
    Fail(WatchError),
}

/// Watch client that hands out pre-scripted connections in order. Once
/// the script is exhausted, further opens get a stream that never yields.
struct MockClient {
    connections: Mutex<VecDeque<Connection>>,
    opens: AtomicUsize,
}

impl MockClient {
    fn new(connections: Vec<Connection>) -> Arc<Self> {
        Arc::new(Self {
            connections: Mutex::new(connections.into()),
            opens: AtomicUsize::new(0),
        })
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WatchClient for MockClient {
    async fn open_watch(
        &self,
        _kind: ObjectKind,
        _namespace: Option<&str>,
        _name: &str,
    ) -> Result<EventStream, WatchError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        match self.connections.lock().unwrap().pop_front() {
            Some(Connection::Stream(stream)) => Ok(stream),
            Some(Connection::Fail(error)) => Err(error),
            None => Ok(stream::pending().boxed()),
        }
    }
}

/// A stream the test feeds event by event. Dropping the sender closes the
/// stream, which the watcher treats as a server-side close.
fn live_stream() -> (mpsc::UnboundedSender<ObjectEvent>, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .boxed();
    (tx, stream)
}

fn snapshot(pairs: &[(&str, &str)]) -> Snapshot {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn eventually(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

fn counting_handler(counter: &Arc<AtomicUsize>) -> ChangeHandler {
    let counter = Arc::clone(counter);
    Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[tokio::test]
async fn remote_change_overrides_then_delete_falls_back() {
    let (events, stream) = live_stream();
    let client = MockClient::new(vec![Connection::Stream(stream)]);

    let provider = ConfigMapProvider::new(client, "config-1");
    let root = ConfigurationBuilder::new(false)
        .add_observable_provider(provider)
        .with_in_memory("defaults", snapshot(&[("flag", "fallback")]))
        .build();

    let notifications = Arc::new(AtomicUsize::new(0));
    root.register_change_handler(counting_handler(&notifications));
    assert_eq!(notifications.load(Ordering::SeqCst), 1, "replay on subscribe");

    let status = root.providers()[0].describe();
    assert_eq!(status.kind, "KubernetesConfigMap");
    assert!(!status.exists, "no sync yet");

    events
        .send(ObjectEvent::Applied(snapshot(&[("flag", "remote")])))
        .unwrap();
    eventually("remote value to win the lookup", || {
        root.get_string("flag", "") == "remote"
    })
    .await;
    eventually("change notification", || {
        notifications.load(Ordering::SeqCst) == 2
    })
    .await;
    assert!(root.providers()[0].describe().exists);

    events.send(ObjectEvent::Deleted).unwrap();
    eventually("lookup to fall back after delete", || {
        root.get_string("flag", "") == "fallback"
    })
    .await;
    eventually("delete notification", || {
        notifications.load(Ordering::SeqCst) == 3
    })
    .await;
    assert!(!root.providers()[0].describe().exists);
}

#[tokio::test]
async fn watcher_survives_stream_closure_and_resumes() {
    let (first_events, first_stream) = live_stream();
    let (second_events, second_stream) = live_stream();
    let client = MockClient::new(vec![
        Connection::Stream(first_stream),
        Connection::Stream(second_stream),
    ]);

    let provider = ConfigMapProvider::new(client.clone(), "config-1");
    let root = ConfigurationBuilder::new(false)
        .add_observable_provider(provider)
        .build();

    let notifications = Arc::new(AtomicUsize::new(0));
    root.register_change_handler(counting_handler(&notifications));

    first_events
        .send(ObjectEvent::Applied(snapshot(&[("a", "1")])))
        .unwrap();
    eventually("initial value", || root.get_string("a", "") == "1").await;

    // Server closes the stream. The last snapshot stays readable and the
    // watcher reopens without publishing anything.
    drop(first_events);
    eventually("watch reopen", || client.opens() >= 2).await;
    assert_eq!(root.get_string("a", ""), "1", "stale read during the gap");
    eventually("no notification for the closure itself", || {
        notifications.load(Ordering::SeqCst) == 2
    })
    .await;

    second_events
        .send(ObjectEvent::Applied(snapshot(&[("a", "2")])))
        .unwrap();
    eventually("value from the reopened watch", || {
        root.get_string("a", "") == "2"
    })
    .await;
    eventually("notification for the post-reconnect event", || {
        notifications.load(Ordering::SeqCst) == 3
    })
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        notifications.load(Ordering::SeqCst),
        3,
        "exactly one notification for the post-reconnect event"
    );
}

#[tokio::test]
async fn unsupported_kind_leaves_provider_permanently_empty() {
    let client = MockClient::new(vec![Connection::Fail(WatchError::Unsupported(
        ObjectKind::ConfigMap,
    ))]);

    let provider = ConfigMapProvider::new(client.clone(), "config-1");
    let root = ConfigurationBuilder::new(false)
        .add_observable_provider(provider)
        .with_in_memory("defaults", snapshot(&[("key", "fallback")]))
        .build();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(client.opens(), 1, "terminal state, no retry");
    assert_eq!(root.get_string("key", ""), "fallback");
    assert!(!root.providers()[0].describe().exists);
}

#[tokio::test]
async fn lookups_never_observe_partial_snapshots() {
    let (events, stream) = live_stream();
    let client = MockClient::new(vec![Connection::Stream(stream)]);

    let provider = ConfigMapProvider::new(client, "config-1");
    let root = ConfigurationBuilder::new(false)
        .add_observable_provider(provider)
        .build();

    events
        .send(ObjectEvent::Applied(snapshot(&[("a", "1"), ("b", "1")])))
        .unwrap();
    eventually("first snapshot", || root.get_string("a", "") == "1").await;

    let reader_root = Arc::clone(&root);
    let reader = tokio::spawn(async move {
        for _ in 0..2_000 {
            let value = reader_root.get_string("a", "missing");
            assert!(
                value == "1" || value == "2",
                "observed partial snapshot: a = {value:?}"
            );
            tokio::task::yield_now().await;
        }
    });

    for round in 0..50 {
        let value = if round % 2 == 0 { "2" } else { "1" };
        events
            .send(ObjectEvent::Applied(snapshot(&[
                ("a", value),
                ("b", value),
            ])))
            .unwrap();
        tokio::task::yield_now().await;
    }

    reader.await.expect("reader saw only whole snapshots");
}

#[tokio::test]
async fn handler_failure_does_not_starve_later_handlers() {
    let (events, stream) = live_stream();
    let client = MockClient::new(vec![Connection::Stream(stream)]);

    let provider = ConfigMapProvider::new(client, "config-1");
    let root = ConfigurationBuilder::new(false)
        .add_observable_provider(provider)
        .build();

    root.register_change_handler(Box::new(|_| Err("always failing".into())));
    let notifications = Arc::new(AtomicUsize::new(0));
    root.register_change_handler(counting_handler(&notifications));

    events
        .send(ObjectEvent::Applied(snapshot(&[("k", "v")])))
        .unwrap();
    eventually("second handler still invoked", || {
        notifications.load(Ordering::SeqCst) == 2
    })
    .await;

    events
        .send(ObjectEvent::Applied(snapshot(&[("k", "v2")])))
        .unwrap();
    eventually("dispatch keeps running on later events", || {
        notifications.load(Ordering::SeqCst) == 3
    })
    .await;
}
