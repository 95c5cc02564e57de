//! Kubernetes-backed watch client.

use crate::config::provider::Snapshot;
use crate::watch::client::{EventStream, ObjectEvent, ObjectKind, WatchClient, WatchError};
use async_trait::async_trait;
use futures_util::future::ready;
use futures_util::{Stream, StreamExt};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::{Api, WatchEvent, WatchParams};
use kube::Client;
use tokio::sync::OnceCell;

/// [`WatchClient`] over a Kubernetes API server.
///
/// Each `open_watch` call opens one streaming watch filtered down to a
/// single object by field selector.
pub struct KubeWatchClient {
    client: Client,
    namespace: String,
}

impl KubeWatchClient {
    /// Resolve credentials and connect.
    ///
    /// Uses the in-cluster service account when running inside a pod and
    /// falls back to the local kubeconfig otherwise.
    pub async fn connect() -> Result<Self, WatchError> {
        let client = Client::try_default()
            .await
            .map_err(|error| WatchError::Connect(Box::new(error)))?;
        let namespace = client.default_namespace().to_string();

        tracing::debug!(namespace = %namespace, "Kubernetes client ready");
        Ok(Self { client, namespace })
    }
}

#[async_trait]
impl WatchClient for KubeWatchClient {
    async fn open_watch(
        &self,
        kind: ObjectKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<EventStream, WatchError> {
        let namespace = namespace.unwrap_or(&self.namespace);
        let params = WatchParams::default().fields(&format!("metadata.name={name}"));

        match kind {
            ObjectKind::ConfigMap => {
                let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
                let events = api
                    .watch(&params, "0")
                    .await
                    .map_err(|error| WatchError::Connect(Box::new(error)))?;
                Ok(into_event_stream(events, config_map_data))
            }
            ObjectKind::Secret => {
                let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
                let events = api
                    .watch(&params, "0")
                    .await
                    .map_err(|error| WatchError::Connect(Box::new(error)))?;
                Ok(into_event_stream(events, secret_data))
            }
        }
    }
}

/// Map raw watch events onto [`ObjectEvent`]s.
///
/// Transport errors and server error events end the stream; the watcher
/// treats stream end as a routine close and reopens. Bookmarks carry no
/// data and are skipped.
fn into_event_stream<K, F>(
    events: impl Stream<Item = kube::Result<WatchEvent<K>>> + Send + 'static,
    extract: F,
) -> EventStream
where
    K: Send + 'static,
    F: Fn(K) -> Snapshot + Send + 'static,
{
    events
        .take_while(|event| ready(!matches!(event, Err(_) | Ok(WatchEvent::Error(_)))))
        .filter_map(move |event| {
            ready(match event {
                Ok(WatchEvent::Added(object)) | Ok(WatchEvent::Modified(object)) => {
                    Some(ObjectEvent::Applied(extract(object)))
                }
                Ok(WatchEvent::Deleted(_)) => Some(ObjectEvent::Deleted),
                Ok(WatchEvent::Bookmark(_)) | Ok(WatchEvent::Error(_)) | Err(_) => None,
            })
        })
        .boxed()
}

fn config_map_data(config_map: ConfigMap) -> Snapshot {
    config_map.data.unwrap_or_default().into_iter().collect()
}

/// Secrets arrive as raw bytes unless the server echoes a string-typed
/// variant. Non-UTF-8 values decode lossily so one mis-encoded entry
/// cannot poison the whole snapshot.
fn secret_data(secret: Secret) -> Snapshot {
    if let Some(strings) = secret.string_data {
        return strings.into_iter().collect();
    }

    secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, String::from_utf8_lossy(&value.0).into_owned()))
        .collect()
}

/// Explicitly passed, lazily-initialized shared Kubernetes client.
///
/// Many watchers start concurrently at configuration-build time; the
/// one-time initialization barrier ensures a single credential resolution
/// serves all of them. A failed connect leaves the cell empty, so the next
/// watch attempt retries it.
#[derive(Default)]
pub struct ClusterHandle {
    client: OnceCell<KubeWatchClient>,
}

impl ClusterHandle {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WatchClient for ClusterHandle {
    async fn open_watch(
        &self,
        kind: ObjectKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<EventStream, WatchError> {
        let client = self.client.get_or_try_init(KubeWatchClient::connect).await?;
        client.open_watch(kind, namespace, name).await
    }
}
