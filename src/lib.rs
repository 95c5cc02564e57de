//! Live-Reloading Layered Configuration Library

pub mod config;
pub mod observability;
pub mod watch;

pub use config::builder::ConfigurationBuilder;
pub use config::provider::{ObservableProvider, Provider, ProviderStatus, Snapshot};
pub use config::root::{ChangeHandler, ConfigurationRoot, HandlerError};
pub use watch::client::{ObjectEvent, ObjectKind, WatchClient, WatchError};
pub use watch::kube::ClusterHandle;
