//! Configuration resolution subsystem.
//!
//! # Data Flow
//! ```text
//! providers (env, in-memory, remote ConfigMap/Secret)
//!     → builder.rs (ordered assembly, declaration order = priority)
//!     → ConfigurationRoot (first-match-wins typed lookup)
//!
//! On remote change:
//!     watch::ObjectWatcher publishes a full snapshot
//!     → per-provider forwarding task on the root
//!     → handlers invoked in registration order, under one dispatch lock
//!     → subsystems observe new values on their next lookup
//! ```
//!
//! # Design Decisions
//! - Provider chain is fixed after build; only remote snapshots mutate
//! - Lookups never fail; unresolved or unparsable keys yield the default
//! - Handlers replay once at registration, so there is no read-then-subscribe
//!   race for callers

pub mod builder;
pub mod environment;
pub mod memory;
pub mod provider;
pub mod remote;
pub mod root;

pub use builder::ConfigurationBuilder;
pub use environment::EnvironmentProvider;
pub use memory::InMemoryProvider;
pub use provider::{ObservableProvider, Provider, ProviderStatus, Snapshot};
pub use remote::{ConfigMapProvider, SecretProvider};
pub use root::ConfigurationRoot;
