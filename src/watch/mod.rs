//! Remote object watching subsystem.
//!
//! # Data Flow
//! ```text
//! control plane (streaming watch API, server-closable)
//!     → client.rs (WatchClient: one filtered stream per object)
//!     → object.rs (ObjectWatcher: perpetual watch/reconnect loop)
//!     → local snapshot (wholesale swap) + bounded update channel
//!     → config::remote provider adapters
//! ```
//!
//! # Design Decisions
//! - One long-lived stream per watched object instead of polling
//! - Server-initiated stream closure is routine, not an error; the loop
//!   reopens and keeps the last snapshot readable in the gap
//! - The only terminal state is an unsupported object kind

pub mod client;
pub mod kube;
pub mod object;

pub use client::{EventStream, ObjectEvent, ObjectKind, WatchClient, WatchError};
pub use kube::{ClusterHandle, KubeWatchClient};
pub use object::ObjectWatcher;
