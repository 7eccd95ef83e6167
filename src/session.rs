//! Table of per-connection split registries.
//!
//! The surrounding client keeps one [`SplitRegistry`] per connection; the
//! `ConnectionTable` lets its connection pumps and the background reaper
//! share those registries concurrently. Each registry sits behind its own
//! async mutex, so unrelated connections never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::reassembly::{ReassemblyConfig, SplitRegistry};

/// Identifier assigned to a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl From<u64> for ConnectionId {
    fn from(value: u64) -> Self { Self(value) }
}

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(&self) -> u64 { self.0 }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionId({})", self.0)
    }
}

/// Shared handle to one connection's registry.
pub type RegistryHandle = Arc<Mutex<SplitRegistry>>;

/// Concurrent table of split registries keyed by [`ConnectionId`].
#[derive(Default)]
pub struct ConnectionTable {
    registries: DashMap<ConnectionId, RegistryHandle>,
}

impl ConnectionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Retrieve the registry for `id`, creating one from `config` on first
    /// use.
    #[must_use]
    pub fn get_or_insert(&self, id: ConnectionId, config: ReassemblyConfig) -> RegistryHandle {
        self.registries
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(SplitRegistry::new(config))))
            .clone()
    }

    /// Retrieve the registry for `id` if the connection is known.
    #[must_use]
    pub fn get(&self, id: &ConnectionId) -> Option<RegistryHandle> {
        self.registries.get(id).map(|entry| entry.value().clone())
    }

    /// Remove a registry, typically on connection teardown.
    pub fn remove(&self, id: &ConnectionId) { self.registries.remove(id); }

    /// Collect handles to every live registry.
    ///
    /// Snapshots the table so callers can lock registries without holding
    /// map guards.
    #[must_use]
    pub fn handles(&self) -> Vec<RegistryHandle> {
        self.registries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Return the IDs of every known connection.
    #[must_use]
    pub fn active_ids(&self) -> Vec<ConnectionId> {
        self.registries.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of known connections.
    #[must_use]
    pub fn len(&self) -> usize { self.registries.len() }

    /// Whether no connection is known.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.registries.is_empty() }
}
