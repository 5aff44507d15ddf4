//! # Runner Pool
//!
//! Concurrent set of runner endpoint addresses with explicit
//! connect/disconnect and a periodic parallel liveness sweep. An entry
//! may be evicted between a snapshot and a later use of the address;
//! callers tolerate that by treating the runner as one more refusal.

use dashmap::DashMap;
use tracing::{debug, info, warn};

use jobcoord_client::RunnerClient;
use jobcoord_shared::error::{CoordError, CoordResult};

/// Concurrent set of runner base addresses. Presence is membership.
#[derive(Default)]
pub struct RunnerPool {
    addrs: DashMap<String, ()>,
}

impl RunnerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address. Fails with `AlreadyConnected` when present.
    pub fn connect(&self, addr: &str) -> CoordResult<()> {
        use dashmap::mapref::entry::Entry;
        match self.addrs.entry(addr.to_string()) {
            Entry::Occupied(_) => Err(CoordError::AlreadyConnected(addr.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(());
                info!(runner = %addr, "task runner connected");
                Ok(())
            }
        }
    }

    /// Remove an address. Fails with `NotConnected` when absent.
    pub fn disconnect(&self, addr: &str) -> CoordResult<()> {
        match self.addrs.remove(addr) {
            Some(_) => {
                info!(runner = %addr, "task runner disconnected");
                Ok(())
            }
            None => Err(CoordError::NotConnected(addr.to_string())),
        }
    }

    /// Membership snapshot, order unspecified.
    pub fn list(&self) -> Vec<String> {
        self.addrs.iter().map(|e| e.key().clone()).collect()
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.addrs.contains_key(addr)
    }

    /// Probe every member's `/alive` in parallel and evict the ones that
    /// fail. Best-effort: eviction races with concurrent disconnects are
    /// logged and ignored.
    pub async fn probe(&self, http: &reqwest::Client) {
        let checks = self.list().into_iter().map(|addr| {
            let client = RunnerClient::with_http(addr.clone(), http.clone());
            async move {
                let outcome = client.alive().await;
                (addr, outcome)
            }
        });

        for (addr, outcome) in futures::future::join_all(checks).await {
            if let Err(err) = outcome {
                warn!(runner = %addr, error = %err, "task runner failed liveness probe, evicting");
                if let Err(err) = self.disconnect(&addr) {
                    debug!(runner = %addr, error = %err, "eviction raced with disconnect");
                }
            }
        }
    }
}
