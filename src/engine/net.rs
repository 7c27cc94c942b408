//! Network role and the resync convention.
//!
//! Only the authority creates entities, makes random choices, or forces
//! teleports. Observers run the same behavior code and receive the outcome
//! through replicated snapshots.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetRole {
    /// Single-player or the server: decisions made here are canonical.
    Authority,
    /// A replicating client.
    Observer,
}

impl NetRole {
    pub fn is_authority(self) -> bool {
        matches!(self, NetRole::Authority)
    }
}

/// Set whenever an authority-only mutation happened this tick; the host
/// drains it after the tick and broadcasts a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResyncFlag(bool);

impl ResyncFlag {
    pub fn mark(&mut self) {
        self.0 = true;
    }

    pub fn is_set(self) -> bool {
        self.0
    }

    /// Read and clear.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.0)
    }
}
