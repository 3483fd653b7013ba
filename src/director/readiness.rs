use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerStatus {
    Starting,
    Running,
    Error,
}

/// Boot status of the peers the director waits for. The peer set is fixed
/// at construction; reports from other peers are ignored.
#[derive(Debug, Clone, Default)]
pub struct ReadinessTracker {
    peers: BTreeMap<String, PeerStatus>,
}

impl ReadinessTracker {
    pub fn new<I, S>(expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            peers: expected
                .into_iter()
                .map(|peer| (peer.into(), PeerStatus::Starting))
                .collect(),
        }
    }

    /// Returns `false` for peers that were never expected.
    pub fn update(&mut self, peer: &str, status: PeerStatus) -> bool {
        match self.peers.get_mut(peer) {
            Some(current) => {
                *current = status;
                true
            }
            None => false,
        }
    }

    pub fn status(&self, peer: &str) -> Option<PeerStatus> {
        self.peers.get(peer).copied()
    }

    pub fn all_running(&self) -> bool {
        self.peers
            .values()
            .all(|status| *status == PeerStatus::Running)
    }

    pub fn pending(&self) -> Vec<&str> {
        self.peers
            .iter()
            .filter(|(_, status)| **status != PeerStatus::Running)
            .map(|(peer, _)| peer.as_str())
            .collect()
    }
}
