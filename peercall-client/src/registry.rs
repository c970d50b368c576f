use dashmap::DashMap;
use peercall_core::{Peer, PeerId, PeerStatus};
use std::sync::Arc;
use tracing::debug;

/// Known remote peers and their presence.
///
/// Cheap to clone and safe to read from any thread. Mutation is crate-private
/// and only happens from actions drained on the apply thread.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<DashMap<PeerId, Peer>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites by `user_id`.
    pub(crate) fn upsert(&self, peer: Peer) {
        self.peers.insert(peer.user_id.clone(), peer);
    }

    /// Presence updates may race ahead of registration, so an unknown id is
    /// not an error. Returns whether a record was updated.
    pub(crate) fn set_status(&self, user_id: &PeerId, status: PeerStatus) -> bool {
        match self.peers.get_mut(user_id) {
            Some(mut peer) => {
                peer.status = status;
                true
            }
            None => {
                debug!("Status update for unknown peer {}", user_id);
                false
            }
        }
    }

    pub fn get(&self, user_id: &PeerId) -> Option<Peer> {
        self.peers.get(user_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, user_id: &PeerId) -> bool {
        self.peers.contains_key(user_id)
    }

    pub fn list(&self) -> Vec<Peer> {
        self.peers.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn online(&self) -> Vec<Peer> {
        self.peers
            .iter()
            .filter(|entry| entry.value().is_online())
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
