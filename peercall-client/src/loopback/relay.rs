use crate::error::ChannelError;
use crate::external::{Credentials, EventSink, SignalingChannel, SignalingEvent, SubscriptionId};
use dashmap::DashMap;
use peercall_core::{Peer, PeerId, PeerStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

struct Endpoint {
    user_name: String,
    online: bool,
    sinks: Vec<(SubscriptionId, EventSink<SignalingEvent>)>,
}

impl Endpoint {
    fn new() -> Self {
        Self {
            user_name: String::new(),
            online: false,
            sinks: Vec::new(),
        }
    }
}

/// A relay shared by every [`LoopbackChannel`] created from it. Delivery is
/// synchronous: sinks run on the sender's thread.
#[derive(Clone, Default)]
pub struct LoopbackRelay {
    endpoints: Arc<DashMap<PeerId, Endpoint>>,
    next_subscription: Arc<AtomicU64>,
}

impl LoopbackRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel a client identified as `user_id` would use.
    pub fn channel(&self, user_id: impl Into<PeerId>) -> LoopbackChannel {
        let user_id = user_id.into();
        self.endpoints
            .entry(user_id.clone())
            .or_insert_with(Endpoint::new);

        LoopbackChannel {
            relay: self.clone(),
            user_id,
        }
    }

    pub fn is_online(&self, user_id: &PeerId) -> bool {
        self.endpoints
            .get(user_id)
            .map(|endpoint| endpoint.online)
            .unwrap_or(false)
    }

    /// Simulates the relay dropping a client: it sees a failed connection,
    /// everyone else sees it go offline.
    pub fn drop_connection(&self, user_id: &PeerId, reason: &str) {
        let was_online = match self.endpoints.get_mut(user_id) {
            Some(mut endpoint) => std::mem::replace(&mut endpoint.online, false),
            None => false,
        };
        if !was_online {
            return;
        }

        info!("Relay dropped {}: {}", user_id, reason);
        self.deliver_to(
            user_id,
            SignalingEvent::ConnectionChanged {
                connected: false,
                error: Some(reason.to_owned()),
            },
        );
        self.announce_status(user_id, PeerStatus::Offline);
    }

    fn sinks_of(&self, user_id: &PeerId) -> Vec<EventSink<SignalingEvent>> {
        self.endpoints
            .get(user_id)
            .map(|endpoint| endpoint.sinks.iter().map(|(_, sink)| sink.clone()).collect())
            .unwrap_or_default()
    }

    fn online_except(&self, user_id: &PeerId) -> Vec<Peer> {
        self.endpoints
            .iter()
            .filter(|entry| entry.online && entry.key() != user_id)
            .map(|entry| Peer::new(entry.key().clone(), entry.user_name.clone()))
            .collect()
    }

    // Sinks are collected first so no map guard is held while they run.
    fn deliver_to(&self, user_id: &PeerId, event: SignalingEvent) {
        for sink in self.sinks_of(user_id) {
            sink(event.clone());
        }
    }

    fn announce_status(&self, user_id: &PeerId, status: PeerStatus) {
        let user_name = self
            .endpoints
            .get(user_id)
            .map(|endpoint| endpoint.user_name.clone())
            .unwrap_or_default();
        let peer = Peer::new(user_id.clone(), user_name).with_status(status);

        for other in self.online_except(user_id) {
            self.deliver_to(&other.user_id, SignalingEvent::PeerStatusChanged(peer.clone()));
        }
    }
}

/// One client's view of a [`LoopbackRelay`].
#[derive(Clone)]
pub struct LoopbackChannel {
    relay: LoopbackRelay,
    user_id: PeerId,
}

impl LoopbackChannel {
    pub fn user_id(&self) -> &PeerId {
        &self.user_id
    }
}

impl SignalingChannel for LoopbackChannel {
    fn connect(&self, credentials: &Credentials) -> Result<(), ChannelError> {
        if credentials.user_id != self.user_id {
            return Err(ChannelError(format!(
                "credentials for {} presented on channel of {}",
                credentials.user_id, self.user_id
            )));
        }

        match self.relay.endpoints.get_mut(&self.user_id) {
            Some(mut endpoint) => {
                endpoint.online = true;
                endpoint.user_name = credentials.user_name.clone();
            }
            None => return Err(ChannelError(format!("unknown endpoint {}", self.user_id))),
        }
        info!("{} connected to loopback relay", self.user_id);

        self.relay.deliver_to(
            &self.user_id,
            SignalingEvent::ConnectionChanged {
                connected: true,
                error: None,
            },
        );

        let me = Peer::new(self.user_id.clone(), credentials.user_name.clone());
        for other in self.relay.online_except(&self.user_id) {
            self.relay
                .deliver_to(&self.user_id, SignalingEvent::NewPeer(other.clone()));
            self.relay
                .deliver_to(&other.user_id, SignalingEvent::NewPeer(me.clone()));
        }
        Ok(())
    }

    fn disconnect(&self) -> Result<(), ChannelError> {
        let was_online = match self.relay.endpoints.get_mut(&self.user_id) {
            Some(mut endpoint) => std::mem::replace(&mut endpoint.online, false),
            None => false,
        };
        if !was_online {
            return Ok(());
        }

        info!("{} disconnected from loopback relay", self.user_id);
        self.relay.deliver_to(
            &self.user_id,
            SignalingEvent::ConnectionChanged {
                connected: false,
                error: None,
            },
        );
        self.relay
            .announce_status(&self.user_id, PeerStatus::Offline);
        Ok(())
    }

    fn send_message(
        &self,
        target_id: &PeerId,
        broadcast: bool,
        message_type: &str,
        payload: &str,
        _reliable: bool,
    ) -> Result<(), ChannelError> {
        if !self.relay.is_online(&self.user_id) {
            return Err(ChannelError(format!("{} is not connected", self.user_id)));
        }

        let event = SignalingEvent::NewMessage {
            sender_id: self.user_id.clone(),
            message_type: message_type.to_owned(),
            payload: payload.to_owned(),
        };

        if broadcast {
            for other in self.relay.online_except(&self.user_id) {
                self.relay.deliver_to(&other.user_id, event.clone());
            }
            return Ok(());
        }

        if !self.relay.is_online(target_id) {
            return Err(ChannelError(format!("peer {} is not connected", target_id)));
        }

        debug!(
            "Relaying {} from {} to {} ({} bytes)",
            message_type,
            self.user_id,
            target_id,
            payload.len()
        );
        self.relay.deliver_to(target_id, event);
        Ok(())
    }

    fn subscribe(&self, sink: EventSink<SignalingEvent>) -> SubscriptionId {
        let id = SubscriptionId(self.relay.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.relay
            .endpoints
            .entry(self.user_id.clone())
            .or_insert_with(Endpoint::new)
            .sinks
            .push((id, sink));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(mut endpoint) = self.relay.endpoints.get_mut(&self.user_id) {
            endpoint.sinks.retain(|(sub, _)| *sub != id);
        }
    }
}
