use peercall_client::{CallError, CallEvent, NegotiationController};
use peercall_core::SessionState;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Consecutive empty ticks before the controller counts as settled.
pub const SETTLE_IDLE_ROUNDS: usize = 5;

/// Tick until nothing is left to run, yielding in between so spawned
/// readiness waits get a chance to enqueue their continuation.
pub async fn settle(controller: &mut NegotiationController) -> usize {
    let mut total = 0;
    let mut idle_rounds = 0;

    while idle_rounds < SETTLE_IDLE_ROUNDS {
        tokio::task::yield_now().await;
        match controller.tick() {
            0 => idle_rounds += 1,
            n => {
                total += n;
                idle_rounds = 0;
            }
        }
    }
    total
}

/// Settle two controllers that talk to each other.
pub async fn settle_pair(a: &mut NegotiationController, b: &mut NegotiationController) {
    let mut idle_rounds = 0;
    while idle_rounds < SETTLE_IDLE_ROUNDS {
        tokio::task::yield_now().await;
        if a.tick() + b.tick() == 0 {
            idle_rounds += 1;
        } else {
            idle_rounds = 0;
        }
    }
}

pub fn drain_events(rx: &mut broadcast::Receiver<CallEvent>) -> Vec<CallEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(n)) => tracing::warn!("Test receiver lagged by {}", n),
            Err(_) => break,
        }
    }
    events
}

/// Target states of every transition, in order.
pub fn transitions(events: &[CallEvent]) -> Vec<SessionState> {
    events
        .iter()
        .filter_map(|e| match e {
            CallEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

pub fn errors(events: &[CallEvent]) -> Vec<CallError> {
    events
        .iter()
        .filter_map(|e| match e {
            CallEvent::Error(err) => Some(err.clone()),
            _ => None,
        })
        .collect()
}

pub fn warnings(events: &[CallEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            CallEvent::Warning(w) => Some(w.clone()),
            _ => None,
        })
        .collect()
}
