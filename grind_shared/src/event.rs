//! Scene lifecycle events.
//!
//! The scene queues what happened to it (built, joined a room, failed to
//! join) and the host drains the queue once per frame, in order.

use std::collections::VecDeque;

use crate::net::SessionId;

/// Something the host may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// The scene has built its HUD and is ready to connect.
    Ready { scene: &'static str },
    /// The room accepted the join.
    Joined {
        room_id: String,
        session_id: SessionId,
    },
    /// The join attempt failed; no retry follows.
    JoinFailed { reason: String },
}

/// FIFO of scene events.
#[derive(Debug, Default)]
pub struct EventBus {
    queue: VecDeque<SceneEvent>,
}

impl EventBus {
    pub fn emit(&mut self, event: SceneEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<SceneEvent> {
        self.queue.drain(..).collect()
    }

    /// Reason of the most recent queued join failure, if any.
    pub fn last_join_failure(&self) -> Option<&str> {
        self.queue.iter().rev().find_map(|e| match e {
            SceneEvent::JoinFailed { reason } => Some(reason.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_emission_order() {
        let mut bus = EventBus::default();
        bus.emit(SceneEvent::Ready { scene: "Game" });
        bus.emit(SceneEvent::JoinFailed {
            reason: "refused".into(),
        });

        assert_eq!(bus.pending(), 2);
        assert_eq!(bus.last_join_failure(), Some("refused"));
        let events = bus.drain();
        assert_eq!(events[0], SceneEvent::Ready { scene: "Game" });
        assert!(matches!(events[1], SceneEvent::JoinFailed { .. }));
        assert_eq!(bus.pending(), 0);
        assert_eq!(bus.last_join_failure(), None);
    }
}
