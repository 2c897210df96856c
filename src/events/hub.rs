use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::broadcast;

use super::{EventPublisher, UserEvent, WatchEvent};

/// In-process fan-out hub with one broadcast topic per user.
///
/// A topic exists only while at least one session is subscribed. Publishing
/// to a user with no live sessions drops the event.
#[derive(Debug)]
pub struct BroadcastHub {
    capacity: usize,
    topics: DashMap<String, broadcast::Sender<UserEvent>>,
}

impl BroadcastHub {
    /// Create a hub whose per-user channels buffer `capacity` events.
    ///
    /// A session that falls further behind observes `RecvError::Lagged` and
    /// should resynchronize with a full status read.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: DashMap::new(),
        }
    }

    /// Subscribe a session to a user's topic
    pub fn subscribe(&self, user_id: &str) -> broadcast::Receiver<UserEvent> {
        match self.topics.entry(user_id.to_string()) {
            Entry::Occupied(topic) => topic.get().subscribe(),
            Entry::Vacant(slot) => {
                let (sender, receiver) = broadcast::channel(self.capacity);
                slot.insert(sender);
                tracing::debug!(user_id = %user_id, "Opened event topic");
                receiver
            }
        }
    }

    /// Number of sessions currently subscribed for a user
    pub fn session_count(&self, user_id: &str) -> usize {
        self.topics
            .get(user_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Number of users with an open topic
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventPublisher for BroadcastHub {
    fn publish(&self, user_id: &str, event: WatchEvent) {
        let name = event.name();
        let envelope = UserEvent {
            user_id: user_id.to_string(),
            emitted_at: Utc::now(),
            event,
        };

        let sent = match self.topics.get(user_id) {
            Some(sender) => sender.send(envelope),
            None => {
                tracing::debug!(user_id = %user_id, event = name, "No live sessions, event dropped");
                return;
            }
        };

        match sent {
            Ok(sessions) => {
                tracing::debug!(user_id = %user_id, event = name, sessions, "Event published");
            }
            Err(_) => {
                // A session may have subscribed since the send failed
                self.topics
                    .remove_if(user_id, |_, sender| sender.receiver_count() == 0);
                tracing::debug!(user_id = %user_id, event = name, "Closed idle event topic");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(series_id: &str) -> WatchEvent {
        WatchEvent::SeriesCompletedToggled {
            series_id: series_id.to_string(),
            is_completed: true,
        }
    }

    #[tokio::test]
    async fn test_every_session_of_a_user_receives_the_event() {
        let hub = BroadcastHub::default();
        let mut phone = hub.subscribe("u1");
        let mut laptop = hub.subscribe("u1");
        assert_eq!(hub.session_count("u1"), 2);

        hub.publish("u1", completed("1399"));

        let a = phone.recv().await.unwrap();
        let b = laptop.recv().await.unwrap();
        assert_eq!(a.user_id, "u1");
        assert_eq!(a.event, completed("1399"));
        assert_eq!(b.event, completed("1399"));
    }

    #[tokio::test]
    async fn test_events_are_scoped_to_the_user() {
        let hub = BroadcastHub::default();
        let mut other = hub.subscribe("u2");

        hub.publish("u1", completed("1399"));

        assert!(matches!(
            other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_publish_without_sessions_is_dropped() {
        let hub = BroadcastHub::default();
        hub.publish("nobody", completed("1399"));
        assert_eq!(hub.topic_count(), 0);
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let hub = BroadcastHub::default();
        let early = hub.subscribe("u1");
        hub.publish("u1", completed("1"));

        let mut late = hub.subscribe("u1");
        assert!(late.try_recv().is_err());
        drop(early);
    }

    #[test]
    fn test_topic_closed_once_sessions_leave() {
        let hub = BroadcastHub::default();
        let session = hub.subscribe("u1");
        assert_eq!(hub.topic_count(), 1);

        drop(session);
        hub.publish("u1", completed("1399"));
        assert_eq!(hub.topic_count(), 0);
    }
}
