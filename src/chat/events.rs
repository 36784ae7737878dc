use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One record of the caller-facing stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatEvent {
    Delta { content: String },
    Done,
    Error { message: String },
}

/// The receiving side has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

/// Write half of a chat event stream.
///
/// `done` and `fail` consume the sink, so at most one terminal event is ever
/// sent and nothing can follow it.
pub struct EventSink {
    tx: mpsc::UnboundedSender<ChatEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn delta(&self, content: String) -> Result<(), Disconnected> {
        self.tx
            .send(ChatEvent::Delta { content })
            .map_err(|_| Disconnected)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the receiver is dropped.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn done(self) {
        let _ = self.tx.send(ChatEvent::Done);
    }

    pub fn fail(self, message: impl Into<String>) {
        let _ = self.tx.send(ChatEvent::Error {
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_a_type_tag() {
        let delta = ChatEvent::Delta {
            content: "안".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&delta).unwrap(),
            json!({"type": "delta", "content": "안"})
        );
        assert_eq!(
            serde_json::to_value(ChatEvent::Done).unwrap(),
            json!({"type": "done"})
        );
        assert_eq!(
            serde_json::to_value(ChatEvent::Error {
                message: "boom".to_string()
            })
            .unwrap(),
            json!({"type": "error", "message": "boom"})
        );
    }

    #[tokio::test]
    async fn terminal_event_closes_the_stream() {
        let (sink, mut rx) = EventSink::channel();
        sink.delta("a".to_string()).unwrap();
        sink.done();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                ChatEvent::Delta {
                    content: "a".to_string()
                },
                ChatEvent::Done
            ]
        );
    }

    #[test]
    fn delta_after_receiver_drop_reports_disconnect() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        assert!(sink.is_closed());
        assert_eq!(sink.delta("late".to_string()), Err(Disconnected));
    }
}
