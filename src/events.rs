use serde::Serialize;
use tokio::sync::broadcast;

use crate::{
    journal::JournalEntry,
    mood::Mood,
    streamer::RunOutcome,
    timer::FocusSnapshot,
};

const EVENT_CAPACITY: usize = 256;

/// Everything a view needs to re-render. Serialized with an `event` tag so a
/// front end can forward it verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SanctuaryEvent {
    MoodChanged {
        mood: Mood,
    },
    JournalSaved {
        entry: JournalEntry,
    },
    EngagementChanged {
        score: f64,
        garden_size: u32,
    },
    FocusStateChanged {
        snapshot: FocusSnapshot,
    },
    FocusTick {
        seconds_remaining: u64,
    },
    FocusCompleted {
        session_id: String,
    },
    ScriptStarted {
        run_id: String,
    },
    OutputUpdated {
        run_id: String,
        output: String,
    },
    ScriptFinished {
        run_id: String,
        outcome: RunOutcome,
    },
}

/// Fan-out channel shared by every component of a session.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SanctuaryEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SanctuaryEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is not an error.
    pub fn emit(&self, event: SanctuaryEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_in_emit_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(SanctuaryEvent::MoodChanged { mood: Mood::Calm });
        bus.emit(SanctuaryEvent::FocusTick {
            seconds_remaining: 59,
        });

        assert!(matches!(
            rx.recv().await,
            Ok(SanctuaryEvent::MoodChanged { mood: Mood::Calm })
        ));
        assert!(matches!(
            rx.recv().await,
            Ok(SanctuaryEvent::FocusTick {
                seconds_remaining: 59
            })
        ));
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.emit(SanctuaryEvent::MoodChanged { mood: Mood::Happy });
    }

    #[test]
    fn events_serialize_with_kebab_case_tag() {
        let json = serde_json::to_value(SanctuaryEvent::FocusTick {
            seconds_remaining: 3,
        })
        .unwrap();
        assert_eq!(json["event"], "focus-tick");
        assert_eq!(json["seconds_remaining"], 3);
    }
}
