use std::sync::{Arc, Mutex, PoisonError};

use crate::events::{EventBus, SanctuaryEvent};

pub const FOCUS_SESSION_POINTS: f64 = 1.0;
pub const JOURNAL_SAVE_POINTS: f64 = 0.5;
pub const GARDEN_CAP: f64 = 6.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngagementScore {
    score: f64,
}

impl EngagementScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Negative amounts are ignored; the score never goes down.
    pub fn add(&mut self, points: f64) {
        if points > 0.0 {
            self.score += points;
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn garden_size(&self) -> u32 {
        self.score.min(GARDEN_CAP).floor() as u32
    }

    pub fn streak(&self) -> u64 {
        self.score.floor() as u64
    }
}

/// Shared handle to a session's score.
///
/// Uses a std mutex so the focus tick task can credit a completed session
/// without an await point between the final tick and the credit.
pub struct Engagement {
    inner: Arc<Mutex<EngagementScore>>,
    events: EventBus,
}

impl Engagement {
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngagementScore::new())),
            events,
        }
    }

    pub fn add(&self, points: f64) -> EngagementScore {
        let updated = {
            let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            guard.add(points);
            *guard
        };

        self.events.emit(SanctuaryEvent::EngagementChanged {
            score: updated.score(),
            garden_size: updated.garden_size(),
        });
        updated
    }

    pub fn current(&self) -> EngagementScore {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for Engagement {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            events: self.events.clone(),
        }
    }
}
