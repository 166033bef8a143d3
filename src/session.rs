use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::{
    engagement::{Engagement, JOURNAL_SAVE_POINTS},
    events::{EventBus, SanctuaryEvent},
    journal::{JournalEntry, JournalLog},
    mood::{Mood, Theme},
    settings::Settings,
    streamer::{RunOutcome, ScriptRunner},
    timer::{FocusController, FocusSnapshot},
};

/// Everything a view renders, captured at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mood: Mood,
    pub theme: Theme,
    pub draft: String,
    pub entries: Vec<JournalEntry>,
    pub focus: FocusSnapshot,
    pub engagement: f64,
    pub garden_size: u32,
    pub streak: u64,
    pub script_output: String,
    pub script_running: bool,
}

/// One user's view state: journal, mood, focus timer, score and script
/// runner. Handlers take the session explicitly; nothing is global.
///
/// Call [`SanctuarySession::shutdown`] when the view goes away. Dropping the
/// last handle without it still aborts the tick task and any in-flight run.
#[derive(Clone)]
pub struct SanctuarySession {
    journal: Arc<Mutex<JournalLog>>,
    engagement: Engagement,
    focus: FocusController,
    runner: ScriptRunner,
    events: EventBus,
    teardown: Arc<TeardownGuard>,
}

struct TeardownGuard {
    focus: FocusController,
    runner: ScriptRunner,
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        self.focus.abort_ticker_now();
        self.runner.cancel();
    }
}

impl SanctuarySession {
    pub fn new(settings: &Settings) -> Result<Self> {
        let events = EventBus::new();
        let engagement = Engagement::new(events.clone());
        let focus = FocusController::new(
            settings.default_focus_minutes,
            settings.tick_interval(),
            engagement.clone(),
            events.clone(),
        );
        let runner = ScriptRunner::new(
            settings.script_endpoint.clone(),
            settings.stream_mode,
            events.clone(),
        )?;

        Ok(Self {
            journal: Arc::new(Mutex::new(JournalLog::new())),
            engagement,
            teardown: Arc::new(TeardownGuard {
                focus: focus.clone(),
                runner: runner.clone(),
            }),
            focus,
            runner,
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SanctuaryEvent> {
        self.events.subscribe()
    }

    // Journal and mood

    pub async fn set_journal_text(&self, text: impl Into<String>) -> Mood {
        let (before, after) = {
            let mut journal = self.journal.lock().await;
            let before = journal.mood();
            (before, journal.set_text(text))
        };
        self.emit_mood_if_changed(before, after);
        after
    }

    pub async fn set_mood(&self, mood: Mood) {
        let before = {
            let mut journal = self.journal.lock().await;
            let before = journal.mood();
            journal.set_mood(mood);
            before
        };
        self.emit_mood_if_changed(before, mood);
    }

    pub async fn mood(&self) -> Mood {
        self.journal.lock().await.mood()
    }

    pub async fn save_journal(&self) -> Option<JournalEntry> {
        let (before, saved, after) = {
            let mut journal = self.journal.lock().await;
            let before = journal.mood();
            let saved = journal.save(Utc::now());
            (before, saved, journal.mood())
        };

        let entry = saved?;
        log::info!("journal entry {} saved ({})", entry.id, entry.mood);
        self.events.emit(SanctuaryEvent::JournalSaved {
            entry: entry.clone(),
        });
        self.engagement.add(JOURNAL_SAVE_POINTS);
        self.emit_mood_if_changed(before, after);
        Some(entry)
    }

    pub async fn clear_journal(&self) {
        let (before, after) = {
            let mut journal = self.journal.lock().await;
            let before = journal.mood();
            (before, journal.clear())
        };
        self.emit_mood_if_changed(before, after);
    }

    pub async fn entries(&self) -> Vec<JournalEntry> {
        self.journal.lock().await.entries().to_vec()
    }

    // Focus

    pub async fn start_focus(&self, minutes: u32) -> Result<FocusSnapshot> {
        self.focus.start_focus(minutes).await
    }

    pub async fn stop_focus(&self) -> Result<FocusSnapshot> {
        self.focus.stop_focus().await
    }

    pub async fn focus_snapshot(&self) -> FocusSnapshot {
        self.focus.get_snapshot().await
    }

    // Script runner

    pub fn runner(&self) -> &ScriptRunner {
        &self.runner
    }

    pub async fn run_script(&self) -> RunOutcome {
        self.runner.run().await
    }

    pub fn cancel_script(&self) -> bool {
        self.runner.cancel()
    }

    pub fn set_script_endpoint(&self, endpoint: impl Into<String>) {
        self.runner.set_endpoint(endpoint);
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let (mood, draft, entries) = {
            let journal = self.journal.lock().await;
            (
                journal.mood(),
                journal.draft().to_string(),
                journal.entries().to_vec(),
            )
        };
        let score = self.engagement.current();

        SessionSnapshot {
            mood,
            theme: mood.theme(),
            draft,
            entries,
            focus: self.focus.get_snapshot().await,
            engagement: score.score(),
            garden_size: score.garden_size(),
            streak: score.streak(),
            script_output: self.runner.output().await,
            script_running: self.runner.is_running(),
        }
    }

    /// Stops the tick task and aborts any in-flight script run.
    pub async fn shutdown(&self) {
        self.focus.shutdown().await;
        self.runner.cancel();
        log::info!("session shut down");
    }

    fn emit_mood_if_changed(&self, before: Mood, after: Mood) {
        if before != after {
            self.events.emit(SanctuaryEvent::MoodChanged { mood: after });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::FocusStatus;
    use std::time::Duration;

    fn session() -> SanctuarySession {
        SanctuarySession::new(&Settings::default()).unwrap()
    }

    #[tokio::test]
    async fn save_credits_partial_points_and_resets_mood() {
        let session = session();
        assert_eq!(session.set_journal_text("such a good day").await, Mood::Happy);

        let entry = session.save_journal().await.expect("saved");
        assert_eq!(entry.mood, Mood::Happy);

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.draft, "");
        assert_eq!(snapshot.mood, Mood::Neutral);
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.engagement, JOURNAL_SAVE_POINTS);
        assert_eq!(snapshot.garden_size, 0);
    }

    #[tokio::test]
    async fn blank_save_is_ignored() {
        let session = session();
        session.set_journal_text("   ").await;
        assert!(session.save_journal().await.is_none());

        let snapshot = session.snapshot().await;
        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.engagement, 0.0);
        assert_eq!(snapshot.draft, "   ");
    }

    #[tokio::test]
    async fn mood_changes_are_published_once_per_change() {
        let session = session();
        let mut rx = session.subscribe();

        session.set_journal_text("calm").await;
        session.set_journal_text("calm morning").await;
        session.set_mood(Mood::Stressed).await;

        let mut moods = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let SanctuaryEvent::MoodChanged { mood } = event {
                moods.push(mood);
            }
        }
        assert_eq!(moods, vec![Mood::Calm, Mood::Stressed]);
    }

    #[tokio::test]
    async fn snapshot_reflects_theme_of_active_mood() {
        let session = session();
        session.set_journal_text("nervous").await;
        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.theme, Theme::for_mood(Mood::Stressed));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_halts_focus() {
        let session = session();
        session.start_focus(25).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        session.shutdown().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        let focus = session.focus_snapshot().await;
        assert_eq!(focus.state.status, FocusStatus::Idle);
        assert_eq!(focus.state.seconds_remaining, 1498);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_last_handle_stops_ticks() {
        let session = session();
        let mut rx = session.subscribe();
        session.start_focus(25).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let mut ticks_before = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, SanctuaryEvent::FocusTick { .. }) {
                ticks_before += 1;
            }
        }
        assert_eq!(ticks_before, 2);

        drop(session);
        tokio::time::sleep(Duration::from_secs(30)).await;

        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, SanctuaryEvent::FocusTick { .. }));
        }
    }
}
