use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use uuid::Uuid;

use crate::{
    engagement::{Engagement, FOCUS_SESSION_POINTS},
    events::{EventBus, SanctuaryEvent},
};

use super::{FocusState, TickOutcome};

// Set to true to log every tick
const ENABLE_LOGS: bool = false;

use crate::log_info;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FocusSnapshot {
    pub state: FocusState,
    pub clock: String,
}

impl FocusSnapshot {
    fn of(state: &FocusState) -> Self {
        Self {
            clock: state.clock(),
            state: state.clone(),
        }
    }
}

/// Owns the focus countdown and the one tick task that drives it.
///
/// `start_focus`, `stop_focus` and `shutdown` are the only paths that touch
/// the tick task, and each releases the previous handle before anything new
/// is scheduled.
#[derive(Clone)]
pub struct FocusController {
    state: Arc<Mutex<FocusState>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    engagement: Engagement,
    events: EventBus,
}

impl FocusController {
    pub fn new(
        default_minutes: u32,
        tick_interval: Duration,
        engagement: Engagement,
        events: EventBus,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(FocusState::new(default_minutes))),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            engagement,
            events,
        }
    }

    pub async fn get_snapshot(&self) -> FocusSnapshot {
        FocusSnapshot::of(&*self.state.lock().await)
    }

    /// Starts a countdown, restarting it if one is already running.
    pub async fn start_focus(&self, minutes: u32) -> Result<FocusSnapshot> {
        if minutes == 0 {
            bail!("focus duration must be at least one minute");
        }

        // Held until the new ticker is stored so overlapping starts serialize.
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let session_id = Uuid::new_v4().to_string();
        let snapshot = {
            let mut state = self.state.lock().await;
            state.begin_session(session_id.clone(), minutes, Utc::now());
            FocusSnapshot::of(&state)
        };

        *ticker_guard = Some(self.spawn_ticker(session_id.clone()));
        drop(ticker_guard);

        log::info!("focus session {session_id} started for {minutes} min");
        self.emit_state_changed(snapshot.clone());
        Ok(snapshot)
    }

    /// Stops the countdown in place. Stopping while idle is a no-op.
    pub async fn stop_focus(&self) -> Result<FocusSnapshot> {
        self.cancel_ticker().await;

        let (was_running, snapshot) = {
            let mut state = self.state.lock().await;
            let was_running = state.stop();
            (was_running, FocusSnapshot::of(&state))
        };

        if was_running {
            log::info!(
                "focus session stopped with {} remaining",
                snapshot.clock
            );
            self.emit_state_changed(snapshot.clone());
        }
        Ok(snapshot)
    }

    /// Teardown: the countdown keeps its value but nothing ticks it any more.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
        self.state.lock().await.stop();
    }

    /// Synchronous variant of teardown for `Drop` paths. Skips if the handle
    /// is momentarily locked by another path, which is itself releasing it.
    pub fn abort_ticker_now(&self) {
        if let Ok(mut guard) = self.ticker.try_lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }

    fn spawn_ticker(&self, session_id: String) -> JoinHandle<()> {
        let state = self.state.clone();
        let engagement = self.engagement.clone();
        let events = self.events.clone();
        let tick_interval = self.tick_interval;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let (outcome, snapshot) = {
                    let mut guard = state.lock().await;
                    if guard.session_id.as_deref() != Some(session_id.as_str()) {
                        break;
                    }
                    let outcome = guard.tick();
                    if outcome == TickOutcome::Completed {
                        engagement.add(FOCUS_SESSION_POINTS);
                    }
                    (outcome, FocusSnapshot::of(&guard))
                };

                match outcome {
                    TickOutcome::Continued => {
                        log_info!("focus tick: {}", snapshot.clock);
                        events.emit(SanctuaryEvent::FocusTick {
                            seconds_remaining: snapshot.state.seconds_remaining,
                        });
                    }
                    TickOutcome::Completed => {
                        log::info!("focus session {session_id} completed");
                        events.emit(SanctuaryEvent::FocusStateChanged { snapshot });
                        events.emit(SanctuaryEvent::FocusCompleted {
                            session_id: session_id.clone(),
                        });
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
        })
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    fn emit_state_changed(&self, snapshot: FocusSnapshot) {
        self.events
            .emit(SanctuaryEvent::FocusStateChanged { snapshot });
    }

    #[cfg(test)]
    async fn ticker_alive(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
