use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FocusStatus {
    #[default]
    Idle,
    Running,
}

/// What a single tick did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continued,
    Completed,
    /// Tick arrived while idle; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusState {
    pub status: FocusStatus,
    pub seconds_remaining: u64,
    pub duration_minutes: u32,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

impl FocusState {
    /// Idle, showing the full length of the default preset.
    pub fn new(default_minutes: u32) -> Self {
        Self {
            status: FocusStatus::Idle,
            seconds_remaining: minutes_to_seconds(default_minutes),
            duration_minutes: default_minutes,
            session_id: None,
            started_at: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == FocusStatus::Running
    }

    pub fn begin_session(&mut self, session_id: String, minutes: u32, start_at: DateTime<Utc>) {
        *self = Self {
            status: FocusStatus::Running,
            seconds_remaining: minutes_to_seconds(minutes),
            duration_minutes: minutes,
            session_id: Some(session_id),
            started_at: Some(start_at),
        };
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Ignored;
        }

        if self.seconds_remaining <= 1 {
            self.seconds_remaining = 0;
            self.status = FocusStatus::Idle;
            TickOutcome::Completed
        } else {
            self.seconds_remaining -= 1;
            TickOutcome::Continued
        }
    }

    /// Leaves `seconds_remaining` where it is. Returns whether it was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.is_running();
        self.status = FocusStatus::Idle;
        was_running
    }

    pub fn clock(&self) -> String {
        format_clock(self.seconds_remaining)
    }
}

fn minutes_to_seconds(minutes: u32) -> u64 {
    u64::from(minutes) * 60
}

/// `mm:ss`, zero padded. Minutes are not wrapped into hours.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
