use serde::Serialize;

use super::Mood;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub mood: Mood,
    /// Swatch colour on the mood ring.
    pub accent: &'static str,
    pub label: &'static str,
}

impl Theme {
    pub fn for_mood(mood: Mood) -> Self {
        let (accent, label) = match mood {
            Mood::Calm => ("#60a5fa", "CALM"),
            Mood::Happy => ("#f59e0b", "HAPPY"),
            Mood::Neutral => ("#94a3b8", "NEUTRAL"),
            Mood::Stressed => ("#34d399", "STRESSED"),
        };
        Self {
            mood,
            accent,
            label,
        }
    }
}
