use chrono::{DateTime, Utc};

use crate::mood::{derive_mood, Mood};

use super::entry::{EntryIdGenerator, JournalEntry};

/// Draft text, the mood it implies, and saved entries (newest first).
#[derive(Debug, Default)]
pub struct JournalLog {
    draft: String,
    mood: Mood,
    entries: Vec<JournalEntry>,
    ids: EntryIdGenerator,
}

impl JournalLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Replaces the draft and re-derives the mood from it. Returns the new mood.
    pub fn set_text(&mut self, text: impl Into<String>) -> Mood {
        self.draft = text.into();
        self.mood = derive_mood(&self.draft);
        self.mood
    }

    /// Manual pick from the mood ring. Holds until the draft changes.
    pub fn set_mood(&mut self, mood: Mood) {
        self.mood = mood;
    }

    /// Empties the draft. Saved entries are untouched.
    pub fn clear(&mut self) -> Mood {
        self.set_text(String::new())
    }

    /// Returns `None` (and changes nothing) when the draft is blank.
    pub fn save(&mut self, now: DateTime<Utc>) -> Option<JournalEntry> {
        let text = self.draft.trim();
        if text.is_empty() {
            return None;
        }

        let entry = JournalEntry {
            id: self.ids.next(now),
            text: text.to_string(),
            mood: self.mood,
            created_at: now,
        };

        self.entries.insert(0, entry.clone());
        self.clear();
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typing_rederives_mood() {
        let mut log = JournalLog::new();
        assert_eq!(log.set_text("so relaxed"), Mood::Calm);
        assert_eq!(log.set_text("so relaxed, yay"), Mood::Happy);
        assert_eq!(log.set_text("nervous now"), Mood::Stressed);
        assert_eq!(log.set_text(""), Mood::Neutral);
    }

    #[test]
    fn save_prepends_trimmed_entry_with_current_mood() {
        let mut log = JournalLog::new();
        log.set_text("  a good day  ");
        let first = log.save(Utc::now()).expect("entry");

        assert_eq!(first.text, "a good day");
        assert_eq!(first.mood, Mood::Happy);
        assert_eq!(log.draft(), "");
        assert_eq!(log.mood(), Mood::Neutral);

        log.set_text("anxious about tomorrow");
        let second = log.save(Utc::now()).expect("entry");

        let texts: Vec<&str> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["anxious about tomorrow", "a good day"]);
        assert!(second.id > first.id);
        assert_eq!(log.entries()[0].mood, Mood::Stressed);
    }

    #[test]
    fn blank_save_changes_nothing() {
        let mut log = JournalLog::new();
        log.set_text("   \n ");
        assert!(log.save(Utc::now()).is_none());
        assert!(log.entries().is_empty());
        assert_eq!(log.draft(), "   \n ");
    }

    #[test]
    fn manual_mood_is_captured_until_text_changes() {
        let mut log = JournalLog::new();
        log.set_text("walked the dog");
        log.set_mood(Mood::Calm);
        let entry = log.save(Utc::now()).expect("entry");
        assert_eq!(entry.mood, Mood::Calm);

        log.set_mood(Mood::Happy);
        log.set_text("walked the dog again");
        assert_eq!(log.mood(), Mood::Neutral);
    }

    #[test]
    fn clear_keeps_entries() {
        let mut log = JournalLog::new();
        log.set_text("first");
        log.save(Utc::now());
        log.set_text("draft in progress");
        log.clear();
        assert_eq!(log.draft(), "");
        assert_eq!(log.entries().len(), 1);
    }
}
