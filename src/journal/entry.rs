use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mood::Mood;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: i64,
    pub text: String,
    pub mood: Mood,
    pub created_at: DateTime<Utc>,
}

/// Hands out creation-timestamp ids (ms since epoch) that stay strictly
/// increasing even when saves share a millisecond or the clock steps back.
#[derive(Debug, Default)]
pub struct EntryIdGenerator {
    last: Option<i64>,
}

impl EntryIdGenerator {
    pub fn next(&mut self, now: DateTime<Utc>) -> i64 {
        let candidate = now.timestamp_millis();
        let id = match self.last {
            Some(last) if candidate <= last => last + 1,
            _ => candidate,
        };
        self.last = Some(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn ids_follow_the_clock() {
        let mut ids = EntryIdGenerator::default();
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(ids.next(t0), 1_700_000_000_000);
        assert_eq!(ids.next(t0 + Duration::milliseconds(40)), 1_700_000_000_040);
    }

    #[test]
    fn same_millisecond_and_backwards_clock_still_increase() {
        let mut ids = EntryIdGenerator::default();
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let a = ids.next(t0);
        let b = ids.next(t0);
        let c = ids.next(t0 - Duration::seconds(5));
        assert!(a < b && b < c);
    }
}
