use super::Mood;

/// One row of the keyword table: if any keyword is a substring of the
/// lower-cased text, the row's mood applies.
#[derive(Debug, Clone, Copy)]
pub struct MoodRule {
    pub mood: Mood,
    pub keywords: &'static [&'static str],
}

impl MoodRule {
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Evaluated top to bottom; the first matching row wins.
pub const MOOD_RULES: &[MoodRule] = &[
    MoodRule {
        mood: Mood::Stressed,
        keywords: &["anx", "nerv"],
    },
    MoodRule {
        mood: Mood::Happy,
        keywords: &["happy", "good", "yay"],
    },
    MoodRule {
        mood: Mood::Calm,
        keywords: &["calm", "relax"],
    },
];

pub fn derive_mood(text: &str) -> Mood {
    let lowered = text.to_lowercase();
    MOOD_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.mood)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_text_is_neutral() {
        assert_eq!(derive_mood(""), Mood::Neutral);
        assert_eq!(derive_mood("   \n\t"), Mood::Neutral);
    }

    #[test]
    fn unrecognized_text_is_neutral() {
        assert_eq!(derive_mood("went to the store, bought bread"), Mood::Neutral);
    }

    #[test]
    fn anxiety_terms_win_over_everything() {
        assert_eq!(derive_mood("Feeling anxious"), Mood::Stressed);
        assert_eq!(derive_mood("happy but NERVOUS about the exam"), Mood::Stressed);
        assert_eq!(derive_mood("calm, relaxed, good, yay... and anxious"), Mood::Stressed);
    }

    #[test]
    fn happy_beats_calm() {
        assert_eq!(derive_mood("a good, relaxing afternoon"), Mood::Happy);
        assert_eq!(derive_mood("Yay!"), Mood::Happy);
    }

    #[test]
    fn calm_terms_match_as_substrings() {
        assert_eq!(derive_mood("Relaxation helped"), Mood::Calm);
        assert_eq!(derive_mood("calmer than yesterday"), Mood::Calm);
    }

    #[test]
    fn table_order_is_the_priority_order() {
        let order: Vec<Mood> = MOOD_RULES.iter().map(|rule| rule.mood).collect();
        assert_eq!(order, vec![Mood::Stressed, Mood::Happy, Mood::Calm]);
    }
}
