pub mod classifier;
pub mod theme;

pub use classifier::{derive_mood, MoodRule, MOOD_RULES};
pub use theme::Theme;

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Calm,
    Happy,
    Stressed,
}

impl Mood {
    /// Order of the swatches around the mood ring.
    pub const RING: [Mood; 4] = [Mood::Calm, Mood::Happy, Mood::Neutral, Mood::Stressed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Neutral => "neutral",
            Mood::Calm => "calm",
            Mood::Happy => "happy",
            Mood::Stressed => "stressed",
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::for_mood(*self)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "neutral" => Ok(Mood::Neutral),
            "calm" => Ok(Mood::Calm),
            "happy" => Ok(Mood::Happy),
            "stressed" => Ok(Mood::Stressed),
            other => {
                let known: Vec<&str> = Mood::RING.iter().map(Mood::as_str).collect();
                Err(anyhow!("unknown mood '{other}' (pick one of {})", known.join(", ")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Calm".parse::<Mood>().unwrap(), Mood::Calm);
        assert_eq!(" STRESSED ".parse::<Mood>().unwrap(), Mood::Stressed);
        let err = "grumpy".parse::<Mood>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown mood 'grumpy' (pick one of calm, happy, neutral, stressed)"
        );
    }

    #[test]
    fn ring_holds_every_mood_once() {
        for mood in [Mood::Neutral, Mood::Calm, Mood::Happy, Mood::Stressed] {
            assert_eq!(Mood::RING.iter().filter(|m| **m == mood).count(), 1);
        }
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mood::Happy).unwrap(), "\"happy\"");
    }
}
