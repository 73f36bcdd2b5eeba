//! Asian Handicap line selection.
//!
//! Lines are quoted from side A's perspective: negative lines give goals away
//! (A is favoured), positive lines receive them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::model::ModelError;

/// The supported handicap ladder, most favoured first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandicapLine {
    MinusOne,
    MinusThreeQuarters,
    MinusHalf,
    MinusQuarter,
    Level,
    PlusQuarter,
    PlusHalf,
}

/// (differential threshold, line) evaluated top-down, first match wins.
/// The final two rungs use strict comparison; see [`suggest_handicap`].
const LADDER: [(f64, HandicapLine); 4] = [
    (0.45, HandicapLine::MinusOne),
    (0.30, HandicapLine::MinusThreeQuarters),
    (0.20, HandicapLine::MinusHalf),
    (0.10, HandicapLine::MinusQuarter),
];

const STRICT_LADDER: [(f64, HandicapLine); 2] = [
    (-0.10, HandicapLine::Level),
    (-0.20, HandicapLine::PlusQuarter),
];

impl HandicapLine {
    pub const ALL: [HandicapLine; 7] = [
        HandicapLine::MinusOne,
        HandicapLine::MinusThreeQuarters,
        HandicapLine::MinusHalf,
        HandicapLine::MinusQuarter,
        HandicapLine::Level,
        HandicapLine::PlusQuarter,
        HandicapLine::PlusHalf,
    ];

    /// Signed goal margin applied to side A.
    pub fn goals(self) -> f64 {
        match self {
            HandicapLine::MinusOne => -1.0,
            HandicapLine::MinusThreeQuarters => -0.75,
            HandicapLine::MinusHalf => -0.5,
            HandicapLine::MinusQuarter => -0.25,
            HandicapLine::Level => 0.0,
            HandicapLine::PlusQuarter => 0.25,
            HandicapLine::PlusHalf => 0.5,
        }
    }

    /// Bookmaker-style label, e.g. `AH -0.75`.
    pub fn label(self) -> &'static str {
        match self {
            HandicapLine::MinusOne => "AH -1.0",
            HandicapLine::MinusThreeQuarters => "AH -0.75",
            HandicapLine::MinusHalf => "AH -0.5",
            HandicapLine::MinusQuarter => "AH -0.25",
            HandicapLine::Level => "AH 0",
            HandicapLine::PlusQuarter => "AH +0.25",
            HandicapLine::PlusHalf => "AH +0.5",
        }
    }

    /// Closest substitutes when this line is not offered, most similar first.
    pub fn alternatives(self) -> &'static [HandicapLine] {
        use HandicapLine::*;
        match self {
            MinusOne => &[MinusThreeQuarters, MinusHalf],
            MinusThreeQuarters => &[MinusHalf, MinusOne],
            MinusHalf => &[MinusQuarter, MinusThreeQuarters],
            MinusQuarter => &[Level, MinusHalf],
            Level => &[PlusQuarter, MinusQuarter],
            PlusQuarter => &[PlusHalf, Level],
            PlusHalf => &[PlusQuarter],
        }
    }
}

impl fmt::Display for HandicapLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HandicapLine {
    type Err = ModelError;

    /// Accepts `AH -0.5`, `-0.5`, `+0.25`, `0.25`, `AH 0`, `-1` and the like.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed
            .strip_prefix("AH")
            .or_else(|| trimmed.strip_prefix("ah"))
            .unwrap_or(trimmed)
            .trim();
        let unsupported = || ModelError::UnsupportedHandicapLine(s.to_string());
        let goals: f64 = number.parse().map_err(|_| unsupported())?;
        HandicapLine::ALL
            .into_iter()
            .find(|line| line.goals() == goals)
            .ok_or_else(unsupported)
    }
}

/// Map a strength differential (side A minus side B expected goals) to a line.
pub fn suggest_handicap(differential: f64) -> HandicapLine {
    LADDER
        .iter()
        .find(|(min, _)| differential >= *min)
        .map(|(_, line)| *line)
        .or_else(|| {
            STRICT_LADDER
                .iter()
                .find(|(floor, _)| differential > *floor)
                .map(|(_, line)| *line)
        })
        .unwrap_or(HandicapLine::PlusHalf)
}
