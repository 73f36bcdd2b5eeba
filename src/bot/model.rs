//! Pre-match goal model.
//!
//! Each side is reduced to four normalised strength signals which are turned
//! into an expected-goals rate. The two rates then drive independent Poisson
//! scoreline distributions, truncated to 0..=5 goals per side, from which the
//! win / draw / loss split is read off (side A perspective).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// League-average goals per side before any adjustment.
const BASE_GOALS: f64 = 1.5;
/// Expected goals never drop below this, keeping the Poisson model well-defined.
const MIN_EXPECTED_GOALS: f64 = 0.5;
/// Highest goal count per side considered by the scoreline grid.
const MAX_GOALS: u32 = 5;

const FORM_WEIGHT: f64 = 0.5;
const GOAL_DIFF_WEIGHT: f64 = 0.3;
const HOME_WEIGHT: f64 = 0.4;
const DEFENSE_PENALTY: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("win probability must be positive to derive fair odds, got {0}")]
    InvalidProbability(f64),

    #[error("unsupported handicap line: {0}")]
    UnsupportedHandicapLine(String),
}

/// Normalised strength inputs for one team, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamSignals {
    pub form: f64,
    pub goal_diff: f64,
    pub home_adv: f64,
    pub defense: f64,
}

impl TeamSignals {
    pub fn new(form: f64, goal_diff: f64, home_adv: f64, defense: f64) -> Self {
        TeamSignals {
            form,
            goal_diff,
            home_adv,
            defense,
        }
    }

    /// Neutral signals used when nothing is known about a team.
    #[cfg(test)]
    pub fn neutral() -> Self {
        TeamSignals::new(0.5, 0.5, 0.5, 0.5)
    }

    pub fn is_normalised(&self) -> bool {
        [self.form, self.goal_diff, self.home_adv, self.defense]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    pub fn expected_goals(&self) -> f64 {
        expected_goals(self.form, self.goal_diff, self.home_adv, self.defense)
    }
}

/// Win / draw / loss probabilities from side A's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OutcomeProbabilities {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
}

impl OutcomeProbabilities {
    pub fn total(&self) -> f64 {
        self.win + self.draw + self.loss
    }
}

/// Expected goals for a team: base rate plus a linear adjustment, floored at 0.5.
pub fn expected_goals(form: f64, goal_diff: f64, home_adv: f64, defense: f64) -> f64 {
    let adjustment = FORM_WEIGHT * form + GOAL_DIFF_WEIGHT * goal_diff + HOME_WEIGHT * home_adv
        - DEFENSE_PENALTY * (1.0 - defense);
    (BASE_GOALS + adjustment).max(MIN_EXPECTED_GOALS)
}

/// Outcome probabilities from two expected-goals rates.
///
/// The 6×6 scoreline grid loses the tail mass beyond five goals, so the three
/// sums are renormalised. A non-positive rate contributes zero mass at every
/// goal count; if that empties the grid the probabilities stay at zero.
pub fn match_probabilities(eg_a: f64, eg_b: f64) -> OutcomeProbabilities {
    let pmf_a = poisson_pmf(eg_a, MAX_GOALS);
    let pmf_b = poisson_pmf(eg_b, MAX_GOALS);

    let mut probs = OutcomeProbabilities::default();
    for (ga, pa) in pmf_a.iter().enumerate() {
        for (gb, pb) in pmf_b.iter().enumerate() {
            let p = pa * pb;
            match ga.cmp(&gb) {
                std::cmp::Ordering::Greater => probs.win += p,
                std::cmp::Ordering::Equal => probs.draw += p,
                std::cmp::Ordering::Less => probs.loss += p,
            }
        }
    }

    let total = probs.total();
    if total > 0.0 {
        probs.win /= total;
        probs.draw /= total;
        probs.loss /= total;
    }
    probs
}

/// Positive values favour side A.
pub fn strength_differential(eg_a: f64, eg_b: f64) -> f64 {
    eg_a - eg_b
}

/// Break-even decimal odds for a probability, rounded to 2 decimals.
pub fn fair_odds(p: f64) -> Result<f64, ModelError> {
    if p > 0.0 {
        Ok(round_to(1.0 / p, 2))
    } else {
        Err(ModelError::InvalidProbability(p))
    }
}

/// Truncated Poisson pmf over 0..=max_k, built by the k-recurrence.
/// The truncated tail is not folded back in; callers renormalise.
fn poisson_pmf(lambda: f64, max_k: u32) -> Vec<f64> {
    let len = max_k as usize + 1;
    if lambda <= 0.0 {
        return vec![0.0; len];
    }
    let mut out = Vec::with_capacity(len);
    out.push((-lambda).exp());
    for k in 1..len {
        let prev = out[k - 1];
        out.push(prev * lambda / k as f64);
    }
    out
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
