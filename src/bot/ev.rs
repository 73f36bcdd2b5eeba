//! Expected value of an Asian Handicap bet against a quoted decimal price.
//!
//! This is a linear approximation, not bookmaker settlement math: pushes and
//! half-win / half-loss outcomes are folded into the three match outcomes.
//!
//!   level and giving lines (0 … -1.0):  EV = p_win·(o − 1) − p_loss
//!   +0.5:                               EV = (p_win + p_draw)·(o − 1) − p_loss
//!   +0.25:                              mean of the level and +0.5 figures
//!
//! Treat the result as a consistent ranking signal, not an exact payout.

use super::handicap::HandicapLine;
use super::model::{round_to, ModelError, OutcomeProbabilities};

/// EV decimals reported to callers.
const EV_DECIMALS: i32 = 3;

pub fn expected_value(line: HandicapLine, probs: &OutcomeProbabilities, odds: f64) -> f64 {
    let net = odds - 1.0;
    let level = probs.win * net - probs.loss;
    let receiving_half = (probs.win + probs.draw) * net - probs.loss;

    let ev = match line {
        HandicapLine::Level
        | HandicapLine::MinusQuarter
        | HandicapLine::MinusHalf
        | HandicapLine::MinusThreeQuarters
        | HandicapLine::MinusOne => level,
        HandicapLine::PlusHalf => receiving_half,
        HandicapLine::PlusQuarter => (level + receiving_half) / 2.0,
    };
    round_to(ev, EV_DECIMALS)
}

/// EV for a line given by its label. Labels outside the ladder are rejected.
pub fn expected_value_for_label(
    label: &str,
    probs: &OutcomeProbabilities,
    odds: f64,
) -> Result<f64, ModelError> {
    let line: HandicapLine = label.parse()?;
    Ok(expected_value(line, probs, odds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn probs(win: f64, draw: f64, loss: f64) -> OutcomeProbabilities {
        OutcomeProbabilities { win, draw, loss }
    }

    #[test]
    fn level_line_ignores_draw() {
        let ev = expected_value(HandicapLine::Level, &probs(0.5, 0.2, 0.3), 2.0);
        assert_relative_eq!(ev, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn giving_lines_share_level_formula() {
        let p = probs(0.55, 0.25, 0.20);
        let level = expected_value(HandicapLine::Level, &p, 1.9);
        for line in [
            HandicapLine::MinusQuarter,
            HandicapLine::MinusHalf,
            HandicapLine::MinusThreeQuarters,
            HandicapLine::MinusOne,
        ] {
            assert_relative_eq!(expected_value(line, &p, 1.9), level, epsilon = 1e-12);
        }
    }

    #[test]
    fn plus_half_counts_draw_as_win() {
        // (0.4 + 0.3) * 0.9 - 0.3 = 0.33
        let ev = expected_value(HandicapLine::PlusHalf, &probs(0.4, 0.3, 0.3), 1.9);
        assert_relative_eq!(ev, 0.33, epsilon = 1e-12);
    }

    #[test]
    fn plus_quarter_is_midpoint() {
        let p = probs(0.4, 0.3, 0.3);
        let level = 0.4 * 0.9 - 0.3;
        let half = 0.7 * 0.9 - 0.3;
        let ev = expected_value(HandicapLine::PlusQuarter, &p, 1.9);
        assert_relative_eq!(ev, round_to((level + half) / 2.0, 3), epsilon = 1e-12);
    }

    #[test]
    fn result_rounded_to_three_decimals() {
        let ev = expected_value(HandicapLine::Level, &probs(0.4567, 0.2, 0.3433), 2.05);
        // 0.4567 * 1.05 - 0.3433 = 0.136235
        assert_relative_eq!(ev, 0.136, epsilon = 1e-12);
    }

    #[test]
    fn label_lookup_rejects_unknown_lines() {
        let p = probs(0.5, 0.2, 0.3);
        assert_relative_eq!(expected_value_for_label("AH 0", &p, 2.0).unwrap(), 0.2);
        assert!(matches!(
            expected_value_for_label("AH +0.75", &p, 2.0),
            Err(ModelError::UnsupportedHandicapLine(_))
        ));
    }
}
