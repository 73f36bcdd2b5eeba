//! Stake sizing from EV bands.
//!
//! Rather than a Kelly fraction, the stake is a fixed slice of bankroll chosen
//! by how large the edge is:
//!
//!   EV < 3%           → no bet
//!   3% ≤ EV < 6%      → 1% of bankroll
//!   6% ≤ EV < 10%     → 2% of bankroll
//!   EV ≥ 10%          → 3% of bankroll

use super::model::round_to;

/// Minimum EV that earns any stake.
pub const MIN_EV: f64 = 0.03;

/// (lower EV bound, bankroll fraction), highest band first.
const RISK_BANDS: [(f64, f64); 3] = [(0.10, 0.03), (0.06, 0.02), (MIN_EV, 0.01)];

/// Bankroll fraction for an EV, or `0.0` when the edge is too thin.
pub fn risk_fraction(ev: f64) -> f64 {
    RISK_BANDS
        .iter()
        .find(|(min_ev, _)| ev >= *min_ev)
        .map(|(_, fraction)| *fraction)
        .unwrap_or(0.0)
}

/// Recommended stake, rounded to 2 decimals. An undefined EV stakes nothing.
pub fn recommend_stake(bankroll: f64, ev: Option<f64>) -> f64 {
    match ev {
        Some(ev) => round_to(bankroll * risk_fraction(ev), 2),
        None => 0.0,
    }
}

/// Whether an EV is worth acting on at all. Strictly above the threshold.
pub fn is_recommended(ev: Option<f64>) -> bool {
    ev.is_some_and(|ev| ev > MIN_EV)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_stake_one_percent_band() {
        assert_relative_eq!(recommend_stake(1000.0, Some(0.05)), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stake_below_threshold() {
        assert_relative_eq!(recommend_stake(1000.0, Some(0.02)), 0.0, epsilon = 1e-9);
        assert_relative_eq!(recommend_stake(1000.0, Some(-0.4)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stake_top_band() {
        assert_relative_eq!(recommend_stake(1000.0, Some(0.15)), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stake_undefined_ev() {
        assert_relative_eq!(recommend_stake(1000.0, None), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_band_edges() {
        assert_relative_eq!(risk_fraction(0.03), 0.01);
        assert_relative_eq!(risk_fraction(0.0599), 0.01);
        assert_relative_eq!(risk_fraction(0.06), 0.02);
        assert_relative_eq!(risk_fraction(0.0999), 0.02);
        assert_relative_eq!(risk_fraction(0.10), 0.03);
    }

    #[test]
    fn test_stake_rounds_to_cents() {
        // 1234.567 * 0.02 = 24.69134
        assert_relative_eq!(recommend_stake(1234.567, Some(0.07)), 24.69, epsilon = 1e-9);
    }

    #[test]
    fn test_recommendation_threshold_is_strict() {
        assert!(!is_recommended(Some(0.03)));
        assert!(is_recommended(Some(0.031)));
        assert!(!is_recommended(None));
    }
}
