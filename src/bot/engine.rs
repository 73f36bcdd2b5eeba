use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::models::{Bet, BetTicket};
use crate::ledger::{Ledger, LedgerError, LedgerStore, LedgerSummary};

use super::ev::expected_value;
use super::handicap::{suggest_handicap, HandicapLine};
use super::model::{
    fair_odds, match_probabilities, round_to, strength_differential, OutcomeProbabilities,
    TeamSignals,
};
use super::stake::{is_recommended, recommend_stake};

const PROBABILITY_DECIMALS: i32 = 3;

/// Outcome of analysing one fixture. Held in memory until a bet is placed.
///
/// Probabilities are kept at 3 decimals: EV is priced from exactly the figures
/// that end up on the saved bet. Fair odds come from the unrounded win
/// probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub handicap: HandicapLine,
    pub probabilities: OutcomeProbabilities,
    /// `None` when the win probability is zero
    pub fair_odds: Option<f64>,
    pub expected_goals_a: f64,
    pub expected_goals_b: f64,
}

impl AnalysisResult {
    pub fn differential(&self) -> f64 {
        strength_differential(self.expected_goals_a, self.expected_goals_b)
    }
}

/// EV and stake for an analysed line at the bookmaker's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetDecision {
    pub handicap: HandicapLine,
    pub odds: f64,
    pub ev: f64,
    pub stake: f64,
    pub recommended: bool,
}

impl BetDecision {
    /// Ticket ready for the ledger.
    pub fn ticket(&self, analysis: &AnalysisResult) -> BetTicket {
        let p = &analysis.probabilities;
        BetTicket {
            handicap: self.handicap.label().to_string(),
            odds: self.odds,
            stake: self.stake,
            ev: Some(self.ev),
            win_p: p.win,
            draw_p: p.draw,
            loss_p: p.loss,
            fair_odds: analysis.fair_odds,
        }
    }
}

/// Pure analysis step: signals for both sides to a suggested line and prices.
pub fn analyze(signals_a: &TeamSignals, signals_b: &TeamSignals) -> AnalysisResult {
    let eg_a = signals_a.expected_goals();
    let eg_b = signals_b.expected_goals();
    let differential = strength_differential(eg_a, eg_b);
    let handicap = suggest_handicap(differential);
    let raw = match_probabilities(eg_a, eg_b);
    let probabilities = OutcomeProbabilities {
        win: round_to(raw.win, PROBABILITY_DECIMALS),
        draw: round_to(raw.draw, PROBABILITY_DECIMALS),
        loss: round_to(raw.loss, PROBABILITY_DECIMALS),
    };

    debug!(
        "xG {:.2} vs {:.2}, differential {:.3} → {}",
        eg_a, eg_b, differential, handicap
    );

    AnalysisResult {
        handicap,
        probabilities,
        fair_odds: fair_odds(raw.win).ok(),
        expected_goals_a: eg_a,
        expected_goals_b: eg_b,
    }
}

/// Front door for the shell: pure analysis plus the persisted ledger.
pub struct AdvisorEngine<S> {
    ledger: Ledger<S>,
}

impl<S: LedgerStore> AdvisorEngine<S> {
    pub fn new(ledger: Ledger<S>) -> Self {
        AdvisorEngine { ledger }
    }

    pub fn analyze(&self, signals_a: &TeamSignals, signals_b: &TeamSignals) -> AnalysisResult {
        analyze(signals_a, signals_b)
    }

    pub fn compute_ev(&self, line: HandicapLine, probs: &OutcomeProbabilities, odds: f64) -> f64 {
        expected_value(line, probs, odds)
    }

    pub fn recommend_stake(&self, bankroll: f64, ev: Option<f64>) -> f64 {
        recommend_stake(bankroll, ev)
    }

    /// EV + stake for `line` at `odds`, sized against the current bankroll.
    pub fn decide(
        &self,
        analysis: &AnalysisResult,
        line: HandicapLine,
        odds: f64,
    ) -> Result<BetDecision, LedgerError> {
        let ev = self.compute_ev(line, &analysis.probabilities, odds);
        let bankroll = self.current_bankroll()?;
        let stake = self.recommend_stake(bankroll, Some(ev));
        let recommended = is_recommended(Some(ev));
        info!(
            "{} @ {:.2}: ev {:.3}, stake {:.2} ({})",
            line,
            odds,
            ev,
            stake,
            if recommended { "bet" } else { "skip" }
        );
        Ok(BetDecision {
            handicap: line,
            odds,
            ev,
            stake,
            recommended,
        })
    }

    pub fn place_bet(&self, ticket: BetTicket) -> Result<Bet, LedgerError> {
        self.ledger.save_bet(ticket)
    }

    pub fn settle(&self, result_label: &str) -> Result<f64, LedgerError> {
        self.ledger.settle_last_bet(result_label)
    }

    pub fn current_bankroll(&self) -> Result<f64, LedgerError> {
        self.ledger.bankroll()
    }

    pub fn deposit(&self, amount: f64) -> Result<f64, LedgerError> {
        self.ledger.deposit(amount)
    }

    pub fn history(&self) -> Result<Vec<Bet>, LedgerError> {
        self.ledger.bets()
    }

    pub fn summary(&self) -> Result<LedgerSummary, LedgerError> {
        self.ledger.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryStore;
    use approx::assert_relative_eq;

    fn engine() -> AdvisorEngine<MemoryStore> {
        AdvisorEngine::new(Ledger::new(MemoryStore::seeded(1000.0)))
    }

    #[test]
    fn evenly_matched_sides_get_level_line() {
        let a = TeamSignals::neutral();
        let result = analyze(&a, &a);
        assert_eq!(result.handicap, HandicapLine::Level);
        assert_relative_eq!(result.probabilities.win, result.probabilities.loss, epsilon = 1e-12);
        assert_relative_eq!(result.expected_goals_a, 1.95, epsilon = 1e-12);
        assert!(result.fair_odds.is_some());
    }

    #[test]
    fn home_favourite_gives_goals() {
        let home = TeamSignals::new(0.8, 0.7, 1.0, 0.8);
        let away = TeamSignals::new(0.2, 0.4, 0.0, 0.3);
        let result = analyze(&home, &away);
        // 2.45 - 1.51
        assert_relative_eq!(result.differential(), 0.94, epsilon = 1e-9);
        assert_eq!(result.handicap, HandicapLine::MinusOne);
        assert!(result.probabilities.win > result.probabilities.loss);
    }

    #[test]
    fn fair_odds_are_inverse_win_probability() {
        let result = analyze(&TeamSignals::neutral(), &TeamSignals::new(0.4, 0.5, 0.0, 0.5));
        let raw = match_probabilities(result.expected_goals_a, result.expected_goals_b);
        assert_eq!(result.fair_odds, Some(round_to(1.0 / raw.win, 2)));
    }

    #[test]
    fn probabilities_are_kept_at_three_decimals() {
        let result = analyze(&TeamSignals::new(0.0, 0.5, 0.0, 0.4), &TeamSignals::neutral());
        let p = result.probabilities;
        for v in [p.win, p.draw, p.loss] {
            assert_eq!(v, round_to(v, 3));
        }
        assert_relative_eq!(p.total(), 1.0, epsilon = 2e-3);
    }

    #[test]
    fn saved_ev_reproduces_from_saved_probabilities() {
        let engine = engine();
        let steps = [0.0, 0.3, 0.5, 0.7, 1.0];
        for form in steps {
            for defense in steps {
                let a = TeamSignals::new(form, 0.5, 0.0, defense);
                let analysis = analyze(&a, &TeamSignals::neutral());
                for odds in [1.85, 2.01, 2.05, 2.4] {
                    let decision = engine.decide(&analysis, analysis.handicap, odds).unwrap();
                    let ticket = decision.ticket(&analysis);
                    let saved = OutcomeProbabilities {
                        win: ticket.win_p,
                        draw: ticket.draw_p,
                        loss: ticket.loss_p,
                    };
                    let ev = expected_value(analysis.handicap, &saved, odds);
                    assert_eq!(decision.ev, ev);
                    assert_eq!(ticket.ev, Some(ev));
                    assert_eq!(decision.stake, recommend_stake(1000.0, Some(ev)));
                }
            }
        }
    }

    #[test]
    fn decision_sizes_stake_from_bankroll() {
        let engine = engine();
        let analysis = AnalysisResult {
            handicap: HandicapLine::Level,
            probabilities: OutcomeProbabilities {
                win: 0.5,
                draw: 0.2,
                loss: 0.3,
            },
            fair_odds: Some(2.0),
            expected_goals_a: 1.9,
            expected_goals_b: 1.6,
        };
        let decision = engine.decide(&analysis, HandicapLine::Level, 2.0).unwrap();
        assert_relative_eq!(decision.ev, 0.2, epsilon = 1e-12);
        assert_relative_eq!(decision.stake, 30.0, epsilon = 1e-9);
        assert!(decision.recommended);

        let ticket = decision.ticket(&analysis);
        assert_eq!(ticket.handicap, "AH 0");
        assert_eq!(ticket.ev, Some(0.2));
    }

    #[test]
    fn thin_edge_is_skipped() {
        let engine = engine();
        let analysis = analyze(&TeamSignals::neutral(), &TeamSignals::neutral());
        let decision = engine.decide(&analysis, analysis.handicap, 1.5).unwrap();
        assert!(decision.ev < 0.0);
        assert_eq!(decision.stake, 0.0);
        assert!(!decision.recommended);
    }

    #[test]
    fn full_pipeline_place_and_settle() {
        let engine = engine();
        let analysis = analyze(
            &TeamSignals::new(0.8, 0.7, 1.0, 0.8),
            &TeamSignals::new(0.2, 0.4, 0.0, 0.3),
        );
        let decision = engine.decide(&analysis, analysis.handicap, 2.1).unwrap();
        assert!(decision.recommended);
        engine.place_bet(decision.ticket(&analysis)).unwrap();
        assert!(matches!(
            engine.place_bet(decision.ticket(&analysis)),
            Err(LedgerError::OpenBetExists)
        ));

        let bankroll = engine.settle("WIN").unwrap();
        assert_relative_eq!(
            bankroll,
            round_to(1000.0 + decision.stake * 1.1, 2),
            epsilon = 1e-9
        );
        assert_eq!(engine.history().unwrap().len(), 1);
        assert_relative_eq!(engine.deposit(100.0).unwrap(), bankroll + 100.0, epsilon = 1e-9);
    }
}
