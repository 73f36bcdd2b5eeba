use async_trait::async_trait;

use crate::bot::model::TeamSignals;

/// Source of normalised pre-match strength signals for a team.
///
/// Any failure (network, unknown team, too little match history) is reported
/// the same way: `None`.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn fetch_team_signals(
        &self,
        team: &str,
        is_home: bool,
        league: &str,
    ) -> Option<TeamSignals>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}
