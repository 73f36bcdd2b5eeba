use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::provider::StatsProvider;
use crate::bot::model::{round_to, TeamSignals};

/// Supported leagues and their football-data.org competition IDs.
pub const COMPETITIONS: [(&str, u32); 5] = [
    ("Premier League", 2021),
    ("La Liga", 2014),
    ("Serie A", 2019),
    ("Bundesliga", 2002),
    ("Ligue 1", 2015),
];

/// Number of most recent finished matches requested per team.
const RECENT_MATCHES: usize = 5;
/// Fewer finished matches than this and the team is treated as unknown.
const MIN_MATCHES: usize = 3;

/// Stats provider backed by the football-data.org v4 REST API.
/// Docs: <https://www.football-data.org/documentation/api>
pub struct FootballData {
    http: Client,
    api_key: Option<String>,
    /// Base URL for overriding in tests
    base_url: String,
}

impl FootballData {
    pub fn new(api_key: Option<&str>, base_url: Option<&str>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FootballData {
            http,
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
            base_url: base_url
                .unwrap_or("https://api.football-data.org/v4")
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Competition ID for a league name; unknown names fall back to the Premier League.
    pub fn competition_id(league: &str) -> u32 {
        COMPETITIONS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(league.trim()))
            .map(|(_, id)| *id)
            .unwrap_or(COMPETITIONS[0].1)
    }

    async fn get_json(&self, url: &str, api_key: &str) -> Result<serde_json::Value> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header("X-Auth-Token", api_key)
            .send()
            .await
            .context("football-data request failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("football-data error: {}", resp.status());
        }

        resp.json()
            .await
            .context("Failed to parse football-data response")
    }

    async fn fetch(&self, team: &str, is_home: bool, league: &str) -> Result<Option<TeamSignals>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No football-data API key configured");
            return Ok(None);
        };

        let comp_id = Self::competition_id(league);
        let url = format!("{}/competitions/{}/teams", self.base_url, comp_id);
        let teams = self.get_json(&url, api_key).await?;
        let Some(team_id) = find_team_id(&teams, team) else {
            debug!("Team '{}' not found in competition {}", team, comp_id);
            return Ok(None);
        };

        let url = format!(
            "{}/teams/{}/matches?status=FINISHED&limit={}",
            self.base_url, team_id, RECENT_MATCHES
        );
        let matches = self.get_json(&url, api_key).await?;
        Ok(signals_from_matches(&matches, team_id, is_home))
    }
}

#[async_trait]
impl StatsProvider for FootballData {
    fn name(&self) -> &str {
        "football-data.org"
    }

    async fn fetch_team_signals(
        &self,
        team: &str,
        is_home: bool,
        league: &str,
    ) -> Option<TeamSignals> {
        match self.fetch(team, is_home, league).await {
            Ok(Some(signals)) => {
                info!("Fetched stats for {} ({}): {:?}", team, league, signals);
                Some(signals)
            }
            Ok(None) => {
                warn!("No usable stats for {} ({})", team, league);
                None
            }
            Err(e) => {
                warn!("Stats fetch for {} failed: {:#}", team, e);
                None
            }
        }
    }
}

/// Case-insensitive substring match in either direction, first hit wins.
fn find_team_id(raw: &serde_json::Value, team: &str) -> Option<i64> {
    let wanted = team.trim().to_lowercase();
    if wanted.is_empty() {
        return None;
    }
    raw["teams"].as_array()?.iter().find_map(|t| {
        let name = t["name"].as_str()?.to_lowercase();
        if name.contains(&wanted) || wanted.contains(&name) {
            t["id"].as_i64()
        } else {
            None
        }
    })
}

/// Normalise a team's recent results into the four model signals.
///
/// - form: share of matches won
/// - goal_diff: average goal difference mapped from [-3, +3] onto [0, 1]
/// - home_adv: home win rate (0.5 without home games), 0.0 for the away side
/// - defense: 1 at zero conceded per match, 0 at two or more
fn signals_from_matches(
    raw: &serde_json::Value,
    team_id: i64,
    is_home: bool,
) -> Option<TeamSignals> {
    let results: Vec<(bool, i64, i64)> = raw["matches"]
        .as_array()?
        .iter()
        .filter_map(|m| {
            let at_home = m["homeTeam"]["id"].as_i64()? == team_id;
            let home = m["score"]["fullTime"]["home"].as_i64()?;
            let away = m["score"]["fullTime"]["away"].as_i64()?;
            Some(if at_home {
                (true, home, away)
            } else {
                (false, away, home)
            })
        })
        .take(RECENT_MATCHES)
        .collect();

    if results.len() < MIN_MATCHES {
        return None;
    }

    let n = results.len() as f64;
    let wins = results.iter().filter(|(_, scored, conceded)| scored > conceded).count();
    let scored: i64 = results.iter().map(|(_, s, _)| s).sum();
    let conceded: i64 = results.iter().map(|(_, _, c)| c).sum();
    let home_games = results.iter().filter(|(at_home, _, _)| *at_home).count();
    let home_wins = results
        .iter()
        .filter(|(at_home, s, c)| *at_home && s > c)
        .count();

    let form = wins as f64 / n;
    let avg_goal_diff = (scored - conceded) as f64 / n;
    let goal_diff = ((avg_goal_diff + 3.0) / 6.0).clamp(0.0, 1.0);
    let home_adv = if !is_home {
        0.0
    } else if home_games > 0 {
        home_wins as f64 / home_games as f64
    } else {
        0.5
    };
    let defense = (1.0 - (conceded as f64 / n) / 2.0).clamp(0.0, 1.0);

    Some(TeamSignals::new(
        round_to(form, 2),
        round_to(goal_diff, 2),
        round_to(home_adv, 2),
        round_to(defense, 2),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn fixture(team_id: i64, results: &[(bool, i64, i64)]) -> serde_json::Value {
        let matches: Vec<_> = results
            .iter()
            .map(|(at_home, scored, conceded)| {
                let (home_id, away_id, home, away) = if *at_home {
                    (team_id, 99, scored, conceded)
                } else {
                    (99, team_id, conceded, scored)
                };
                json!({
                    "homeTeam": { "id": home_id },
                    "awayTeam": { "id": away_id },
                    "score": { "fullTime": { "home": home, "away": away } }
                })
            })
            .collect();
        json!({ "matches": matches })
    }

    #[test]
    fn test_competition_lookup() {
        assert_eq!(FootballData::competition_id("La Liga"), 2014);
        assert_eq!(FootballData::competition_id("bundesliga"), 2002);
        assert_eq!(FootballData::competition_id("Eredivisie"), 2021);
    }

    #[test]
    fn test_find_team_matches_either_direction() {
        let raw = json!({ "teams": [
            { "id": 57, "name": "Arsenal FC" },
            { "id": 61, "name": "Chelsea FC" }
        ]});
        assert_eq!(find_team_id(&raw, "chelsea"), Some(61));
        assert_eq!(find_team_id(&raw, "Arsenal FC London"), Some(57));
        assert_eq!(find_team_id(&raw, "Everton"), None);
        assert_eq!(find_team_id(&raw, "  "), None);
    }

    #[test]
    fn test_signals_from_recent_matches() {
        // W 2-0 (H), D 1-1 (A), L 0-1 (H), W 3-1 (A), W 2-1 (H)
        let raw = fixture(
            7,
            &[
                (true, 2, 0),
                (false, 1, 1),
                (true, 0, 1),
                (false, 3, 1),
                (true, 2, 1),
            ],
        );
        let s = signals_from_matches(&raw, 7, true).unwrap();
        assert_relative_eq!(s.form, 0.6);
        // scored 8, conceded 4 → avg +0.8 → 3.8 / 6
        assert_relative_eq!(s.goal_diff, 0.63);
        assert_relative_eq!(s.home_adv, 0.67);
        // 0.8 conceded per match → 1 - 0.4
        assert_relative_eq!(s.defense, 0.6);
        assert!(s.is_normalised());
    }

    #[test]
    fn test_away_side_has_no_home_advantage() {
        let raw = fixture(7, &[(true, 2, 0), (true, 1, 0), (false, 0, 0)]);
        let s = signals_from_matches(&raw, 7, false).unwrap();
        assert_eq!(s.home_adv, 0.0);
    }

    #[test]
    fn test_no_home_games_defaults_to_half() {
        let raw = fixture(7, &[(false, 2, 0), (false, 1, 0), (false, 0, 0)]);
        let s = signals_from_matches(&raw, 7, true).unwrap();
        assert_eq!(s.home_adv, 0.5);
    }

    #[test]
    fn test_insufficient_history() {
        let raw = fixture(7, &[(true, 2, 0), (false, 1, 1)]);
        assert!(signals_from_matches(&raw, 7, true).is_none());
        assert!(signals_from_matches(&json!({}), 7, true).is_none());
    }

    #[test]
    fn test_heavy_defeats_clamp_to_zero() {
        let raw = fixture(7, &[(true, 0, 5), (false, 0, 4), (true, 0, 6)]);
        let s = signals_from_matches(&raw, 7, true).unwrap();
        assert_eq!(s.goal_diff, 0.0);
        assert_eq!(s.defense, 0.0);
        assert_eq!(s.form, 0.0);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let provider = FootballData::new(None, Some("http://127.0.0.1:9")).unwrap();
        assert!(provider
            .fetch_team_signals("Arsenal", true, "Premier League")
            .await
            .is_none());
    }
}
