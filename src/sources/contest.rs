//! Contest-service props feed.
//!
//! Pulls the open player props for each enabled league and flattens the
//! nested prop/player/event JSON into `PropOffer` rows. Contest stat names
//! ("Passing Yards") are mapped onto odds-API market keys
//! ("player_pass_yds") via a fixed table; props with unmapped stats are
//! dropped with a warning.
//!
//! Auth: `Authorization: {token}` header on every request.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const BASE_URL: &str = "https://node.drafters.com";

/// Delay between per-league requests, to stay polite on an undocumented
/// endpoint.
const REQUEST_DELAY: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Stat-name mapping (contest display name → odds-API market key)
// ---------------------------------------------------------------------------

const STAT_MAPPING: &[(&str, &str)] = &[
    ("3 Pointer Made", "player_threes"),
    ("3 Pointers Made", "player_threes"),
    ("Assists", "player_assists"),
    ("Blocked Shots", "player_blocked_shots"),
    ("Blocks", "player_blocks"),
    ("Blocks+Steals", "player_blocks_steals"),
    ("Completions", "player_pass_completions"),
    ("Field Goals Made", "player_field_goals"),
    ("Goals Against", "player_goals_against"),
    ("Interceptions Thrown", "player_pass_interceptions"),
    ("Kicker Points", "player_kicking_points"),
    ("Longest Completion", "player_pass_longest_completion"),
    ("Longest Reception", "player_reception_longest"),
    ("Longest Rush", "player_rush_longest"),
    ("Passing Touchdowns", "player_pass_tds"),
    ("Passing Yards", "player_pass_yds"),
    ("Points", "player_points"),
    ("Points+Assists", "player_points_assists"),
    ("Points+Rebounds", "player_points_rebounds"),
    ("Pts+Rebs+Asts", "player_points_rebounds_assists"),
    ("Rebounds", "player_rebounds"),
    ("Rebounds+Assists", "player_rebounds_assists"),
    ("Receiving Yards", "player_reception_yds"),
    ("Receptions", "player_receptions"),
    ("Rush+Rec Yds", "player_rush_reception_yds"),
    ("Rushing Yards", "player_rush_yds"),
    ("Saves", "player_total_saves"),
    ("Shots", "player_shots_on_goal"),
    ("Steals", "player_steals"),
    ("Turnovers", "player_turnovers"),
];

/// Map a contest stat display name to its odds-API market key.
pub fn map_stat(stat_name: &str) -> Option<&'static str> {
    STAT_MAPPING
        .iter()
        .find(|(name, _)| *name == stat_name)
        .map(|(_, key)| *key)
}

// ---------------------------------------------------------------------------
// API response types (contest JSON → Rust)
// ---------------------------------------------------------------------------

/// Response from `/props-game/get-props-games/{league_id}`. We only
/// deserialize the fields we need.
#[derive(Debug, Deserialize)]
struct PropsGamesResponse {
    #[serde(default)]
    entities: Vec<PropsEntity>,
}

#[derive(Debug, Deserialize)]
struct PropsEntity {
    #[serde(default)]
    players: Vec<RawProp>,
}

#[derive(Debug, Deserialize)]
struct RawProp {
    prop_id: u64,
    /// League id on the contest service (2 = NFL, 4 = NBA, ...).
    game_id: u32,
    player_id: u64,
    player_name: String,
    bid_stats_name: String,
    bid_stats_value: f64,
}

// ---------------------------------------------------------------------------
// Flattened offer
// ---------------------------------------------------------------------------

/// One enterable proposition offer from the contest service.
#[derive(Debug, Clone, PartialEq)]
pub struct PropOffer {
    pub prop_id: String,
    pub league_id: u32,
    pub player_id: String,
    pub player_name: String,
    /// Already mapped onto the odds-API market key vocabulary.
    pub market_key: String,
    pub line: f64,
}

impl PropOffer {
    fn from_raw(raw: &RawProp) -> Option<Self> {
        let market_key = map_stat(&raw.bid_stats_name)?;
        Some(PropOffer {
            prop_id: raw.prop_id.to_string(),
            league_id: raw.game_id,
            player_id: raw.player_id.to_string(),
            player_name: raw.player_name.clone(),
            market_key: market_key.to_string(),
            line: raw.bid_stats_value,
        })
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Contest-service props client.
pub struct ContestClient {
    http: Client,
    auth_token: String,
}

impl ContestClient {
    pub fn new(auth_token: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3",
            )
            .build()
            .context("Failed to build HTTP client for contest service")?;
        Ok(Self { http, auth_token })
    }

    /// Fetch and flatten the open props for every given league.
    ///
    /// A failing league is logged and skipped; an empty overall result is
    /// left to the caller to treat as data-unavailable.
    pub async fn fetch_props(&self, league_ids: &[u32]) -> Result<Vec<PropOffer>> {
        let mut offers = Vec::new();
        let mut unmapped: Vec<String> = Vec::new();

        for (i, league_id) in league_ids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(REQUEST_DELAY).await;
            }

            match self.fetch_league(*league_id).await {
                Ok(resp) => {
                    let mut count = 0usize;
                    for entity in &resp.entities {
                        for raw in &entity.players {
                            match PropOffer::from_raw(raw) {
                                Some(offer) => {
                                    offers.push(offer);
                                    count += 1;
                                }
                                None => {
                                    if !unmapped.contains(&raw.bid_stats_name) {
                                        unmapped.push(raw.bid_stats_name.clone());
                                    }
                                }
                            }
                        }
                    }
                    info!(league_id, offers = count, "Contest league fetched");
                }
                Err(e) => {
                    warn!(league_id, error = %e, "Contest league fetch failed, skipping");
                }
            }
        }

        if !unmapped.is_empty() {
            warn!(stats = ?unmapped, "Dropped props with unmapped stat names");
        }

        debug!(total = offers.len(), "Contest props flattened");
        Ok(offers)
    }

    async fn fetch_league(&self, league_id: u32) -> Result<PropsGamesResponse> {
        let url = format!("{BASE_URL}/props-game/get-props-games/{league_id}?stats=");

        let resp = self
            .http
            .get(&url)
            .header("Authorization", &self.auth_token)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Contest props request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Contest props API error {status} for league {league_id}");
        }

        resp.json::<PropsGamesResponse>()
            .await
            .context("Failed to parse contest props response")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
