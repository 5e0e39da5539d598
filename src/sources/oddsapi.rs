//! Sportsbook-aggregation API client.
//!
//! Lists upcoming events per sport, then pulls per-event player-prop odds
//! for the configured market keys from two reference books and flattens
//! them into per-player over/under quote rows.
//!
//! Base URL: `https://api.the-odds-api.com/v4/sports/`
//! Auth: `apiKey` query parameter. Odds are requested in decimal format.
//!
//! Pinnacle prices the pro leagues; BetOnline covers the college leagues
//! Pinnacle skips thinly or not at all.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::types::ProplineError;

const BASE_URL: &str = "https://api.the-odds-api.com/v4/sports";

// ---------------------------------------------------------------------------
// Reference books
// ---------------------------------------------------------------------------

/// The two sportsbooks used as fair-value references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Book {
    Pinnacle,
    BetOnline,
}

impl Book {
    /// The odds-API bookmaker key.
    pub fn key(&self) -> &'static str {
        match self {
            Book::Pinnacle => "pinnacle",
            Book::BetOnline => "betonlineag",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "pinnacle" => Some(Book::Pinnacle),
            "betonlineag" => Some(Book::BetOnline),
            _ => None,
        }
    }

    /// Which book prices a given contest league. College leagues
    /// (NCAAM = 7, NCAAF = 10) use BetOnline; everything else Pinnacle.
    pub fn for_league(league_id: u32) -> Self {
        match league_id {
            7 | 10 => Book::BetOnline,
            _ => Book::Pinnacle,
        }
    }
}

// ---------------------------------------------------------------------------
// Sport configuration (contest league id ↔ odds-API sport + markets)
// ---------------------------------------------------------------------------

struct SportConfig {
    league_id: u32,
    sport_key: &'static str,
    market_keys: &'static [&'static str],
}

const NBA_MARKET_KEYS: &[&str] = &[
    "player_points",
    "player_rebounds",
    "player_assists",
    "player_threes",
    "player_points_rebounds_assists",
    "player_points_alternate",
    "player_rebounds_alternate",
    "player_assists_alternate",
    "player_threes_alternate",
    "player_points_rebounds_assists_alternate",
];

const NCAAM_MARKET_KEYS: &[&str] = &[
    "player_points",
    "player_rebounds",
    "player_assists",
    "player_threes",
];

const NHL_MARKET_KEYS: &[&str] = &[
    "player_points",
    "player_assists",
    "player_blocked_shots",
    "player_shots_on_goal",
    "player_goals",
    "player_total_saves",
    "player_points_alternate",
    "player_assists_alternate",
    "player_goals_alternate",
    "player_shots_on_goal_alternate",
    "player_blocked_shots_alternate",
    "player_total_saves_alternate",
];

/// NFL and NCAAF share one market list.
const FOOTBALL_MARKET_KEYS: &[&str] = &[
    "player_field_goals",
    "player_kicking_points",
    "player_pass_attempts",
    "player_pass_completions",
    "player_pass_interceptions",
    "player_pass_rush_reception_yds",
    "player_pass_tds",
    "player_pass_yds",
    "player_receptions",
    "player_reception_tds",
    "player_reception_yds",
    "player_rush_attempts",
    "player_rush_reception_tds",
    "player_rush_reception_yds",
    "player_rush_tds",
    "player_rush_yds",
    "player_field_goals_alternate",
    "player_kicking_points_alternate",
    "player_pass_attempts_alternate",
    "player_pass_completions_alternate",
    "player_pass_interceptions_alternate",
    "player_pass_rush_reception_yds_alternate",
    "player_pass_tds_alternate",
    "player_pass_yds_alternate",
    "player_receptions_alternate",
    "player_reception_tds_alternate",
    "player_reception_yds_alternate",
    "player_rush_attempts_alternate",
    "player_rush_reception_tds_alternate",
    "player_rush_reception_yds_alternate",
    "player_rush_tds_alternate",
    "player_rush_yds_alternate",
];

const SPORTS: &[SportConfig] = &[
    SportConfig { league_id: 1, sport_key: "icehockey_nhl", market_keys: NHL_MARKET_KEYS },
    SportConfig { league_id: 2, sport_key: "americanfootball_nfl", market_keys: FOOTBALL_MARKET_KEYS },
    SportConfig { league_id: 4, sport_key: "basketball_nba", market_keys: NBA_MARKET_KEYS },
    SportConfig { league_id: 7, sport_key: "basketball_ncaab", market_keys: NCAAM_MARKET_KEYS },
    SportConfig { league_id: 10, sport_key: "americanfootball_ncaaf", market_keys: FOOTBALL_MARKET_KEYS },
];

// ---------------------------------------------------------------------------
// Player-name reconciliation (odds-API spelling → contest spelling)
// ---------------------------------------------------------------------------

const NAME_REPLACEMENTS: &[(&str, &str)] = &[
    ("AJ Brown", "A.J. Brown"),
    ("Alexis Lafrenière", "Alexis Lafreniere"),
    ("Alperen Sengun", "Alperen Şengün"),
    ("Bogdan Bogdanovic", "Bogdan Bogdanović"),
    ("C.J. McCollum", "CJ McCollum"),
    ("Christopher Tanev", "Chris Tanev"),
    ("Dennis Schroder", "Dennis Schröder"),
    ("Gary Trent Jr", "Gary Trent"),
    ("Isaiah Stewart II", "Isaiah Stewart"),
    ("Jaime Jaquez Jr", "Jaime Jaquez"),
    ("Jaren Jackson Jr", "Jaren Jackson"),
    ("Jonas Valanciunas", "Jonas Valančiūnas"),
    ("Kelly Oubre Jr", "Kelly Oubre"),
    ("Kristaps Porzingis", "Kristaps Porziņģis"),
    ("Michael Porter Jr", "Michael Porter"),
    ("Nick Smith Jr", "Nick Smith"),
    ("Nicolas Claxton", "Nic Claxton"),
    ("Nikola Jokic", "Nikola Jokić"),
    ("Nikola Jovic", "Nikola Jović"),
    ("Nikola Vucevic", "Nikola Vučević"),
    ("Tim Hardaway Jr", "Tim Hardaway"),
    ("Trey Murphy III", "Trey Murphy"),
    ("Vit Krejci", "Vít Krejčí"),
    ("Wendell Carter Jr", "Wendell Carter"),
];

/// Reconcile an odds-API player name with the contest feed's spelling.
fn reconcile_name(name: &str) -> String {
    NAME_REPLACEMENTS
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Strip the `_alternate` suffix so alternate-line markets join against
/// the same contest stat as their standard counterpart.
fn normalize_market_key(key: &str) -> &str {
    key.strip_suffix("_alternate").unwrap_or(key)
}

/// Whether an event falls inside the pricing window: already listed as
/// upcoming (not live) and starting within `lookahead` of `now`.
fn within_window(commence: DateTime<Utc>, now: DateTime<Utc>, lookahead: Duration) -> bool {
    commence > now && commence <= now + lookahead
}

// ---------------------------------------------------------------------------
// API response types (odds-API JSON → Rust)
// ---------------------------------------------------------------------------

/// One event from the per-sport listing. We only deserialize the fields
/// we need.
#[derive(Debug, Deserialize)]
struct EventRow {
    id: String,
    commence_time: DateTime<Utc>,
}

/// Per-event odds for one market query.
#[derive(Debug, Deserialize)]
struct EventOdds {
    id: String,
    commence_time: DateTime<Utc>,
    #[serde(default)]
    bookmakers: Vec<BookmakerBlock>,
}

#[derive(Debug, Deserialize)]
struct BookmakerBlock {
    key: String,
    #[serde(default)]
    markets: Vec<MarketBlock>,
}

#[derive(Debug, Deserialize)]
struct MarketBlock {
    key: String,
    #[serde(default)]
    outcomes: Vec<Outcome>,
}

/// A single priced outcome. `description` carries the player name;
/// `point` is the line (absent for Yes/No markets).
#[derive(Debug, Deserialize)]
struct Outcome {
    name: String,
    #[serde(default)]
    description: String,
    price: f64,
    #[serde(default)]
    point: Option<f64>,
}

// ---------------------------------------------------------------------------
// Flattened quote
// ---------------------------------------------------------------------------

/// One two-sided reference price: a player, a market, a line, and the
/// decimal over/under prices from a single book.
#[derive(Debug, Clone, PartialEq)]
pub struct OddsQuote {
    pub event_id: String,
    /// Normalized market key (no `_alternate` suffix).
    pub market_key: String,
    /// Player name, already reconciled with the contest spelling.
    pub player_name: String,
    pub line: f64,
    pub over_price: f64,
    pub under_price: f64,
    pub book: Book,
    pub commence_time: DateTime<Utc>,
}

/// Pair the Over/Under (or Yes/No) outcomes of one bookmaker market into
/// two-sided quotes. One-sided rows are dropped: devig needs both prices.
fn flatten_market(event: &EventOdds, bookmaker: &BookmakerBlock, market: &MarketBlock) -> Vec<OddsQuote> {
    let Some(book) = Book::from_key(&bookmaker.key) else {
        return Vec::new();
    };
    let market_key = normalize_market_key(&market.key).to_string();

    let is_yes_no = market.outcomes.iter().any(|o| o.name == "Yes" || o.name == "No");

    let mut quotes = Vec::new();
    for over in &market.outcomes {
        let (over_name, under_name, line) = if is_yes_no {
            ("Yes", "No", 0.5)
        } else {
            match over.point {
                Some(p) => ("Over", "Under", p),
                None => continue,
            }
        };
        if over.name != over_name {
            continue;
        }
        let under = market.outcomes.iter().find(|o| {
            o.name == under_name
                && o.description == over.description
                && (is_yes_no || o.point == over.point)
        });
        let Some(under) = under else { continue };

        quotes.push(OddsQuote {
            event_id: event.id.clone(),
            market_key: market_key.clone(),
            player_name: reconcile_name(&over.description),
            line,
            over_price: over.price,
            under_price: under.price,
            book,
            commence_time: event.commence_time,
        });
    }
    quotes
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Odds-API client.
pub struct OddsClient {
    http: Client,
    api_key: String,
}

impl OddsClient {
    pub fn new(api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("propline/0.1.0")
            .build()
            .context("Failed to build HTTP client for odds API")?;
        Ok(Self { http, api_key })
    }

    /// Fetch two-sided reference quotes for every configured sport among
    /// the given contest leagues, limited to events starting within the
    /// lookahead window.
    pub async fn fetch_quotes(
        &self,
        league_ids: &[u32],
        lookahead_hours: i64,
    ) -> Result<Vec<OddsQuote>> {
        let lookahead = Duration::hours(lookahead_hours);
        let mut quotes = Vec::new();

        for sport in SPORTS.iter().filter(|s| league_ids.contains(&s.league_id)) {
            let events = match self.list_events(sport.sport_key).await {
                Ok(events) => events,
                Err(e) => {
                    warn!(sport = sport.sport_key, error = %e, "Event listing failed, skipping sport");
                    continue;
                }
            };

            let now = Utc::now();
            let upcoming: Vec<&EventRow> = events
                .iter()
                .filter(|e| within_window(e.commence_time, now, lookahead))
                .collect();

            info!(
                sport = sport.sport_key,
                listed = events.len(),
                upcoming = upcoming.len(),
                lookahead_hours,
                "Events listed"
            );

            for event in upcoming {
                for market_key in sport.market_keys {
                    match self.event_market_odds(sport.sport_key, &event.id, market_key).await {
                        Ok(odds) => {
                            for bookmaker in &odds.bookmakers {
                                for market in bookmaker.markets.iter().filter(|m| m.key == *market_key) {
                                    quotes.extend(flatten_market(&odds, bookmaker, market));
                                }
                            }
                        }
                        Err(e) => {
                            warn!(
                                event_id = %event.id,
                                market_key,
                                error = %e,
                                "Event odds fetch failed, skipping market"
                            );
                        }
                    }
                }
                debug!(event_id = %event.id, total = quotes.len(), "Event markets fetched");
            }
        }

        Ok(quotes)
    }

    async fn list_events(&self, sport_key: &str) -> Result<Vec<EventRow>> {
        // The /odds listing with a DFS-region book is the cheapest way to
        // enumerate event ids and start times in one call.
        let url = format!(
            "{BASE_URL}/{sport_key}/odds/?apiKey={}&regions=us_dfs&bookmakers=underdog&oddsFormat=decimal",
            self.api_key,
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Odds API event listing request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Odds API event listing error {status} for {sport_key}");
        }

        resp.json::<Vec<EventRow>>()
            .await
            .context("Failed to parse odds API event listing")
    }

    async fn event_market_odds(
        &self,
        sport_key: &str,
        event_id: &str,
        market_key: &str,
    ) -> Result<EventOdds> {
        let books = format!("{},{}", Book::Pinnacle.key(), Book::BetOnline.key());
        let url = format!(
            "{BASE_URL}/{sport_key}/events/{event_id}/odds?apiKey={}&regions=eu&markets={market_key}&bookmakers={books}&oddsFormat=decimal",
            self.api_key,
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Odds API event odds request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Odds API event odds error {status} for event {event_id}");
        }

        resp.json::<EventOdds>()
            .await
            .context("Failed to parse odds API event odds")
    }
}

/// Convenience check used by the pipeline: a quote pool that came back
/// empty means the odds side has nothing to price against.
pub fn require_quotes(quotes: Vec<OddsQuote>) -> Result<Vec<OddsQuote>, ProplineError> {
    if quotes.is_empty() {
        Err(ProplineError::DataUnavailable {
            source: "odds-api".to_string(),
        })
    } else {
        Ok(quotes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
