//! Shared types for the propline pipeline.
//!
//! These types form the data model used across all modules: the sources
//! produce raw offers and quotes, pricing turns them into `Leg`s, and the
//! generator and submission driver consume `Leg`s and `Combination`s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which side of a proposition line a leg backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Over,
    Under,
}

impl Direction {
    /// The lowercase form the contest service expects in a selections map.
    pub fn as_selection(&self) -> &'static str {
        match self {
            Direction::Over => "over",
            Direction::Under => "under",
        }
    }

    /// The opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Over => Direction::Under,
            Direction::Under => Direction::Over,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Over => write!(f, "OVER"),
            Direction::Under => write!(f, "UNDER"),
        }
    }
}

// ---------------------------------------------------------------------------
// Leg
// ---------------------------------------------------------------------------

/// A single proposition bet candidate: one player, one stat, one line,
/// aligned between the contest feed and the sportsbook feed, with the
/// vig-free probabilities already computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    /// Unique key for this specific offer on the contest service.
    pub prop_id: String,
    /// Event the leg belongs to (sportsbook event id).
    pub game_id: String,
    /// Player the leg is about (contest service id).
    pub player_id: String,
    pub player_name: String,
    /// Contest league the offer came from (2 = NFL, 4 = NBA, ...).
    pub league_id: u32,
    /// Odds-API market key ("player_points", "player_pass_yds", ...).
    pub market_key: String,
    pub line: f64,
    /// Vig-free probability of the over, in (0, 1).
    pub fair_over: f64,
    /// Vig-free probability of the under, in (0, 1).
    pub fair_under: f64,
    pub direction: Direction,
    /// Whether the leg clears the play threshold and is eligible for
    /// combination.
    pub play: bool,
    /// Event start time, carried through for the audit file.
    pub commence_time: DateTime<Utc>,
}

impl Leg {
    /// The stronger of the two fair probabilities.
    pub fn fair_probability(&self) -> f64 {
        self.fair_over.max(self.fair_under)
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} ({:.1}%{})",
            self.player_name,
            self.direction,
            self.line,
            self.market_key,
            self.fair_probability() * 100.0,
            if self.play { ", PLAY" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Combination
// ---------------------------------------------------------------------------

/// An unordered set of legs submitted together as one contest entry.
///
/// Validity (distinct games, distinct players, not previously submitted)
/// is enforced by the generator; a `Combination` that exists has already
/// passed those checks.
#[derive(Debug, Clone)]
pub struct Combination {
    pub legs: Vec<Leg>,
}

impl Combination {
    pub fn new(legs: Vec<Leg>) -> Self {
        Self { legs }
    }

    pub fn size(&self) -> usize {
        self.legs.len()
    }

    /// Canonical dedup key: the legs' prop_ids, sorted and pipe-joined.
    /// Order-independent, so the same set of legs always maps to the
    /// same key.
    pub fn key(&self) -> String {
        let mut ids: Vec<&str> = self.legs.iter().map(|l| l.prop_id.as_str()).collect();
        ids.sort_unstable();
        ids.join("|")
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .legs
            .iter()
            .map(|l| format!("{} {} {}", l.player_name, l.direction, l.line))
            .collect();
        write!(f, "{}-pick [{}]", self.size(), parts.join(" / "))
    }
}

// ---------------------------------------------------------------------------
// Submission outcome
// ---------------------------------------------------------------------------

/// Record of one successfully submitted entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub size: usize,
    /// Canonical combination key, as written to the submission log.
    pub key: String,
    /// Message the contest service returned, if any.
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-pick entry [{}]", self.size, self.key)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for propline.
///
/// Fatal submission errors (`Transport`, `Rejected`) abort the run; `main`
/// maps them to a nonzero exit. Library code never exits the process.
#[derive(Debug)]
pub enum ProplineError {
    DataUnavailable { source: String },

    Transport(String),

    Rejected(String),

    Config(String),

    Storage(String),
}

// Hand-written instead of `#[derive(thiserror::Error)]` because the
// `source: String` field name collides with thiserror's automatic
// `Error::source()` inference, which requires the field to implement
// `std::error::Error`.
impl fmt::Display for ProplineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProplineError::DataUnavailable { source } => {
                write!(f, "No data available from {source}")
            }
            ProplineError::Transport(msg) => {
                write!(f, "Submission transport failure: {msg}")
            }
            ProplineError::Rejected(msg) => {
                write!(f, "Submission rejected by contest service: {msg}")
            }
            ProplineError::Config(msg) => write!(f, "Configuration error: {msg}"),
            ProplineError::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for ProplineError {}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

impl Leg {
    /// Helper to build a test leg with sensible defaults.
    #[cfg(test)]
    pub fn sample(prop_id: &str, game_id: &str, player_id: &str) -> Self {
        Leg {
            prop_id: prop_id.to_string(),
            game_id: game_id.to_string(),
            player_id: player_id.to_string(),
            player_name: format!("Player {player_id}"),
            league_id: 4,
            market_key: "player_points".to_string(),
            line: 24.5,
            fair_over: 0.58,
            fair_under: 0.42,
            direction: Direction::Over,
            play: true,
            commence_time: Utc::now() + chrono::Duration::hours(3),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
