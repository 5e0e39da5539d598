//! End-to-end pipeline tests.
//!
//! Exercises the offline half of the pipeline — join, tag, generate,
//! submit — with in-memory feeds and a scripted entry endpoint. No
//! network.

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::Mutex;

use propline::combos;
use propline::config::UserIdentity;
use propline::pricing::join_legs;
use propline::sources::contest::PropOffer;
use propline::sources::oddsapi::{Book, OddsQuote};
use propline::storage::{MemorySubmissionLog, SubmissionLog};
use propline::submit::{drive, DriveSettings, EntryPayload, EntryResponse, EntrySubmitter};
use propline::types::ProplineError;

// ---------------------------------------------------------------------------
// Scripted entry endpoint
// ---------------------------------------------------------------------------

enum Script {
    Accept,
    Reject(&'static str),
    TransportFail,
}

/// Plays back a fixed sequence of outcomes and records every payload.
struct ScriptedSubmitter {
    script: Vec<Script>,
    calls: Mutex<Vec<EntryPayload>>,
}

impl ScriptedSubmitter {
    fn new(script: Vec<Script>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl EntrySubmitter for ScriptedSubmitter {
    async fn submit_entry(&self, payload: &EntryPayload) -> Result<EntryResponse, ProplineError> {
        let mut calls = self.calls.lock().unwrap();
        let step = calls.len();
        calls.push(payload.clone());

        match self.script.get(step) {
            Some(Script::Accept) | None => Ok(EntryResponse {
                status: true,
                message: Some("Entry placed".to_string()),
                market_error: false,
            }),
            Some(Script::Reject(msg)) => Ok(EntryResponse {
                status: false,
                message: Some((*msg).to_string()),
                market_error: false,
            }),
            Some(Script::TransportFail) => {
                Err(ProplineError::Transport("connection reset".to_string()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Feed builders
// ---------------------------------------------------------------------------

fn offer(prop_id: &str, player: &str, line: f64) -> PropOffer {
    PropOffer {
        prop_id: prop_id.to_string(),
        league_id: 4,
        player_id: format!("pid-{prop_id}"),
        player_name: player.to_string(),
        market_key: "player_points".to_string(),
        line,
    }
}

fn quote(event_id: &str, player: &str, line: f64, over: f64, under: f64) -> OddsQuote {
    OddsQuote {
        event_id: event_id.to_string(),
        market_key: "player_points".to_string(),
        player_name: player.to_string(),
        line,
        over_price: over,
        under_price: under,
        book: Book::Pinnacle,
        commence_time: Utc::now() + chrono::Duration::hours(2),
    }
}

fn settings() -> DriveSettings {
    DriveSettings {
        entry_fee: dec!(2),
        identity: UserIdentity {
            display_name: "tester".to_string(),
            public_ip: "203.0.113.7".to_string(),
            country_name: "United States".to_string(),
            state_name: "Texas".to_string(),
            user_dob: "1990-01-01".to_string(),
        },
        pace_min_secs: 0.0,
        pace_max_secs: 0.0,
    }
}

/// Three strong-over offers on three distinct players in three distinct
/// events, each priced 1.60/2.40 (fair over 0.60, a PLAY at 0.55).
fn three_play_feeds() -> (Vec<PropOffer>, Vec<OddsQuote>) {
    let offers = vec![
        offer("p1", "Player One", 20.5),
        offer("p2", "Player Two", 21.5),
        offer("p3", "Player Three", 22.5),
    ];
    let quotes = vec![
        quote("evt-1", "Player One", 20.5, 1.60, 2.40),
        quote("evt-2", "Player Two", 21.5, 1.60, 2.40),
        quote("evt-3", "Player Three", 22.5, 1.60, 2.40),
    ];
    (offers, quotes)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_single_combination_submitted_and_logged() {
    let (offers, quotes) = three_play_feeds();
    let legs = join_legs(&offers, &quotes, 0.55);
    assert_eq!(legs.len(), 3);
    assert!(legs.iter().all(|l| l.play));

    let mut rng = StdRng::seed_from_u64(1);
    let combinations = combos::generate(&legs, &[3, 5, 7], &HashSet::new(), &mut rng);
    assert_eq!(combinations[&3].len(), 1);
    assert!(combinations[&5].is_empty());
    assert!(combinations[&7].is_empty());

    let submitter = ScriptedSubmitter::new(vec![Script::Accept]);
    let mut log = MemorySubmissionLog::new();
    let results = drive(&combinations, &submitter, &mut log, &settings(), &mut rng)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key, "p1|p2|p3");
    assert!(log.contains("p1|p2|p3"));

    // The payload carried all three selections as "over"
    let calls = submitter.calls.lock().unwrap();
    assert_eq!(calls[0].selections.len(), 3);
    assert!(calls[0].selections.values().all(|s| s == "over"));
    assert_eq!(calls[0].entry_fee, "2");
}

#[tokio::test]
async fn test_shared_event_produces_no_combinations() {
    let (offers, mut quotes) = three_play_feeds();
    // Two of the three players now share one event
    quotes[1].event_id = "evt-1".to_string();

    let legs = join_legs(&offers, &quotes, 0.55);
    let mut rng = StdRng::seed_from_u64(1);
    let combinations = combos::generate(&legs, &[3], &HashSet::new(), &mut rng);
    assert!(combinations[&3].is_empty());

    let submitter = ScriptedSubmitter::new(vec![]);
    let mut log = MemorySubmissionLog::new();
    let results = drive(&combinations, &submitter, &mut log, &settings(), &mut rng)
        .await
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(submitter.call_count(), 0);
}

#[tokio::test]
async fn test_previously_submitted_combination_is_skipped() {
    let (offers, quotes) = three_play_feeds();
    let legs = join_legs(&offers, &quotes, 0.55);

    let log = MemorySubmissionLog::with_keys(["p1|p2|p3".to_string()]);
    let mut rng = StdRng::seed_from_u64(1);
    let combinations = combos::generate(&legs, &[3], log.keys(), &mut rng);
    assert!(combinations[&3].is_empty());
}

#[tokio::test]
async fn test_rejection_aborts_but_keeps_prior_success() {
    // Four distinct players/events → C(4,3) = 4 combinations of size 3
    let mut offers = three_play_feeds().0;
    offers.push(offer("p4", "Player Four", 23.5));
    let mut quotes = three_play_feeds().1;
    quotes.push(quote("evt-4", "Player Four", 23.5, 1.60, 2.40));

    let legs = join_legs(&offers, &quotes, 0.55);
    let mut rng = StdRng::seed_from_u64(1);
    let combinations = combos::generate(&legs, &[3], &HashSet::new(), &mut rng);
    assert_eq!(combinations[&3].len(), 4);

    let submitter =
        ScriptedSubmitter::new(vec![Script::Accept, Script::Reject("insufficient balance")]);
    let mut log = MemorySubmissionLog::new();
    let err = drive(&combinations, &submitter, &mut log, &settings(), &mut rng)
        .await
        .unwrap_err();

    match err {
        ProplineError::Rejected(msg) => assert!(msg.contains("insufficient balance")),
        other => panic!("expected Rejected, got {other:?}"),
    }
    // The first success landed in the log before the abort, and nothing
    // after the rejection was attempted
    assert_eq!(log.keys().len(), 1);
    assert_eq!(submitter.call_count(), 2);
}

#[tokio::test]
async fn test_transport_failure_aborts_run() {
    let (offers, quotes) = three_play_feeds();
    let legs = join_legs(&offers, &quotes, 0.55);
    let mut rng = StdRng::seed_from_u64(1);
    let combinations = combos::generate(&legs, &[3], &HashSet::new(), &mut rng);

    let submitter = ScriptedSubmitter::new(vec![Script::TransportFail]);
    let mut log = MemorySubmissionLog::new();
    let err = drive(&combinations, &submitter, &mut log, &settings(), &mut rng)
        .await
        .unwrap_err();

    assert!(matches!(err, ProplineError::Transport(_)));
    assert!(log.keys().is_empty());
}

#[tokio::test]
async fn test_weak_legs_never_reach_submission() {
    let offers = vec![
        offer("p1", "Player One", 20.5),
        offer("p2", "Player Two", 21.5),
        offer("p3", "Player Three", 22.5),
    ];
    // Even 1.90/1.90 quotes → fair 0.50/0.50, below the 0.55 threshold
    let quotes = vec![
        quote("evt-1", "Player One", 20.5, 1.90, 1.90),
        quote("evt-2", "Player Two", 21.5, 1.90, 1.90),
        quote("evt-3", "Player Three", 22.5, 1.90, 1.90),
    ];

    let legs = join_legs(&offers, &quotes, 0.55);
    assert_eq!(legs.len(), 3);
    assert!(legs.iter().all(|l| !l.play));

    let play: Vec<_> = legs.into_iter().filter(|l| l.play).collect();
    let mut rng = StdRng::seed_from_u64(1);
    let combinations = combos::generate(&play, &[3], &HashSet::new(), &mut rng);
    assert!(combinations[&3].is_empty());
}
