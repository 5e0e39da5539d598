//! PROPLINE — Player Proposition Entry Pipeline
//!
//! Entry point. Loads configuration, initialises structured logging,
//! then runs one fetch→join→tag→generate→submit pass and exits.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use propline::combos;
use propline::config::AppConfig;
use propline::pricing;
use propline::sources::contest::ContestClient;
use propline::sources::oddsapi::{self, OddsClient};
use propline::storage::{self, FileSubmissionLog, SubmissionLog};
use propline::submit::{self, DraftersClient, DriveSettings};
use propline::types::{Leg, ProplineError, SubmissionResult};

const BANNER: &str = r#"
 ____  ____   ___  ____  _     ___ _   _ _____
|  _ \|  _ \ / _ \|  _ \| |   |_ _| \ | | ____|
| |_) | |_) | | | | |_) | |    | ||  \| |  _|
|  __/|  _ <| |_| |  __/| |___ | || |\  | |___
|_|   |_| \_\\___/|_|   |_____|___|_| \_|_____|

  Player Proposition Entry Pipeline
  v0.1.0 — One pass per invocation
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    println!("{BANNER}");
    info!(
        leagues = ?cfg.contest.league_ids,
        sizes = ?cfg.selection.sizes,
        play_threshold = cfg.selection.play_threshold,
        entry_fee = %cfg.submission.entry_fee,
        "PROPLINE starting up"
    );

    match run(&cfg).await {
        Ok(results) => {
            info!(submitted = results.len(), "Run finished");
            Ok(())
        }
        Err(e) => {
            // An empty upstream feed is a normal outcome for a one-shot
            // pipeline, not a failure worth a nonzero exit.
            if let Some(ProplineError::DataUnavailable { source }) =
                e.downcast_ref::<ProplineError>()
            {
                warn!(source = %source, "No data available, nothing to do");
                return Ok(());
            }
            error!(error = %e, "Run aborted");
            Err(e)
        }
    }
}

/// One full pipeline pass: fetch both feeds, join and tag, write the
/// audit file, generate fresh combinations, and drive submission.
async fn run(cfg: &AppConfig) -> Result<Vec<SubmissionResult>> {
    let auth_token = AppConfig::resolve_env(&cfg.contest.auth_token_env)?;
    let odds_api_key = AppConfig::resolve_env(&cfg.odds.api_key_env)?;
    let identity = cfg.submission.identity.resolve()?;

    // -- Fetch ------------------------------------------------------------

    let contest = ContestClient::new(auth_token.clone())?;
    let offers = contest.fetch_props(&cfg.contest.league_ids).await?;
    if offers.is_empty() {
        return Err(ProplineError::DataUnavailable {
            source: "contest".to_string(),
        }
        .into());
    }

    let odds = OddsClient::new(odds_api_key)?;
    let quotes = odds
        .fetch_quotes(&cfg.contest.league_ids, cfg.odds.lookahead_hours)
        .await?;
    let quotes = oddsapi::require_quotes(quotes)?;

    // -- Join and tag -----------------------------------------------------

    let legs = pricing::join_legs(&offers, &quotes, cfg.selection.play_threshold);
    storage::write_audit(&legs, &cfg.paths.audit_csv)?;

    let play_legs: Vec<Leg> = legs.into_iter().filter(|l| l.play).collect();
    info!(play = play_legs.len(), "PLAY legs tagged");
    if play_legs.is_empty() {
        info!("No PLAY legs this run, nothing to submit");
        return Ok(Vec::new());
    }

    // -- Generate ---------------------------------------------------------

    let mut log = FileSubmissionLog::open(&cfg.paths.submitted_log)?;
    let mut rng = StdRng::from_entropy();
    let combinations = combos::generate(&play_legs, &cfg.selection.sizes, log.keys(), &mut rng);

    let queued: usize = combinations.values().map(Vec::len).sum();
    if queued == 0 {
        info!("No new valid combinations, nothing to submit");
        return Ok(Vec::new());
    }

    // -- Submit -----------------------------------------------------------

    let submitter = DraftersClient::new(auth_token)?;
    let settings = DriveSettings {
        entry_fee: cfg.submission.entry_fee,
        identity,
        pace_min_secs: cfg.submission.pace_min_secs,
        pace_max_secs: cfg.submission.pace_max_secs,
    };

    let results = submit::drive(&combinations, &submitter, &mut log, &settings, &mut rng).await?;
    Ok(results)
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("propline=info"));

    let json_logging = std::env::var("PROPLINE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
