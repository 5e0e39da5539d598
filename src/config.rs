//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the odds API key, the contest auth token) and the user
//! identity fields are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub contest: ContestConfig,
    pub odds: OddsConfig,
    pub selection: SelectionConfig,
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Contest-service (props feed + entry endpoint) settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ContestConfig {
    /// Contest league ids to scrape (2 = NFL, 10 = NCAAF, 1 = NHL,
    /// 7 = NCAAM, 4 = NBA, 3 = MLB).
    pub league_ids: Vec<u32>,
    /// Env var holding the Authorization header value.
    pub auth_token_env: String,
}

/// Sportsbook-aggregation API settings.
#[derive(Debug, Deserialize, Clone)]
pub struct OddsConfig {
    /// Env var holding the odds API key.
    pub api_key_env: String,
    /// Only events starting within this many hours are priced.
    #[serde(default = "default_lookahead_hours")]
    pub lookahead_hours: i64,
}

/// Play tagging and combination sizing.
#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    /// A leg is a PLAY when its stronger fair probability exceeds this.
    #[serde(default = "default_play_threshold")]
    pub play_threshold: f64,
    /// Entry sizes to generate and submit, e.g. [3, 5, 7].
    #[serde(default = "default_sizes")]
    pub sizes: Vec<usize>,
}

/// Entry submission settings.
#[derive(Debug, Deserialize, Clone)]
pub struct SubmissionConfig {
    /// Fixed fee per entry, sent to the contest service as a string.
    pub entry_fee: Decimal,
    /// Pacing window between successful submissions, in seconds.
    #[serde(default = "default_pace_min_secs")]
    pub pace_min_secs: f64,
    #[serde(default = "default_pace_max_secs")]
    pub pace_max_secs: f64,
    pub identity: IdentityConfig,
}

/// Env-var names for the user identity / compliance fields the contest
/// service requires on every entry. Opaque pass-through beyond resolution.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub display_name_env: String,
    pub public_ip_env: String,
    pub country_name_env: String,
    pub state_name_env: String,
    pub user_dob_env: String,
}

/// Output and state file locations.
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_audit_path")]
    pub audit_csv: String,
    #[serde(default = "default_log_path")]
    pub submitted_log: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            audit_csv: default_audit_path(),
            submitted_log: default_log_path(),
        }
    }
}

/// Resolved identity fields, ready to embed in entry payloads.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub display_name: String,
    pub public_ip: String,
    pub country_name: String,
    pub state_name: String,
    pub user_dob: String,
}

fn default_lookahead_hours() -> i64 {
    16
}

fn default_play_threshold() -> f64 {
    0.55
}

fn default_sizes() -> Vec<usize> {
    vec![3, 5, 7]
}

fn default_pace_min_secs() -> f64 {
    5.0
}

fn default_pace_max_secs() -> f64 {
    10.0
}

fn default_audit_path() -> String {
    "data/combined_props.csv".to_string()
}

fn default_log_path() -> String {
    "data/submitted_combinations.txt".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

impl IdentityConfig {
    /// Resolve every identity env var. All five fields are required by
    /// the contest service, so a missing var is an error.
    pub fn resolve(&self) -> Result<UserIdentity> {
        Ok(UserIdentity {
            display_name: AppConfig::resolve_env(&self.display_name_env)?,
            public_ip: AppConfig::resolve_env(&self.public_ip_env)?,
            country_name: AppConfig::resolve_env(&self.country_name_env)?,
            state_name: AppConfig::resolve_env(&self.state_name_env)?,
            user_dob: AppConfig::resolve_env(&self.user_dob_env)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        [contest]
        league_ids = [4, 1]
        auth_token_env = "DRAFTERS_AUTH_TOKEN"

        [odds]
        api_key_env = "ODDS_API_KEY"

        [selection]

        [submission]
        entry_fee = 2
        [submission.identity]
        display_name_env = "DISPLAY_NAME"
        public_ip_env = "PUBLIC_IP"
        country_name_env = "COUNTRY_NAME"
        state_name_env = "STATE_NAME"
        user_dob_env = "USER_DOB"
    "#;

    #[test]
    fn test_parse_with_defaults() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.contest.league_ids, vec![4, 1]);
        assert_eq!(cfg.odds.lookahead_hours, 16);
        assert!((cfg.selection.play_threshold - 0.55).abs() < f64::EPSILON);
        assert_eq!(cfg.selection.sizes, vec![3, 5, 7]);
        assert_eq!(cfg.submission.entry_fee, dec!(2));
        assert!((cfg.submission.pace_min_secs - 5.0).abs() < f64::EPSILON);
        assert!((cfg.submission.pace_max_secs - 10.0).abs() < f64::EPSILON);
        assert_eq!(cfg.paths.submitted_log, "data/submitted_combinations.txt");
    }

    #[test]
    fn test_parse_overrides() {
        let doc = SAMPLE.replace("[selection]", "[selection]\nplay_threshold = 0.6\nsizes = [3]");
        let cfg: AppConfig = toml::from_str(&doc).unwrap();
        assert!((cfg.selection.play_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(cfg.selection.sizes, vec![3]);
    }

    #[test]
    fn test_resolve_env_missing() {
        let result = AppConfig::resolve_env("PROPLINE_DEFINITELY_NOT_SET_XYZ");
        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("PROPLINE_DEFINITELY_NOT_SET_XYZ"));
    }
}
