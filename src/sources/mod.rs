//! Upstream data sources.
//!
//! Two fetch-and-flatten integrations feed the pipeline:
//! - `contest` — the fantasy-contest operator's props feed (the offers we
//!   can actually enter),
//! - `oddsapi` — the sportsbook-aggregation API (the fair-value reference
//!   prices).
//!
//! Both clients return flat row vectors; aligning them is the job of
//! `pricing::join`.

pub mod contest;
pub mod oddsapi;

pub use contest::{ContestClient, PropOffer};
pub use oddsapi::{Book, OddsClient, OddsQuote};
