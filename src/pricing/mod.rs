//! Pricing: odds join and devig.
//!
//! Turns the two raw feeds into tagged `Leg`s. `join` aligns contest
//! offers with sportsbook quotes on (player, market, line); `devig`
//! strips the bookmaker margin from the quoted prices and `classify`
//! derives the direction and PLAY tag from the fair probabilities.

pub mod devig;
pub mod join;

pub use devig::{classify, devig};
pub use join::join_legs;
