//! Offer/quote alignment.
//!
//! Inner join of contest offers against sportsbook quotes on
//! (player name, market key, line). Each contest league reads from the
//! book that actually prices it (college → BetOnline, else Pinnacle).
//! Offers without a matching two-sided quote are dropped and reported.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::pricing::devig::{classify, devig};
use crate::sources::contest::PropOffer;
use crate::sources::oddsapi::{Book, OddsQuote};
use crate::types::Leg;

/// Exact-match join key. Lines arrive as halves (26.5) from both feeds,
/// so bit-level equality on the f64 is safe.
type QuoteKey = (Book, String, String, u64);

fn quote_key(book: Book, market_key: &str, player_name: &str, line: f64) -> QuoteKey {
    (book, market_key.to_string(), player_name.to_string(), line.to_bits())
}

/// Join contest offers with odds quotes and tag the result.
///
/// Returns every aligned leg, PLAY or not; the audit file wants all of
/// them, and the generator filters on the tag. `threshold` is the PLAY
/// cutoff on the stronger fair probability.
pub fn join_legs(offers: &[PropOffer], quotes: &[OddsQuote], threshold: f64) -> Vec<Leg> {
    // First quote wins per key: the standard and alternate markets can
    // both produce the same (player, market, line) row after suffix
    // normalization.
    let mut by_key: HashMap<QuoteKey, &OddsQuote> = HashMap::new();
    for quote in quotes {
        by_key
            .entry(quote_key(quote.book, &quote.market_key, &quote.player_name, quote.line))
            .or_insert(quote);
    }

    let mut legs = Vec::new();
    let mut unmatched: Vec<&str> = Vec::new();

    for offer in offers {
        let book = Book::for_league(offer.league_id);
        let key = quote_key(book, &offer.market_key, &offer.player_name, offer.line);

        let Some(quote) = by_key.get(&key) else {
            unmatched.push(&offer.player_name);
            continue;
        };

        let Some((fair_over, fair_under)) = devig(quote.over_price, quote.under_price) else {
            warn!(
                player = %offer.player_name,
                market = %offer.market_key,
                over = quote.over_price,
                under = quote.under_price,
                "Quote has invalid prices, dropping"
            );
            continue;
        };

        let (direction, play) = classify(fair_over, fair_under, threshold);

        legs.push(Leg {
            prop_id: offer.prop_id.clone(),
            game_id: quote.event_id.clone(),
            player_id: offer.player_id.clone(),
            player_name: offer.player_name.clone(),
            league_id: offer.league_id,
            market_key: offer.market_key.clone(),
            line: offer.line,
            fair_over,
            fair_under,
            direction,
            play,
            commence_time: quote.commence_time,
        });
    }

    if !unmatched.is_empty() {
        unmatched.sort_unstable();
        unmatched.dedup();
        warn!(
            count = unmatched.len(),
            players = ?unmatched,
            "Contest offers with no matching quote"
        );
    }

    debug!(offers = offers.len(), legs = legs.len(), "Join complete");
    legs
}
