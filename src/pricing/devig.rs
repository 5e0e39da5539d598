//! No-vig probability math.
//!
//! Decimal odds imply probabilities of 1/price; the two sides of a quote
//! sum past 1.0 by the bookmaker's margin. Normalizing by that sum yields
//! the fair probabilities.

use crate::types::Direction;

/// Remove the vig from a two-sided decimal quote.
///
/// Returns `(fair_over, fair_under)`, which sum to 1.0 with each in
/// (0, 1). Returns `None` when either price is not a valid decimal
/// quote (≤ 1.0).
pub fn devig(over_price: f64, under_price: f64) -> Option<(f64, f64)> {
    if over_price <= 1.0 || under_price <= 1.0 {
        return None;
    }
    let over_prob = 1.0 / over_price;
    let under_prob = 1.0 / under_price;
    let total = over_prob + under_prob;
    Some((over_prob / total, under_prob / total))
}

/// Derive the direction and PLAY tag from fair probabilities.
///
/// Direction is OVER iff `fair_over > fair_under`; the exactly-equal case
/// resolves to UNDER. A leg is a PLAY when the stronger probability
/// exceeds `threshold`.
pub fn classify(fair_over: f64, fair_under: f64, threshold: f64) -> (Direction, bool) {
    let direction = if fair_over > fair_under {
        Direction::Over
    } else {
        Direction::Under
    };
    let play = fair_over.max(fair_under) > threshold;
    (direction, play)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_devig_sums_to_one() {
        for (over, under) in [(1.85, 1.95), (1.50, 2.50), (3.20, 1.33), (2.0, 2.0)] {
            let (fo, fu) = devig(over, under).unwrap();
            assert!((fo + fu - 1.0).abs() < 1e-12, "({over}, {under})");
            assert!(fo > 0.0 && fo < 1.0);
            assert!(fu > 0.0 && fu < 1.0);
        }
    }

    #[test]
    fn test_devig_even_quote() {
        let (fo, fu) = devig(1.90, 1.90).unwrap();
        assert!((fo - 0.5).abs() < 1e-12);
        assert!((fu - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_devig_known_values() {
        // 1/1.50 = 0.6667, 1/3.00 = 0.3333 → already sum to 1, no vig
        let (fo, fu) = devig(1.5, 3.0).unwrap();
        assert!((fo - 2.0 / 3.0).abs() < 1e-12);
        assert!((fu - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_devig_rejects_invalid_prices() {
        assert!(devig(1.0, 1.95).is_none());
        assert!(devig(1.85, 0.9).is_none());
        assert!(devig(0.0, 0.0).is_none());
    }

    #[test]
    fn test_classify_over() {
        let (dir, play) = classify(0.60, 0.40, 0.55);
        assert_eq!(dir, Direction::Over);
        assert!(play);
    }

    #[test]
    fn test_classify_under() {
        let (dir, play) = classify(0.40, 0.60, 0.55);
        assert_eq!(dir, Direction::Under);
        assert!(play);
    }

    #[test]
    fn test_classify_tie_goes_under() {
        let (dir, _) = classify(0.5, 0.5, 0.55);
        assert_eq!(dir, Direction::Under);
    }

    #[test]
    fn test_classify_below_threshold_is_no_play() {
        let (dir, play) = classify(0.54, 0.46, 0.55);
        assert_eq!(dir, Direction::Over);
        assert!(!play);
    }

    #[test]
    fn test_classify_threshold_is_strict() {
        // Exactly at the threshold does not qualify
        let (_, play) = classify(0.55, 0.45, 0.55);
        assert!(!play);
    }
}
