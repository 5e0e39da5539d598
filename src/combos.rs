//! Combination generation.
//!
//! Enumerates every fixed-size subset of the eligible legs, keeps those
//! with no repeated game and no repeated player whose canonical key has
//! not already been submitted, and shuffles the survivors so repeated
//! runs against an unchanged pool don't always attempt the same entries
//! first.
//!
//! Enumeration is exhaustive — C(M, N) subsets for M legs — which is fine
//! at the pool sizes this pipeline sees (tens of PLAY legs per run). Pure
//! function of its inputs; the RNG is injected so tests can pin ordering.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::types::{Combination, Leg};

/// Generate the valid, not-yet-submitted combinations for each requested
/// size, shuffled per size.
///
/// `legs` must already be filtered to PLAY legs. `history` holds the
/// canonical keys of previously submitted combinations. The returned map
/// iterates sizes in ascending order.
pub fn generate<R: Rng + ?Sized>(
    legs: &[Leg],
    sizes: &[usize],
    history: &HashSet<String>,
    rng: &mut R,
) -> BTreeMap<usize, Vec<Combination>> {
    let mut by_size = BTreeMap::new();

    for &size in sizes {
        let mut combos: Vec<Combination> = Vec::new();

        if size > 0 && size <= legs.len() {
            for_each_subset(legs.len(), size, |indices| {
                let subset: Vec<&Leg> = indices.iter().map(|&i| &legs[i]).collect();
                if !is_valid(&subset) {
                    return;
                }
                let combo = Combination::new(subset.into_iter().cloned().collect());
                if history.contains(&combo.key()) {
                    return;
                }
                combos.push(combo);
            });
        }

        combos.shuffle(rng);
        info!(size, count = combos.len(), "Valid combinations generated");
        by_size.insert(size, combos);
    }

    by_size
}

/// A subset is valid when no game and no player appears twice.
fn is_valid(subset: &[&Leg]) -> bool {
    let mut games = HashSet::with_capacity(subset.len());
    let mut players = HashSet::with_capacity(subset.len());
    for leg in subset {
        if !games.insert(leg.game_id.as_str()) {
            return false;
        }
        if !players.insert(leg.player_id.as_str()) {
            return false;
        }
    }
    true
}

/// Visit every k-element index subset of 0..n in lexicographic order.
///
/// Caller guarantees 0 < k <= n.
fn for_each_subset<F: FnMut(&[usize])>(n: usize, k: usize, mut visit: F) {
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        visit(&indices);

        // Advance the rightmost index that still has room, then reset
        // everything to its right.
        let mut i = k;
        loop {
            if i == 0 {
                return;
            }
            i -= 1;
            if indices[i] != i + n - k {
                break;
            }
        }
        indices[i] += 1;
        for j in (i + 1)..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
