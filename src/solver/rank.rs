//! Cheapest-first hour ranking with an explicit tie-break key.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// How hours with identical prices are ordered.
///
/// Prices themselves are never perturbed; ties are resolved by a secondary key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TieBreak {
    /// Earlier hour first.
    #[default]
    HourIndex,
    /// Per-run random key drawn from `seed`, so repeated runs with different
    /// seeds do not systematically favour low indices.
    Salted {
        /// Seed for the salt generator.
        seed: u64,
    },
}

/// Returns hour indices ordered cheapest first.
///
/// The sort key is `(price, salt, hour)`; `salt` is zero for
/// [`TieBreak::HourIndex`]. Identical inputs always yield the same ranking.
pub fn rank_by_price(prices: &[f64], tie_break: TieBreak) -> Vec<usize> {
    let salt: Vec<u64> = match tie_break {
        TieBreak::HourIndex => vec![0; prices.len()],
        TieBreak::Salted { seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..prices.len()).map(|_| rng.random::<u64>()).collect()
        }
    };

    let mut hours: Vec<usize> = (0..prices.len()).collect();
    hours.sort_by(|&a, &b| {
        prices[a]
            .total_cmp(&prices[b])
            .then(salt[a].cmp(&salt[b]))
            .then(a.cmp(&b))
    });
    hours
}
