use crate::core::errors::DripsplitError;
use crate::core::money::Drops;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// How the drops lost to floor truncation are handed back out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemainderPolicy {
    /// One extra drop per participant, heaviest weights first (ties broken by
    /// participant order). Deterministic, so a settlement can be re-derived
    /// and audited later.
    LargestWeight,
    /// Uniform choice without replacement. Seeded for reproducible tests,
    /// unseeded otherwise.
    Random { seed: Option<u64> },
}

impl Default for RemainderPolicy {
    fn default() -> Self {
        RemainderPolicy::LargestWeight
    }
}

/// Splits `total` drops across participants proportionally to `weights`.
///
/// The result has one entry per weight, every entry is non-negative, and the
/// entries sum to `total` exactly: each participant gets the floored
/// proportional share, then the truncated remainder (at most `weights.len() - 1`
/// drops) is distributed one drop at a time per `policy`.
pub fn allocate(total: Drops, weights: &[u64], policy: &RemainderPolicy) -> Result<Vec<Drops>, DripsplitError> {
    if total < 0 {
        return Err(DripsplitError::InvalidAmount(total));
    }
    if weights.is_empty() {
        return Err(DripsplitError::InvalidSplit("no participants to split across".into()));
    }
    if weights.iter().any(|&w| w == 0) {
        return Err(DripsplitError::InvalidSplit("every weight must be at least 1".into()));
    }

    let weight_sum: u128 = weights.iter().map(|&w| w as u128).sum();

    let mut shares: Vec<Drops> = weights
        .iter()
        .map(|&w| ((total as i128 * w as i128) / weight_sum as i128) as Drops)
        .collect();

    let remainder = total - shares.iter().sum::<Drops>();
    debug_assert!(remainder >= 0 && (remainder as usize) < weights.len());

    let mut order: Vec<usize> = (0..weights.len()).collect();
    match policy {
        RemainderPolicy::LargestWeight => {
            order.sort_by(|&a, &b| weights[b].cmp(&weights[a]).then(a.cmp(&b)));
        }
        RemainderPolicy::Random { seed } => {
            let mut rng = match seed {
                Some(seed) => SmallRng::seed_from_u64(*seed),
                None => SmallRng::from_entropy(),
            };
            order.shuffle(&mut rng);
        }
    }

    for &idx in order.iter().take(remainder as usize) {
        shares[idx] += 1;
    }

    Ok(shares)
}
