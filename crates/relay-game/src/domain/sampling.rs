//! Uniform candidate sampling over an injected RNG.

use relay_core::rng::DeterministicRng;

/// Draws an index in `[min, max]`, clamped so out-of-range RNG output can
/// never index past the pool.
fn pick_index(rng: &mut dyn DeterministicRng, min: usize, max: usize) -> usize {
    let lo = u32::try_from(min).unwrap_or(u32::MAX);
    let hi = u32::try_from(max).unwrap_or(u32::MAX);
    let drawn = usize::try_from(rng.next_u32_range(lo, hi)).unwrap_or(max);
    drawn.clamp(min, max)
}

/// Samples up to `k` distinct items uniformly without replacement
/// (partial Fisher-Yates). Returns fewer when the pool is smaller.
pub fn sample_without_replacement<T: Clone>(
    pool: &[T],
    k: usize,
    rng: &mut dyn DeterministicRng,
) -> Vec<T> {
    let mut items = pool.to_vec();
    let take = k.min(items.len());
    for i in 0..take {
        let j = pick_index(rng, i, items.len() - 1);
        items.swap(i, j);
    }
    items.truncate(take);
    items
}

/// Picks one item uniformly, or `None` for an empty pool.
pub fn pick_one<'a, T>(pool: &'a [T], rng: &mut dyn DeterministicRng) -> Option<&'a T> {
    if pool.is_empty() {
        return None;
    }
    pool.get(pick_index(rng, 0, pool.len() - 1))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use relay_core::rng::StdRandom;
    use relay_test_support::{MockRng, SequenceRng};

    use super::*;

    #[test]
    fn test_sample_caps_at_k() {
        let pool: Vec<u32> = (0..10).collect();

        let sample = sample_without_replacement(&pool, 4, &mut MockRng);

        assert_eq!(sample, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_sample_returns_whole_pool_when_smaller_than_k() {
        let pool = vec!['a', 'b'];

        let sample = sample_without_replacement(&pool, 4, &mut MockRng);

        assert_eq!(sample, vec!['a', 'b']);
    }

    #[test]
    fn test_sample_of_empty_pool_is_empty() {
        let pool: Vec<u32> = Vec::new();

        assert!(sample_without_replacement(&pool, 4, &mut MockRng).is_empty());
    }

    #[test]
    fn test_sample_follows_rng_swaps() {
        let pool = vec!['a', 'b', 'c', 'd', 'e'];
        // i=0 swaps with 4, i=1 swaps with 3.
        let mut rng = SequenceRng::new(vec![4, 3]);

        let sample = sample_without_replacement(&pool, 2, &mut rng);

        assert_eq!(sample, vec!['e', 'd']);
    }

    #[test]
    fn test_out_of_range_rng_output_is_clamped() {
        let pool = vec!['a', 'b', 'c'];
        let mut rng = SequenceRng::new(vec![99]);

        assert_eq!(pick_one(&pool, &mut rng), Some(&'c'));
    }

    #[test]
    fn test_sample_is_distinct() {
        let pool: Vec<u32> = (0..8).collect();
        let mut rng = StdRandom::seeded(11);

        for _ in 0..200 {
            let sample = sample_without_replacement(&pool, 4, &mut rng);
            let distinct: BTreeSet<_> = sample.iter().collect();
            assert_eq!(distinct.len(), 4);
        }
    }

    #[test]
    fn test_sample_is_roughly_uniform() {
        let pool: Vec<u32> = (0..6).collect();
        let mut rng = StdRandom::seeded(2026);
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        let rounds = 6_000;

        for _ in 0..rounds {
            for item in sample_without_replacement(&pool, 2, &mut rng) {
                *counts.entry(item).or_default() += 1;
            }
        }

        // Each item is expected in 1/3 of the rounds.
        for item in &pool {
            let seen = counts[item];
            assert!((1_700..=2_300).contains(&seen), "item {item} seen {seen} times");
        }
    }

    #[test]
    fn test_pick_one_on_empty_pool_is_none() {
        let pool: Vec<u32> = Vec::new();

        assert!(pick_one(&pool, &mut MockRng).is_none());
    }
}
