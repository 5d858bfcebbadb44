/*!
Balanced tuple designs for Best-Worst Scaling (BWS) surveys.

The crate covers the three computational steps of a BWS study:

1. [`generate_design`] draws a set of fixed-size tuples from a pool of items such that
   every item and every pair of items appears about the same number of times;
2. [`split_batches`] partitions these tuples into annotation batches;
3. [`score_items`] turns the collected best/worst judgements into a ranked score per item.

Storing the tuples, presenting them to annotators and collecting the answers is left
to the caller.
*/
mod batches;
pub mod builder;
mod config;
mod frequency;
pub mod manual;
mod scoring;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use std::{
    cmp::Ordering,
    collections::{HashMap, HashSet},
    hash::Hash,
    sync::atomic::{AtomicU32, Ordering as AtomicOrdering},
    time::Instant,
};

pub use crate::batches::*;
pub use crate::config::*;
pub use crate::frequency::*;
pub use crate::scoring::*;

// **** Private structures ****

type TrialId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct ItemId(u32);

// The best tuple set found by a single trial.
#[derive(PartialEq, Debug, Clone)]
struct TrialResult {
    trial: TrialId,
    score: f64,
    tuples: Vec<Vec<ItemId>>,
}

// A random permutation of the whole pool, consumed from the cursor onwards.
struct DrawList {
    items: Vec<ItemId>,
    cursor: usize,
}

impl DrawList {
    fn new<R: Rng + ?Sized>(base: &[ItemId], rng: &mut R) -> DrawList {
        let mut items = base.to_vec();
        items.shuffle(rng);
        DrawList { items, cursor: 0 }
    }

    /// Draws the next tuple of distinct items.
    ///
    /// When the permutation runs out, the remaining items are taken and the tuple is
    /// completed from a fresh permutation. Items of the fresh permutation that are
    /// already in the tuple are rotated to the end of the list.
    fn next_tuple<R: Rng + ?Sized>(
        &mut self,
        base: &[ItemId],
        tuple_size: usize,
        rng: &mut R,
    ) -> Vec<ItemId> {
        let end = self.cursor + tuple_size;
        if end <= self.items.len() {
            let tuple = self.items[self.cursor..end].to_vec();
            self.cursor = end;
            return tuple;
        }

        let mut tuple: Vec<ItemId> = self.items[self.cursor..].to_vec();
        let need_more = tuple_size - tuple.len();
        self.items = base.to_vec();
        self.items.shuffle(rng);
        for pos in 0..need_more {
            // Invariant: tuple.len() < tuple_size <= base.len(), and items[..pos] are all
            // in the tuple, so items[pos..] holds at least one item not in the tuple.
            while tuple.contains(&self.items[pos]) {
                self.items[pos..].rotate_left(1);
            }
            tuple.push(self.items[pos]);
        }
        self.cursor = need_more;
        tuple
    }
}

/// Generates a near-balanced tuple design from the items of the pool.
///
/// The random source is seeded from `rules.seed` if provided, and from the
/// operating system otherwise.
///
/// Arguments:
/// * `pool` the distinct items to draw from
/// * `rules` the sizing policy and search parameters
pub fn generate_design(pool: &ItemPool, rules: &DesignRules) -> Result<Design, DesignErrors> {
    let mut rng = match rules.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_design_with_rng(pool, rules, &mut rng)
}

/// Generates a near-balanced tuple design, drawing all the randomness from `rng`.
///
/// `rules.seed` is ignored. The search runs `num_iter` independent trials and keeps
/// the tuple set with the lowest dispersion of the pair co-occurrence counts. Ties go
/// to the earliest trial. The outcome only depends on the state of `rng`: running the
/// trials in parallel does not change it.
pub fn generate_design_with_rng<R: Rng + ?Sized>(
    pool: &ItemPool,
    rules: &DesignRules,
    rng: &mut R,
) -> Result<Design, DesignErrors> {
    let requested = rules.resolve(pool.len())?;
    if pool.len() < requested.tuple_size {
        return Err(DesignErrors::InsufficientItems {
            items: pool.len(),
            tuple_size: requested.tuple_size,
        });
    }

    let items: Vec<&Item> = pool.iter().collect();
    let base: Vec<ItemId> = (0..items.len() as u32).map(ItemId).collect();

    // Duplicate tuples are rejected: never ask for more tuples than there are subsets.
    let max_tuples = max_distinct_tuples(items.len(), requested.tuple_size);
    let params = if requested.num_tuples > max_tuples {
        warn!(
            "generate_design: {} tuples requested but only {} distinct tuples of size {} exist, capping",
            requested.num_tuples, max_tuples, requested.tuple_size
        );
        DesignParams {
            num_tuples: max_tuples,
            ..requested
        }
    } else {
        requested
    };

    info!(
        "Generating {} tuples of size {} from {} items ({} trials)",
        params.num_tuples,
        params.tuple_size,
        items.len(),
        params.num_iter
    );

    // One seed per trial, drawn up front so that the scheduling of the trials does not matter.
    let seeds: Vec<u64> = (0..params.num_iter).map(|_| rng.gen()).collect();
    let started = Instant::now();
    let trials_run = AtomicU32::new(0);

    let run = |trial: TrialId, seed: u64| -> Option<TrialResult> {
        if trial > 0 {
            if let Some(budget) = rules.time_budget {
                if started.elapsed() >= budget {
                    debug!("generate_design: time budget exhausted, skipping trial {}", trial);
                    return None;
                }
            }
        }
        trials_run.fetch_add(1, AtomicOrdering::Relaxed);
        Some(run_trial(trial, seed, &base, &params))
    };

    let best: Option<TrialResult> = if rules.parallel {
        seeds
            .par_iter()
            .enumerate()
            .filter_map(|(idx, seed)| run(idx as TrialId, *seed))
            .min_by(compare_trials)
    } else {
        seeds
            .iter()
            .enumerate()
            .filter_map(|(idx, seed)| run(idx as TrialId, *seed))
            .min_by(compare_trials)
    };
    let best = best.ok_or_else(|| {
        DesignErrors::InvalidParameters("no trial could be completed".to_string())
    })?;
    let trials_run = trials_run.load(AtomicOrdering::Relaxed);

    info!(
        "Selected trial {} of {} with pair deviation {:.6}",
        best.trial + 1,
        trials_run,
        best.score
    );

    let tuples: Vec<Tuple> = best
        .tuples
        .iter()
        .map(|t| t.iter().map(|iid| items[iid.0 as usize].clone()).collect())
        .collect();

    Ok(Design {
        tuples,
        tuple_size: params.tuple_size,
        score: best.score,
        trial: best.trial,
        trials_run,
    })
}

// Lower score first, then lower trial index.
fn compare_trials(a: &TrialResult, b: &TrialResult) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.trial.cmp(&b.trial))
}

fn run_trial(trial: TrialId, seed: u64, base: &[ItemId], params: &DesignParams) -> TrialResult {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut draw = DrawList::new(base, &mut rng);

    let capacity = params.num_tuples.min(base.len().saturating_mul(4));
    let mut tuples: Vec<Vec<ItemId>> = Vec::with_capacity(capacity);
    let mut seen: HashSet<Vec<ItemId>> = HashSet::with_capacity(capacity);
    let mut pair_freqs: HashMap<(ItemId, ItemId), u32> = HashMap::new();
    let mut rejected: u64 = 0;

    while tuples.len() < params.num_tuples {
        let tuple = draw.next_tuple(base, params.tuple_size, &mut rng);
        let mut key = tuple.clone();
        key.sort();
        if !seen.insert(key) {
            rejected += 1;
            continue;
        }
        add_pairs(&mut pair_freqs, &tuple);
        tuples.push(tuple);
    }

    let score = pair_deviation(pair_freqs.values().copied());
    debug!(
        "run_trial: trial {}: score {:.6}, {} duplicate tuples rejected",
        trial, score, rejected
    );
    TrialResult {
        trial,
        score,
        tuples,
    }
}

// Increments the count of every unordered pair of the tuple. Pairs are keyed with the
// smaller item first.
fn add_pairs<T: Ord + Hash + Clone>(pair_freqs: &mut HashMap<(T, T), u32>, tuple: &[T]) {
    for (idx, a) in tuple.iter().enumerate() {
        for b in tuple[idx + 1..].iter() {
            let key = if a <= b {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            *pair_freqs.entry(key).or_insert(0) += 1;
        }
    }
}

/// Population standard deviation of the counts. Zero if there are no counts.
///
/// Computed from integer sums so that the result does not depend on the order of the counts.
fn pair_deviation<I: Iterator<Item = u32>>(counts: I) -> f64 {
    let mut n: u128 = 0;
    let mut sum: u128 = 0;
    let mut sum_sq: u128 = 0;
    for c in counts {
        let c = c as u128;
        n += 1;
        sum += c;
        sum_sq += c * c;
    }
    if n == 0 {
        return 0.0;
    }
    let num = (n * sum_sq - sum * sum) as f64;
    let den = (n * n) as f64;
    (num / den).sqrt()
}

/// The number of distinct subsets of `tuple_size` items, saturating at `usize::MAX`.
fn max_distinct_tuples(num_items: usize, tuple_size: usize) -> usize {
    if tuple_size > num_items {
        return 0;
    }
    let k = tuple_size.min(num_items - tuple_size) as u128;
    let n = num_items as u128;
    let mut res: u128 = 1;
    for i in 0..k {
        // Exact at every step: res * (n - i) is divisible by (i + 1).
        res = match res.checked_mul(n - i) {
            Some(x) => x / (i + 1),
            None => return usize::MAX,
        };
        if res > usize::MAX as u128 {
            return usize::MAX;
        }
    }
    res as usize
}

impl Design {
    /// Balance statistics of this design with respect to the pool it was drawn from.
    pub fn stats(&self, pool: &ItemPool) -> DesignStats {
        let mut pair_freqs: HashMap<(&str, &str), u32> = HashMap::new();
        for tuple in self.tuples.iter() {
            let t: Vec<&str> = tuple.iter().map(|s| s.as_str()).collect();
            add_pairs(&mut pair_freqs, &t);
        }
        let freqs = item_frequencies(&self.tuples);
        let counts: Vec<u32> = freqs.iter().map(|(_, c)| c).collect();
        let mean_item_frequency = if counts.is_empty() {
            0.0
        } else {
            counts.iter().map(|c| *c as f64).sum::<f64>() / counts.len() as f64
        };
        DesignStats {
            num_tuples: self.tuples.len(),
            num_items: freqs.len(),
            pair_deviation: pair_deviation(pair_freqs.values().copied()),
            min_item_frequency: counts.iter().copied().min().unwrap_or(0),
            max_item_frequency: counts.iter().copied().max().unwrap_or(0),
            mean_item_frequency,
            full_coverage: pool.iter().all(|item| freqs.contains(item)),
        }
    }

    /// A SHA-256 digest identifying the tuple set, regardless of the order of the
    /// tuples and of the items inside each tuple.
    pub fn fingerprint(&self) -> String {
        let mut canonical: Vec<Vec<&str>> = self
            .tuples
            .iter()
            .map(|t| {
                let mut c: Vec<&str> = t.iter().map(|s| s.as_str()).collect();
                c.sort_unstable();
                c
            })
            .collect();
        canonical.sort();
        let text: Vec<String> = canonical.iter().map(|t| t.join("\u{1f}")).collect();
        sha256::digest(text.join("\u{1e}").as_str())
    }
}
