use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use std::collections::BTreeMap;

use crate::config::*;

/// A design split into annotation batches.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BatchPlan<T> {
    /// The regular batch size that was applied. It differs from the requested one
    /// when the whole design fits in a single batch.
    pub batch_size: usize,
    pub minimum: usize,
    /// The batches, keyed by their index starting at 1.
    pub batches: BTreeMap<u32, Vec<T>>,
}

impl<T> BatchPlan<T> {
    /// Number of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Number of tuples over all the batches.
    pub fn num_tuples(&self) -> usize {
        self.batches.values().map(|b| b.len()).sum()
    }
}

/// Splits the tuples of a design into batches.
///
/// The random source is seeded from `rules.seed` if provided, and from the
/// operating system otherwise.
pub fn split_batches<T>(tuples: Vec<T>, rules: &BatchRules) -> Result<BatchPlan<T>, DesignErrors> {
    let mut rng = match rules.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    split_batches_with_rng(tuples, rules, &mut rng)
}

/// Splits the tuples of a design into batches, drawing all the randomness from `rng`.
///
/// The tuples are shuffled and cut into batches of `batch_size` tuples. A remainder of
/// at least `minimum` tuples forms a last, smaller batch. A smaller remainder is spread
/// over the full batches, at most one extra tuple per batch and per round.
///
/// If the design does not exceed `batch_size` tuples, the rules
/// [`BatchRules::SMALL_DESIGN_RULES`] apply instead.
pub fn split_batches_with_rng<T, R: Rng + ?Sized>(
    mut tuples: Vec<T>,
    rules: &BatchRules,
    rng: &mut R,
) -> Result<BatchPlan<T>, DesignErrors> {
    if tuples.is_empty() {
        return Err(DesignErrors::EmptyDesign);
    }
    if rules.batch_size == 0 {
        return Err(DesignErrors::InvalidParameters(
            "the batch size must be at least 1".to_string(),
        ));
    }

    let num_tuples = tuples.len();
    let (batch_size, minimum) = if num_tuples <= rules.batch_size {
        debug!(
            "split_batches: {} tuples fit in one batch of {}, using batches of {}",
            num_tuples,
            rules.batch_size,
            BatchRules::SMALL_DESIGN_RULES.batch_size
        );
        (
            BatchRules::SMALL_DESIGN_RULES.batch_size,
            BatchRules::SMALL_DESIGN_RULES.minimum,
        )
    } else {
        (rules.batch_size, rules.minimum)
    };

    tuples.shuffle(rng);

    let remainder = num_tuples % batch_size;
    let num_full = num_tuples / batch_size;
    let rest: Vec<T> = tuples.split_off(num_tuples - remainder);

    let mut batches: BTreeMap<u32, Vec<T>> = BTreeMap::new();
    let mut iter = tuples.into_iter();
    for idx in 1..=num_full {
        batches.insert(idx as u32, iter.by_ref().take(batch_size).collect());
    }

    if rest.is_empty() {
        // Nothing left over.
    } else if remainder >= minimum || batches.is_empty() {
        debug!("split_batches: last batch with {} tuples", remainder);
        batches.insert((num_full + 1) as u32, rest);
    } else {
        distribute_remainder(&mut batches, rest, rng);
    }

    info!(
        "Split {} tuples into {} batches (batch size {}, minimum {})",
        num_tuples,
        batches.len(),
        batch_size,
        minimum
    );
    Ok(BatchPlan {
        batch_size,
        minimum,
        batches,
    })
}

// Each round hands one extra tuple to distinct batches, picked uniformly among the
// batches that did not get one yet in this round.
fn distribute_remainder<T, R: Rng + ?Sized>(
    batches: &mut BTreeMap<u32, Vec<T>>,
    rest: Vec<T>,
    rng: &mut R,
) {
    let keys: Vec<u32> = batches.keys().copied().collect();
    let mut available: Vec<u32> = Vec::new();
    for tuple in rest {
        if available.is_empty() {
            available = keys.clone();
        }
        let key = available.swap_remove(rng.gen_range(0..available.len()));
        debug!("distribute_remainder: extra tuple for batch {}", key);
        if let Some(batch) = batches.get_mut(&key) {
            batch.push(tuple);
        }
    }
}
