// ********* Input data structures ***********

use std::collections::btree_set;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;
use std::time::Duration;

/// An item is an opaque string. Two items are the same item if their strings are equal.
pub type Item = String;

/// A tuple of distinct items, as presented to an annotator.
pub type Tuple = Vec<Item>;

/// The distinct items a design is built from.
///
/// The pool is kept sorted: it is the deterministic base ordering from which
/// all the random permutations of a design are drawn.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ItemPool {
    items: BTreeSet<Item>,
}

impl ItemPool {
    pub fn from_items<I, S>(items: I) -> ItemPool
    where
        I: IntoIterator<Item = S>,
        S: Into<Item>,
    {
        ItemPool {
            items: items.into_iter().map(|s| s.into()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains(item)
    }

    /// The items in sorted order.
    pub fn iter(&self) -> btree_set::Iter<'_, Item> {
        self.items.iter()
    }

    pub(crate) fn insert(&mut self, item: Item) -> bool {
        self.items.insert(item)
    }
}

/// One best/worst judgement made by an annotator on a tuple.
///
/// `best` and `worst` are expected to be distinct members of `tuple`. This is
/// checked by whoever collects the annotations, not by the scorer.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Annotation {
    pub tuple: Tuple,
    pub best: Item,
    pub worst: Item,
}

// ******** Output data structures *********

/// The tuple set selected by the design generator.
#[derive(PartialEq, Debug, Clone)]
pub struct Design {
    pub tuples: Vec<Tuple>,
    pub tuple_size: usize,
    /// Population standard deviation of the pair co-occurrence counts of the
    /// selected trial. Lower is better balanced.
    pub score: f64,
    /// Index (0-based) of the trial that produced the tuples.
    pub trial: u32,
    /// Number of trials that actually ran. It is lower than the requested number
    /// of iterations when a time budget cut the search short.
    pub trials_run: u32,
}

/// Balance statistics of a design.
#[derive(PartialEq, Debug, Clone)]
pub struct DesignStats {
    pub num_tuples: usize,
    pub num_items: usize,
    pub pair_deviation: f64,
    pub min_item_frequency: u32,
    pub max_item_frequency: u32,
    pub mean_item_frequency: f64,
    /// True if every item of the pool appears in at least one tuple.
    pub full_coverage: bool,
}

/// Errors that prevent the design, batching or scoring from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DesignErrors {
    /// The pool holds fewer distinct items than a single tuple needs.
    InsufficientItems { items: usize, tuple_size: usize },
    /// Batches were requested for an empty tuple set.
    EmptyDesign,
    InvalidParameters(String),
    /// The tuples and the best/worst choices are not parallel sequences.
    MismatchedAnnotations {
        tuples: usize,
        best: usize,
        worst: usize,
    },
}

impl Error for DesignErrors {}

impl Display for DesignErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DesignErrors::InsufficientItems { items, tuple_size } => write!(
                f,
                "the number of unique items ({}) is less than the number of items requested per tuple ({})",
                items, tuple_size
            ),
            DesignErrors::EmptyDesign => write!(f, "no tuples to split into batches"),
            DesignErrors::InvalidParameters(msg) => write!(f, "invalid parameters: {}", msg),
            DesignErrors::MismatchedAnnotations {
                tuples,
                best,
                worst,
            } => write!(
                f,
                "annotations are not aligned: {} tuples, {} best choices, {} worst choices",
                tuples, best, worst
            ),
        }
    }
}

// ********* Configuration **********

/// Pools strictly larger than this use tuples of 5 items instead of 4.
pub const LARGE_POOL: usize = 1000;
/// Pools strictly larger than this (and a multiple of 4) use a factor of 1.5.
pub const VERY_LARGE_POOL: usize = 10000;
/// Upper bound on the number of tuples per item that a design may request.
pub const MAX_TUPLES_PER_ITEM: usize = 1000;

/// Rules controlling the search for a balanced design.
///
/// The fields left to `None` are derived from the size of the pool.
#[derive(PartialEq, Debug, Clone)]
pub struct DesignRules {
    pub tuple_size: Option<usize>,
    /// Number of tuples per item. Ignored if `num_tuples` is provided.
    pub factor: Option<f64>,
    pub num_tuples: Option<usize>,
    /// Number of independent randomized trials.
    pub num_iter: u32,
    /// Seed of the random source. Runs with the same seed produce the same design.
    pub seed: Option<u64>,
    /// Trials not started within this duration are skipped. The first trial always runs.
    pub time_budget: Option<Duration>,
    /// Runs the trials on the rayon thread pool. It does not change the outcome.
    pub parallel: bool,
}

impl DesignRules {
    pub const DEFAULT_RULES: DesignRules = DesignRules {
        tuple_size: None,
        factor: None,
        num_tuples: None,
        num_iter: 100,
        seed: None,
        time_budget: None,
        parallel: true,
    };

    /// The tuple size used for a pool of the given size when none is requested.
    pub fn default_tuple_size(num_items: usize) -> usize {
        if num_items > LARGE_POOL {
            5
        } else {
            4
        }
    }

    pub fn default_factor(num_items: usize) -> f64 {
        if num_items > VERY_LARGE_POOL && num_items % 4 == 0 {
            1.5
        } else {
            2.0
        }
    }

    /// Resolves the concrete parameters for a pool of `num_items` items.
    pub fn resolve(&self, num_items: usize) -> Result<DesignParams, DesignErrors> {
        let tuple_size = self
            .tuple_size
            .unwrap_or_else(|| DesignRules::default_tuple_size(num_items));
        if tuple_size == 0 {
            return Err(DesignErrors::InvalidParameters(
                "the tuple size must be at least 1".to_string(),
            ));
        }
        if self.num_iter == 0 {
            return Err(DesignErrors::InvalidParameters(
                "at least one iteration is required".to_string(),
            ));
        }
        let num_tuples = match (self.num_tuples, self.factor) {
            (Some(n), _) => n,
            (None, Some(f)) if !f.is_finite() || f <= 0.0 => {
                return Err(DesignErrors::InvalidParameters(format!(
                    "the factor must be a positive number, got {}",
                    f
                )));
            }
            (None, f) => {
                let factor = f.unwrap_or_else(|| DesignRules::default_factor(num_items));
                (factor * num_items as f64 + 0.5).floor() as usize
            }
        };
        let max_tuples = num_items.saturating_mul(MAX_TUPLES_PER_ITEM);
        if num_tuples > max_tuples {
            return Err(DesignErrors::InvalidParameters(format!(
                "{} tuples requested for {} items, at most {} tuples per item are allowed",
                num_tuples, num_items, MAX_TUPLES_PER_ITEM
            )));
        }
        Ok(DesignParams {
            tuple_size,
            num_tuples,
            num_iter: self.num_iter,
        })
    }
}

/// The parameters of one design generation, after applying the sizing policy.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct DesignParams {
    pub tuple_size: usize,
    pub num_tuples: usize,
    pub num_iter: u32,
}

/// Rules controlling how a design is split into annotation batches.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BatchRules {
    /// Size of a regular batch.
    pub batch_size: usize,
    /// Smallest size allowed for the trailing batch. Smaller remainders are
    /// spread over the other batches.
    pub minimum: usize,
    pub seed: Option<u64>,
}

impl BatchRules {
    pub const DEFAULT_RULES: BatchRules = BatchRules {
        batch_size: 20,
        minimum: 5,
        seed: None,
    };

    /// Used instead of the requested rules when the whole design fits in a single batch.
    pub const SMALL_DESIGN_RULES: BatchRules = BatchRules {
        batch_size: 5,
        minimum: 3,
        seed: None,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizing_policy() {
        let p = DesignRules::DEFAULT_RULES.resolve(8).unwrap();
        assert_eq!(p.tuple_size, 4);
        assert_eq!(p.num_tuples, 16);
        assert_eq!(p.num_iter, 100);

        let p = DesignRules::DEFAULT_RULES.resolve(1001).unwrap();
        assert_eq!(p.tuple_size, 5);
        assert_eq!(p.num_tuples, 2002);

        // Factor 1.5 only for very large pools that are a multiple of 4.
        let p = DesignRules::DEFAULT_RULES.resolve(10004).unwrap();
        assert_eq!(p.num_tuples, 15006);
        let p = DesignRules::DEFAULT_RULES.resolve(10001).unwrap();
        assert_eq!(p.num_tuples, 20002);
    }

    #[test]
    fn factor_is_rounded() {
        let rules = DesignRules {
            factor: Some(1.5),
            ..DesignRules::DEFAULT_RULES
        };
        assert_eq!(rules.resolve(5).unwrap().num_tuples, 8);
        assert_eq!(rules.resolve(7).unwrap().num_tuples, 11);
    }

    #[test]
    fn explicit_values_win() {
        let rules = DesignRules {
            tuple_size: Some(3),
            factor: Some(10.0),
            num_tuples: Some(7),
            ..DesignRules::DEFAULT_RULES
        };
        let p = rules.resolve(2000).unwrap();
        assert_eq!(p.tuple_size, 3);
        assert_eq!(p.num_tuples, 7);
    }

    #[test]
    fn invalid_rules() {
        let rules = DesignRules {
            tuple_size: Some(0),
            ..DesignRules::DEFAULT_RULES
        };
        assert!(matches!(
            rules.resolve(10),
            Err(DesignErrors::InvalidParameters(_))
        ));
        let rules = DesignRules {
            num_iter: 0,
            ..DesignRules::DEFAULT_RULES
        };
        assert!(rules.resolve(10).is_err());
        let rules = DesignRules {
            factor: Some(-1.0),
            ..DesignRules::DEFAULT_RULES
        };
        assert!(rules.resolve(10).is_err());
    }

    #[test]
    fn oversized_requests_are_rejected() {
        let rules = DesignRules {
            num_tuples: Some(usize::MAX),
            ..DesignRules::DEFAULT_RULES
        };
        assert!(matches!(
            rules.resolve(20000),
            Err(DesignErrors::InvalidParameters(_))
        ));
        let rules = DesignRules {
            factor: Some(1e30),
            ..DesignRules::DEFAULT_RULES
        };
        assert!(matches!(
            rules.resolve(10),
            Err(DesignErrors::InvalidParameters(_))
        ));
        let rules = DesignRules {
            num_tuples: Some(10 * MAX_TUPLES_PER_ITEM),
            ..DesignRules::DEFAULT_RULES
        };
        assert_eq!(rules.resolve(10).unwrap().num_tuples, 10 * MAX_TUPLES_PER_ITEM);
        assert!(rules.resolve(9).is_err());
    }

    #[test]
    fn pool_is_sorted_and_distinct() {
        let pool = ItemPool::from_items(["b", "a", "c", "a"]);
        assert_eq!(pool.len(), 3);
        let items: Vec<&Item> = pool.iter().collect();
        assert_eq!(items, vec!["a", "b", "c"]);
        assert!(pool.contains("c"));
        assert!(!pool.contains("d"));
    }
}
