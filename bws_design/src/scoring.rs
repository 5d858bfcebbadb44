use log::{debug, info};

use std::collections::HashMap;

use crate::config::*;
use crate::frequency::item_frequencies;

/// Computes the Best-Worst score of every item appearing in the tuples.
///
/// `best[i]` and `worst[i]` are the choices made for `tuples[i]`. The score of an item is
/// the number of times it was chosen as best, minus the number of times it was chosen
/// as worst, divided by the number of tuples it appears in. An item never chosen
/// scores `0.0`.
///
/// The items are returned by decreasing score. Items with the same score keep the order
/// in which they first appear in the tuples.
///
/// ```
/// use bws_design::score_items;
///
/// let tuples = vec![vec!["A", "B", "C"], vec!["B", "C", "D"], vec!["D", "A", "C"]];
/// let scores = score_items(&tuples, &["A", "B", "A"], &["B", "D", "C"])?;
/// assert_eq!(scores[0], ("A".to_string(), 1.0));
/// assert_eq!(scores[3], ("D".to_string(), -0.5));
/// # Ok::<(), bws_design::DesignErrors>(())
/// ```
pub fn score_items<S: AsRef<str>>(
    tuples: &[Vec<S>],
    best: &[S],
    worst: &[S],
) -> Result<Vec<(String, f64)>, DesignErrors> {
    if tuples.len() != best.len() || tuples.len() != worst.len() {
        return Err(DesignErrors::MismatchedAnnotations {
            tuples: tuples.len(),
            best: best.len(),
            worst: worst.len(),
        });
    }
    let tuples: Vec<Vec<&str>> = tuples
        .iter()
        .map(|t| t.iter().map(|s| s.as_ref()).collect())
        .collect();
    let best: Vec<&str> = best.iter().map(|s| s.as_ref()).collect();
    let worst: Vec<&str> = worst.iter().map(|s| s.as_ref()).collect();
    Ok(compute_scores(&tuples, &best, &worst))
}

/// Computes the Best-Worst score of every item from annotation records.
///
/// See [`score_items`].
pub fn score_annotations(annotations: &[Annotation]) -> Vec<(String, f64)> {
    let tuples: Vec<Vec<&str>> = annotations
        .iter()
        .map(|a| a.tuple.iter().map(|s| s.as_str()).collect())
        .collect();
    let best: Vec<&str> = annotations.iter().map(|a| a.best.as_str()).collect();
    let worst: Vec<&str> = annotations.iter().map(|a| a.worst.as_str()).collect();
    compute_scores(&tuples, &best, &worst)
}

/// Renders the scores as lines of `item<TAB>score`.
pub fn format_scores(scores: &[(String, f64)]) -> String {
    let lines: Vec<String> = scores
        .iter()
        .map(|(item, score)| format!("{}\t{:?}", item, score))
        .collect();
    lines.join("\n")
}

fn compute_scores(tuples: &[Vec<&str>], best: &[&str], worst: &[&str]) -> Vec<(String, f64)> {
    info!("Scoring {} annotated tuples", tuples.len());
    let frequencies = item_frequencies(tuples);
    let best_counts = count_choices(best);
    let worst_counts = count_choices(worst);

    let mut scores: Vec<(String, f64)> = frequencies
        .iter()
        .map(|(item, freq)| {
            let pos = best_counts.get(item).copied().unwrap_or(0);
            let neg = worst_counts.get(item).copied().unwrap_or(0);
            let score = if pos + neg == 0 {
                0.0
            } else {
                (pos as f64 - neg as f64) / freq as f64
            };
            debug!(
                "compute_scores: {}: best {} worst {} frequency {} -> {}",
                item, pos, neg, freq, score
            );
            (item.to_string(), score)
        })
        .collect();
    // Stable: ties keep the order of first appearance.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
}

fn count_choices<'a>(choices: &[&'a str]) -> HashMap<&'a str, u32> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for &c in choices.iter() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}
