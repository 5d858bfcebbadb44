use std::collections::HashMap;
use std::hash::Hash;

/// The number of tuples each item appears in.
///
/// Items are kept in the order in which they first appear in the tuples.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Frequencies<T: Eq + Hash> {
    entries: Vec<(T, u32)>,
    index: HashMap<T, usize>,
}

impl<T: Eq + Hash> Frequencies<T> {
    /// The number of tuples containing this item, zero if it never appears.
    pub fn get(&self, item: &T) -> u32 {
        self.index
            .get(item)
            .map(|idx| self.entries[*idx].1)
            .unwrap_or(0)
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> {
        self.entries.iter().map(|(item, count)| (item, *count))
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }
}

/// Counts, for every item, the number of tuples it belongs to.
///
/// An item repeated inside a tuple is counted once for that tuple.
///
/// ```
/// use bws_design::item_frequencies;
///
/// let tuples = vec![vec!["A", "B", "C"], vec!["B", "C", "D"], vec!["D", "A", "C"]];
/// let freqs = item_frequencies(&tuples);
/// assert_eq!(freqs.get(&"C"), 3);
/// assert_eq!(freqs.get(&"A"), 2);
/// assert_eq!(freqs.get(&"E"), 0);
/// ```
pub fn item_frequencies<T, U>(tuples: &[U]) -> Frequencies<T>
where
    T: Eq + Hash + Clone,
    U: AsRef<[T]>,
{
    let mut entries: Vec<(T, u32)> = Vec::new();
    let mut index: HashMap<T, usize> = HashMap::new();
    for tuple in tuples.iter() {
        let tuple = tuple.as_ref();
        for (pos, item) in tuple.iter().enumerate() {
            if tuple[..pos].contains(item) {
                continue;
            }
            match index.get(item) {
                Some(&idx) => entries[idx].1 += 1,
                None => {
                    index.insert(item.clone(), entries.len());
                    entries.push((item.clone(), 1));
                }
            }
        }
    }
    Frequencies { entries, index }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_tuple_membership() {
        let tuples = vec![
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec!["B".to_string(), "C".to_string(), "D".to_string()],
            vec!["D".to_string(), "A".to_string(), "C".to_string()],
        ];
        let freqs = item_frequencies(&tuples);
        assert_eq!(freqs.len(), 4);
        assert_eq!(freqs.get(&"C".to_string()), 3);
        assert_eq!(freqs.get(&"A".to_string()), 2);
        assert_eq!(freqs.get(&"B".to_string()), 2);
        assert_eq!(freqs.get(&"D".to_string()), 2);
    }

    #[test]
    fn first_appearance_order() {
        let tuples = vec![vec![3, 1], vec![2, 1], vec![4, 3]];
        let freqs = item_frequencies(&tuples);
        let order: Vec<(i32, u32)> = freqs.iter().map(|(i, c)| (*i, c)).collect();
        assert_eq!(order, vec![(3, 2), (1, 2), (2, 1), (4, 1)]);
    }

    #[test]
    fn duplicates_within_a_tuple_count_once() {
        let tuples = vec![vec!["A", "A", "B"], vec!["A"]];
        let freqs = item_frequencies(&tuples);
        assert_eq!(freqs.get(&"A"), 2);
        assert_eq!(freqs.get(&"B"), 1);
    }

    #[test]
    fn empty_input() {
        let tuples: Vec<Vec<String>> = vec![];
        let freqs = item_frequencies(&tuples);
        assert!(freqs.is_empty());
        assert!(!freqs.contains(&"A".to_string()));
    }
}
