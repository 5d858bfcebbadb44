pub use crate::config::*;

use log::debug;

/// A builder for collecting the items of a study from raw text sources.
///
/// Every non-empty line of a source is an item. Sources are merged and duplicated
/// lines are only kept once.
///
/// ```
/// use bws_design::builder::{PoolBuilder, PoolOutcome};
///
/// let mut builder = PoolBuilder::new();
/// builder.add_text("joyful\nboring\nannoyed\n");
/// builder.add_bytes(b"boring\r\nexcited\r\nfantastic\r\n");
///
/// match builder.build() {
///     PoolOutcome::Ready(pool) => assert_eq!(pool.len(), 5),
///     other => panic!("unexpected outcome {:?}", other),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PoolBuilder {
    pub(crate) _pool: ItemPool,
    pub(crate) _tuple_size: Option<usize>,
}

/// What came out of the item sources.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PoolOutcome {
    /// The sources held no item at all.
    NoItems,
    /// Some items, but not more than the size of a tuple. A study on so few items is not
    /// meaningful.
    TooFewItems { pool: ItemPool, required: usize },
    Ready(ItemPool),
}

impl PoolBuilder {
    pub fn new() -> PoolBuilder {
        PoolBuilder::default()
    }

    /// Sets the tuple size the pool is checked against. By default, the size the
    /// design generator would pick for the pool.
    pub fn tuple_size(self, tuple_size: usize) -> PoolBuilder {
        PoolBuilder {
            _pool: self._pool,
            _tuple_size: Some(tuple_size),
        }
    }

    /// Adds the lines of a text. Returns the number of new items.
    pub fn add_text(&mut self, text: &str) -> usize {
        let mut added = 0;
        for line in text.trim().lines() {
            if line.trim().is_empty() {
                continue;
            }
            if self._pool.insert(line.to_string()) {
                added += 1;
            }
        }
        debug!("add_text: {} new items, {} in total", added, self._pool.len());
        added
    }

    /// Adds the lines of a UTF-8 encoded source. Invalid byte sequences are dropped.
    pub fn add_bytes(&mut self, bytes: &[u8]) -> usize {
        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(s) => {
                    text.push_str(s);
                    break;
                }
                Err(e) => {
                    let (valid, invalid) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => rest = &invalid[len..],
                        // Truncated sequence at the end of the input.
                        None => break,
                    }
                }
            }
        }
        self.add_text(&text)
    }

    pub fn len(&self) -> usize {
        self._pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self._pool.is_empty()
    }

    pub fn build(self) -> PoolOutcome {
        let required = self
            ._tuple_size
            .unwrap_or_else(|| DesignRules::default_tuple_size(self._pool.len()));
        if self._pool.is_empty() {
            PoolOutcome::NoItems
        } else if self._pool.len() <= required {
            PoolOutcome::TooFewItems {
                pool: self._pool,
                required: required + 1,
            }
        } else {
            PoolOutcome::Ready(self._pool)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_become_items() {
        let mut b = PoolBuilder::new();
        assert_eq!(b.add_text("a\nb\n\nc\r\nd\n"), 4);
        assert_eq!(b.add_text("d\ne"), 1);
        match b.build() {
            PoolOutcome::Ready(pool) => {
                let items: Vec<&String> = pool.iter().collect();
                assert_eq!(items, vec!["a", "b", "c", "d", "e"]);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn blank_content_has_no_items() {
        let mut b = PoolBuilder::new();
        b.add_text("");
        b.add_text("  \n\n ");
        assert!(b.is_empty());
        assert_eq!(b.build(), PoolOutcome::NoItems);
        assert_eq!(PoolBuilder::new().build(), PoolOutcome::NoItems);
    }

    #[test]
    fn too_few_items() {
        let mut b = PoolBuilder::new();
        b.add_text("a\nb\nc\nd");
        match b.build() {
            PoolOutcome::TooFewItems { pool, required } => {
                assert_eq!(pool.len(), 4);
                assert_eq!(required, 5);
            }
            other => panic!("{:?}", other),
        }

        let mut b = PoolBuilder::new().tuple_size(3);
        b.add_text("a\nb\nc\nd");
        assert!(matches!(b.build(), PoolOutcome::Ready(_)));
    }

    #[test]
    fn invalid_utf8_is_dropped() {
        let mut b = PoolBuilder::new();
        b.add_bytes(b"caf\xffe\nthe\xc3\xa9\n");
        assert_eq!(b.len(), 2);
        let outcome = b.tuple_size(1).build();
        match outcome {
            PoolOutcome::Ready(pool) => {
                assert!(pool.contains("cafe"));
                assert!(pool.contains("the\u{e9}"));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn encoded_replacement_character_is_kept() {
        let mut b = PoolBuilder::new();
        b.add_bytes("a\u{FFFD}b\nab\n".as_bytes());
        assert_eq!(b.len(), 2);
        b.add_bytes(b"x\xe2\x82");
        assert_eq!(b.len(), 3);
        match b.tuple_size(1).build() {
            PoolOutcome::Ready(pool) => {
                assert!(pool.contains("a\u{FFFD}b"));
                assert!(pool.contains("ab"));
                assert!(pool.contains("x"));
            }
            other => panic!("{:?}", other),
        }
    }
}
