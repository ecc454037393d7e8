use crate::store::WordEntry;
use std::cmp::Ordering;

/// Default number of entries in a report
pub const DEFAULT_TOP_K: usize = 10;

/// Order by count descending, then by word ascending
fn by_rank(a: &WordEntry, b: &WordEntry) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word))
}

/// Return the `min(k, entries.len())` highest-count entries.
///
/// Equal counts are ordered lexicographically by word, so the result does not
/// depend on the order the entries were inserted in.
pub fn select_top_k(mut entries: Vec<WordEntry>, k: usize) -> Vec<WordEntry> {
    entries.sort_unstable_by(by_rank);
    entries.truncate(k);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Word;

    fn entry(word: &str, count: u64) -> WordEntry {
        WordEntry {
            word: Word::new(word),
            count,
        }
    }

    #[test]
    fn test_sorted_by_count_descending() {
        let top = select_top_k(
            vec![entry("second", 5), entry("first", 9), entry("third", 1)],
            10,
        );
        let counts: Vec<_> = top.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![9, 5, 1]);
    }

    #[test]
    fn test_fewer_entries_than_k() {
        assert_eq!(select_top_k(vec![entry("single", 1)], 10).len(), 1);
        assert!(select_top_k(Vec::new(), 10).is_empty());
    }

    #[test]
    fn test_bounded_to_k() {
        let entries: Vec<_> = (0..25).map(|i| entry(&format!("word{:02}", i), i)).collect();
        let top = select_top_k(entries, DEFAULT_TOP_K);
        assert_eq!(top.len(), DEFAULT_TOP_K);
        assert_eq!(top[0].count, 24);
        assert_eq!(top[9].count, 15);
        assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_ties_broken_by_word() {
        let forward = vec![entry("zebra", 2), entry("apple", 2), entry("mango", 3)];
        let mut reversed = forward.clone();
        reversed.reverse();

        let expected = vec!["mango", "apple", "zebra"];
        for input in [forward, reversed] {
            let words: Vec<_> = select_top_k(input, 3)
                .into_iter()
                .map(|e| e.word.into_string())
                .collect();
            assert_eq!(words, expected);
        }
    }

    #[test]
    fn test_zero_k() {
        assert!(select_top_k(vec![entry("anything", 3)], 0).is_empty());
    }
}
