use crate::store::{FrequencyStore, Increment, StoreKind, WordEntry};
use crate::tokenizer::truncate_word;
use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::hash::BuildHasher;
use tracing::warn;

/// Default number of distinct words a table can hold
pub const DEFAULT_CAPACITY: usize = 100_000;

struct Inner {
    store: Box<dyn FrequencyStore>,
    /// Hashes of dropped words, so tracking them never holds their text
    rejected: HashSet<u64>,
    hasher: RandomState,
    rejected_occurrences: u64,
}

/// The word-to-count aggregate shared by all workers.
///
/// Every increment runs under a single exclusive lock held for the full
/// search and update of one token. This is the one serialization point of a
/// run: all writers queue on it regardless of worker count, and with the
/// linear store the time spent inside grows with the number of stored words.
pub struct FrequencyTable {
    inner: Mutex<Inner>,
}

impl FrequencyTable {
    /// Create a table backed by `store`
    pub fn new(store: Box<dyn FrequencyStore>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                store,
                rejected: HashSet::new(),
                hasher: RandomState::new(),
                rejected_occurrences: 0,
            }),
        }
    }

    /// Create a table of the given kind and capacity
    pub fn with_kind(kind: StoreKind, capacity: usize) -> Self {
        Self::new(kind.build(capacity))
    }

    /// Count one occurrence of `word`.
    ///
    /// A new word arriving when the table is full is dropped, and recorded
    /// as rejected. Existing words are always incremented.
    pub fn increment(&self, word: &str) -> Increment {
        let mut inner = self.inner.lock();
        let outcome = inner.store.increment(word);
        if outcome == Increment::Rejected {
            inner.rejected_occurrences += 1;
            let first = inner.rejected.is_empty();
            let hash = inner.hasher.hash_one(truncate_word(word));
            inner.rejected.insert(hash);
            if first {
                warn!(
                    capacity = inner.store.capacity(),
                    "Frequency table full, dropping new words"
                );
            }
        }
        outcome
    }

    /// All entries in insertion order.
    ///
    /// Intended to be called once every writer has finished.
    pub fn snapshot(&self) -> Vec<WordEntry> {
        self.inner.lock().store.entries()
    }

    /// Number of distinct words stored
    pub fn len(&self) -> usize {
        self.inner.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().store.capacity()
    }

    /// Number of distinct words dropped because the table was full.
    ///
    /// Counted by 64-bit hash, so a collision between two dropped words
    /// undercounts by one.
    pub fn rejected_words(&self) -> usize {
        self.inner.lock().rejected.len()
    }

    /// Number of occurrences dropped because the table was full
    pub fn rejected_occurrences(&self) -> u64 {
        self.inner.lock().rejected_occurrences
    }

    /// Name of the backing store
    pub fn store_name(&self) -> String {
        self.inner.lock().store.name().to_owned()
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::with_kind(StoreKind::default(), DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("FrequencyTable")
            .field("store", &inner.store.name())
            .field("len", &inner.store.len())
            .field("capacity", &inner.store.capacity())
            .field("rejected_words", &inner.rejected.len())
            .finish()
    }
}
