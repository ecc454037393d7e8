//! Storage strategies behind the frequency table.
//!
//! A store is not synchronized itself; [`FrequencyTable`](crate::FrequencyTable)
//! holds it under one lock and calls it for a single find-or-insert at a time.

use crate::tokenizer::{truncate_word, Word};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

/// A word and the number of times it was counted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordEntry {
    pub word: Word,
    pub count: u64,
}

/// Outcome of one find-or-insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    /// New entry created with count 1
    Inserted,
    /// Existing entry now has this count
    Incremented(u64),
    /// Word was new but the store was full
    Rejected,
}

/// Find-or-insert storage for word counts.
///
/// Implementations compare borrowed words and allocate only when inserting.
pub trait FrequencyStore: Send {
    /// Increment `word`, inserting it with count 1 if absent and there is room
    fn increment(&mut self, word: &str) -> Increment;

    /// All entries in insertion order
    fn entries(&self) -> Vec<WordEntry>;

    /// Number of distinct words stored
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of distinct words
    fn capacity(&self) -> usize;

    /// Get a human-readable name for this store
    fn name(&self) -> &str;
}

/// Fixed-capacity array searched linearly on every increment.
///
/// Each increment costs O(n) in the number of stored words, which is paid
/// while the table lock is held.
#[derive(Debug)]
pub struct LinearStore {
    entries: Vec<WordEntry>,
    capacity: usize,
}

impl LinearStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }
}

impl FrequencyStore for LinearStore {
    fn increment(&mut self, word: &str) -> Increment {
        let word = truncate_word(word);
        if let Some(entry) = self.entries.iter_mut().find(|e| e.word.as_str() == word) {
            entry.count += 1;
            return Increment::Incremented(entry.count);
        }
        if self.entries.len() >= self.capacity {
            return Increment::Rejected;
        }
        self.entries.push(WordEntry {
            word: Word::new(word),
            count: 1,
        });
        Increment::Inserted
    }

    fn entries(&self) -> Vec<WordEntry> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/// Hashed index over an insertion-ordered entry list, O(1) amortized per increment
#[derive(Debug)]
pub struct HashedStore {
    entries: Vec<WordEntry>,
    index: HashMap<Word, usize>,
    capacity: usize,
}

impl HashedStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            capacity,
        }
    }
}

impl FrequencyStore for HashedStore {
    fn increment(&mut self, word: &str) -> Increment {
        let word = truncate_word(word);
        if let Some(&slot) = self.index.get(word) {
            let entry = &mut self.entries[slot];
            entry.count += 1;
            return Increment::Incremented(entry.count);
        }
        if self.entries.len() >= self.capacity {
            return Increment::Rejected;
        }
        let word = Word::new(word);
        self.index.insert(word.clone(), self.entries.len());
        self.entries.push(WordEntry { word, count: 1 });
        Increment::Inserted
    }

    fn entries(&self) -> Vec<WordEntry> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn name(&self) -> &str {
        "hashed"
    }
}

/// Selects the store a table is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Linear,
    Hashed,
}

impl StoreKind {
    pub fn build(self, capacity: usize) -> Box<dyn FrequencyStore> {
        match self {
            StoreKind::Linear => Box::new(LinearStore::new(capacity)),
            StoreKind::Hashed => Box::new(HashedStore::new(capacity)),
        }
    }
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(StoreKind::Linear),
            "hashed" => Ok(StoreKind::Hashed),
            other => Err(format!("unknown store '{}', expected linear or hashed", other)),
        }
    }
}
