use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// The string table of a thread: every string is stored once and referenced by index.
///
/// Serializes as a plain array of strings. An array read from disk may contain duplicates;
/// lookups then resolve to the first occurrence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct UniqueStringArray {
    strings: Vec<String>,
    index: AHashMap<String, usize>,
}

impl UniqueStringArray {
    /// Creates an empty string table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `s`, adding it to the table if it is not there yet.
    pub fn index_for_string(&mut self, s: &str) -> usize {
        if let Some(&index) = self.index.get(s) {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(s.to_owned());
        self.index.insert(s.to_owned(), index);
        index
    }

    /// Returns the string at `index`.
    ///
    /// Panics if `index` is out of range.
    pub fn get_string(&self, index: usize) -> &str {
        match self.strings.get(index) {
            Some(s) => s,
            None => panic!(
                "string index {} is out of range for a table of {} strings",
                index,
                self.strings.len()
            ),
        }
    }

    /// Returns `true` if `s` is in the table.
    pub fn has_string(&self, s: &str) -> bool {
        self.index.contains_key(s)
    }

    /// Returns the number of strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns `true` if the table holds no strings.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterates over the strings in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}

impl PartialEq for UniqueStringArray {
    fn eq(&self, other: &Self) -> bool {
        self.strings == other.strings
    }
}

impl Eq for UniqueStringArray {}

impl From<Vec<String>> for UniqueStringArray {
    fn from(strings: Vec<String>) -> Self {
        let mut index = AHashMap::with_capacity(strings.len());
        for (i, s) in strings.iter().enumerate() {
            index.entry(s.clone()).or_insert(i);
        }
        UniqueStringArray { strings, index }
    }
}

impl From<UniqueStringArray> for Vec<String> {
    fn from(table: UniqueStringArray) -> Self {
        table.strings
    }
}
