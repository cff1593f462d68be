//! ordered header storage
use std::fmt;

/// An ordered header collection with case-insensitive names.
///
/// Replaying captured traffic faithfully means emitting headers with the
/// spelling and order they were captured with, so entries store names
/// verbatim while every lookup and override compares case-insensitively.
/// Duplicate names are permitted via [`append`](HeaderBlock::append);
/// [`set`](HeaderBlock::set) collapses duplicates to a single entry.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HeaderBlock {
  entries: Vec<(String, String)>,
}

impl HeaderBlock {
  /// Creates an empty block.
  pub fn new() -> HeaderBlock {
    HeaderBlock::default()
  }
  /// Number of stored entries, duplicates included.
  pub fn len(&self) -> usize {
    self.entries.len()
  }
  /// Returns `true` if no header is stored.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
  /// Value of the first entry whose name matches, case-insensitively.
  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(name))
      .map(|(_, v)| v.as_str())
  }
  /// Returns `true` if any entry matches `name`, case-insensitively.
  pub fn contains(&self, name: &str) -> bool {
    self.get(name).is_some()
  }
  /// Appends an entry, keeping the given spelling. Duplicates allowed.
  pub fn append<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
    self.entries.push((name.into(), value.into()));
  }
  /// Inserts or overrides a header, last write wins.
  ///
  /// When a matching entry exists the first occurrence keeps its stored
  /// spelling and position and receives the new value; any further
  /// duplicates are dropped. When absent the entry is appended with the
  /// caller's spelling.
  pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
    let name = name.into();
    let mut slot = None;
    let mut i = 0;
    while i < self.entries.len() {
      if self.entries[i].0.eq_ignore_ascii_case(&name) {
        if slot.is_none() {
          slot = Some(i);
          i += 1;
        } else {
          self.entries.remove(i);
        }
      } else {
        i += 1;
      }
    }
    match slot {
      Some(i) => self.entries[i].1 = value.into(),
      None => self.entries.push((name, value.into())),
    }
  }
  /// Removes every entry matching `name` and returns the first value.
  pub fn remove(&mut self, name: &str) -> Option<String> {
    let mut first = None;
    self.entries.retain(|(k, v)| {
      if k.eq_ignore_ascii_case(name) {
        if first.is_none() {
          first = Some(v.clone());
        }
        false
      } else {
        true
      }
    });
    first
  }
  /// Iterates entries in stored order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

impl From<Vec<(String, String)>> for HeaderBlock {
  fn from(entries: Vec<(String, String)>) -> Self {
    HeaderBlock { entries }
  }
}

impl FromIterator<(String, String)> for HeaderBlock {
  fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
    HeaderBlock {
      entries: iter.into_iter().collect(),
    }
  }
}

impl IntoIterator for HeaderBlock {
  type Item = (String, String);
  type IntoIter = std::vec::IntoIter<(String, String)>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}

impl fmt::Display for HeaderBlock {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (k, v) in self.iter() {
      writeln!(f, "{}: {}", k, v)?;
    }
    Ok(())
  }
}
