//! Saved UPI ids.
//!
//! File layout: one record per line, `display_name|upi_id`. The whole file is
//! rewritten on every change. Loading is lenient: blank lines and lines
//! without a separator are skipped, invalid UTF-8 is replaced, and a last
//! line without a newline is still read.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::payload::{truncate_to, MAX_UPI_ID_LEN};

/// Longest display name kept, in bytes.
pub const MAX_NAME_LEN: usize = 31;
/// Name stored when the user left it empty.
pub const DEFAULT_NAME: &str = "Unnamed";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("already holding the maximum of {0} saved entries")]
    Full(usize),

    #[error("no saved entry at index {0}")]
    NoSuchEntry(usize),
}

/// A saved payee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedEntry {
    pub name: String,
    pub upi_id: String,
}

impl SavedEntry {
    /// Cleans both fields so they survive a save and reload: line breaks are
    /// dropped, a `|` in the name becomes `/`, and each field is truncated to
    /// its stored limit.
    pub fn new(name: &str, upi_id: &str) -> Self {
        let name: String = name
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n'))
            .map(|c| if c == '|' { '/' } else { c })
            .collect();
        let upi_id: String = upi_id.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        let name = if name.is_empty() { DEFAULT_NAME } else { &name };
        Self {
            name: truncate_to(name, MAX_NAME_LEN).to_owned(),
            upi_id: truncate_to(&upi_id, MAX_UPI_ID_LEN).to_owned(),
        }
    }

    fn parse_line(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let (name, upi_id) = line.split_once('|')?;
        Some(Self {
            name: truncate_to(name, MAX_NAME_LEN).to_owned(),
            upi_id: truncate_to(upi_id, MAX_UPI_ID_LEN).to_owned(),
        })
    }
}

/// A bounded list of saved entries backed by a text file.
#[derive(Debug)]
pub struct EntryStore {
    path: PathBuf,
    max_entries: usize,
    entries: Vec<SavedEntry>,
}

impl EntryStore {
    /// Loads the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns `Err(StoreError::Io)` if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>, max_entries: usize) -> Result<Self, StoreError> {
        let mut store = Self {
            path: path.into(),
            max_entries,
            entries: Vec::new(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-reads the file, dropping the in-memory list.
    ///
    /// # Errors
    ///
    /// Returns `Err(StoreError::Io)` if the file exists but cannot be read.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        self.entries = parse(&String::from_utf8_lossy(&bytes), self.max_entries);
        debug!(path = %self.path.display(), count = self.entries.len(), "loaded saved entries");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[SavedEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&SavedEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_entries
    }

    /// Appends an entry and saves the file. The list is only changed once the
    /// file has been written.
    ///
    /// # Errors
    ///
    /// Returns `Err(StoreError::Full)` when the list is at its limit, or
    /// `Err(StoreError::Io)` if the file cannot be written.
    pub fn add(&mut self, name: &str, upi_id: &str) -> Result<&SavedEntry, StoreError> {
        if self.is_full() {
            return Err(StoreError::Full(self.max_entries));
        }
        let entry = SavedEntry::new(name, upi_id);
        info!(name = %entry.name, upi_id = %entry.upi_id, "saving entry");
        let mut entries = self.entries.clone();
        entries.push(entry);
        self.write(&entries)?;
        self.entries = entries;
        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Removes the entry at `index`, shifting later entries up, and saves the
    /// file.
    ///
    /// # Errors
    ///
    /// Returns `Err(StoreError::NoSuchEntry)` for an index out of range, or
    /// `Err(StoreError::Io)` if the file cannot be written.
    pub fn remove(&mut self, index: usize) -> Result<SavedEntry, StoreError> {
        if index >= self.entries.len() {
            return Err(StoreError::NoSuchEntry(index));
        }
        let mut entries = self.entries.clone();
        let removed = entries.remove(index);
        info!(index, name = %removed.name, "deleting entry");
        self.write(&entries)?;
        self.entries = entries;
        Ok(removed)
    }

    /// Rewrites the whole file with `entries`, creating its directory if
    /// needed.
    fn write(&self, entries: &[SavedEntry]) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let mut contents = String::new();
        for entry in entries {
            contents.push_str(&entry.name);
            contents.push('|');
            contents.push_str(&entry.upi_id);
            contents.push('\n');
        }
        fs::write(&self.path, contents).map_err(io_err)
    }
}

/// Parses the file contents, keeping at most `max_entries` records.
pub fn parse(contents: &str, max_entries: usize) -> Vec<SavedEntry> {
    contents
        .split('\n')
        .filter_map(SavedEntry::parse_line)
        .take(max_entries)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn entry(name: &str, upi_id: &str) -> SavedEntry {
        SavedEntry {
            name: name.to_owned(),
            upi_id: upi_id.to_owned(),
        }
    }

    #[test]
    fn parse_is_lenient() {
        let contents = "Alice|alice@bank\n\nno separator\r\nBob|bob@bank\r\nCarol|carol@x|y";
        assert_eq!(
            parse(contents, 20),
            vec![
                entry("Alice", "alice@bank"),
                entry("Bob", "bob@bank"),
                entry("Carol", "carol@x|y"),
            ]
        );
    }

    #[test]
    fn parse_limits_count_and_length() {
        let contents: String = (0..25).map(|i| format!("n{i}|id{i}\n")).collect();
        let entries = parse(&contents, 20);
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[19], entry("n19", "id19"));

        let long = format!("{}|{}\n", "n".repeat(40), "u".repeat(80));
        let entries = parse(&long, 20);
        assert_eq!(entries[0].name.len(), MAX_NAME_LEN);
        assert_eq!(entries[0].upi_id.len(), MAX_UPI_ID_LEN);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new("store").unwrap();
        let store = EntryStore::open(dir.path().join("nope.txt"), 20).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn add_remove_persist() {
        let dir = TempDir::new("store").unwrap();
        let path = dir.path().join("upi_qr").join("saved_upi.txt");
        let mut store = EntryStore::open(&path, 20).unwrap();

        store.add("Alice", "alice@bank").unwrap();
        store.add("", "anon@bank").unwrap();
        store.add("Bob", "bob@bank").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Alice|alice@bank\nUnnamed|anon@bank\nBob|bob@bank\n"
        );

        assert_eq!(store.remove(0).unwrap(), entry("Alice", "alice@bank"));
        assert!(matches!(store.remove(5), Err(StoreError::NoSuchEntry(5))));

        let reopened = EntryStore::open(&path, 20).unwrap();
        assert_eq!(
            reopened.entries(),
            &[entry("Unnamed", "anon@bank"), entry("Bob", "bob@bank")]
        );
    }

    #[test]
    fn full_store_rejects() {
        let dir = TempDir::new("store").unwrap();
        let mut store = EntryStore::open(dir.path().join("s.txt"), 2).unwrap();
        store.add("a", "a@x").unwrap();
        store.add("b", "b@x").unwrap();
        assert!(store.is_full());
        assert!(matches!(store.add("c", "c@x"), Err(StoreError::Full(2))));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn failed_write_keeps_list() {
        let dir = TempDir::new("store").unwrap();
        let blocker = dir.path().join("blocker");
        let mut store = EntryStore::open(blocker.join("s.txt"), 20).unwrap();
        store.add("Alice", "alice@bank").unwrap();

        // A plain file where the directory should be makes every write fail.
        fs::remove_dir_all(&blocker).unwrap();
        fs::write(&blocker, "").unwrap();

        assert!(matches!(store.add("Bob", "bob@bank"), Err(StoreError::Io { .. })));
        assert_eq!(store.entries(), &[entry("Alice", "alice@bank")]);
        assert!(matches!(store.remove(0), Err(StoreError::Io { .. })));
        assert_eq!(store.entries(), &[entry("Alice", "alice@bank")]);
    }

    #[test]
    fn separators_and_line_breaks_survive_reload() {
        let dir = TempDir::new("store").unwrap();
        let path = dir.path().join("s.txt");
        let mut store = EntryStore::open(&path, 20).unwrap();
        store.add("A|B", "alice@bank").unwrap();
        store.add("Two\nLines", "bob@\r\nbank").unwrap();
        store.add("\n", "carol@bank").unwrap();

        let expected = [
            entry("A/B", "alice@bank"),
            entry("TwoLines", "bob@bank"),
            entry("Unnamed", "carol@bank"),
        ];
        assert_eq!(store.entries(), &expected);
        assert_eq!(EntryStore::open(&path, 20).unwrap().entries(), &expected);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let dir = TempDir::new("store").unwrap();
        let path = dir.path().join("s.txt");
        fs::write(&path, b"Al\xffce|alice@bank\nBob|bob@bank\n").unwrap();
        let store = EntryStore::open(&path, 20).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries()[0].name, "Al\u{fffd}ce");
        assert_eq!(store.entries()[1], entry("Bob", "bob@bank"));
    }

    #[test]
    fn io_error_names_path() {
        let dir = TempDir::new("store").unwrap();
        // A directory cannot be read as a file.
        let err = EntryStore::open(dir.path(), 20).unwrap_err();
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }
}
