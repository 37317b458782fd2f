//! JSON array file implementation
//!
//! [`JsonArrayFile`] owns a path and performs whole-file operations against it. Every call
//! re-reads the file, so two handles on the same path always observe each other's writes.
//!
//! # Write Model
//!
//! ```text
//! api/
//! ├── bot.json        # current collection, pretty-printed array
//! └── bot.json.tmp    # only present while a write is in flight
//! ```
//!
//! Writes serialise the full array to `<file>.tmp` and rename it over the target, so a crash
//! mid-write leaves the previous contents intact. Callers that need read-modify-write
//! atomicity across tasks must serialise calls themselves.

use crate::constants::EMPTY_ARRAY;
use crate::{FilesError, TEMP_FILE_SUFFIX};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A JSON array stored in a single file
#[derive(Debug, Clone)]
pub struct JsonArrayFile {
    path: PathBuf,
}

impl JsonArrayFile {
    /// Creates a handle for the array file at `path`.
    ///
    /// No I/O happens here; the file may not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the parent directory and an empty array file if the file is absent.
    ///
    /// # Returns
    ///
    /// `true` if the file was created, `false` if it already existed.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the path exists but is a directory
    /// - the parent directory or file cannot be created (I/O)
    pub fn ensure_exists(&self) -> Result<bool, FilesError> {
        if self.path.is_dir() {
            return Err(FilesError::InvalidPath(format!(
                "Path is a directory: {}",
                self.path.display()
            )));
        }
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory {}: {}", parent.display(), e),
                ))
            })?;
        }

        self.write_text(EMPTY_ARRAY)?;
        tracing::info!("created empty collection file {}", self.path.display());
        Ok(true)
    }

    /// Reads and parses every element of the array.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the file cannot be read (I/O, including not found)
    /// - the contents are not a JSON array of `T`
    pub fn read_all<T: DeserializeOwned>(&self) -> Result<Vec<T>, FilesError> {
        let contents = self.read_text()?;
        serde_json::from_str(&contents).map_err(|source| FilesError::InvalidJson {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Overwrites the file with `items`.
    ///
    /// # Returns
    ///
    /// The number of elements written.
    pub fn replace_all<T: Serialize>(&self, items: &[T]) -> Result<usize, FilesError> {
        let body = serde_json::to_string_pretty(items)?;
        self.write_text(&body)?;
        Ok(items.len())
    }

    /// Appends `item` to the end of the stored array.
    ///
    /// Existing entries are carried over as raw JSON values, so entries written by older
    /// clients survive even if they would not parse as `T`.
    ///
    /// # Returns
    ///
    /// The number of elements stored after the append.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if the file cannot be read, is not a JSON array, or cannot be
    /// written back.
    pub fn append<T: Serialize>(&self, item: &T) -> Result<usize, FilesError> {
        let mut existing: Vec<serde_json::Value> = self.read_all()?;
        existing.push(serde_json::to_value(item)?);
        self.replace_all(&existing)
    }

    fn read_text(&self) -> Result<String, FilesError> {
        fs::read_to_string(&self.path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", self.path.display(), e),
            ))
        })
    }

    fn write_text(&self, body: &str) -> Result<(), FilesError> {
        write_atomic(&self.path, body)
    }
}

/// Writes `body` to `path` through a sibling temporary file and a rename.
///
/// The parent directory must already exist.
pub fn write_atomic(path: &Path, body: &str) -> Result<(), FilesError> {
    let temp_path = temp_path(path);
    fs::write(&temp_path, body).map_err(|e| {
        FilesError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write {}: {}", temp_path.display(), e),
        ))
    })?;
    fs::rename(&temp_path, path).map_err(|e| {
        FilesError::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to move {} into place at {}: {}",
                temp_path.display(),
                path.display(),
                e
            ),
        ))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_FILE_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        title: String,
    }

    fn entry(title: &str) -> Entry {
        Entry {
            title: title.to_string(),
        }
    }

    #[test]
    fn test_ensure_exists_creates_parent_and_empty_array() {
        let temp = TempDir::new().unwrap();
        let file = JsonArrayFile::new(temp.path().join("api").join("bot.json"));

        assert!(file.ensure_exists().unwrap());
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "[]");
        assert!(!file.ensure_exists().unwrap());
    }

    #[test]
    fn test_ensure_exists_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let file = JsonArrayFile::new(temp.path());

        let result = file.ensure_exists();
        assert!(matches!(result, Err(FilesError::InvalidPath(_))));
    }

    #[test]
    fn test_read_all_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let file = JsonArrayFile::new(temp.path().join("missing.json"));

        let result: Result<Vec<Entry>, _> = file.read_all();
        assert!(matches!(result, Err(FilesError::Io(_))));
    }

    #[test]
    fn test_read_all_rejects_non_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bot.json");
        fs::write(&path, r#"{"title":"not a list"}"#).unwrap();

        let result: Result<Vec<Entry>, _> = JsonArrayFile::new(&path).read_all();
        assert!(matches!(result, Err(FilesError::InvalidJson { .. })));
    }

    #[test]
    fn test_replace_all_overwrites_and_pretty_prints() {
        let temp = TempDir::new().unwrap();
        let file = JsonArrayFile::new(temp.path().join("bot.json"));
        file.ensure_exists().unwrap();

        file.replace_all(&[entry("a"), entry("b")]).unwrap();
        let count = file.replace_all(&[entry("c")]).unwrap();

        assert_eq!(count, 1);
        let stored: Vec<Entry> = file.read_all().unwrap();
        assert_eq!(stored, vec![entry("c")]);

        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\n  {\n    \"title\": \"c\""));
        assert!(!temp.path().join("bot.json.tmp").exists());
    }

    #[test]
    fn test_append_keeps_order() {
        let temp = TempDir::new().unwrap();
        let file = JsonArrayFile::new(temp.path().join("bot.json"));
        file.ensure_exists().unwrap();

        assert_eq!(file.append(&entry("first")).unwrap(), 1);
        assert_eq!(file.append(&entry("second")).unwrap(), 2);

        let stored: Vec<Entry> = file.read_all().unwrap();
        assert_eq!(stored, vec![entry("first"), entry("second")]);
    }

    #[test]
    fn test_append_preserves_foreign_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bot.json");
        fs::write(&path, r#"[{"legacy": true, "extra": [1, 2]}]"#).unwrap();
        let file = JsonArrayFile::new(&path);

        assert_eq!(file.append(&entry("new")).unwrap(), 2);

        let stored: Vec<serde_json::Value> = file.read_all().unwrap();
        assert_eq!(stored[0]["legacy"], true);
        assert_eq!(stored[0]["extra"][1], 2);
        assert_eq!(stored[1]["title"], "new");
    }
}
