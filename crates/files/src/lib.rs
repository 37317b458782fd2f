//! Flat JSON file storage
//!
//! This crate stores a whole collection as one pretty-printed JSON array on disk. It is the
//! storage behind the knowledge-base HTTP service, which reads, overwrites, and appends to a
//! single `bot.json` file.
//!
//! ## Design Principles
//!
//! - The file is the only state: nothing is cached between calls
//! - Writes go to a sibling temporary file first and are renamed into place
//! - Append preserves existing entries verbatim, even ones the caller's type cannot parse
//! - The crate is generic over the element type and knows nothing about solutions
//!
//! ## Example Usage
//!
//! ```no_run
//! use kb_files::JsonArrayFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = JsonArrayFile::new("api/bot.json");
//! file.ensure_exists()?;
//! let count = file.append(&serde_json::json!({ "title": "VPN drops" }))?;
//! println!("{count} entries stored");
//! # Ok(())
//! # }
//! ```

mod constants;
mod files;

pub use constants::TEMP_FILE_SUFFIX;
pub use files::{write_atomic, JsonArrayFile};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Path points at something that cannot hold the array (e.g. a directory)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File contents are not a JSON array of the expected shape
    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serialising the collection failed
    #[error("Failed to serialise collection: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
