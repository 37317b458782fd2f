//! Loading the read-only base collection.

use crate::constants::EMBEDDED_BASE_COLLECTION;
use crate::solution::Solution;
use crate::{KbError, KbResult};
use std::path::Path;

/// Loads the base collection from `path`, or the embedded default when `path` is `None`.
///
/// Every record must be a valid solution; a single invalid entry fails the whole load.
///
/// # Errors
///
/// Returns `KbError::BaseCollection` if the file cannot be read or does not parse.
pub fn load_base_collection(path: Option<&Path>) -> KbResult<Vec<Solution>> {
    match path {
        Some(path) => {
            let contents =
                std::fs::read_to_string(path).map_err(|e| KbError::BaseCollection {
                    source_name: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            parse_base_collection(&path.display().to_string(), &contents)
        }
        None => parse_base_collection("embedded collection", EMBEDDED_BASE_COLLECTION),
    }
}

fn parse_base_collection(source_name: &str, contents: &str) -> KbResult<Vec<Solution>> {
    let solutions: Vec<Solution> =
        serde_json::from_str(contents).map_err(|e| KbError::BaseCollection {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
    tracing::debug!("loaded {} base solutions from {}", solutions.len(), source_name);
    Ok(solutions)
}
