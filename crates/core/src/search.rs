//! Keyword search over solutions.
//!
//! A solution matches when the lowercased query is a substring of its lowercased title,
//! problem statement, or any trigger keyword. A query that is blank after trimming matches
//! nothing. Results keep the input order; there is no ranking and no index.

use crate::solution::Solution;
use crate::store::{RecordStore, UnionEntry};

/// Lowercased needle for a query, or `None` if the query is blank.
///
/// Only emptiness is decided on the trimmed text; the needle itself keeps inner and outer
/// whitespace.
fn needle(query: &str) -> Option<String> {
    if query.trim().is_empty() {
        None
    } else {
        Some(query.to_lowercase())
    }
}

/// Returns the solutions of `collection` that match `query`, in their original order.
pub fn filter<'a, I>(query: &str, collection: I) -> Vec<&'a Solution>
where
    I: IntoIterator<Item = &'a Solution>,
{
    let Some(needle) = needle(query) else {
        return Vec::new();
    };

    collection
        .into_iter()
        .filter(|solution| solution.matches_lowercase(&needle))
        .collect()
}

/// Like [`filter`], over the unioned view of `store`, keeping each hit's position and origin.
pub fn search<'a>(query: &str, store: &'a RecordStore) -> Vec<UnionEntry<'a>> {
    let Some(needle) = needle(query) else {
        return Vec::new();
    };

    let hits: Vec<UnionEntry<'a>> = store
        .iter()
        .filter(|entry| entry.solution.matches_lowercase(&needle))
        .collect();
    tracing::debug!(query, hits = hits.len(), "search");
    hits
}
