//! Record store: the shipped base collection unioned with the user's custom collection.
//!
//! The base collection is shared and read-only. The custom collection is replaced wholesale by
//! the mutation service, which bumps the store revision each time. Positions in the unioned
//! view (`full_index`) are navigation keys for the current revision only; custom records also
//! carry a [`SolutionId`] that survives deletes of other records.

use crate::solution::Solution;
use crate::{KbError, KbResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Stable identifier of a custom solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolutionId(Uuid);

impl SolutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SolutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SolutionId {
    type Err = KbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| KbError::InvalidId(format!("{s}: {e}")))
    }
}

/// Whether the remote mirror is known to hold a custom record's current content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Saved locally, mirror not attempted yet
    #[default]
    Pending,
    /// The last mirror call that included this content succeeded
    Synced,
    /// The mirror call for this content failed
    LocalOnly,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Synced => "synced",
            SyncStatus::LocalOnly => "local only",
        };
        f.write_str(label)
    }
}

/// A user-added solution as held in the local slot.
///
/// Serialises as the solution's own fields plus `id` and `sync`. A missing `sync` loads as
/// [`SyncStatus::Pending`]. Slot entries without an `id` are handled by
/// [`LocalPersistence::load`](crate::persistence::LocalPersistence::load).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSolution {
    pub id: SolutionId,
    #[serde(default)]
    pub sync: SyncStatus,
    #[serde(flatten)]
    pub solution: Solution,
}

impl CustomSolution {
    pub fn new(solution: Solution) -> Self {
        Self {
            id: SolutionId::new(),
            sync: SyncStatus::Pending,
            solution,
        }
    }
}

/// Where an entry of the unioned view comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Base { index: usize },
    Custom { index: usize, id: SolutionId },
}

impl Origin {
    pub fn is_custom(&self) -> bool {
        matches!(self, Origin::Custom { .. })
    }
}

/// One position of the unioned view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionEntry<'a> {
    pub full_index: usize,
    pub origin: Origin,
    pub solution: &'a Solution,
}

/// Base collection plus custom collection.
#[derive(Debug, Clone)]
pub struct RecordStore {
    base: Arc<[Solution]>,
    custom: Vec<CustomSolution>,
    revision: u64,
}

impl RecordStore {
    pub fn new(base: impl Into<Arc<[Solution]>>, custom: Vec<CustomSolution>) -> Self {
        Self {
            base: base.into(),
            custom,
            revision: 0,
        }
    }

    pub fn base(&self) -> &[Solution] {
        &self.base
    }

    pub fn custom(&self) -> &[CustomSolution] {
        &self.custom
    }

    /// Incremented on every change to the custom collection.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Length of the unioned view.
    pub fn len(&self) -> usize {
        self.base.len() + self.custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `base ++ custom` in order.
    pub fn iter(&self) -> impl Iterator<Item = UnionEntry<'_>> {
        let base = self
            .base
            .iter()
            .enumerate()
            .map(|(index, solution)| (Origin::Base { index }, solution));
        let custom = self.custom.iter().enumerate().map(|(index, record)| {
            (
                Origin::Custom {
                    index,
                    id: record.id,
                },
                &record.solution,
            )
        });

        base.chain(custom)
            .enumerate()
            .map(|(full_index, (origin, solution))| UnionEntry {
                full_index,
                origin,
                solution,
            })
    }

    /// Looks up a position of the unioned view.
    pub fn entry(&self, full_index: usize) -> Option<UnionEntry<'_>> {
        self.iter().nth(full_index)
    }

    /// Owned copy of `base ++ custom`, as sent to the remote mirror.
    pub fn union(&self) -> Vec<Solution> {
        self.iter().map(|entry| entry.solution.clone()).collect()
    }

    /// Current position of a custom record.
    pub fn position_of(&self, id: SolutionId) -> Option<usize> {
        self.custom.iter().position(|record| record.id == id)
    }

    pub fn custom_at(&self, index: usize) -> KbResult<&CustomSolution> {
        self.custom.get(index).ok_or(KbError::OutOfBounds {
            index,
            len: self.custom.len(),
        })
    }

    /// Swaps in a new custom collection and bumps the revision.
    pub(crate) fn replace_custom(&mut self, custom: Vec<CustomSolution>) -> u64 {
        self.custom = custom;
        self.revision += 1;
        self.revision
    }

    /// Updates sync flags without changing content or revision.
    pub(crate) fn custom_mut(&mut self) -> &mut [CustomSolution] {
        &mut self.custom
    }
}
