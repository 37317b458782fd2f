//! # KB Core
//!
//! Core logic of the IT-support knowledge base.
//!
//! This crate owns the solution records and everything that happens to them:
//! - Validation of form input into [`Solution`] records
//! - The [`RecordStore`], a read-only base collection unioned with a custom collection
//! - Keyword [`search`](search::search) over the unioned view
//! - Durable local persistence of the custom collection through a [`SlotStore`]
//! - Best-effort mirroring of the full collection through a [`RemoteMirror`]
//! - The [`SolutionService`] that sequences validation, local save, and mirroring
//!
//! **No server concerns**: the flat-file HTTP service lives in `api-rest`, and the wire DTOs
//! shared by both sides live in `api-shared`.

pub mod base;
pub mod config;
pub mod constants;
pub mod error;
pub mod mirror;
pub mod notice;
pub mod persistence;
pub mod search;
pub mod service;
pub mod solution;
pub mod steps;
pub mod store;

pub use base::load_base_collection;
pub use config::{ClientConfig, ServerConfig};
pub use error::{KbError, KbResult};
pub use mirror::{DisabledMirror, HttpMirror, RemoteMirror};
pub use notice::{Notice, NoticeLevel};
pub use persistence::{FileSlotStore, LocalPersistence, MemorySlotStore, SlotStore};
pub use service::{
    MutationKind, MutationReport, PersistPhase, RemoteOutcome, SolutionService, SyncMark,
    SyncSummary,
};
pub use solution::{Action, Solution, SolutionInput};
pub use store::{CustomSolution, Origin, RecordStore, SolutionId, SyncStatus, UnionEntry};
