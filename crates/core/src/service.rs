//! Solution mutation service.
//!
//! [`SolutionService`] is the single owner of the record store. Reads go through it, and every
//! create, update, and delete follows the same persistence sequence:
//!
//! ```text
//! Validated ──▶ Invalid                       (nothing changed)
//!     │
//!     ▼
//! LocalSaved ──▶ RemoteSynced | RemoteUnreachable
//! ```
//!
//! The new custom collection is written to the local slot before it replaces the in-memory
//! one, so a failed local write leaves both untouched. Once the local write succeeds the change
//! is committed; the mirror call afterwards only decides between a success and an
//! informational notice. Mutations take `&mut self`, so one mutation and its mirror call finish
//! before the next starts.

use crate::mirror::RemoteMirror;
use crate::notice::Notice;
use crate::persistence::{LocalPersistence, SlotStore};
use crate::search;
use crate::solution::{Solution, SolutionInput};
use crate::store::{CustomSolution, RecordStore, SolutionId, SyncStatus, UnionEntry};
use crate::{KbError, KbResult};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

/// Persistence state of a single mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPhase {
    Validated,
    Invalid,
    LocalSaved,
    RemoteSynced,
    RemoteUnreachable,
}

impl PersistPhase {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: PersistPhase) -> bool {
        use PersistPhase::*;
        matches!(
            (self, next),
            (Validated, Invalid)
                | (Validated, LocalSaved)
                | (LocalSaved, RemoteSynced)
                | (LocalSaved, RemoteUnreachable)
        )
    }

    /// Committed from the user's standpoint, whatever the remote did.
    pub fn is_committed(self) -> bool {
        matches!(
            self,
            PersistPhase::LocalSaved | PersistPhase::RemoteSynced | PersistPhase::RemoteUnreachable
        )
    }
}

/// What the mirror call after a local save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Synced { count: usize },
    Unreachable { reason: String },
}

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub kind: MutationKind,
    /// Record that was created, updated, or removed
    pub id: SolutionId,
    /// Position in the custom collection; for deletes, the position it was removed from
    pub index: usize,
    /// Store revision produced by this mutation
    pub revision: u64,
    pub remote: RemoteOutcome,
}

impl MutationReport {
    pub fn phase(&self) -> PersistPhase {
        match self.remote {
            RemoteOutcome::Synced { .. } => PersistPhase::RemoteSynced,
            RemoteOutcome::Unreachable { .. } => PersistPhase::RemoteUnreachable,
        }
    }

    pub fn notice(&self) -> Notice {
        let verb = match self.kind {
            MutationKind::Created => "added",
            MutationKind::Updated => "updated",
            MutationKind::Deleted => "deleted",
        };
        match self.remote {
            RemoteOutcome::Synced { .. } if self.kind == MutationKind::Deleted => {
                Notice::success("Solution deleted successfully!")
            }
            RemoteOutcome::Synced { .. } => Notice::success(format!(
                "Solution {verb} successfully and saved to backend!"
            )),
            RemoteOutcome::Unreachable { .. } => Notice::info(format!(
                "Solution {verb} (saved locally only - backend unavailable)"
            )),
        }
    }
}

/// Last successful mirror call made by this service instance.
///
/// Held in memory only. A new service starts without one, at revision 0; the durable record
/// of what reached the remote is each custom record's [`SyncStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncMark {
    pub revision: u64,
    pub at: DateTime<Utc>,
    pub count: usize,
}

/// Custom records per sync status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub pending: usize,
    pub synced: usize,
    pub local_only: usize,
}

/// Owner of the record store and entry point for every mutation.
pub struct SolutionService<S, M> {
    store: RecordStore,
    local: LocalPersistence<S>,
    mirror: M,
    last_synced: Option<SyncMark>,
}

impl<S: SlotStore, M: RemoteMirror> SolutionService<S, M> {
    /// Builds the service, loading the custom collection from the local slot.
    pub fn new(base: Vec<Solution>, local: LocalPersistence<S>, mirror: M) -> Self {
        let custom = local.load();
        tracing::info!(
            "loaded {} base and {} custom solutions",
            base.len(),
            custom.len()
        );

        Self {
            store: RecordStore::new(base, custom),
            local,
            mirror,
            last_synced: None,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn search(&self, query: &str) -> Vec<UnionEntry<'_>> {
        search::search(query, &self.store)
    }

    pub fn entry(&self, full_index: usize) -> Option<UnionEntry<'_>> {
        self.store.entry(full_index)
    }

    /// Current position of a custom record.
    ///
    /// # Errors
    ///
    /// Returns `KbError::NotFound` if no custom record has `id`.
    pub fn position(&self, id: SolutionId) -> KbResult<usize> {
        self.store.position_of(id).ok_or(KbError::NotFound(id))
    }

    /// Form values for editing the custom record at `index`.
    pub fn edit_form(&self, index: usize) -> KbResult<SolutionInput> {
        let record = self.store.custom_at(index)?;
        Ok(SolutionInput::from_solution(&record.solution))
    }

    /// Last successful mirror call of this session, if any.
    pub fn last_synced(&self) -> Option<&SyncMark> {
        self.last_synced.as_ref()
    }

    /// `true` if the remote acknowledged the current revision during this session.
    pub fn is_remote_current(&self) -> bool {
        self.last_synced
            .is_some_and(|mark| mark.revision == self.store.revision())
    }

    pub fn sync_summary(&self) -> SyncSummary {
        self.store
            .custom()
            .iter()
            .fold(SyncSummary::default(), |mut summary, record| {
                match record.sync {
                    SyncStatus::Pending => summary.pending += 1,
                    SyncStatus::Synced => summary.synced += 1,
                    SyncStatus::LocalOnly => summary.local_only += 1,
                }
                summary
            })
    }

    /// Validates `input` and appends it to the custom collection.
    pub async fn create(&mut self, input: &SolutionInput) -> KbResult<MutationReport> {
        let record = CustomSolution::new(input.validate()?);
        let id = record.id;

        let mut next = self.store.custom().to_vec();
        next.push(record);
        let index = next.len() - 1;

        self.commit(MutationKind::Created, id, index, next).await
    }

    /// Validates `input` and replaces the custom record at `index`, keeping its id.
    pub async fn update(
        &mut self,
        index: usize,
        input: &SolutionInput,
    ) -> KbResult<MutationReport> {
        let solution = input.validate()?;
        let id = self.store.custom_at(index)?.id;

        let mut next = self.store.custom().to_vec();
        next[index] = CustomSolution {
            id,
            sync: SyncStatus::Pending,
            solution,
        };

        self.commit(MutationKind::Updated, id, index, next).await
    }

    pub async fn update_by_id(
        &mut self,
        id: SolutionId,
        input: &SolutionInput,
    ) -> KbResult<MutationReport> {
        let index = self.position(id)?;
        self.update(index, input).await
    }

    /// Removes the custom record at `index`; later records shift down by one.
    pub async fn delete(&mut self, index: usize) -> KbResult<MutationReport> {
        let id = self.store.custom_at(index)?.id;

        let mut next = self.store.custom().to_vec();
        next.remove(index);

        self.commit(MutationKind::Deleted, id, index, next).await
    }

    pub async fn delete_by_id(&mut self, id: SolutionId) -> KbResult<MutationReport> {
        let index = self.position(id)?;
        self.delete(index).await
    }

    /// Pushes the current unioned collection to the mirror again.
    pub async fn sync(&mut self) -> RemoteOutcome {
        self.push_to_mirror().await
    }

    /// Reads the collection the remote currently holds, without validating its entries.
    pub async fn fetch_remote(&self) -> KbResult<Vec<serde_json::Value>> {
        self.mirror.fetch().await
    }

    async fn commit(
        &mut self,
        kind: MutationKind,
        id: SolutionId,
        index: usize,
        next: Vec<CustomSolution>,
    ) -> KbResult<MutationReport> {
        self.local.save(&next)?;
        let revision = self.store.replace_custom(next);
        tracing::info!(?kind, %id, index, revision, "saved locally");

        let remote = self.push_to_mirror().await;
        Ok(MutationReport {
            kind,
            id,
            index,
            revision,
            remote,
        })
    }

    async fn push_to_mirror(&mut self) -> RemoteOutcome {
        let revision = self.store.revision();
        let full = self.store.union();

        let outcome = match self.mirror.replace(&full).await {
            Ok(receipt) => {
                for record in self.store.custom_mut() {
                    record.sync = SyncStatus::Synced;
                }
                self.last_synced = Some(SyncMark {
                    revision,
                    at: Utc::now(),
                    count: receipt.count,
                });
                tracing::info!(revision, count = receipt.count, "mirrored to remote");
                RemoteOutcome::Synced {
                    count: receipt.count,
                }
            }
            Err(e) => {
                for record in self.store.custom_mut() {
                    if record.sync != SyncStatus::Synced {
                        record.sync = SyncStatus::LocalOnly;
                    }
                }
                tracing::warn!(revision, "mirror failed, change kept locally: {}", e);
                RemoteOutcome::Unreachable {
                    reason: e.to_string(),
                }
            }
        };

        if let Err(e) = self.local.save(self.store.custom()) {
            tracing::warn!("failed to persist sync status: {}", e);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::{DisabledMirror, HttpMirror};
    use crate::notice::NoticeLevel;
    use crate::persistence::MemorySlotStore;
    use crate::solution::tests::{input, solution};
    use api_shared::SaveRes;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mirror that records every replace call and can be switched to fail.
    #[derive(Clone, Default)]
    struct RecordingMirror {
        calls: Arc<Mutex<Vec<Vec<Solution>>>>,
        failing: Arc<Mutex<bool>>,
    }

    impl RecordingMirror {
        fn fail(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }

        fn last_call(&self) -> Vec<Solution> {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl RemoteMirror for RecordingMirror {
        async fn fetch(&self) -> KbResult<Vec<serde_json::Value>> {
            let last = self.calls.lock().unwrap().last().cloned().unwrap_or_default();
            Ok(last
                .iter()
                .map(|s| serde_json::to_value(s).unwrap())
                .collect())
        }

        async fn replace(&self, full: &[Solution]) -> KbResult<SaveRes> {
            if *self.failing.lock().unwrap() {
                return Err(KbError::RemoteUnavailable("connection refused".into()));
            }
            self.calls.lock().unwrap().push(full.to_vec());
            Ok(SaveRes::ok("bot.json updated successfully", full.len()))
        }

        async fn append(&self, _solution: &Solution) -> KbResult<SaveRes> {
            unreachable!("the service always mirrors with replace")
        }
    }

    /// Slot store whose writes always fail.
    struct ReadOnlySlotStore;

    impl SlotStore for ReadOnlySlotStore {
        fn get(&self, _key: &str) -> KbResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> KbResult<()> {
            Err(KbError::SlotWrite(kb_files::FilesError::InvalidPath(
                "read-only".into(),
            )))
        }
    }

    fn base() -> Vec<Solution> {
        vec![solution("Teams camera not working", "camera, teams")]
    }

    fn service() -> (
        SolutionService<MemorySlotStore, RecordingMirror>,
        MemorySlotStore,
        RecordingMirror,
    ) {
        let slots = MemorySlotStore::new();
        let mirror = RecordingMirror::default();
        let service = SolutionService::new(
            base(),
            LocalPersistence::new(slots.clone()),
            mirror.clone(),
        );
        (service, slots, mirror)
    }

    fn contents(
        service: &SolutionService<MemorySlotStore, RecordingMirror>,
    ) -> Vec<(SolutionId, Solution)> {
        service
            .store()
            .custom()
            .iter()
            .map(|r| (r.id, r.solution.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_appends_persists_and_mirrors() {
        let (mut service, slots, mirror) = service();

        let report = service.create(&input("VPN drops", "vpn")).await.unwrap();

        assert_eq!(report.kind, MutationKind::Created);
        assert_eq!(report.index, 0);
        assert_eq!(report.phase(), PersistPhase::RemoteSynced);
        assert_eq!(report.notice().level, NoticeLevel::Success);
        assert_eq!(service.store().custom().len(), 1);

        let reloaded = LocalPersistence::new(slots).load();
        assert_eq!(reloaded[0].id, report.id);
        assert_eq!(reloaded[0].sync, SyncStatus::Synced);

        let mirrored = mirror.last_call();
        let titles: Vec<&str> = mirrored.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Teams camera not working", "VPN drops"]);
        assert!(service.is_remote_current());
    }

    #[tokio::test]
    async fn test_create_with_empty_title_is_rejected() {
        let (mut service, slots, mirror) = service();
        service.create(&input("Existing", "x")).await.unwrap();
        let before = service.store().custom().len();

        let mut form = input("ignored", "camera");
        form.title = "   ".into();
        let result = service.create(&form).await;

        assert!(matches!(result, Err(KbError::Validation(_))));
        assert_eq!(service.store().custom().len(), before);
        assert_eq!(LocalPersistence::new(slots).load().len(), before);
        assert_eq!(mirror.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_each_missing_required_field() {
        let (mut service, _, _) = service();
        let blankers: [fn(&mut SolutionInput); 4] = [
            |f| f.title.clear(),
            |f| f.problem_statement = " ".into(),
            |f| f.description.clear(),
            |f| f.triggers = " , ,".into(),
        ];

        for blank in blankers {
            let mut form = input("Printer offline", "printer");
            blank(&mut form);
            assert!(matches!(
                service.create(&form).await,
                Err(KbError::Validation(_))
            ));
            assert!(service.store().custom().is_empty());
        }
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_change() {
        let (mut service, slots, mirror) = service();
        mirror.fail(true);

        let report = service.create(&input("VPN drops", "vpn")).await.unwrap();

        assert_eq!(report.phase(), PersistPhase::RemoteUnreachable);
        assert!(report.phase().is_committed());
        let notice = report.notice();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(
            notice.message,
            "Solution added (saved locally only - backend unavailable)"
        );
        assert_eq!(service.store().custom().len(), 1);
        assert_eq!(
            LocalPersistence::new(slots).load()[0].sync,
            SyncStatus::LocalOnly
        );
        assert!(!service.is_remote_current());
    }

    #[tokio::test]
    async fn test_remote_http_500_is_informational() {
        use axum::http::StatusCode;
        use axum::routing::post;

        let app = axum::Router::new().route(
            api_shared::paths::BOT,
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let slots = MemorySlotStore::new();
        let mirror = HttpMirror::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let mut service =
            SolutionService::new(base(), LocalPersistence::new(slots.clone()), mirror);

        let report = service.create(&input("VPN drops", "vpn")).await.unwrap();

        assert_eq!(report.notice().level, NoticeLevel::Info);
        assert_eq!(service.store().custom().len(), 1);
        assert_eq!(LocalPersistence::new(slots).load().len(), 1);
    }

    #[tokio::test]
    async fn test_local_save_failure_changes_nothing() {
        let mirror = RecordingMirror::default();
        let mut service = SolutionService::new(
            base(),
            LocalPersistence::new(ReadOnlySlotStore),
            mirror.clone(),
        );

        let result = service.create(&input("VPN drops", "vpn")).await;

        assert!(matches!(result, Err(KbError::SlotWrite(_))));
        assert!(service.store().custom().is_empty());
        assert_eq!(service.store().revision(), 0);
        assert!(mirror.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_collection() {
        let (mut service, _, _) = service();
        service.create(&input("First", "one")).await.unwrap();
        service.create(&input("Second", "two")).await.unwrap();
        let before = contents(&service);

        let created = service.create(&input("Third", "three")).await.unwrap();
        let deleted = service.delete(created.index).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert_eq!(deleted.notice().message, "Solution deleted successfully!");

        assert_eq!(contents(&service), before);
    }

    #[tokio::test]
    async fn test_update_twice_restores_element() {
        let (mut service, _, _) = service();
        service.create(&input("First", "one")).await.unwrap();
        service.create(&input("Second", "two")).await.unwrap();
        let before = contents(&service);

        let original = service.edit_form(1).unwrap();
        service.update(1, &input("Changed", "changed")).await.unwrap();
        assert_eq!(service.store().custom()[1].solution.title.as_str(), "Changed");

        service.update(1, &original).await.unwrap();
        assert_eq!(contents(&service), before);
    }

    #[tokio::test]
    async fn test_out_of_bounds_is_rejected_without_change() {
        let (mut service, _, mirror) = service();
        service.create(&input("Only", "only")).await.unwrap();
        let revision = service.store().revision();

        assert!(matches!(
            service.update(1, &input("X", "x")).await,
            Err(KbError::OutOfBounds { index: 1, len: 1 })
        ));
        assert!(matches!(
            service.delete(5).await,
            Err(KbError::OutOfBounds { index: 5, len: 1 })
        ));
        assert!(matches!(service.edit_form(1), Err(KbError::OutOfBounds { .. })));
        assert_eq!(service.store().revision(), revision);
        assert_eq!(mirror.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_with_invalid_form_changes_nothing() {
        let (mut service, slots, mirror) = service();
        service.create(&input("Only", "only")).await.unwrap();
        let before = contents(&service);
        let revision = service.store().revision();

        let mut form = service.edit_form(0).unwrap();
        form.title = "  ".into();

        assert!(matches!(
            service.update(0, &form).await,
            Err(KbError::Validation(_))
        ));
        assert_eq!(contents(&service), before);
        assert_eq!(service.store().revision(), revision);
        assert_eq!(LocalPersistence::new(slots).load()[0].solution, before[0].1);
        assert_eq!(mirror.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_record_id_is_stable_across_sessions() {
        let slots = MemorySlotStore::new();
        slots
            .set(
                crate::constants::STORAGE_KEY,
                r#"[{"title":"Legacy printer fix","problem_statement":"p",
                     "description":"1) Restart",
                     "action":{"trigger":["printer"],"next_step":"n"}}]"#,
            )
            .unwrap();

        let first = SolutionService::new(
            base(),
            LocalPersistence::new(slots.clone()),
            RecordingMirror::default(),
        );
        let id = first.store().custom()[0].id;
        drop(first);

        let mut second = SolutionService::new(
            base(),
            LocalPersistence::new(slots.clone()),
            RecordingMirror::default(),
        );
        assert_eq!(second.store().custom()[0].id, id);

        let report = second.delete_by_id(id).await.unwrap();
        assert_eq!(report.id, id);
        assert!(second.store().custom().is_empty());
    }

    #[tokio::test]
    async fn test_sync_mark_is_per_session_but_status_persists() {
        let (mut service, slots, _) = service();
        service.create(&input("Synced", "synced")).await.unwrap();
        assert!(service.last_synced().is_some());
        drop(service);

        let reopened = SolutionService::new(
            base(),
            LocalPersistence::new(slots),
            RecordingMirror::default(),
        );
        assert!(reopened.last_synced().is_none());
        assert!(!reopened.is_remote_current());
        assert_eq!(reopened.sync_summary().synced, 1);
    }

    #[tokio::test]
    async fn test_id_survives_delete_of_earlier_record() {
        let (mut service, _, _) = service();
        service.create(&input("First", "one")).await.unwrap();
        let second = service.create(&input("Second", "two")).await.unwrap();

        service.delete(0).await.unwrap();
        assert_eq!(service.position(second.id).unwrap(), 0);

        let report = service
            .update_by_id(second.id, &input("Second edited", "two"))
            .await
            .unwrap();
        assert_eq!(report.index, 0);
        assert_eq!(report.id, second.id);

        service.delete_by_id(second.id).await.unwrap();
        assert!(matches!(
            service.delete_by_id(second.id).await,
            Err(KbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_base_collection_is_never_mutated() {
        let (mut service, _, mirror) = service();
        service.create(&input("Custom", "custom")).await.unwrap();
        service.delete(0).await.unwrap();

        assert_eq!(service.store().base(), base().as_slice());
        assert_eq!(mirror.last_call(), base());
    }

    #[tokio::test]
    async fn test_sync_summary_and_retry() {
        let (mut service, _, mirror) = service();
        mirror.fail(true);
        service.create(&input("First", "one")).await.unwrap();
        service.create(&input("Second", "two")).await.unwrap();
        assert_eq!(
            service.sync_summary(),
            SyncSummary {
                pending: 0,
                synced: 0,
                local_only: 2
            }
        );

        mirror.fail(false);
        let outcome = service.sync().await;

        assert_eq!(outcome, RemoteOutcome::Synced { count: 3 });
        assert_eq!(service.sync_summary().synced, 2);
        assert!(service.is_remote_current());
    }

    #[tokio::test]
    async fn test_search_sees_custom_records() {
        let (mut service, _, _) = service();
        service
            .create(&input("Camera flickers", "flicker"))
            .await
            .unwrap();

        let hits = service.search("cam");
        assert_eq!(hits.len(), 2);
        assert!(hits[1].origin.is_custom());
        assert_eq!(service.entry(1).unwrap().solution.title.as_str(), "Camera flickers");
        assert!(service.search(" ").is_empty());
    }

    #[tokio::test]
    async fn test_disabled_mirror_reports_local_only() {
        let mut service = SolutionService::new(
            base(),
            LocalPersistence::new(MemorySlotStore::new()),
            DisabledMirror,
        );

        let report = service.delete(0).await;
        assert!(matches!(report, Err(KbError::OutOfBounds { .. })));

        let report = service.create(&input("Offline", "offline")).await.unwrap();
        assert_eq!(report.phase(), PersistPhase::RemoteUnreachable);
    }

    #[test]
    fn test_persist_phase_transitions() {
        use PersistPhase::*;

        assert!(Validated.can_advance_to(LocalSaved));
        assert!(Validated.can_advance_to(Invalid));
        assert!(LocalSaved.can_advance_to(RemoteSynced));
        assert!(LocalSaved.can_advance_to(RemoteUnreachable));
        assert!(!LocalSaved.can_advance_to(Invalid));
        assert!(!RemoteUnreachable.can_advance_to(RemoteSynced));
        assert!(!Invalid.is_committed());
        assert!(LocalSaved.is_committed());
    }
}
