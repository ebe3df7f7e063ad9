//! Integration tests for the ISBAR chart engine
//!
//! These tests drive the sync controller end to end against a file-backed
//! SQLite store:
//! - Editor sessions, merge and commit
//! - Backend failures
//! - Realtime invalidation
//! - Ward list filtering and render recovery

use chrono::Local;
use isbar_chart::chart::{DraftKey, FieldId};
use isbar_chart::config::{ALERT_SOUND, DATABASE_FILE};
use isbar_chart::database::{
    create_pool, Alert, AlertCategory, AlertPatch, FallRisk, NewAlert, NewMedication, NewTodo, Priority, Record,
    RecordPatch, RecordStatus, Repository, Todo, TodoPatch, YesNo,
};
use isbar_chart::error::{AppError, Result};
use isbar_chart::services::{
    Backend, ChangeEvent, Collaborators, Collection, NoticeKind, Notifier, SqliteBackend,
    SyncController, ViewSink,
};
use isbar_chart::state::{ModalTab, SharedState};
use isbar_chart::view::Node;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

// ===== Test doubles =====

#[derive(Default)]
struct RecordingView {
    views: Mutex<Vec<Node>>,
}

impl RecordingView {
    fn count(&self) -> usize {
        self.views.lock().unwrap().len()
    }

    fn last(&self) -> Node {
        self.views.lock().unwrap().last().cloned().unwrap()
    }
}

impl ViewSink for RecordingView {
    fn present(&self, view: Node) {
        self.views.lock().unwrap().push(view);
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: Mutex<Vec<NoticeKind>>,
    sounds: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.lock().unwrap().clone()
    }

    fn sounds(&self) -> Vec<String> {
        self.sounds.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, _message: &str) {
        self.notices.lock().unwrap().push(kind);
    }

    fn play_sound(&self, sound: &str) {
        self.sounds.lock().unwrap().push(sound.to_string());
    }
}

/// Wraps the real backend; counts reloads and can reject or slow down
/// every write
struct FlakyBackend {
    inner: SqliteBackend,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    write_delay_ms: AtomicU64,
    record_lists: AtomicUsize,
}

impl FlakyBackend {
    fn new(inner: SqliteBackend) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            write_delay_ms: AtomicU64::new(0),
            record_lists: AtomicUsize::new(0),
        }
    }

    async fn check_write(&self) -> Result<()> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Backend("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Backend("connection refused".to_string()));
        }
        Ok(())
    }

    fn reloads(&self) -> usize {
        self.record_lists.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Backend for FlakyBackend {
    async fn list_records(&self) -> Result<Vec<Record>> {
        self.record_lists.fetch_add(1, Ordering::SeqCst);
        self.check_read()?;
        self.inner.list_records().await
    }

    async fn create_record(&self, payload: Record) -> Result<Record> {
        self.check_write().await?;
        self.inner.create_record(payload).await
    }

    async fn update_record(&self, id: &str, patch: RecordPatch) -> Result<Record> {
        self.check_write().await?;
        self.inner.update_record(id, patch).await
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.check_write().await?;
        self.inner.delete_record(id).await
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.check_read()?;
        self.inner.list_alerts().await
    }

    async fn create_alert(&self, req: NewAlert) -> Result<Alert> {
        self.check_write().await?;
        self.inner.create_alert(req).await
    }

    async fn update_alert(&self, id: &str, patch: AlertPatch) -> Result<Alert> {
        self.check_write().await?;
        self.inner.update_alert(id, patch).await
    }

    async fn delete_alert(&self, id: &str) -> Result<()> {
        self.check_write().await?;
        self.inner.delete_alert(id).await
    }

    async fn list_todos(&self) -> Result<Vec<Todo>> {
        self.check_read()?;
        self.inner.list_todos().await
    }

    async fn create_todo(&self, req: NewTodo) -> Result<Todo> {
        self.check_write().await?;
        self.inner.create_todo(req).await
    }

    async fn update_todo(&self, id: &str, patch: TodoPatch) -> Result<Todo> {
        self.check_write().await?;
        self.inner.update_todo(id, patch).await
    }

    async fn delete_todo(&self, id: &str) -> Result<()> {
        self.check_write().await?;
        self.inner.delete_todo(id).await
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        self.inner.subscribe(collection)
    }
}

struct Harness {
    controller: SyncController,
    backend: Arc<FlakyBackend>,
    view: Arc<RecordingView>,
    notifier: Arc<RecordingNotifier>,
    _temp: TempDir,
}

/// Signed-in controller over a fresh database file
async fn create_harness() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let pool = create_pool(&temp_dir.path().join(DATABASE_FILE)).await.unwrap();
    let backend = Arc::new(FlakyBackend::new(SqliteBackend::new(Repository::new(pool))));
    let view = Arc::new(RecordingView::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let controller = SyncController::new(
        backend.clone(),
        SharedState::default(),
        Collaborators::new(view.clone(), notifier.clone()),
    );
    controller
        .sign_in(isbar_chart::database::User {
            id: "nurse-1".to_string(),
            email: "mariam@ward.test".to_string(),
            name: "Mariam".to_string(),
        })
        .await
        .unwrap();

    Harness {
        controller,
        backend,
        view,
        notifier,
        _temp: temp_dir,
    }
}

async fn new_chart(controller: &SyncController, entries: &[(&str, &str)]) -> Record {
    controller.open_new().await;
    for (identifier, value) in entries {
        controller.input(identifier, value).await;
    }
    controller.save().await.unwrap()
}

async fn loaded(controller: &SyncController, id: &str) -> Record {
    controller.state().read().await.find_record(id).cloned().unwrap()
}

async fn wait_for_renders(view: &RecordingView, expected: usize) {
    for _ in 0..200 {
        if view.count() >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // Give any unexpected extra event a chance to show up
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn alert(title: &str) -> NewAlert {
    NewAlert {
        title: title.to_string(),
        message: "Spill near bed 4".to_string(),
        category: AlertCategory::Hazard,
        priority: Priority::High,
        patient_id: None,
        patient_name: None,
        source: "ward".to_string(),
    }
}

// ===== Editor sessions =====

#[tokio::test]
async fn test_new_record_through_all_tabs_gets_defaults() {
    let h = create_harness().await;

    h.controller.open_new().await;
    h.controller.input("patientName", "Aisha").await;
    h.controller.input("roomNumber", "204").await;
    for tab in ModalTab::ALL {
        h.controller.switch_tab(tab).await;
    }
    let saved = h.controller.save().await.unwrap();
    let today = Local::now().format("%Y-%m-%d").to_string();

    let record = loaded(&h.controller, saved.id().unwrap()).await;
    assert_eq!(record.name, "Aisha");
    assert_eq!(record.isbar.identification.patient_name, "Aisha");
    assert_eq!(record.room_number, "204");
    assert_eq!(record.isbar.identification.room_no, "204");
    assert_eq!(record.status, RecordStatus::Active);

    assert!(record.file_number.starts_with("MRN"));
    assert_eq!(record.file_number.len(), 9);
    assert!(record.file_number[3..].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(record.isbar.identification.mrn, record.file_number);

    assert_eq!(record.isbar.identification.admission_date, today);
    assert_eq!(record.isbar.background.allergy, "None");
    assert_eq!(record.isbar.background.isolation, "None");
    assert_eq!(record.isbar.assessment.gcs, "15");
    assert_eq!(record.isbar.assessment.fall_risk, Some(FallRisk::Low));
    assert_eq!(record.isbar.assessment.bed_sore, Some(YesNo::No));
    assert_eq!(record.isbar.assessment.restraint, Some(YesNo::No));
    assert_eq!(record.diagnosis, "");
    assert_eq!(record.isbar.recommendations.plan, "");
    assert!(record.medications.is_empty());
    assert!(record.isbar.shift_notes.is_empty());
}

#[tokio::test]
async fn test_editing_gcs_keeps_allergy() {
    let h = create_harness().await;
    let saved = new_chart(&h.controller, &[("patientName", "Omar"), ("allergy", "Penicillin")]).await;
    let id = saved.id.clone().unwrap();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.switch_tab(ModalTab::Assessment).await;
    h.controller.input("gcs", "10").await;
    h.controller.save().await.unwrap();

    let record = loaded(&h.controller, &id).await;
    assert_eq!(record.isbar.background.allergy, "Penicillin");
    assert_eq!(record.isbar.assessment.gcs, "10");
    assert_eq!(record.file_number, saved.file_number);
}

#[tokio::test]
async fn test_untouched_tab_is_unchanged_after_save() {
    let h = create_harness().await;
    let saved = new_chart(
        &h.controller,
        &[("patientName", "Layla"), ("vitals", "BP 120/80"), ("fallRisk", "high")],
    )
    .await;
    let id = saved.id.clone().unwrap();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.switch_tab(ModalTab::Situation).await;
    h.controller.input("diet", "Diabetic").await;
    h.controller.switch_tab(ModalTab::Assessment).await;
    h.controller.save().await.unwrap();

    let record = loaded(&h.controller, &id).await;
    assert_eq!(record.isbar.situation.diet, "Diabetic");
    assert_eq!(record.isbar.assessment, saved.isbar.assessment);
    assert_eq!(record.isbar.background, saved.isbar.background);
}

#[tokio::test]
async fn test_cleared_draft_value_keeps_persisted() {
    let h = create_harness().await;
    let saved = new_chart(&h.controller, &[("patientName", "Yusuf"), ("diagnosis", "COPD")]).await;
    let id = saved.id.clone().unwrap();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("diagnosis", "Asthma").await;
    h.controller.input("diagnosis", "").await;
    h.controller.save().await.unwrap();

    let record = loaded(&h.controller, &id).await;
    assert_eq!(record.diagnosis, "COPD");
    assert_eq!(record.isbar.situation.diagnosis, "COPD");
}

#[tokio::test]
async fn test_reopen_starts_with_empty_draft() {
    let h = create_harness().await;
    let saved = new_chart(&h.controller, &[("patientName", "Aisha")]).await;
    let id = saved.id.clone().unwrap();
    let key = DraftKey::Record(id.clone());

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("plan", "Mobilise").await;
    h.controller.close(&[("risks", "Falls")]).await;
    assert!(h.controller.state().read().await.drafts.has_draft(&key));

    h.controller.open_for_edit(&id).await.unwrap();

    let state = h.controller.state().read().await;
    assert!(state.drafts.get_draft(&key).is_empty());
    assert_eq!(state.modal_tab, ModalTab::Identification);
}

#[tokio::test]
async fn test_failed_save_leaves_state_and_draft() {
    let h = create_harness().await;
    let saved = new_chart(&h.controller, &[("patientName", "Omar")]).await;
    let id = saved.id.clone().unwrap();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("diagnosis", "Sepsis").await;
    let before = h.controller.state().read().await.records.clone();

    h.backend.fail_writes.store(true, Ordering::SeqCst);
    let err = h.controller.save().await.unwrap_err();

    assert!(matches!(err, AppError::Backend(_)));
    assert_eq!(h.notifier.kinds().last(), Some(&NoticeKind::Error));

    let state = h.controller.state().read().await;
    assert_eq!(state.records, before);
    assert!(state.modal_open);
    assert_eq!(
        state
            .drafts
            .get_draft(&DraftKey::Record(id))
            .value(FieldId::Diagnosis),
        Some("Sepsis")
    );
}

#[tokio::test]
async fn test_retry_after_failure_commits_draft() {
    let h = create_harness().await;

    h.backend.fail_writes.store(true, Ordering::SeqCst);
    h.controller.open_new().await;
    h.controller.input("patientName", "Aisha").await;
    assert!(h.controller.save().await.is_err());

    h.backend.fail_writes.store(false, Ordering::SeqCst);
    let saved = h.controller.save().await.unwrap();

    assert_eq!(saved.name, "Aisha");
    assert!(h.controller.state().read().await.drafts.is_empty());
}

#[tokio::test]
async fn test_failed_reload_keeps_last_snapshot() {
    let h = create_harness().await;
    new_chart(&h.controller, &[("patientName", "Aisha")]).await;

    h.backend.fail_reads.store(true, Ordering::SeqCst);
    assert!(h.controller.reload_and_render().await.is_err());

    assert_eq!(h.controller.state().read().await.records.len(), 1);
    assert_eq!(h.notifier.kinds().last(), Some(&NoticeKind::Error));
}

// ===== Overlapping operations =====

fn heparin() -> NewMedication {
    NewMedication {
        name: "Heparin".to_string(),
        dose: "5000 units".to_string(),
        route: "SC".to_string(),
        frequency: "BID".to_string(),
    }
}

#[tokio::test]
async fn test_save_overlapping_medication_add_keeps_both() {
    let h = create_harness().await;
    let id = new_chart(&h.controller, &[("patientName", "Omar")]).await.id.unwrap();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("diet", "Soft").await;
    h.backend.write_delay_ms.store(50, Ordering::SeqCst);

    let (added, saved) = tokio::join!(h.controller.add_medication(&id, heparin()), h.controller.save());
    added.unwrap();
    saved.unwrap();
    h.controller.reload().await.unwrap();

    let record = loaded(&h.controller, &id).await;
    assert_eq!(record.isbar.situation.diet, "Soft");
    assert_eq!(record.medications.len(), 1);
    assert_eq!(record.medications[0].name, "Heparin");
}

#[tokio::test]
async fn test_typing_during_save_is_kept() {
    let h = create_harness().await;
    let id = new_chart(&h.controller, &[("patientName", "Layla")]).await.id.unwrap();
    let key = DraftKey::Record(id.clone());

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("diet", "Soft").await;
    h.backend.write_delay_ms.store(50, Ordering::SeqCst);

    let (saved, typed) = tokio::join!(h.controller.save(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.controller.input("plan", "Mobilise").await
    });
    saved.unwrap();
    assert_eq!(typed, Some(FieldId::Plan));

    {
        let state = h.controller.state().read().await;
        assert!(state.modal_open);
        assert_eq!(state.find_record(&id).unwrap().isbar.situation.diet, "Soft");
        assert_eq!(state.find_record(&id).unwrap().isbar.recommendations.plan, "");
        let draft = state.drafts.get_draft(&key);
        assert_eq!(draft.get(FieldId::Diet), None);
        assert_eq!(draft.get(FieldId::Plan), Some("Mobilise"));
    }

    h.backend.write_delay_ms.store(0, Ordering::SeqCst);
    h.controller.save().await.unwrap();

    let state = h.controller.state().read().await;
    assert!(!state.modal_open);
    assert!(state.drafts.is_empty());
    assert_eq!(state.find_record(&id).unwrap().isbar.recommendations.plan, "Mobilise");
}

#[tokio::test]
async fn test_typing_during_create_moves_to_the_new_chart() {
    let h = create_harness().await;

    h.controller.open_new().await;
    h.controller.input("patientName", "Yusuf").await;
    h.backend.write_delay_ms.store(50, Ordering::SeqCst);

    let (saved, _) = tokio::join!(h.controller.save(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.controller.input("diagnosis", "CAP").await
    });
    let id = saved.unwrap().id.unwrap();

    {
        let state = h.controller.state().read().await;
        assert!(state.modal_open);
        assert_eq!(state.selected_record_id.as_deref(), Some(id.as_str()));
        assert!(state.drafts.get_draft(&DraftKey::New).is_empty());
        assert_eq!(
            state.drafts.get_draft(&DraftKey::Record(id.clone())).get(FieldId::Diagnosis),
            Some("CAP")
        );
    }

    h.backend.write_delay_ms.store(0, Ordering::SeqCst);
    h.controller.save().await.unwrap();

    let state = h.controller.state().read().await;
    assert_eq!(state.records.len(), 1);
    assert_eq!(state.find_record(&id).unwrap().diagnosis, "CAP");
    assert!(!state.modal_open);
}

#[tokio::test]
async fn test_collection_write_on_chart_removed_meanwhile_fails() {
    let h = create_harness().await;
    let id = new_chart(&h.controller, &[("patientName", "Aisha")]).await.id.unwrap();
    h.backend.write_delay_ms.store(50, Ordering::SeqCst);

    let (added, removed) = tokio::join!(h.controller.add_medication(&id, heparin()), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.backend.inner.delete_record(&id).await
    });
    removed.unwrap();

    assert!(matches!(added, Err(AppError::RecordNotFound(_))));
    assert_eq!(h.notifier.kinds().last(), Some(&NoticeKind::Error));
    assert!(h.backend.inner.list_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_save_of_chart_removed_meanwhile_keeps_draft() {
    let h = create_harness().await;
    let id = new_chart(&h.controller, &[("patientName", "Omar")]).await.id.unwrap();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("gcs", "9").await;
    h.backend.write_delay_ms.store(50, Ordering::SeqCst);

    let (saved, removed) = tokio::join!(h.controller.save(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.backend.inner.delete_record(&id).await
    });
    removed.unwrap();

    assert!(matches!(saved, Err(AppError::RecordNotFound(_))));
    let state = h.controller.state().read().await;
    assert!(state.modal_open);
    assert_eq!(
        state.drafts.get_draft(&DraftKey::Record(id)).get(FieldId::Gcs),
        Some("9")
    );
}

// ===== Realtime =====

#[tokio::test]
async fn test_alert_create_reloads_once_and_plays_sound() {
    let h = create_harness().await;
    let listener = h.controller.start_realtime();
    let renders = h.view.count();
    let reloads = h.backend.reloads();

    let created = h.backend.create_alert(alert("Wet floor")).await.unwrap();
    wait_for_renders(&h.view, renders + 1).await;

    assert_eq!(h.view.count(), renders + 1);
    assert_eq!(h.backend.reloads(), reloads + 1);
    assert_eq!(h.notifier.sounds(), vec![ALERT_SOUND.to_string()]);
    assert_eq!(h.controller.state().read().await.alerts.len(), 1);

    h.backend
        .update_alert(&created.id, AlertPatch { read: Some(true) })
        .await
        .unwrap();
    wait_for_renders(&h.view, renders + 2).await;
    h.backend.delete_alert(&created.id).await.unwrap();
    wait_for_renders(&h.view, renders + 3).await;

    assert_eq!(h.view.count(), renders + 3);
    assert_eq!(h.backend.reloads(), reloads + 3);
    assert_eq!(h.notifier.sounds().len(), 1);
    assert!(h.controller.state().read().await.alerts.is_empty());

    listener.abort();
}

#[tokio::test]
async fn test_remote_change_does_not_touch_open_draft() {
    let h = create_harness().await;
    let saved = new_chart(&h.controller, &[("patientName", "Layla")]).await;
    let id = saved.id.clone().unwrap();
    let listener = h.controller.start_realtime();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("plan", "Oxygen wean").await;
    let renders = h.view.count();

    h.backend
        .update_record(&id, RecordPatch { age: Some("44".to_string()), ..Default::default() })
        .await
        .unwrap();
    wait_for_renders(&h.view, renders + 1).await;

    let state = h.controller.state().read().await;
    assert!(state.modal_open);
    assert_eq!(state.find_record(&id).unwrap().age, "44");
    assert_eq!(
        state.drafts.get_draft(&DraftKey::Record(id)).value(FieldId::Plan),
        Some("Oxygen wean")
    );
    assert!(h.notifier.sounds().is_empty());

    listener.abort();
}

#[tokio::test]
async fn test_remote_delete_of_open_record_shows_banner() {
    let h = create_harness().await;
    let saved = new_chart(&h.controller, &[("patientName", "Omar")]).await;
    let id = saved.id.clone().unwrap();
    let listener = h.controller.start_realtime();

    h.controller.open_for_edit(&id).await.unwrap();
    let renders = h.view.count();
    h.backend.delete_record(&id).await.unwrap();
    wait_for_renders(&h.view, renders + 1).await;

    assert!(h.view.last().find_by_id("record-removed").is_some());
    assert!(h.controller.save().await.is_err());

    listener.abort();
}

// ===== Ward list =====

#[tokio::test]
async fn test_discharged_tab_lists_only_discharged_in_order() {
    let h = create_harness().await;
    let mut ids = Vec::new();
    for name in ["Aisha", "Omar", "Layla", "Yusuf"] {
        ids.push(new_chart(&h.controller, &[("patientName", name)]).await.id.unwrap());
    }
    h.controller.discharge(&ids[0]).await.unwrap();
    h.controller.discharge(&ids[2]).await.unwrap();

    h.controller.set_status_tab(RecordStatus::Discharged).await;

    let state = h.controller.state().read().await;
    let expected: Vec<&str> = state
        .records
        .iter()
        .filter(|r| r.status == RecordStatus::Discharged)
        .filter_map(|r| r.id())
        .collect();
    let visible: Vec<&str> = state.visible_records().into_iter().filter_map(|r| r.id()).collect();
    assert_eq!(visible.len(), 2);
    assert_eq!(visible, expected);

    let cards = h.view.last();
    let rendered: Vec<&str> = cards
        .find_all(|e| e.has_class("record-card"))
        .into_iter()
        .filter_map(|e| e.get_attr("data-id"))
        .collect();
    assert_eq!(rendered, expected);
}

#[tokio::test]
async fn test_saving_discharged_chart_readmits_it() {
    let h = create_harness().await;
    let id = new_chart(&h.controller, &[("patientName", "Omar")]).await.id.unwrap();
    h.controller.discharge(&id).await.unwrap();

    h.controller.open_for_edit(&id).await.unwrap();
    h.controller.input("diet", "Soft").await;
    h.controller.save().await.unwrap();

    assert_eq!(loaded(&h.controller, &id).await.status, RecordStatus::Active);
}

#[tokio::test]
async fn test_malformed_state_renders_recovery_view() {
    let h = create_harness().await;
    let saved = new_chart(&h.controller, &[("patientName", "Aisha")]).await;
    h.controller.state().write().await.records.push(saved);

    h.controller.refresh_view().await;

    let view = h.view.last();
    assert!(view.find_by_id("render-error").is_some());
    assert!(view.find_by_id("reload").is_some());
}
