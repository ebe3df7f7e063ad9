//! Sync controller
//!
//! Owns the edit session of one chart at a time and the write-then-reload
//! cycle shared by every mutating operation:
//!
//! ```text
//! CLOSED --open--> OPEN --switch_tab--> OPEN
//!                  OPEN --save--> COMMITTING --ok--> CLOSED
//!                                            --ok, newer edits--> OPEN
//!                                            --err-> OPEN (draft kept)
//!                  OPEN --close--> CLOSED (draft flushed, not persisted)
//! ```
//!
//! Nothing is written to application state before the backend confirms.
//! After every successful write the three collections are reloaded
//! wholesale and the view is re-rendered.

use super::backend::{Backend, ChangeAction, ChangeEvent, Collection};
use super::collaborators::{AiGenerator, Collaborators, NoticeKind, PdfExporter};
use super::search::SearchDebouncer;
use super::settings::SettingsService;
use crate::chart::{merge, DefaultContext, DraftKey, FieldId};
use crate::config::{ALERT_SOUND, SEARCH_DEBOUNCE_MS};
use crate::database::{Record, RecordPatch, User};
use crate::error::{AppError, Result};
use crate::state::{AppState, ModalTab, SharedState};
use crate::view::render_or_recover;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct SyncController {
    backend: Arc<dyn Backend>,
    state: SharedState,
    collaborators: Collaborators,
    settings: Option<SettingsService>,
    search: SearchDebouncer,
}

impl SyncController {
    pub fn new(backend: Arc<dyn Backend>, state: SharedState, collaborators: Collaborators) -> Self {
        Self {
            backend,
            state,
            collaborators,
            settings: None,
            search: SearchDebouncer::new(Duration::from_millis(SEARCH_DEBOUNCE_MS)),
        }
    }

    /// Persist preference changes through `settings`
    pub fn with_settings(mut self, settings: SettingsService) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_ai(mut self, ai: Arc<dyn AiGenerator>) -> Self {
        self.collaborators.ai = Some(ai);
        self
    }

    pub fn with_pdf(mut self, pdf: Arc<dyn PdfExporter>) -> Self {
        self.collaborators.pdf = Some(pdf);
        self
    }

    pub fn with_search_window(mut self, window: Duration) -> Self {
        self.search = SearchDebouncer::new(window);
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub(super) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub(super) fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub(super) fn settings(&self) -> Option<&SettingsService> {
        self.settings.as_ref()
    }

    pub(super) fn search(&self) -> &SearchDebouncer {
        &self.search
    }

    // ===== Render and reload =====

    /// Render the current state and hand it to the view
    pub async fn refresh_view(&self) {
        let view = {
            let state = self.state.read().await;
            render_or_recover(&state)
        };
        self.collaborators.view.present(view);
    }

    /// Replace records, alerts and tasks with the backend's current lists.
    /// On failure the previous snapshot is kept.
    pub async fn reload(&self) -> Result<()> {
        let (records, alerts, todos) = tokio::try_join!(
            self.backend.list_records(),
            self.backend.list_alerts(),
            self.backend.list_todos(),
        )?;

        tracing::debug!(
            "Reloaded {} records, {} alerts, {} tasks",
            records.len(),
            alerts.len(),
            todos.len()
        );

        self.state.write().await.replace_collections(records, alerts, todos);
        Ok(())
    }

    pub async fn reload_and_render(&self) -> Result<()> {
        let result = self.reload().await;
        if let Err(e) = &result {
            tracing::error!("Failed to reload collections: {}", e);
            self.report(e);
        }
        self.refresh_view().await;
        result
    }

    /// Reload after a confirmed write. Reload failures are already reported.
    pub(super) async fn settle(&self) {
        let _ = self.reload_and_render().await;
    }

    /// Surface an error as a transient notification
    pub(super) fn report(&self, err: &AppError) {
        let kind = if err.is_validation() {
            NoticeKind::Warning
        } else {
            NoticeKind::Error
        };
        self.collaborators.notifier.notify(kind, &err.to_string());
    }

    pub(super) fn fail<T>(&self, err: AppError) -> Result<T> {
        tracing::warn!("Operation failed: {}", err);
        self.report(&err);
        Err(err)
    }

    /// Trimmed `value`, or a reported validation error when it is blank
    pub(super) fn require(&self, value: &str, message: &str) -> Result<String> {
        let value = value.trim();
        if value.is_empty() {
            return self.fail(AppError::Validation(message.to_string()));
        }
        Ok(value.to_string())
    }

    /// Settle after success, report on failure
    pub(super) async fn finish_write<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.settle().await;
                Ok(value)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Build a patch from the loaded copy of a chart and write it
    pub(super) async fn patch_record<F>(&self, record_id: &str, build: F) -> Result<Record>
    where
        F: FnOnce(&Record) -> Result<RecordPatch>,
    {
        let patch = {
            let state = self.state.read().await;
            let Some(record) = state.find_record(record_id) else {
                return self.fail(AppError::RecordNotFound(record_id.to_string()));
            };
            match build(record) {
                Ok(patch) => patch,
                Err(e) => return self.fail(e),
            }
        };

        let result = self.backend.update_record(record_id, patch).await;
        self.finish_write(result).await
    }

    // ===== Authentication =====

    pub async fn sign_in(&self, user: User) -> Result<()> {
        tracing::info!("Signed in as {}", user.email);
        self.state.write().await.user = Some(user);
        self.reload_and_render().await
    }

    /// Reset all session state. Device preferences are kept.
    pub async fn sign_out(&self) {
        {
            let mut state = self.state.write().await;
            let fresh = AppState {
                language: state.language,
                ai_language: state.ai_language,
                dark_mode: state.dark_mode,
                signature: std::mem::take(&mut state.signature),
                ..Default::default()
            };
            *state = fresh;
        }
        tracing::info!("Signed out");
        self.refresh_view().await;
    }

    // ===== Edit session =====

    /// Open the editor on a blank chart
    pub async fn open_new(&self) {
        {
            let mut state = self.state.write().await;
            state.drafts.clear_draft(&DraftKey::New);
            open_session(&mut state, None);
        }
        tracing::debug!("Opened editor for new chart");
        self.refresh_view().await;
    }

    /// Open the editor on a loaded chart, always from a clean draft
    pub async fn open_for_edit(&self, record_id: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if state.find_record(record_id).is_none() {
                return self.fail(AppError::RecordNotFound(record_id.to_string()));
            }
            state.drafts.clear_draft(&DraftKey::Record(record_id.to_string()));
            open_session(&mut state, Some(record_id));
        }
        tracing::debug!("Opened editor for {}", record_id);
        self.refresh_view().await;
        Ok(())
    }

    /// Switch editor tab; the draft is untouched
    pub async fn switch_tab(&self, tab: ModalTab) {
        {
            let mut state = self.state.write().await;
            if !state.modal_open {
                return;
            }
            state.modal_tab = tab;
        }
        self.refresh_view().await;
    }

    /// Record one input event from the open editor
    pub async fn input(&self, identifier: &str, value: &str) -> Option<FieldId> {
        let mut state = self.state.write().await;
        let key = state.open_draft_key()?;
        state.drafts.record_input(&key, identifier, value)
    }

    /// Close without saving. Pending form values are flushed into the draft
    /// but nothing is persisted.
    pub async fn close(&self, pending: &[(&str, &str)]) {
        {
            let mut state = self.state.write().await;
            if let Some(key) = state.open_draft_key() {
                let entries: Vec<(FieldId, String)> = pending
                    .iter()
                    .filter_map(|(identifier, value)| {
                        FieldId::decode(identifier).map(|field| (field, value.to_string()))
                    })
                    .collect();
                state.drafts.flush(&key, entries);
            }
            close_session(&mut state);
        }
        self.refresh_view().await;
    }

    /// Merge the open draft over the loaded chart and commit it.
    ///
    /// On failure the draft and the loaded collections stay exactly as they
    /// were so the user can retry.
    pub async fn save(&self) -> Result<Record> {
        let (key, session, committed, payload) = {
            let state = self.state.read().await;
            let Some(key) = state.open_draft_key() else {
                return self.fail(AppError::Validation("No chart is open".to_string()));
            };
            let persisted = state.selected_record();
            if let (Some(id), None) = (key.record_id(), persisted) {
                return self.fail(AppError::RecordNotFound(id.to_string()));
            }

            let ctx = DefaultContext::new(state.language);
            let committed = state.drafts.get_draft(&key).clone();
            let payload = merge(&committed, persisted, &ctx);
            (key, state.edit_session, committed, payload)
        };

        tracing::info!("Committing chart {}", key);

        let result = match key.record_id() {
            Some(id) => self.backend.update_record(id, RecordPatch::from_editor(payload)).await,
            None => self.backend.create_record(payload).await,
        };

        let saved = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Failed to commit chart {}: {}", key, e);
                return self.fail(e);
            }
        };

        {
            let mut state = self.state.write().await;
            let same_session = state.edit_session == session;
            // A blank chart opened meanwhile starts from its own draft
            if same_session || key.record_id().is_some() {
                let pending = state.drafts.release_committed(&key, &committed);
                if same_session && !pending {
                    close_session(&mut state);
                } else if same_session {
                    if let (DraftKey::New, Some(id)) = (&key, saved.id()) {
                        let id = id.to_string();
                        state.drafts.rekey(&key, DraftKey::Record(id.clone()));
                        state.selected_record_id = Some(id);
                    }
                    tracing::info!("Editor kept open for edits made during the save");
                }
            }
        }

        self.collaborators
            .notifier
            .notify(NoticeKind::Success, &format!("Saved chart for {}", saved.name));
        self.settle().await;

        Ok(saved)
    }

    // ===== Realtime =====

    /// React to one push event: full reload and render, plus the alert
    /// sound for newly created alerts.
    pub async fn handle_change(&self, event: &ChangeEvent) {
        tracing::debug!("Remote change on {}: {:?} {}", event.collection, event.action, event.id);

        self.settle().await;

        if event.collection == Collection::Alerts && event.action == ChangeAction::Create {
            self.collaborators.notifier.play_sound(ALERT_SOUND);
        }
    }

    /// Subscribe to all collections and handle events until the feed closes.
    ///
    /// Subscriptions are taken before this returns, so no event published
    /// afterwards is missed.
    pub fn start_realtime(&self) -> JoinHandle<()> {
        let mut records = self.backend.subscribe(Collection::Records);
        let mut alerts = self.backend.subscribe(Collection::Alerts);
        let mut todos = self.backend.subscribe(Collection::Todos);
        let controller = self.clone();

        tokio::spawn(async move {
            tracing::info!("Listening for backend changes");

            loop {
                let received = tokio::select! {
                    event = records.recv() => event,
                    event = alerts.recv() => event,
                    event = todos.recv() => event,
                };

                match received {
                    Ok(event) => controller.handle_change(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Change feed lagged by {} events, reloading", skipped);
                        controller.settle().await;
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Change feed closed");
                        break;
                    }
                }
            }
        })
    }
}

fn open_session(state: &mut AppState, record_id: Option<&str>) {
    state.selected_record_id = record_id.map(str::to_string);
    state.modal_open = true;
    state.modal_tab = ModalTab::Identification;
    state.edit_session += 1;
}

pub(super) fn close_session(state: &mut AppState) {
    state.modal_open = false;
    state.selected_record_id = None;
    state.modal_tab = ModalTab::Identification;
    state.edit_session += 1;
}
