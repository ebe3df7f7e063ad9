//! View filters and device preferences
//!
//! Language, dark mode and signature are saved to the settings file when a
//! settings service is attached. A failed save is reported but the change
//! still applies for this session.

use super::settings::LocalSettings;
use super::sync::SyncController;
use crate::database::RecordStatus;
use crate::i18n::Language;
use crate::state::{AppState, View};
use tokio::task::JoinHandle;

fn local_settings(state: &AppState) -> LocalSettings {
    LocalSettings {
        language: state.language,
        ai_language: state.ai_language,
        dark_mode: state.dark_mode,
        signature: state.signature.clone(),
    }
}

impl SyncController {
    pub async fn set_view(&self, view: View) {
        self.state().write().await.current_view = view;
        self.refresh_view().await;
    }

    /// Switch the ward list between active and discharged charts
    pub async fn set_status_tab(&self, status: RecordStatus) {
        self.state().write().await.active_tab = status;
        self.refresh_view().await;
    }

    /// Debounced search box input; only the last keystroke in the quiet
    /// window filters and renders
    pub fn search_input(&self, query: impl Into<String>) -> JoinHandle<bool> {
        let controller = self.clone();
        let query = query.into();
        self.search()
            .trigger(move || async move { controller.apply_search(query).await })
    }

    /// Apply a search query immediately
    pub async fn apply_search(&self, query: String) {
        tracing::debug!("Applying search query: {:?}", query);
        self.state().write().await.search_query = query;
        self.refresh_view().await;
    }

    pub async fn set_language(&self, language: Language) {
        self.update_preferences(|state| state.language = language).await;
    }

    pub async fn set_ai_language(&self, language: Language) {
        self.update_preferences(|state| state.ai_language = language).await;
    }

    /// Returns the new dark mode flag
    pub async fn toggle_dark_mode(&self) -> bool {
        self.update_preferences(|state| state.dark_mode = !state.dark_mode)
            .await
            .dark_mode
    }

    pub async fn set_signature(&self, signature: &str) {
        let signature = signature.trim().to_string();
        self.update_preferences(|state| state.signature = signature).await;
    }

    async fn update_preferences<F>(&self, change: F) -> LocalSettings
    where
        F: FnOnce(&mut AppState),
    {
        let settings = {
            let mut state = self.state().write().await;
            change(&mut state);
            local_settings(&state)
        };

        if let Some(service) = self.settings() {
            if let Err(e) = service.save(&settings).await {
                tracing::error!("Failed to save settings: {}", e);
                self.report(&e);
            }
        }

        self.refresh_view().await;
        settings
    }
}
