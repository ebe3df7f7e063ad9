//! Application setup
//!
//! Builds every service once on startup and hands the assembled context to
//! the host. Nothing here is global; each call to [`setup`] produces an
//! independent instance.

use crate::config::DATABASE_FILE;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{Collaborators, ReminderService, SettingsService, SqliteBackend, SyncController};
use crate::state::{AppState, SharedState};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a host needs to drive the engine
#[derive(Clone)]
pub struct AppContext {
    pub app_data_dir: PathBuf,
    pub backend: Arc<SqliteBackend>,
    pub controller: SyncController,
    pub reminders: ReminderService,
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: PathBuf, collaborators: Collaborators) -> Result<AppContext> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(&app_data_dir)?;
    std::fs::create_dir_all(app_data_dir.join("exports"))?;

    let settings = SettingsService::new(app_data_dir.clone());
    let local = settings.load().await?;

    let pool = create_pool(&app_data_dir.join(DATABASE_FILE)).await?;
    let backend = Arc::new(SqliteBackend::new(Repository::new(pool)));

    let state = SharedState::new(AppState::with_settings(&local));
    let reminders = ReminderService::new(state.clone(), collaborators.notifier.clone());
    let controller = SyncController::new(backend.clone(), state, collaborators).with_settings(settings);

    tracing::info!("Application initialized successfully");

    Ok(AppContext {
        app_data_dir,
        backend,
        controller,
        reminders,
    })
}
