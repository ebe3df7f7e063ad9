//! Test doubles shared by the service unit tests

use super::backend::SqliteBackend;
use super::collaborators::{Collaborators, NoticeKind, Notifier, ViewSink};
use super::sync::SyncController;
use crate::database::{initialize_database, Repository, User};
use crate::state::SharedState;
use crate::view::Node;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct RecordingView {
    views: Mutex<Vec<Node>>,
}

impl RecordingView {
    pub fn count(&self) -> usize {
        self.views.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Node> {
        self.views.lock().unwrap().last().cloned()
    }
}

impl ViewSink for RecordingView {
    fn present(&self, view: Node) {
        self.views.lock().unwrap().push(view);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(NoticeKind, String)>>,
    sounds: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.lock().unwrap().iter().map(|(kind, _)| *kind).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn sounds(&self) -> Vec<String> {
        self.sounds.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices.lock().unwrap().push((kind, message.to_string()));
    }

    fn play_sound(&self, sound: &str) {
        self.sounds.lock().unwrap().push(sound.to_string());
    }
}

pub async fn memory_backend() -> Arc<SqliteBackend> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    initialize_database(&pool).await.unwrap();
    Arc::new(SqliteBackend::new(Repository::new(pool)))
}

pub async fn test_controller() -> (SyncController, Arc<RecordingView>, Arc<RecordingNotifier>) {
    let view = Arc::new(RecordingView::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = SyncController::new(
        memory_backend().await,
        SharedState::default(),
        Collaborators::new(view.clone(), notifier.clone()),
    )
    .with_search_window(Duration::from_millis(20));

    (controller, view, notifier)
}

pub fn user() -> User {
    User {
        id: "nurse-1".to_string(),
        email: "mariam@ward.test".to_string(),
        name: "Mariam".to_string(),
    }
}
