//! Persistence collaborator
//!
//! The sync controller only talks to storage through [`Backend`]. Every
//! successful write is followed by a [`ChangeEvent`] on the collection's
//! broadcast channel, which is how remote changes reach subscribers.

use crate::config::CHANGE_CHANNEL_CAPACITY;
use crate::database::{
    Alert, AlertPatch, NewAlert, NewTodo, Record, RecordPatch, Repository, Todo, TodoPatch,
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Backend-owned collections that publish change events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Records,
    Alerts,
    Todos,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Records => "records",
            Collection::Alerts => "alerts",
            Collection::Todos => "todos",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

/// Push notification that a document changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub action: ChangeAction,
    pub id: String,
}

impl ChangeEvent {
    pub fn new(collection: Collection, action: ChangeAction, id: impl Into<String>) -> Self {
        Self {
            collection,
            action,
            id: id.into(),
        }
    }
}

/// One broadcast channel per collection
#[derive(Clone)]
pub struct ChangeFeed {
    records: broadcast::Sender<ChangeEvent>,
    alerts: broadcast::Sender<ChangeEvent>,
    todos: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self {
            records: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
            alerts: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
            todos: broadcast::channel(CHANGE_CHANNEL_CAPACITY).0,
        }
    }

    fn sender(&self, collection: Collection) -> &broadcast::Sender<ChangeEvent> {
        match collection {
            Collection::Records => &self.records,
            Collection::Alerts => &self.alerts,
            Collection::Todos => &self.todos,
        }
    }

    pub fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        self.sender(collection).subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!("Change event: {} {:?} {}", event.collection, event.action, event.id);
        let _ = self.sender(event.collection).send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage for charts, alerts and tasks
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// All charts, newest first
    async fn list_records(&self) -> Result<Vec<Record>>;

    async fn create_record(&self, payload: Record) -> Result<Record>;

    /// Merge a partial payload over the stored chart
    async fn update_record(&self, id: &str, patch: RecordPatch) -> Result<Record>;

    async fn delete_record(&self, id: &str) -> Result<()>;

    async fn list_alerts(&self) -> Result<Vec<Alert>>;

    async fn create_alert(&self, req: NewAlert) -> Result<Alert>;

    async fn update_alert(&self, id: &str, patch: AlertPatch) -> Result<Alert>;

    async fn delete_alert(&self, id: &str) -> Result<()>;

    async fn list_todos(&self) -> Result<Vec<Todo>>;

    async fn create_todo(&self, req: NewTodo) -> Result<Todo>;

    async fn update_todo(&self, id: &str, patch: TodoPatch) -> Result<Todo>;

    async fn delete_todo(&self, id: &str) -> Result<()>;

    /// Change events for one collection, delivered until the backend is dropped
    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent>;
}

/// Local SQLite backend
#[derive(Clone)]
pub struct SqliteBackend {
    repo: Repository,
    feed: ChangeFeed,
}

impl SqliteBackend {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            feed: ChangeFeed::new(),
        }
    }

    fn changed(&self, collection: Collection, action: ChangeAction, id: &str) {
        self.feed.publish(ChangeEvent::new(collection, action, id));
    }
}

#[async_trait::async_trait]
impl Backend for SqliteBackend {
    async fn list_records(&self) -> Result<Vec<Record>> {
        self.repo.list_records().await
    }

    async fn create_record(&self, payload: Record) -> Result<Record> {
        let record = self.repo.create_record(payload).await?;
        self.changed(Collection::Records, ChangeAction::Create, record.id().unwrap_or_default());
        Ok(record)
    }

    async fn update_record(&self, id: &str, patch: RecordPatch) -> Result<Record> {
        let record = self.repo.update_record(id, patch).await?;
        self.changed(Collection::Records, ChangeAction::Update, id);
        Ok(record)
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.repo.delete_record(id).await?;
        self.changed(Collection::Records, ChangeAction::Delete, id);
        Ok(())
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.repo.list_alerts().await
    }

    async fn create_alert(&self, req: NewAlert) -> Result<Alert> {
        let alert = self.repo.create_alert(req).await?;
        self.changed(Collection::Alerts, ChangeAction::Create, &alert.id);
        Ok(alert)
    }

    async fn update_alert(&self, id: &str, patch: AlertPatch) -> Result<Alert> {
        let alert = self.repo.update_alert(id, patch).await?;
        self.changed(Collection::Alerts, ChangeAction::Update, id);
        Ok(alert)
    }

    async fn delete_alert(&self, id: &str) -> Result<()> {
        self.repo.delete_alert(id).await?;
        self.changed(Collection::Alerts, ChangeAction::Delete, id);
        Ok(())
    }

    async fn list_todos(&self) -> Result<Vec<Todo>> {
        self.repo.list_todos().await
    }

    async fn create_todo(&self, req: NewTodo) -> Result<Todo> {
        let todo = self.repo.create_todo(req).await?;
        self.changed(Collection::Todos, ChangeAction::Create, &todo.id);
        Ok(todo)
    }

    async fn update_todo(&self, id: &str, patch: TodoPatch) -> Result<Todo> {
        let todo = self.repo.update_todo(id, patch).await?;
        self.changed(Collection::Todos, ChangeAction::Update, id);
        Ok(todo)
    }

    async fn delete_todo(&self, id: &str) -> Result<()> {
        self.repo.delete_todo(id).await?;
        self.changed(Collection::Todos, ChangeAction::Delete, id);
        Ok(())
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe(collection)
    }
}
