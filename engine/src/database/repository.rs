//! Repository layer for database operations
//!
//! This module provides CRUD operations for charts, alerts and tasks.
//! Each entity is stored as a JSON document; read-modify-write updates
//! run inside a transaction.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const RECORDS: &str = "records";
const ALERTS: &str = "alerts";
const TODOS: &str = "todos";

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    /// Held across read-modify-write updates. A deferred SQLite
    /// transaction cannot upgrade to a writer once another connection
    /// has committed after its read.
    writer: Arc<Mutex<()>>,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    // ===== Records =====

    /// Create a chart. Any id on the payload is replaced by a fresh one.
    pub async fn create_record(&self, mut record: Record) -> Result<Record> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        record.id = Some(id.clone());
        record.created = Some(now);
        record.updated = Some(now);

        self.insert_document(RECORDS, &id, &record, now).await?;

        tracing::debug!("Created record: {}", id);
        Ok(record)
    }

    /// Get a chart by ID
    pub async fn get_record(&self, id: &str) -> Result<Record> {
        self.fetch_document(RECORDS, id)
            .await?
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))
    }

    /// List all charts, newest first
    pub async fn list_records(&self) -> Result<Vec<Record>> {
        self.fetch_all_documents(RECORDS).await
    }

    /// Apply a partial update to a chart
    pub async fn update_record(&self, id: &str, patch: RecordPatch) -> Result<Record> {
        let record = self
            .modify_document(RECORDS, id, |record: &mut Record, now| {
                record.apply_patch(patch);
                record.updated = Some(now);
            })
            .await?
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))?;

        tracing::debug!("Updated record: {}", id);
        Ok(record)
    }

    /// Permanently delete a chart
    pub async fn delete_record(&self, id: &str) -> Result<()> {
        if self.remove_document(RECORDS, id).await? == 0 {
            return Err(AppError::RecordNotFound(id.to_string()));
        }

        tracing::debug!("Deleted record: {}", id);
        Ok(())
    }

    // ===== Alerts =====

    pub async fn create_alert(&self, req: NewAlert) -> Result<Alert> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let alert = Alert {
            id: id.clone(),
            title: req.title,
            message: req.message,
            category: req.category,
            priority: req.priority,
            read: false,
            patient_id: req.patient_id,
            patient_name: req.patient_name,
            source: req.source,
            created: now,
        };

        self.insert_document(ALERTS, &id, &alert, now).await?;

        tracing::debug!("Created alert: {}", id);
        Ok(alert)
    }

    pub async fn list_alerts(&self) -> Result<Vec<Alert>> {
        self.fetch_all_documents(ALERTS).await
    }

    pub async fn update_alert(&self, id: &str, patch: AlertPatch) -> Result<Alert> {
        self.modify_document(ALERTS, id, |alert: &mut Alert, _| {
            if let Some(read) = patch.read {
                alert.read = read;
            }
        })
        .await?
        .ok_or_else(|| AppError::AlertNotFound(id.to_string()))
    }

    pub async fn delete_alert(&self, id: &str) -> Result<()> {
        if self.remove_document(ALERTS, id).await? == 0 {
            return Err(AppError::AlertNotFound(id.to_string()));
        }

        tracing::debug!("Deleted alert: {}", id);
        Ok(())
    }

    // ===== Tasks =====

    pub async fn create_todo(&self, req: NewTodo) -> Result<Todo> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let todo = Todo {
            id: id.clone(),
            text: req.text,
            patient_id: req.patient_id,
            patient_name: req.patient_name,
            priority: req.priority,
            due_date: req.due_date,
            reminder: req.reminder,
            completed: false,
            created: now,
        };

        self.insert_document(TODOS, &id, &todo, now).await?;

        tracing::debug!("Created task: {}", id);
        Ok(todo)
    }

    pub async fn list_todos(&self) -> Result<Vec<Todo>> {
        self.fetch_all_documents(TODOS).await
    }

    pub async fn update_todo(&self, id: &str, patch: TodoPatch) -> Result<Todo> {
        self.modify_document(TODOS, id, |todo: &mut Todo, _| {
            if let Some(text) = patch.text {
                todo.text = text;
            }
            if let Some(completed) = patch.completed {
                todo.completed = completed;
            }
        })
        .await?
        .ok_or_else(|| AppError::TodoNotFound(id.to_string()))
    }

    pub async fn delete_todo(&self, id: &str) -> Result<()> {
        if self.remove_document(TODOS, id).await? == 0 {
            return Err(AppError::TodoNotFound(id.to_string()));
        }

        tracing::debug!("Deleted task: {}", id);
        Ok(())
    }

    // ===== Document helpers =====

    async fn insert_document<T: Serialize>(
        &self,
        table: &'static str,
        id: &str,
        doc: &T,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let data = serde_json::to_string(doc)?;

        sqlx::query(&format!(
            "INSERT INTO {table} (id, data, created_at, updated_at) VALUES (?, ?, ?, ?)"
        ))
        .bind(id)
        .bind(data)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_document<T: DeserializeOwned>(
        &self,
        table: &'static str,
        id: &str,
    ) -> Result<Option<T>> {
        let data: Option<String> =
            sqlx::query_scalar(&format!("SELECT data FROM {table} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn fetch_all_documents<T: DeserializeOwned>(&self, table: &'static str) -> Result<Vec<T>> {
        let rows: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT data FROM {table} ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(AppError::from))
            .collect()
    }

    /// Read, modify and write back one document in a single transaction.
    /// Returns `None` when no document has the given id.
    async fn modify_document<T, F>(
        &self,
        table: &'static str,
        id: &str,
        modify: F,
    ) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T, DateTime<Utc>),
    {
        let _writer = self.writer.lock().await;
        let mut tx = self.pool.begin().await?;

        let data: Option<String> =
            sqlx::query_scalar(&format!("SELECT data FROM {table} WHERE id = ?"))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(data) = data else {
            return Ok(None);
        };

        let mut doc: T = serde_json::from_str(&data)?;
        let now = Utc::now();
        modify(&mut doc, now);

        sqlx::query(&format!(
            "UPDATE {table} SET data = ?, updated_at = ? WHERE id = ?"
        ))
        .bind(serde_json::to_string(&doc)?)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(doc))
    }

    async fn remove_document(&self, table: &'static str, id: &str) -> Result<u64> {
        let rows = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }
}
