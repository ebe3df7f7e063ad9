//! Tasks and alerts

use super::sync::SyncController;
use crate::database::{Alert, AlertPatch, NewAlert, NewTodo, Todo, TodoPatch};
use crate::error::{AppError, Result};

impl SyncController {
    // ===== Tasks =====

    /// Create a task. A patient id without a name picks the name up from
    /// the loaded chart.
    pub async fn add_task(&self, mut req: NewTodo) -> Result<Todo> {
        req.text = self.require(&req.text, "Task text is required")?;

        if req.patient_name.is_none() {
            if let Some(patient_id) = req.patient_id.as_deref() {
                let state = self.state().read().await;
                req.patient_name = state.find_record(patient_id).map(|r| r.name.clone());
            }
        }

        let result = self.backend().create_todo(req).await;
        self.finish_write(result).await
    }

    pub async fn toggle_task(&self, id: &str) -> Result<Todo> {
        let completed = {
            let state = self.state().read().await;
            match state.todos.iter().find(|t| t.id == id) {
                Some(todo) => todo.completed,
                None => return self.fail(AppError::TodoNotFound(id.to_string())),
            }
        };

        let patch = TodoPatch {
            completed: Some(!completed),
            ..Default::default()
        };
        let result = self.backend().update_todo(id, patch).await;
        self.finish_write(result).await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let result = self.backend().delete_todo(id).await;
        self.finish_write(result).await
    }

    // ===== Alerts =====

    pub async fn add_alert(&self, mut req: NewAlert) -> Result<Alert> {
        req.title = self.require(&req.title, "Alert title is required")?;

        let result = self.backend().create_alert(req).await;
        self.finish_write(result).await
    }

    pub async fn mark_alert_read(&self, id: &str) -> Result<Alert> {
        let result = self.backend().update_alert(id, AlertPatch { read: Some(true) }).await;
        self.finish_write(result).await
    }

    /// Mark every loaded unread alert as read; returns how many changed
    pub async fn mark_all_alerts_read(&self) -> Result<usize> {
        let unread: Vec<String> = {
            let state = self.state().read().await;
            state
                .alerts
                .iter()
                .filter(|a| !a.read)
                .map(|a| a.id.clone())
                .collect()
        };

        for id in &unread {
            if let Err(e) = self.backend().update_alert(id, AlertPatch { read: Some(true) }).await {
                // Earlier alerts were written; show them
                self.settle().await;
                return self.fail(e);
            }
        }

        tracing::info!("Marked {} alerts read", unread.len());
        self.finish_write(Ok(unread.len())).await
    }

    pub async fn delete_alert(&self, id: &str) -> Result<()> {
        let result = self.backend().delete_alert(id).await;
        self.finish_write(result).await
    }
}
