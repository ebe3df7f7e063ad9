//! Reminders service
//!
//! Scans the loaded task list on a fixed interval and announces every
//! incomplete task whose reminder time has passed. Each task is announced
//! once per process; the announced set is not persisted.

use super::collaborators::{NoticeKind, Notifier};
use crate::config::{REMINDER_SCAN_INTERVAL_SECS, REMINDER_SOUND};
use crate::database::Todo;
use crate::state::SharedState;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Reminders service with background scheduler
#[derive(Clone)]
pub struct ReminderService {
    state: SharedState,
    notifier: Arc<dyn Notifier>,
    announced: Arc<Mutex<HashSet<String>>>,
}

impl ReminderService {
    pub fn new(state: SharedState, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state,
            notifier,
            announced: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Start the background scheduler
    pub fn start_scheduler(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting reminders scheduler");

            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(REMINDER_SCAN_INTERVAL_SECS));

            loop {
                interval.tick().await;
                self.check_due_reminders(Utc::now()).await;
            }
        })
    }

    /// Announce tasks due at `now`; returns the ids announced by this call
    pub async fn check_due_reminders(&self, now: DateTime<Utc>) -> Vec<String> {
        let (due, live): (Vec<Todo>, HashSet<String>) = {
            let state = self.state.read().await;
            let due = state
                .todos
                .iter()
                .filter(|todo| is_due(todo, now))
                .cloned()
                .collect();
            let live = state.todos.iter().map(|todo| todo.id.clone()).collect();
            (due, live)
        };

        let mut announced = self.announced.lock().await;
        // Deleted tasks can never be announced again
        announced.retain(|id| live.contains(id));
        let mut fired = Vec::new();

        for todo in due {
            if !announced.insert(todo.id.clone()) {
                continue;
            }

            tracing::info!("Triggering reminder for task {}", todo.id);

            let message = match &todo.patient_name {
                Some(patient) => format!("Reminder: {} ({})", todo.text, patient),
                None => format!("Reminder: {}", todo.text),
            };
            self.notifier.notify(NoticeKind::Info, &message);
            self.notifier.play_sound(REMINDER_SOUND);

            fired.push(todo.id);
        }

        fired
    }
}

fn is_due(todo: &Todo, now: DateTime<Utc>) -> bool {
    !todo.completed && todo.reminder.is_some_and(|at| at <= now)
}
