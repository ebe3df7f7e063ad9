//! Application state
//!
//! A single snapshot read by the render projection. It is owned by a
//! [`SharedState`] handle that is passed explicitly to every component,
//! so tests can run independent instances side by side.

use crate::chart::{DraftKey, DraftStore};
use crate::database::{Alert, Record, RecordStatus, Todo, User};
use crate::i18n::Language;
use crate::services::settings::LocalSettings;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Top-level screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Alerts,
}

/// The nine tabs of the chart editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModalTab {
    #[default]
    Identification,
    Situation,
    Background,
    Assessment,
    Recommendations,
    ShiftNotes,
    Medications,
    Labs,
    Radiology,
}

impl ModalTab {
    pub const ALL: [ModalTab; 9] = [
        ModalTab::Identification,
        ModalTab::Situation,
        ModalTab::Background,
        ModalTab::Assessment,
        ModalTab::Recommendations,
        ModalTab::ShiftNotes,
        ModalTab::Medications,
        ModalTab::Labs,
        ModalTab::Radiology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModalTab::Identification => "identification",
            ModalTab::Situation => "situation",
            ModalTab::Background => "background",
            ModalTab::Assessment => "assessment",
            ModalTab::Recommendations => "recommendations",
            ModalTab::ShiftNotes => "shift_notes",
            ModalTab::Medications => "medications",
            ModalTab::Labs => "labs",
            ModalTab::Radiology => "radiology",
        }
    }

    pub fn title(&self, lang: Language) -> &'static str {
        match (lang, self) {
            (Language::English, ModalTab::Identification) => "Identification",
            (Language::English, ModalTab::Situation) => "Situation",
            (Language::English, ModalTab::Background) => "Background",
            (Language::English, ModalTab::Assessment) => "Assessment",
            (Language::English, ModalTab::Recommendations) => "Recommendations",
            (Language::English, ModalTab::ShiftNotes) => "Shift notes",
            (Language::English, ModalTab::Medications) => "Medications",
            (Language::English, ModalTab::Labs) => "Labs",
            (Language::English, ModalTab::Radiology) => "Radiology",
            (Language::Arabic, ModalTab::Identification) => "التعريف",
            (Language::Arabic, ModalTab::Situation) => "الحالة",
            (Language::Arabic, ModalTab::Background) => "الخلفية",
            (Language::Arabic, ModalTab::Assessment) => "التقييم",
            (Language::Arabic, ModalTab::Recommendations) => "التوصيات",
            (Language::Arabic, ModalTab::ShiftNotes) => "ملاحظات المناوبة",
            (Language::Arabic, ModalTab::Medications) => "الأدوية",
            (Language::Arabic, ModalTab::Labs) => "المختبر",
            (Language::Arabic, ModalTab::Radiology) => "الأشعة",
        }
    }
}

impl fmt::Display for ModalTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModalTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModalTab::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s)
            .ok_or_else(|| format!("Unknown tab: {}", s))
    }
}

/// Central application state
#[derive(Debug, Default)]
pub struct AppState {
    pub user: Option<User>,
    pub records: Vec<Record>,
    pub alerts: Vec<Alert>,
    pub todos: Vec<Todo>,
    pub current_view: View,
    /// Record status filter for the ward list
    pub active_tab: RecordStatus,
    pub search_query: String,
    pub language: Language,
    pub ai_language: Language,
    pub dark_mode: bool,
    /// Signature printed on exported charts
    pub signature: String,
    /// `None` with the modal open means a new chart
    pub selected_record_id: Option<String>,
    pub modal_open: bool,
    pub modal_tab: ModalTab,
    /// Bumped on every open and close of the editor
    pub edit_session: u64,
    pub drafts: DraftStore,
}

impl AppState {
    pub fn with_settings(settings: &LocalSettings) -> Self {
        Self {
            language: settings.language,
            ai_language: settings.ai_language,
            dark_mode: settings.dark_mode,
            signature: settings.signature.clone(),
            ..Default::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn find_record(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == Some(id))
    }

    /// The persisted chart behind the open editor, if any
    pub fn selected_record(&self) -> Option<&Record> {
        self.selected_record_id
            .as_deref()
            .and_then(|id| self.find_record(id))
    }

    /// Ward list after the status tab and search filters, in collection order
    pub fn visible_records(&self) -> Vec<&Record> {
        let query = self.search_query.trim().to_lowercase();

        self.records
            .iter()
            .filter(|record| record.status == self.active_tab)
            .filter(|record| query.is_empty() || matches_query(record, &query))
            .collect()
    }

    /// Draft key of the open editor
    pub fn open_draft_key(&self) -> Option<DraftKey> {
        self.modal_open
            .then(|| DraftKey::for_record(self.selected_record_id.as_deref()))
    }

    pub fn unread_alert_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.read).count()
    }

    /// Replace every backend-owned collection at once
    pub fn replace_collections(&mut self, records: Vec<Record>, alerts: Vec<Alert>, todos: Vec<Todo>) {
        self.records = records;
        self.alerts = alerts;
        self.todos = todos;
    }
}

fn matches_query(record: &Record, query: &str) -> bool {
    [&record.name, &record.file_number, &record.diagnosis]
        .iter()
        .any(|field| field.to_lowercase().contains(query))
}

/// Shared, explicitly passed handle to the application state
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<AppState>>,
}

impl SharedState {
    pub fn new(state: AppState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppState> {
        self.inner.read().await
    }

    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppState> {
        self.inner.write().await
    }
}
