//! Services module
//!
//! Business logic that coordinates between the application state, the
//! backend and the host collaborators.

pub mod backend;
pub mod collaborators;
mod inbox;
mod preferences;
mod records;
pub mod reminders;
mod reports;
pub mod search;
pub mod settings;
pub mod sync;

#[cfg(test)]
mod testing;

pub use backend::{Backend, ChangeAction, ChangeEvent, ChangeFeed, Collection, SqliteBackend};
pub use collaborators::{
    AiGenerator, AiOutcome, Collaborators, HtmlFileView, LogNotifier, NoticeKind, Notifier, PdfExporter, ReportKind,
    ViewSink,
};
pub use reminders::ReminderService;
pub use search::SearchDebouncer;
pub use settings::{LocalSettings, SettingsService};
pub use sync::SyncController;
