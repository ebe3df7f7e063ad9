//! Host-side collaborators
//!
//! Traits for everything the engine hands off to its host: the view
//! surface, transient notifications and sounds, AI text generation and PDF
//! export.

use crate::database::Record;
use crate::error::Result;
use crate::i18n::Language;
use crate::view::Node;
use std::path::PathBuf;
use std::sync::Arc;

/// Receives every freshly rendered view tree
pub trait ViewSink: Send + Sync {
    fn present(&self, view: Node);
}

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Info => "info",
            NoticeKind::Warning => "warning",
            NoticeKind::Error => "error",
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);

    fn play_sound(&self, sound: &str);
}

/// What the AI collaborator is asked to produce from a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    HandoverSummary,
    CarePlan,
    DischargeSummary,
    /// Tabular medication reconciliation
    MedicationReview,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::HandoverSummary => "handover_summary",
            ReportKind::CarePlan => "care_plan",
            ReportKind::DischargeSummary => "discharge_summary",
            ReportKind::MedicationReview => "medication_review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    Text(String),
    Table(Vec<Vec<String>>),
    /// No key configured; nothing was generated
    RequiresApiKey,
}

#[async_trait::async_trait]
pub trait AiGenerator: Send + Sync {
    async fn generate(&self, kind: ReportKind, record: &Record, language: Language) -> Result<AiOutcome>;
}

#[async_trait::async_trait]
pub trait PdfExporter: Send + Sync {
    /// Export a full chart; returns the written file
    async fn export_chart(&self, record: &Record, signature: &str, counterparty: &str) -> Result<PathBuf>;

    async fn export_generic_report(
        &self,
        title: &str,
        content: &str,
        file_base_name: &str,
        signature: &str,
    ) -> Result<PathBuf>;
}

/// Host-side collaborators of the sync controller
#[derive(Clone)]
pub struct Collaborators {
    pub view: Arc<dyn ViewSink>,
    pub notifier: Arc<dyn Notifier>,
    pub ai: Option<Arc<dyn AiGenerator>>,
    pub pdf: Option<Arc<dyn PdfExporter>>,
}

impl Collaborators {
    pub fn new(view: Arc<dyn ViewSink>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            view,
            notifier,
            ai: None,
            pdf: None,
        }
    }
}

/// Writes each rendered view to an HTML file; used by the headless binary
#[derive(Debug, Clone)]
pub struct HtmlFileView {
    path: PathBuf,
}

impl HtmlFileView {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl ViewSink for HtmlFileView {
    fn present(&self, view: Node) {
        let html = format!("<!DOCTYPE html>\n{}", view.to_html());
        if let Err(e) = std::fs::write(&self.path, html) {
            tracing::error!("Failed to write view to {:?}: {}", self.path, e);
        }
    }
}

/// Notifier that writes to the log; used by the headless binary
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Error => tracing::error!(kind = kind.as_str(), "{}", message),
            NoticeKind::Warning => tracing::warn!(kind = kind.as_str(), "{}", message),
            NoticeKind::Success | NoticeKind::Info => tracing::info!(kind = kind.as_str(), "{}", message),
        }
    }

    fn play_sound(&self, sound: &str) {
        tracing::info!("Playing sound: {}", sound);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::el;
    use tempfile::TempDir;

    #[test]
    fn test_html_file_view_overwrites_with_latest_view() {
        let temp_dir = TempDir::new().unwrap();
        let view = HtmlFileView::new(temp_dir.path().join("view.html"));

        view.present(el("p").text("first").into());
        view.present(el("p").text("second").into());

        let written = std::fs::read_to_string(view.path()).unwrap();
        assert_eq!(written, "<!DOCTYPE html>\n<p>second</p>");
    }
}
