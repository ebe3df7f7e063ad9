//! AI reports and PDF export

use super::collaborators::{AiOutcome, NoticeKind, ReportKind};
use super::sync::SyncController;
use crate::database::Record;
use crate::error::{AppError, Result};
use std::path::PathBuf;

impl SyncController {
    async fn loaded_record(&self, record_id: &str) -> Result<Record> {
        let state = self.state().read().await;
        match state.find_record(record_id) {
            Some(record) => Ok(record.clone()),
            None => self.fail(AppError::RecordNotFound(record_id.to_string())),
        }
    }

    /// Generate a report for a chart in the AI output language.
    ///
    /// `Ok(None)` means no API key is configured; the user has been told.
    pub async fn generate_report(&self, record_id: &str, kind: ReportKind) -> Result<Option<AiOutcome>> {
        let Some(ai) = self.collaborators().ai.clone() else {
            return self.fail(AppError::Generic("Report generation is not configured".to_string()));
        };
        let record = self.loaded_record(record_id).await?;
        let language = self.state().read().await.ai_language;

        tracing::info!("Generating {} for {}", kind.as_str(), record_id);

        match ai.generate(kind, &record, language).await {
            Ok(AiOutcome::RequiresApiKey) => {
                self.collaborators().notifier.notify(
                    NoticeKind::Warning,
                    "An API key is required to generate reports",
                );
                Ok(None)
            }
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => self.fail(AppError::Backend(e.to_string())),
        }
    }

    /// Export a chart to PDF, signed with the saved signature
    pub async fn export_chart(&self, record_id: &str, counterparty: &str) -> Result<PathBuf> {
        let Some(pdf) = self.collaborators().pdf.clone() else {
            return self.fail(AppError::Generic("PDF export is not configured".to_string()));
        };
        let record = self.loaded_record(record_id).await?;
        let signature = self.state().read().await.signature.clone();

        match pdf.export_chart(&record, &signature, counterparty.trim()).await {
            Ok(path) => {
                tracing::info!("Exported chart {} to {:?}", record_id, path);
                self.collaborators()
                    .notifier
                    .notify(NoticeKind::Success, "Chart exported");
                Ok(path)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Export free text, typically a generated report, to PDF
    pub async fn export_report(&self, title: &str, content: &str, file_base_name: &str) -> Result<PathBuf> {
        let Some(pdf) = self.collaborators().pdf.clone() else {
            return self.fail(AppError::Generic("PDF export is not configured".to_string()));
        };
        let title = self.require(title, "Report title is required")?;
        let signature = self.state().read().await.signature.clone();

        match pdf
            .export_generic_report(&title, content, file_base_name, &signature)
            .await
        {
            Ok(path) => {
                self.collaborators()
                    .notifier
                    .notify(NoticeKind::Success, "Report exported");
                Ok(path)
            }
            Err(e) => self.fail(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::services::collaborators::{AiGenerator, PdfExporter};
    use crate::services::testing::{test_controller, user};
    use std::sync::{Arc, Mutex};

    struct StubAi(AiOutcome);

    #[async_trait::async_trait]
    impl AiGenerator for StubAi {
        async fn generate(&self, _kind: ReportKind, _record: &Record, _language: Language) -> Result<AiOutcome> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct RecordingPdf {
        signatures: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl PdfExporter for RecordingPdf {
        async fn export_chart(&self, record: &Record, signature: &str, counterparty: &str) -> Result<PathBuf> {
            self.signatures
                .lock()
                .unwrap()
                .push((signature.to_string(), counterparty.to_string()));
            Ok(PathBuf::from(format!("{}.pdf", record.name)))
        }

        async fn export_generic_report(
            &self,
            _title: &str,
            _content: &str,
            file_base_name: &str,
            _signature: &str,
        ) -> Result<PathBuf> {
            Ok(PathBuf::from(format!("{}.pdf", file_base_name)))
        }
    }

    async fn seeded(controller: &SyncController) -> String {
        controller.sign_in(user()).await.unwrap();
        controller.open_new().await;
        controller.input("patientName", "Aisha").await;
        controller.save().await.unwrap().id.unwrap()
    }

    #[tokio::test]
    async fn test_missing_api_key_warns_and_returns_none() {
        let (controller, _view, notifier) = test_controller().await;
        let id = seeded(&controller).await;
        let controller = controller.with_ai(Arc::new(StubAi(AiOutcome::RequiresApiKey)));

        let outcome = controller.generate_report(&id, ReportKind::HandoverSummary).await.unwrap();

        assert_eq!(outcome, None);
        assert_eq!(notifier.kinds().last(), Some(&NoticeKind::Warning));
    }

    #[tokio::test]
    async fn test_export_uses_saved_signature() {
        let (controller, _view, _notifier) = test_controller().await;
        let id = seeded(&controller).await;
        let pdf = Arc::new(RecordingPdf::default());
        let controller = controller.with_pdf(pdf.clone());
        controller.set_signature("RN Mariam").await;

        let path = controller.export_chart(&id, "Dr. Hassan").await.unwrap();

        assert_eq!(path, PathBuf::from("Aisha.pdf"));
        assert_eq!(
            *pdf.signatures.lock().unwrap(),
            vec![("RN Mariam".to_string(), "Dr. Hassan".to_string())]
        );
    }

    #[tokio::test]
    async fn test_table_outcome_is_returned() {
        let (controller, _view, _notifier) = test_controller().await;
        let id = seeded(&controller).await;
        let table = vec![vec!["Drug".to_string(), "Dose".to_string()]];
        let controller = controller.with_ai(Arc::new(StubAi(AiOutcome::Table(table.clone()))));

        let outcome = controller.generate_report(&id, ReportKind::MedicationReview).await.unwrap();

        assert_eq!(outcome, Some(AiOutcome::Table(table)));
    }

    #[tokio::test]
    async fn test_unconfigured_export_fails() {
        let (controller, _view, _notifier) = test_controller().await;
        let id = seeded(&controller).await;

        assert!(controller.export_chart(&id, "Dr. Hassan").await.is_err());
    }
}
