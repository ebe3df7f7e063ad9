//! Chart-owned collections and status changes
//!
//! Medications, labs, radiology and shift notes are never touched by the
//! tabbed form. They change only through these operations, each of which
//! writes the whole collection back and then reloads.

use super::sync::{close_session, SyncController};
use super::NoticeKind;
use crate::chart::DraftKey;
use crate::database::{
    LabResult, Medication, NewLab, NewMedication, NewRadiology, NewShiftNote, RadiologyStudy,
    Record, RecordPatch, RecordStatus, ShiftNote,
};
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

/// Copy of `items` without the entry at `index`
fn without<T: Clone>(items: &[T], index: usize, what: &str) -> Result<Vec<T>> {
    if index >= items.len() {
        return Err(AppError::Validation(format!("No {} at position {}", what, index + 1)));
    }
    let mut remaining = items.to_vec();
    remaining.remove(index);
    Ok(remaining)
}

impl SyncController {
    // ===== Medications =====

    pub async fn add_medication(&self, record_id: &str, req: NewMedication) -> Result<Record> {
        let medication = Medication {
            name: self.require(&req.name, "Medication name is required")?,
            dose: req.dose.trim().to_string(),
            route: req.route.trim().to_string(),
            frequency: req.frequency.trim().to_string(),
            added: Utc::now(),
        };

        self.patch_record(record_id, move |record| {
            let mut medications = record.medications.clone();
            medications.push(medication);
            Ok(RecordPatch {
                medications: Some(medications),
                ..Default::default()
            })
        })
        .await
    }

    pub async fn delete_medication(&self, record_id: &str, index: usize) -> Result<Record> {
        self.patch_record(record_id, |record| {
            Ok(RecordPatch {
                medications: Some(without(&record.medications, index, "medication")?),
                ..Default::default()
            })
        })
        .await
    }

    // ===== Labs =====

    pub async fn add_lab(&self, record_id: &str, req: NewLab) -> Result<Record> {
        let lab = LabResult {
            test: self.require(&req.test, "Lab test name is required")?,
            result: req.result.trim().to_string(),
            date: req.date.trim().to_string(),
            added: Utc::now(),
        };

        self.patch_record(record_id, move |record| {
            let mut labs = record.labs.clone();
            labs.push(lab);
            Ok(RecordPatch {
                labs: Some(labs),
                ..Default::default()
            })
        })
        .await
    }

    pub async fn delete_lab(&self, record_id: &str, index: usize) -> Result<Record> {
        self.patch_record(record_id, |record| {
            Ok(RecordPatch {
                labs: Some(without(&record.labs, index, "lab result")?),
                ..Default::default()
            })
        })
        .await
    }

    // ===== Radiology =====

    pub async fn add_radiology(&self, record_id: &str, req: NewRadiology) -> Result<Record> {
        let study = RadiologyStudy {
            study: self.require(&req.study, "Radiology study is required")?,
            findings: req.findings.trim().to_string(),
            date: req.date.trim().to_string(),
            added: Utc::now(),
        };

        self.patch_record(record_id, move |record| {
            let mut radiology = record.radiology.clone();
            radiology.push(study);
            Ok(RecordPatch {
                radiology: Some(radiology),
                ..Default::default()
            })
        })
        .await
    }

    pub async fn delete_radiology(&self, record_id: &str, index: usize) -> Result<Record> {
        self.patch_record(record_id, |record| {
            Ok(RecordPatch {
                radiology: Some(without(&record.radiology, index, "radiology study")?),
                ..Default::default()
            })
        })
        .await
    }

    // ===== Shift notes =====

    /// Prepend a note; the list is kept newest first
    pub async fn add_shift_note(&self, record_id: &str, req: NewShiftNote) -> Result<Record> {
        let note = ShiftNote {
            id: Uuid::new_v4().to_string(),
            time: Utc::now(),
            event: self.require(&req.event, "Shift event is required")?,
            category: req.category.trim().to_string(),
        };

        self.patch_record(record_id, move |record| {
            let mut notes = Vec::with_capacity(record.isbar.shift_notes.len() + 1);
            notes.push(note);
            notes.extend(record.isbar.shift_notes.iter().cloned());
            Ok(RecordPatch {
                shift_notes: Some(notes),
                ..Default::default()
            })
        })
        .await
    }

    pub async fn delete_shift_note(&self, record_id: &str, index: usize) -> Result<Record> {
        self.patch_record(record_id, |record| {
            Ok(RecordPatch {
                shift_notes: Some(without(&record.isbar.shift_notes, index, "shift note")?),
                ..Default::default()
            })
        })
        .await
    }

    // ===== Status =====

    pub async fn discharge(&self, record_id: &str) -> Result<Record> {
        self.set_status(record_id, RecordStatus::Discharged).await
    }

    pub async fn readmit(&self, record_id: &str) -> Result<Record> {
        self.set_status(record_id, RecordStatus::Active).await
    }

    async fn set_status(&self, record_id: &str, status: RecordStatus) -> Result<Record> {
        let record = self
            .patch_record(record_id, |_| {
                Ok(RecordPatch {
                    status: Some(status),
                    ..Default::default()
                })
            })
            .await?;

        tracing::info!("Chart {} is now {}", record_id, status.as_str());
        Ok(record)
    }

    /// Permanently delete a chart, closing the editor if it was open on it
    pub async fn delete_record(&self, record_id: &str) -> Result<()> {
        if self.state().read().await.find_record(record_id).is_none() {
            return self.fail(AppError::RecordNotFound(record_id.to_string()));
        }

        if let Err(e) = self.backend().delete_record(record_id).await {
            return self.fail(e);
        }

        {
            let mut state = self.state().write().await;
            let key = DraftKey::Record(record_id.to_string());
            if state.open_draft_key().as_ref() == Some(&key) {
                close_session(&mut state);
            }
            state.drafts.clear_draft(&key);
        }

        self.collaborators()
            .notifier
            .notify(NoticeKind::Info, "Chart deleted");
        self.settle().await;
        Ok(())
    }
}
