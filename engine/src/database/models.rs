//! Database models
//!
//! Rust structs representing stored entities.
//! All models use serde for serialization to the document columns.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a chart belongs to the ward list or the discharged list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Discharged,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Discharged => "discharged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    No,
    Yes,
}

/// Error returned when a select input carries a value outside its option list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption(pub String);

impl fmt::Display for UnknownOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown option: {}", self.0)
    }
}

impl std::error::Error for UnknownOption {}

impl FallRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallRisk::Low => "low",
            FallRisk::Medium => "medium",
            FallRisk::High => "high",
        }
    }
}

impl FromStr for FallRisk {
    type Err = UnknownOption;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(FallRisk::Low),
            "medium" => Ok(FallRisk::Medium),
            "high" => Ok(FallRisk::High),
            other => Err(UnknownOption(other.to_string())),
        }
    }
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::No => "no",
            YesNo::Yes => "yes",
        }
    }
}

impl FromStr for YesNo {
    type Err = UnknownOption;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "no" => Ok(YesNo::No),
            "yes" => Ok(YesNo::Yes),
            other => Err(UnknownOption(other.to_string())),
        }
    }
}

// ===== ISBAR sections =====
//
// Text fields use the empty string for "no value".

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identification {
    pub room_no: String,
    pub patient_name: String,
    pub mrn: String,
    pub age: String,
    pub admission_date: String,
    pub admitted_from: String,
    pub consultant: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Situation {
    pub current_complaints: String,
    pub diagnosis: String,
    pub diet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Background {
    pub past_history: String,
    pub chief_complaint: String,
    /// Free text, or the localized "none" sentinel
    pub allergy: String,
    pub isolation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assessment {
    /// Glasgow Coma Scale, 3-15
    pub gcs: String,
    pub fall_risk: Option<FallRisk>,
    pub vitals: String,
    pub ventilation: String,
    pub bed_sore: Option<YesNo>,
    pub restraint: Option<YesNo>,
    pub findings: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendations {
    pub plan: String,
    pub risks: String,
}

/// A timestamped clinical event recorded during a shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftNote {
    pub id: String,
    pub time: DateTime<Utc>,
    pub event: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Isbar {
    pub identification: Identification,
    pub situation: Situation,
    pub background: Background,
    pub assessment: Assessment,
    pub recommendations: Recommendations,
    /// Newest first
    pub shift_notes: Vec<ShiftNote>,
}

// ===== Owned collections =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default)]
    pub dose: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub frequency: String,
    pub added: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabResult {
    pub test: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub date: String,
    pub added: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiologyStudy {
    pub study: String,
    #[serde(default)]
    pub findings: String,
    #[serde(default)]
    pub date: String,
    pub added: DateTime<Utc>,
}

/// A patient chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Record {
    /// Absent until the first successful commit
    pub id: Option<String>,
    pub name: String,
    /// Medical record number, mirrored in `isbar.identification.mrn`
    pub file_number: String,
    pub age: String,
    pub room_number: String,
    pub diagnosis: String,
    pub status: RecordStatus,
    pub isbar: Isbar,
    pub medications: Vec<Medication>,
    pub labs: Vec<LabResult>,
    pub radiology: Vec<RadiologyStudy>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Record {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Apply a partial update in place; absent fields keep their value
    pub fn apply_patch(&mut self, patch: RecordPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(file_number) = patch.file_number {
            self.file_number = file_number;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(room_number) = patch.room_number {
            self.room_number = room_number;
        }
        if let Some(diagnosis) = patch.diagnosis {
            self.diagnosis = diagnosis;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(mut isbar) = patch.isbar {
            // Shift notes only change through `patch.shift_notes`
            isbar.shift_notes = std::mem::take(&mut self.isbar.shift_notes);
            self.isbar = isbar;
        }
        if let Some(shift_notes) = patch.shift_notes {
            self.isbar.shift_notes = shift_notes;
        }
        if let Some(medications) = patch.medications {
            self.medications = medications;
        }
        if let Some(labs) = patch.labs {
            self.labs = labs;
        }
        if let Some(radiology) = patch.radiology {
            self.radiology = radiology;
        }
    }
}

/// Partial record update; `None` leaves the stored field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub name: Option<String>,
    pub file_number: Option<String>,
    pub age: Option<String>,
    pub room_number: Option<String>,
    pub diagnosis: Option<String>,
    pub status: Option<RecordStatus>,
    /// Replaces the ISBAR sections; stored shift notes are kept
    pub isbar: Option<Isbar>,
    /// Replaces `isbar.shift_notes` without touching the sections
    pub shift_notes: Option<Vec<ShiftNote>>,
    pub medications: Option<Vec<Medication>>,
    pub labs: Option<Vec<LabResult>>,
    pub radiology: Option<Vec<RadiologyStudy>>,
}

impl RecordPatch {
    /// The fields the chart editor owns: top-level scalars and the ISBAR
    /// sections. Medications, labs, radiology and shift notes are left to
    /// their own operations so a concurrent append survives the save.
    pub fn from_editor(record: Record) -> Self {
        Self {
            name: Some(record.name),
            file_number: Some(record.file_number),
            age: Some(record.age),
            room_number: Some(record.room_number),
            diagnosis: Some(record.diagnosis),
            status: Some(record.status),
            isbar: Some(record.isbar),
            ..Default::default()
        }
    }
}

/// Add medication request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dose: String,
    pub route: String,
    pub frequency: String,
}

/// Add lab result request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLab {
    pub test: String,
    pub result: String,
    pub date: String,
}

/// Add radiology study request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRadiology {
    pub study: String,
    pub findings: String,
    pub date: String,
}

/// Add shift note request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewShiftNote {
    pub event: String,
    pub category: String,
}

// ===== Alerts and tasks =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCategory {
    Hazard,
    Warning,
    Tip,
    Learning,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Hazard => "hazard",
            AlertCategory::Warning => "warning",
            AlertCategory::Tip => "tip",
            AlertCategory::Learning => "learning",
        }
    }
}

/// A safety alert shown on the alerts view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub category: AlertCategory,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub source: String,
    pub created: DateTime<Utc>,
}

/// Create alert request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub title: String,
    pub message: String,
    pub category: AlertCategory,
    pub priority: Priority,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub source: String,
}

/// Update alert request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertPatch {
    pub read: Option<bool>,
}

/// A nursing task, optionally tied to a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub created: DateTime<Utc>,
}

/// Create task request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub text: String,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub reminder: Option<DateTime<Utc>>,
}

/// Update task request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoPatch {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

/// The signed-in nurse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}
