//! Field codec
//!
//! Closed table between the identifiers of the chart editor inputs and
//! the leaves of the nested [`Record`] shape, plus the default applied
//! when a field has no value anywhere.

use crate::config::{ADMISSION_DATE_FORMAT, DEFAULT_GCS, MRN_DIGITS, MRN_PREFIX};
use crate::database::{FallRisk, Record, UnknownOption, YesNo};
use crate::i18n::Language;
use crate::state::ModalTab;
use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

const FALL_RISK_OPTIONS: &[&str] = &["low", "medium", "high"];
const YES_NO_OPTIONS: &[&str] = &["no", "yes"];

/// One editable input of the chart editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    // Identification
    PatientName,
    RoomNumber,
    FileNumber,
    Age,
    AdmissionDate,
    AdmissionSource,
    Consultant,
    // Situation
    Complaints,
    Diagnosis,
    Diet,
    // Background
    PastHistory,
    ChiefComplaint,
    Allergy,
    Isolation,
    // Assessment
    Gcs,
    FallRisk,
    Vitals,
    Ventilation,
    BedSore,
    Restraint,
    Findings,
    // Recommendations
    Plan,
    Risks,
}

/// Where a field lives in the record. `mirror` is a second leaf kept equal
/// to `path` on every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub path: &'static str,
    pub mirror: Option<&'static str>,
}

impl FieldPath {
    const fn single(path: &'static str) -> Self {
        Self { path, mirror: None }
    }

    const fn mirrored(path: &'static str, mirror: &'static str) -> Self {
        Self {
            path,
            mirror: Some(mirror),
        }
    }
}

impl FieldId {
    pub const ALL: [FieldId; 23] = [
        FieldId::PatientName,
        FieldId::RoomNumber,
        FieldId::FileNumber,
        FieldId::Age,
        FieldId::AdmissionDate,
        FieldId::AdmissionSource,
        FieldId::Consultant,
        FieldId::Complaints,
        FieldId::Diagnosis,
        FieldId::Diet,
        FieldId::PastHistory,
        FieldId::ChiefComplaint,
        FieldId::Allergy,
        FieldId::Isolation,
        FieldId::Gcs,
        FieldId::FallRisk,
        FieldId::Vitals,
        FieldId::Ventilation,
        FieldId::BedSore,
        FieldId::Restraint,
        FieldId::Findings,
        FieldId::Plan,
        FieldId::Risks,
    ];

    /// The input identifier used in markup
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldId::PatientName => "patientName",
            FieldId::RoomNumber => "roomNumber",
            FieldId::FileNumber => "fileNumber",
            FieldId::Age => "age",
            FieldId::AdmissionDate => "admissionDate",
            FieldId::AdmissionSource => "admissionSource",
            FieldId::Consultant => "consultant",
            FieldId::Complaints => "complaints",
            FieldId::Diagnosis => "diagnosis",
            FieldId::Diet => "diet",
            FieldId::PastHistory => "pastHistory",
            FieldId::ChiefComplaint => "chiefComplaint",
            FieldId::Allergy => "allergy",
            FieldId::Isolation => "isolation",
            FieldId::Gcs => "gcs",
            FieldId::FallRisk => "fallRisk",
            FieldId::Vitals => "vitals",
            FieldId::Ventilation => "ventilation",
            FieldId::BedSore => "bedSore",
            FieldId::Restraint => "restraint",
            FieldId::Findings => "findings",
            FieldId::Plan => "plan",
            FieldId::Risks => "risks",
        }
    }

    /// Look up an input identifier; unknown identifiers yield `None`
    pub fn decode(identifier: &str) -> Option<FieldId> {
        FieldId::ALL
            .into_iter()
            .find(|field| field.as_str() == identifier)
    }

    pub fn path(&self) -> FieldPath {
        match self {
            FieldId::PatientName => FieldPath::mirrored("name", "isbar.identification.patient_name"),
            FieldId::RoomNumber => FieldPath::mirrored("isbar.identification.room_no", "roomNumber"),
            FieldId::FileNumber => FieldPath::mirrored("fileNumber", "isbar.identification.mrn"),
            FieldId::Age => FieldPath::mirrored("isbar.identification.age", "age"),
            FieldId::AdmissionDate => FieldPath::single("isbar.identification.admission_date"),
            FieldId::AdmissionSource => FieldPath::single("isbar.identification.admitted_from"),
            FieldId::Consultant => FieldPath::single("isbar.identification.consultant"),
            FieldId::Complaints => FieldPath::single("isbar.situation.current_complaints"),
            FieldId::Diagnosis => FieldPath::mirrored("isbar.situation.diagnosis", "diagnosis"),
            FieldId::Diet => FieldPath::single("isbar.situation.diet"),
            FieldId::PastHistory => FieldPath::single("isbar.background.past_history"),
            FieldId::ChiefComplaint => FieldPath::single("isbar.background.chief_complaint"),
            FieldId::Allergy => FieldPath::single("isbar.background.allergy"),
            FieldId::Isolation => FieldPath::single("isbar.background.isolation"),
            FieldId::Gcs => FieldPath::single("isbar.assessment.gcs"),
            FieldId::FallRisk => FieldPath::single("isbar.assessment.fall_risk"),
            FieldId::Vitals => FieldPath::single("isbar.assessment.vitals"),
            FieldId::Ventilation => FieldPath::single("isbar.assessment.ventilation"),
            FieldId::BedSore => FieldPath::single("isbar.assessment.bed_sore"),
            FieldId::Restraint => FieldPath::single("isbar.assessment.restraint"),
            FieldId::Findings => FieldPath::single("isbar.assessment.findings"),
            FieldId::Plan => FieldPath::single("isbar.recommendations.plan"),
            FieldId::Risks => FieldPath::single("isbar.recommendations.risks"),
        }
    }

    /// The editor tab the input is rendered on
    pub fn tab(&self) -> ModalTab {
        match self {
            FieldId::PatientName
            | FieldId::RoomNumber
            | FieldId::FileNumber
            | FieldId::Age
            | FieldId::AdmissionDate
            | FieldId::AdmissionSource
            | FieldId::Consultant => ModalTab::Identification,
            FieldId::Complaints | FieldId::Diagnosis | FieldId::Diet => ModalTab::Situation,
            FieldId::PastHistory | FieldId::ChiefComplaint | FieldId::Allergy | FieldId::Isolation => {
                ModalTab::Background
            }
            FieldId::Gcs
            | FieldId::FallRisk
            | FieldId::Vitals
            | FieldId::Ventilation
            | FieldId::BedSore
            | FieldId::Restraint
            | FieldId::Findings => ModalTab::Assessment,
            FieldId::Plan | FieldId::Risks => ModalTab::Recommendations,
        }
    }

    /// Fields rendered on `tab`, in form order
    pub fn on_tab(tab: ModalTab) -> impl Iterator<Item = FieldId> {
        FieldId::ALL.into_iter().filter(move |field| field.tab() == tab)
    }

    /// Option list for select inputs, `None` for free text
    pub fn options(&self) -> Option<&'static [&'static str]> {
        match self {
            FieldId::FallRisk => Some(FALL_RISK_OPTIONS),
            FieldId::BedSore | FieldId::Restraint => Some(YES_NO_OPTIONS),
            _ => None,
        }
    }

    /// Whether `value` can be stored in this field
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            FieldId::FallRisk => value.parse::<FallRisk>().is_ok(),
            FieldId::BedSore | FieldId::Restraint => value.parse::<YesNo>().is_ok(),
            _ => true,
        }
    }

    /// The non-empty stored value, reading the mirror when the primary
    /// leaf is blank
    pub fn persisted(&self, record: &Record) -> Option<String> {
        let ident = &record.isbar.identification;
        let situation = &record.isbar.situation;
        let background = &record.isbar.background;
        let assessment = &record.isbar.assessment;
        let recommendations = &record.isbar.recommendations;

        let (primary, mirror): (Option<&str>, Option<&str>) = match self {
            FieldId::PatientName => (Some(record.name.as_str()), Some(ident.patient_name.as_str())),
            FieldId::RoomNumber => (Some(ident.room_no.as_str()), Some(record.room_number.as_str())),
            FieldId::FileNumber => (Some(record.file_number.as_str()), Some(ident.mrn.as_str())),
            FieldId::Age => (Some(ident.age.as_str()), Some(record.age.as_str())),
            FieldId::AdmissionDate => (Some(ident.admission_date.as_str()), None),
            FieldId::AdmissionSource => (Some(ident.admitted_from.as_str()), None),
            FieldId::Consultant => (Some(ident.consultant.as_str()), None),
            FieldId::Complaints => (Some(situation.current_complaints.as_str()), None),
            FieldId::Diagnosis => (Some(situation.diagnosis.as_str()), Some(record.diagnosis.as_str())),
            FieldId::Diet => (Some(situation.diet.as_str()), None),
            FieldId::PastHistory => (Some(background.past_history.as_str()), None),
            FieldId::ChiefComplaint => (Some(background.chief_complaint.as_str()), None),
            FieldId::Allergy => (Some(background.allergy.as_str()), None),
            FieldId::Isolation => (Some(background.isolation.as_str()), None),
            FieldId::Gcs => (Some(assessment.gcs.as_str()), None),
            FieldId::FallRisk => (assessment.fall_risk.map(|v| v.as_str()), None),
            FieldId::Vitals => (Some(assessment.vitals.as_str()), None),
            FieldId::Ventilation => (Some(assessment.ventilation.as_str()), None),
            FieldId::BedSore => (assessment.bed_sore.map(|v| v.as_str()), None),
            FieldId::Restraint => (assessment.restraint.map(|v| v.as_str()), None),
            FieldId::Findings => (Some(assessment.findings.as_str()), None),
            FieldId::Plan => (Some(recommendations.plan.as_str()), None),
            FieldId::Risks => (Some(recommendations.risks.as_str()), None),
        };

        primary
            .into_iter()
            .chain(mirror)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Write `value` to the field's leaf and its mirror
    pub fn assign(&self, record: &mut Record, value: &str) -> Result<(), UnknownOption> {
        let isbar = &mut record.isbar;
        let text = value.to_string();

        match self {
            FieldId::PatientName => {
                record.name = text.clone();
                isbar.identification.patient_name = text;
            }
            FieldId::RoomNumber => {
                isbar.identification.room_no = text.clone();
                record.room_number = text;
            }
            FieldId::FileNumber => {
                record.file_number = text.clone();
                isbar.identification.mrn = text;
            }
            FieldId::Age => {
                isbar.identification.age = text.clone();
                record.age = text;
            }
            FieldId::AdmissionDate => isbar.identification.admission_date = text,
            FieldId::AdmissionSource => isbar.identification.admitted_from = text,
            FieldId::Consultant => isbar.identification.consultant = text,
            FieldId::Complaints => isbar.situation.current_complaints = text,
            FieldId::Diagnosis => {
                isbar.situation.diagnosis = text.clone();
                record.diagnosis = text;
            }
            FieldId::Diet => isbar.situation.diet = text,
            FieldId::PastHistory => isbar.background.past_history = text,
            FieldId::ChiefComplaint => isbar.background.chief_complaint = text,
            FieldId::Allergy => isbar.background.allergy = text,
            FieldId::Isolation => isbar.background.isolation = text,
            FieldId::Gcs => isbar.assessment.gcs = text,
            FieldId::FallRisk => isbar.assessment.fall_risk = Some(value.parse()?),
            FieldId::Vitals => isbar.assessment.vitals = text,
            FieldId::Ventilation => isbar.assessment.ventilation = text,
            FieldId::BedSore => isbar.assessment.bed_sore = Some(value.parse()?),
            FieldId::Restraint => isbar.assessment.restraint = Some(value.parse()?),
            FieldId::Findings => isbar.assessment.findings = text,
            FieldId::Plan => isbar.recommendations.plan = text,
            FieldId::Risks => isbar.recommendations.risks = text,
        }

        Ok(())
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldId::decode(s).ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// Inputs to the defaulting rules that are not part of the record
#[derive(Debug, Clone, Copy)]
pub struct DefaultContext {
    pub now: DateTime<Local>,
    pub language: Language,
}

impl DefaultContext {
    pub fn new(language: Language) -> Self {
        Self {
            now: Local::now(),
            language,
        }
    }
}

/// Value used when neither a draft nor the stored record has one
pub fn default_for(field: FieldId, ctx: &DefaultContext) -> String {
    match field {
        FieldId::FileNumber => generate_mrn(ctx.now),
        FieldId::AdmissionDate => ctx.now.format(ADMISSION_DATE_FORMAT).to_string(),
        _ => static_default(field, ctx.language).unwrap_or_default(),
    }
}

/// Defaults that do not depend on the clock. `None` for generated values.
pub fn static_default(field: FieldId, language: Language) -> Option<String> {
    let value = match field {
        FieldId::FileNumber | FieldId::AdmissionDate => return None,
        FieldId::Allergy | FieldId::Isolation => language.none_sentinel(),
        FieldId::FallRisk => FallRisk::Low.as_str(),
        FieldId::BedSore | FieldId::Restraint => YesNo::No.as_str(),
        FieldId::Gcs => DEFAULT_GCS,
        _ => "",
    };
    Some(value.to_string())
}

/// "MRN" followed by the last digits of the millisecond timestamp
pub fn generate_mrn(now: DateTime<Local>) -> String {
    let digits = now.timestamp_millis().unsigned_abs().to_string();
    let tail = &digits[digits.len().saturating_sub(MRN_DIGITS)..];
    format!("{}{:0>width$}", MRN_PREFIX, tail, width = MRN_DIGITS)
}
