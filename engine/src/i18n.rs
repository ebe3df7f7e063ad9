//! UI and AI output languages
//!
//! The chart is bilingual. Only the strings the engine itself produces
//! live here: form labels, the "none" sentinel and status captions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }

    /// Text direction for the document root
    pub fn direction(&self) -> &'static str {
        match self {
            Language::English => "ltr",
            Language::Arabic => "rtl",
        }
    }

    /// Sentinel stored in allergy and isolation fields when nothing applies
    pub fn none_sentinel(&self) -> &'static str {
        match self {
            Language::English => "None",
            Language::Arabic => "لا يوجد",
        }
    }

    /// True when `value` is the "none" sentinel in either language
    pub fn is_none_sentinel(value: &str) -> bool {
        let value = value.trim();
        [Language::English, Language::Arabic]
            .iter()
            .any(|lang| value.eq_ignore_ascii_case(lang.none_sentinel()))
    }

    pub fn other(&self) -> Language {
        match self {
            Language::English => Language::Arabic,
            Language::Arabic => Language::English,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ar" | "arabic" => Ok(Language::Arabic),
            other => Err(format!("Unsupported language: {}", other)),
        }
    }
}

/// Strings rendered by the view projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    AppTitle,
    SignIn,
    Dashboard,
    Alerts,
    ActivePatients,
    Discharged,
    Search,
    NewPatient,
    NoPatients,
    Tasks,
    NoTasks,
    NoAlerts,
    Save,
    Close,
    Add,
    Delete,
    Discharge,
    Readmit,
    RecordRemoved,
    RenderFailed,
    Reload,
}

pub fn label(lang: Language, label: Label) -> &'static str {
    use Label::*;
    match (lang, label) {
        (Language::English, AppTitle) => "ISBAR Nursing Chart",
        (Language::English, SignIn) => "Sign in to continue",
        (Language::English, Dashboard) => "Dashboard",
        (Language::English, Alerts) => "Alerts",
        (Language::English, ActivePatients) => "Active",
        (Language::English, Discharged) => "Discharged",
        (Language::English, Search) => "Search by name, file number or diagnosis",
        (Language::English, NewPatient) => "New patient",
        (Language::English, NoPatients) => "No patients found",
        (Language::English, Tasks) => "Tasks",
        (Language::English, NoTasks) => "No tasks",
        (Language::English, NoAlerts) => "No alerts",
        (Language::English, Save) => "Save",
        (Language::English, Close) => "Close",
        (Language::English, Add) => "Add",
        (Language::English, Delete) => "Delete",
        (Language::English, Discharge) => "Discharge",
        (Language::English, Readmit) => "Readmit",
        (Language::English, RecordRemoved) => "This chart was removed on another device",
        (Language::English, RenderFailed) => "Something went wrong while displaying the ward",
        (Language::English, Reload) => "Reload",
        (Language::Arabic, AppTitle) => "سجل التمريض ISBAR",
        (Language::Arabic, SignIn) => "سجّل الدخول للمتابعة",
        (Language::Arabic, Dashboard) => "لوحة التحكم",
        (Language::Arabic, Alerts) => "التنبيهات",
        (Language::Arabic, ActivePatients) => "المرضى الحاليون",
        (Language::Arabic, Discharged) => "المخرَّجون",
        (Language::Arabic, Search) => "ابحث بالاسم أو رقم الملف أو التشخيص",
        (Language::Arabic, NewPatient) => "مريض جديد",
        (Language::Arabic, NoPatients) => "لا يوجد مرضى",
        (Language::Arabic, Tasks) => "المهام",
        (Language::Arabic, NoTasks) => "لا توجد مهام",
        (Language::Arabic, NoAlerts) => "لا توجد تنبيهات",
        (Language::Arabic, Save) => "حفظ",
        (Language::Arabic, Close) => "إغلاق",
        (Language::Arabic, Add) => "إضافة",
        (Language::Arabic, Delete) => "حذف",
        (Language::Arabic, Discharge) => "تخريج",
        (Language::Arabic, Readmit) => "إعادة إدخال",
        (Language::Arabic, RecordRemoved) => "تم حذف هذا السجل من جهاز آخر",
        (Language::Arabic, RenderFailed) => "حدث خطأ أثناء عرض القسم",
        (Language::Arabic, Reload) => "إعادة التحميل",
    }
}
