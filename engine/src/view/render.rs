//! Render projection
//!
//! `render` is a pure function of [`AppState`]: the whole view is rebuilt on
//! every call and nothing is diffed. Malformed data surfaces as a
//! [`RenderError`], which `render_or_recover` turns into the recovery view.

use super::markup::{el, Element, Node};
use crate::chart::{static_default, Draft, DraftKey, FieldId};
use crate::database::{Alert, Record, RecordStatus, Todo};
use crate::error::RenderError;
use crate::i18n::{label, Label, Language};
use crate::state::{AppState, ModalTab, View};
use std::collections::HashSet;

/// Project the state into a markup tree
pub fn render(state: &AppState) -> Result<Node, RenderError> {
    validate(state)?;

    let lang = state.language;
    let root = app_root(state);

    if !state.is_authenticated() {
        return Ok(root.child(login_view(lang)).into());
    }

    let body = match state.current_view {
        View::Dashboard => dashboard(state),
        View::Alerts => alerts_view(state),
    };

    let mut root = root.child(header(state)).child(body);
    if state.modal_open {
        root = root.child(editor(state));
    }

    Ok(root.into())
}

/// Render, replacing any failure with the recovery view
pub fn render_or_recover(state: &AppState) -> Node {
    match render(state) {
        Ok(node) => node,
        Err(e) => {
            tracing::warn!("Render failed, showing recovery view: {}", e);
            recovery_view(state.language, &e)
        }
    }
}

/// Minimal view with a full-reload affordance
pub fn recovery_view(lang: Language, error: &RenderError) -> Node {
    el("div")
        .id("app")
        .class("app render-error")
        .attr("dir", lang.direction())
        .child(
            el("div")
                .id("render-error")
                .child(el("h1").text(label(lang, Label::RenderFailed)))
                .child(el("p").class("error-detail").text(error.to_string()))
                .child(
                    el("button")
                        .id("reload")
                        .attr("data-action", "reload")
                        .text(label(lang, Label::Reload)),
                ),
        )
        .into()
}

fn validate(state: &AppState) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    for (index, record) in state.records.iter().enumerate() {
        let id = record.id().ok_or(RenderError::MissingRecordId(index))?;
        if !seen.insert(id) {
            return Err(RenderError::DuplicateRecordId(id.to_string()));
        }
    }
    Ok(())
}

fn app_root(state: &AppState) -> Element {
    let lang = state.language;
    el("div")
        .id("app")
        .class(if state.dark_mode { "app dark" } else { "app" })
        .attr("lang", lang.code())
        .attr("dir", lang.direction())
}

fn login_view(lang: Language) -> Element {
    el("section")
        .id("login")
        .child(el("h1").text(label(lang, Label::AppTitle)))
        .child(el("p").text(label(lang, Label::SignIn)))
}

fn header(state: &AppState) -> Element {
    let lang = state.language;
    let unread = state.unread_alert_count();
    let nav_button = |view: View, id: &'static str, text: Label| {
        el("button")
            .id(id)
            .class(if state.current_view == view { "nav active" } else { "nav" })
            .text(label(lang, text))
    };

    let mut alerts = nav_button(View::Alerts, "nav-alerts", Label::Alerts);
    if unread > 0 {
        alerts = alerts.child(el("span").id("unread-count").class("badge").text(unread.to_string()));
    }

    let user_name = state.user.as_ref().map(|u| u.name.clone()).unwrap_or_default();

    el("header")
        .child(el("h1").text(label(lang, Label::AppTitle)))
        .child(
            el("nav")
                .child(nav_button(View::Dashboard, "nav-dashboard", Label::Dashboard))
                .child(alerts),
        )
        .child(
            el("div")
                .class("toolbar")
                .child(
                    el("button")
                        .id("toggle-language")
                        .attr("data-language", lang.other().code())
                        .text(lang.other().code().to_uppercase()),
                )
                .child(
                    el("button")
                        .id("toggle-dark")
                        .attr("aria-pressed", state.dark_mode.to_string()),
                )
                .child(el("span").id("user-name").text(user_name)),
        )
}

// ===== Dashboard =====

fn dashboard(state: &AppState) -> Element {
    let lang = state.language;
    let count = |status: RecordStatus| state.records.iter().filter(|r| r.status == status).count();
    let status_tab = |status: RecordStatus, text: Label| {
        el("button")
            .class(if state.active_tab == status { "status-tab active" } else { "status-tab" })
            .attr("data-status", status.as_str())
            .text(format!("{} ({})", label(lang, text), count(status)))
    };

    let visible = state.visible_records();
    let list = if visible.is_empty() {
        el("section")
            .id("record-list")
            .child(el("p").class("empty").text(label(lang, Label::NoPatients)))
    } else {
        el("section")
            .id("record-list")
            .children(visible.into_iter().map(|record| record_card(record, lang)))
    };

    el("main")
        .id("dashboard")
        .child(
            el("div")
                .class("status-tabs")
                .child(status_tab(RecordStatus::Active, Label::ActivePatients))
                .child(status_tab(RecordStatus::Discharged, Label::Discharged)),
        )
        .child(
            el("input")
                .id("search")
                .attr("type", "search")
                .attr("placeholder", label(lang, Label::Search))
                .attr("value", state.search_query.clone()),
        )
        .child(
            el("button")
                .id("new-patient")
                .attr("data-action", "new-record")
                .text(label(lang, Label::NewPatient)),
        )
        .child(list)
        .child(tasks_panel(&state.todos, lang))
}

fn record_card(record: &Record, lang: Language) -> Element {
    let id = record.id().unwrap_or_default();
    let assessment = &record.isbar.assessment;
    let allergy = &record.isbar.background.allergy;

    let mut badges = el("div").class("badges");
    if let Some(risk) = assessment.fall_risk {
        badges = badges.child(
            el("span")
                .class(format!("badge fall-risk {}", risk.as_str()))
                .text(risk.as_str()),
        );
    }
    if !allergy.is_empty() && !Language::is_none_sentinel(allergy) {
        badges = badges.child(el("span").class("badge allergy").text(allergy.clone()));
    }

    let mut actions = el("div").class("card-actions");
    actions = match record.status {
        RecordStatus::Active => actions.child(
            el("button")
                .attr("data-action", "discharge")
                .attr("data-id", id)
                .text(label(lang, Label::Discharge)),
        ),
        RecordStatus::Discharged => actions.child(
            el("button")
                .attr("data-action", "readmit")
                .attr("data-id", id)
                .text(label(lang, Label::Readmit)),
        ),
    };

    el("article")
        .class("record-card")
        .attr("data-id", id)
        .child(el("h3").class("name").text(record.name.clone()))
        .child(el("span").class("room").text(record.room_number.clone()))
        .child(el("span").class("mrn").text(record.file_number.clone()))
        .child(el("span").class("diagnosis").text(record.diagnosis.clone()))
        .child(badges)
        .child(actions)
}

fn tasks_panel(todos: &[Todo], lang: Language) -> Element {
    let panel = el("aside")
        .id("tasks")
        .child(el("h2").text(label(lang, Label::Tasks)));

    if todos.is_empty() {
        return panel.child(el("p").class("empty").text(label(lang, Label::NoTasks)));
    }

    panel.child(el("ul").children(todos.iter().map(|todo| {
        let class = if todo.completed {
            format!("task done {}", todo.priority.as_str())
        } else {
            format!("task {}", todo.priority.as_str())
        };
        let mut item = el("li")
            .class(class)
            .attr("data-id", todo.id.clone())
            .child(el("span").class("task-text").text(todo.text.clone()));
        if let Some(patient) = &todo.patient_name {
            item = item.child(el("span").class("task-patient").text(patient.clone()));
        }
        if let Some(due) = todo.due_date {
            item = item.child(el("time").class("task-due").text(due.to_string()));
        }
        item
    })))
}

// ===== Alerts =====

fn alerts_view(state: &AppState) -> Element {
    let lang = state.language;
    let view = el("main").id("alerts");

    if state.alerts.is_empty() {
        return view.child(el("p").class("empty").text(label(lang, Label::NoAlerts)));
    }

    view.child(el("ul").children(state.alerts.iter().map(|alert| alert_item(alert, lang))))
}

fn alert_item(alert: &Alert, lang: Language) -> Element {
    let mut class = format!("alert {} {}", alert.category.as_str(), alert.priority.as_str());
    if !alert.read {
        class.push_str(" unread");
    }

    let mut item = el("li")
        .class(class)
        .attr("data-id", alert.id.clone())
        .child(el("h3").text(alert.title.clone()))
        .child(el("p").text(alert.message.clone()));
    if let Some(patient) = &alert.patient_name {
        item = item.child(el("span").class("alert-patient").text(patient.clone()));
    }

    item.child(
        el("button")
            .attr("data-action", "delete-alert")
            .attr("data-id", alert.id.clone())
            .text(label(lang, Label::Delete)),
    )
}

// ===== Editor =====

fn editor(state: &AppState) -> Element {
    let lang = state.language;
    let key = DraftKey::for_record(state.selected_record_id.as_deref());
    let draft = state.drafts.get_draft(&key);
    let persisted = state.selected_record();

    let tabs = ModalTab::ALL.into_iter().map(|tab| {
        el("button")
            .class(if tab == state.modal_tab { "tab active" } else { "tab" })
            .attr("data-tab", tab.as_str())
            .text(tab.title(lang))
    });

    let mut modal = el("div")
        .id("record-modal")
        .class("modal")
        .attr("data-record", key.to_string())
        .attr("data-tab", state.modal_tab.as_str())
        .child(el("nav").class("modal-tabs").children(tabs));

    if state.selected_record_id.is_some() && persisted.is_none() {
        modal = modal.child(
            el("p")
                .id("record-removed")
                .class("banner warning")
                .text(label(lang, Label::RecordRemoved)),
        );
    }

    let body = match state.modal_tab {
        ModalTab::ShiftNotes => shift_notes_panel(persisted, lang),
        ModalTab::Medications => medications_panel(persisted, lang),
        ModalTab::Labs => labs_panel(persisted, lang),
        ModalTab::Radiology => radiology_panel(persisted, lang),
        section => el("form")
            .class("isbar-form")
            .attr("data-section", section.as_str())
            .children(FieldId::on_tab(section).map(|field| field_input(field, draft, persisted, lang))),
    };

    let footer = el("footer")
        .child(
            el("button")
                .id("save-record")
                .attr("data-action", "save")
                .text(label(lang, Label::Save)),
        )
        .child(
            el("button")
                .id("close-record")
                .attr("data-action", "close")
                .text(label(lang, Label::Close)),
        );

    modal.child(el("div").class("modal-body").child(body)).child(footer)
}

/// Shown value: raw draft entry (even when cleared), else stored, else
/// the clock-independent default
fn field_input(field: FieldId, draft: &Draft, persisted: Option<&Record>, lang: Language) -> Element {
    let value = draft
        .get(field)
        .map(str::to_string)
        .or_else(|| persisted.and_then(|record| field.persisted(record)))
        .or_else(|| static_default(field, lang))
        .unwrap_or_default();

    let control = match field.options() {
        Some(options) => el("select")
            .id(field.as_str())
            .attr("name", field.as_str())
            .children(options.iter().map(|option| {
                el("option")
                    .attr("value", *option)
                    .attr_if(*option == value, "selected", "selected")
                    .text(*option)
            })),
        None => el("input")
            .id(field.as_str())
            .attr("name", field.as_str())
            .attr("value", value)
            .attr_if(
                field == FieldId::FileNumber && persisted.is_some(),
                "readonly",
                "readonly",
            ),
    };

    el("label")
        .class("field")
        .attr("for", field.as_str())
        .child(el("span").text(field_label(field, lang)))
        .child(control)
}

fn delete_button(action: &'static str, index: usize, lang: Language) -> Element {
    el("button")
        .attr("data-action", action)
        .attr("data-index", index.to_string())
        .text(label(lang, Label::Delete))
}

fn add_form(action: &'static str, inputs: &[&'static str], lang: Language) -> Element {
    el("div")
        .class("add-entry")
        .children(inputs.iter().map(|name| el("input").id(*name).attr("name", *name)))
        .child(
            el("button")
                .attr("data-action", action)
                .text(label(lang, Label::Add)),
        )
}

fn shift_notes_panel(persisted: Option<&Record>, lang: Language) -> Element {
    let notes = persisted.map(|r| r.isbar.shift_notes.as_slice()).unwrap_or_default();

    el("section")
        .id("shift-notes")
        .child(add_form("add-shift-note", &["shiftEvent", "shiftCategory"], lang))
        .child(el("ol").children(notes.iter().enumerate().map(|(index, note)| {
            el("li")
                .class(format!("shift-note {}", note.category))
                .attr("data-id", note.id.clone())
                .child(el("time").text(note.time.format("%Y-%m-%d %H:%M").to_string()))
                .child(el("span").text(note.event.clone()))
                .child(delete_button("delete-shift-note", index, lang))
        })))
}

fn medications_panel(persisted: Option<&Record>, lang: Language) -> Element {
    let medications = persisted.map(|r| r.medications.as_slice()).unwrap_or_default();

    el("section")
        .id("medications")
        .child(add_form(
            "add-medication",
            &["medName", "medDose", "medRoute", "medFrequency"],
            lang,
        ))
        .child(el("ul").children(medications.iter().enumerate().map(|(index, med)| {
            el("li")
                .class("medication")
                .text(format!("{} {} {} {}", med.name, med.dose, med.route, med.frequency).trim().to_string())
                .child(delete_button("delete-medication", index, lang))
        })))
}

fn labs_panel(persisted: Option<&Record>, lang: Language) -> Element {
    let labs = persisted.map(|r| r.labs.as_slice()).unwrap_or_default();

    el("section")
        .id("labs")
        .child(add_form("add-lab", &["labTest", "labResult", "labDate"], lang))
        .child(el("ul").children(labs.iter().enumerate().map(|(index, lab)| {
            el("li")
                .class("lab")
                .child(el("span").class("lab-test").text(lab.test.clone()))
                .child(el("span").class("lab-result").text(lab.result.clone()))
                .child(el("time").text(lab.date.clone()))
                .child(delete_button("delete-lab", index, lang))
        })))
}

fn radiology_panel(persisted: Option<&Record>, lang: Language) -> Element {
    let studies = persisted.map(|r| r.radiology.as_slice()).unwrap_or_default();

    el("section")
        .id("radiology")
        .child(add_form(
            "add-radiology",
            &["radStudy", "radFindings", "radDate"],
            lang,
        ))
        .child(el("ul").children(studies.iter().enumerate().map(|(index, study)| {
            el("li")
                .class("radiology")
                .child(el("span").class("study").text(study.study.clone()))
                .child(el("span").class("findings").text(study.findings.clone()))
                .child(el("time").text(study.date.clone()))
                .child(delete_button("delete-radiology", index, lang))
        })))
}

fn field_label(field: FieldId, lang: Language) -> &'static str {
    match lang {
        Language::English => match field {
            FieldId::PatientName => "Patient name",
            FieldId::RoomNumber => "Room",
            FieldId::FileNumber => "MRN",
            FieldId::Age => "Age",
            FieldId::AdmissionDate => "Admission date",
            FieldId::AdmissionSource => "Admitted from",
            FieldId::Consultant => "Consultant",
            FieldId::Complaints => "Current complaints",
            FieldId::Diagnosis => "Diagnosis",
            FieldId::Diet => "Diet",
            FieldId::PastHistory => "Past history",
            FieldId::ChiefComplaint => "Chief complaint",
            FieldId::Allergy => "Allergy",
            FieldId::Isolation => "Isolation",
            FieldId::Gcs => "GCS",
            FieldId::FallRisk => "Fall risk",
            FieldId::Vitals => "Vital signs",
            FieldId::Ventilation => "Ventilation",
            FieldId::BedSore => "Pressure injury",
            FieldId::Restraint => "Restraint",
            FieldId::Findings => "Findings",
            FieldId::Plan => "Plan of care",
            FieldId::Risks => "Risks",
        },
        Language::Arabic => match field {
            FieldId::PatientName => "اسم المريض",
            FieldId::RoomNumber => "الغرفة",
            FieldId::FileNumber => "رقم الملف",
            FieldId::Age => "العمر",
            FieldId::AdmissionDate => "تاريخ الدخول",
            FieldId::AdmissionSource => "مصدر الدخول",
            FieldId::Consultant => "الاستشاري",
            FieldId::Complaints => "الشكوى الحالية",
            FieldId::Diagnosis => "التشخيص",
            FieldId::Diet => "النظام الغذائي",
            FieldId::PastHistory => "التاريخ المرضي",
            FieldId::ChiefComplaint => "الشكوى الرئيسية",
            FieldId::Allergy => "الحساسية",
            FieldId::Isolation => "العزل",
            FieldId::Gcs => "مقياس غلاسكو",
            FieldId::FallRisk => "خطر السقوط",
            FieldId::Vitals => "العلامات الحيوية",
            FieldId::Ventilation => "التهوية",
            FieldId::BedSore => "قرحة الفراش",
            FieldId::Restraint => "التقييد",
            FieldId::Findings => "الملاحظات",
            FieldId::Plan => "خطة الرعاية",
            FieldId::Risks => "المخاطر",
        },
    }
}
