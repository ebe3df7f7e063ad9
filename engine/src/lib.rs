//! ISBAR chart engine
//!
//! Local-first core of a bilingual nursing handover chart: field codec,
//! draft buffering, record merge, state projection and backend sync.

pub mod app;
pub mod chart;
pub mod config;
pub mod database;
pub mod error;
pub mod i18n;
pub mod services;
pub mod state;
pub mod view;
