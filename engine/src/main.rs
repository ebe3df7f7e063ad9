// ISBAR chart - headless host
// Renders the chart to an HTML file and keeps it in sync until interrupted

use anyhow::Context;
use isbar_chart::app;
use isbar_chart::database::User;
use isbar_chart::services::{Collaborators, HtmlFileView, LogNotifier};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn app_data_dir() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("isbar-data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "isbar_chart=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ISBAR chart");

    let data_dir = app_data_dir();
    let view = HtmlFileView::new(data_dir.join("view.html"));
    let collaborators = Collaborators::new(Arc::new(view.clone()), Arc::new(LogNotifier));

    let ctx = app::setup(data_dir, collaborators)
        .await
        .context("failed to initialize application")?;

    let user = User {
        id: "local".to_string(),
        email: std::env::var("ISBAR_USER_EMAIL").unwrap_or_else(|_| "nurse@localhost".to_string()),
        name: std::env::var("ISBAR_USER_NAME").unwrap_or_else(|_| "Nurse".to_string()),
    };
    ctx.controller
        .sign_in(user)
        .await
        .context("failed to load charts")?;

    let realtime = ctx.controller.start_realtime();
    let reminders = ctx.reminders.clone().start_scheduler();

    tracing::info!("View written to {:?}; press Ctrl+C to exit", view.path());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    realtime.abort();
    reminders.abort();
    tracing::info!("Shutting down");

    Ok(())
}
