//! SerialLog - Main Entry Point
//!
//! Interactive serial data-capture: configure the channel through the
//! command interpreter, then stream incoming lines into a timestamped data
//! log until the process is terminated.

use anyhow::Context;
use seriallog_rs::{
    config::SettingsStore,
    console,
    session::SessionController,
    transport::{self, SerialTransport},
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directory for captured data logs, below the working directory
const DATA_LOG_DIR: &str = "datalogs";

/// Directory for application diagnostics logs
const DIAGNOSTICS_DIR: &str = "logs";

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            console::error_line(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    console::set_title();
    console::print_logo();

    // Diagnostics go to a daily file; the console stays operator-facing
    let file_appender = tracing_appender::rolling::daily(DIAGNOSTICS_DIR, "seriallog.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,seriallog_rs=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();

    tracing::info!("SerialLog v{} initiated", env!("CARGO_PKG_VERSION"));

    let store = SettingsStore::at_default_location()
        .context("could not determine the settings location")?;
    let mut session =
        SessionController::new(store, Box::new(SerialTransport::new()), DATA_LOG_DIR);

    console::show_ports(&transport::available_port_names());
    session.configure();

    let stdin = std::io::stdin();
    let outcome = session
        .run_interpreter(&mut stdin.lock())
        .context("operator input failed")?;
    if !outcome.is_start() {
        console::plain_line("No /start issued. Bye.");
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(e) = session.arm() {
        tracing::error!("Failed to arm session: {}", e);
        console::error_line(&e.to_string());
        console::pause_for_ack();
        return Ok(ExitCode::FAILURE);
    }

    // Streams until the process is terminated; returns only if the reader
    // loop dies on a fatal transport error.
    if let Err(e) = session.stream_until_reader_exits() {
        console::error_line(&e.to_string());
        console::pause_for_ack();
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
