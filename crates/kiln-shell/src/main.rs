//! Console front end for the Kiln session core.

mod command;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use kiln_core::document::DocumentManager;
use kiln_core::notice::NoticeSender;
use kiln_core::serial::SerialManager;
use kiln_core::workbench::Workbench;
use kiln_infrastructure::{
    CargoToolchainGateway, ConfigService, SerialPortGateway, TokioFsGateway,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use console::{Console, ConsoleDialogs, ConsoleShell};

#[derive(Parser, Debug)]
#[command(name = "kiln", about = "Code editing shell for embedded Rust boards")]
struct Cli {
    /// Files to open at startup.
    files: Vec<PathBuf>,

    /// Path to an alternate config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let config = config_service.load().await?;

    let (notices, mut notice_rx) = NoticeSender::channel();
    let input = console::stdin_lines();
    let exit = CancellationToken::new();

    let documents = Arc::new(DocumentManager::new(
        Arc::new(TokioFsGateway::new()),
        Arc::new(ConsoleDialogs::new(input.clone())),
        notices.clone(),
        &config,
    ));
    let serial = Arc::new(SerialManager::new(
        Arc::new(SerialPortGateway::new(&config)),
        notices.clone(),
        &config,
    ));
    let workbench = Arc::new(Workbench::new(
        documents.clone(),
        serial,
        Arc::new(CargoToolchainGateway::new()),
        Arc::new(ConsoleShell::new(exit.clone())),
        notices,
    ));

    tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            console::print_notice(&notice);
        }
    });

    for file in cli.files {
        // Failures surface as notices; keep opening the rest.
        let _ = documents.open_path(file).await;
    }

    Console::new(workbench, input, exit).run().await;
    Ok(())
}
