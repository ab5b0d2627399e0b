//! The interactive console loop and its gateway implementations.
//!
//! Stdin is shared between the command loop and the dialog gateway: a
//! "dialog" is a prompt that consumes the next input line, with a blank line
//! meaning the user dismissed it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use kiln_core::document::DocumentCollection;
use kiln_core::error::Result;
use kiln_core::gateway::{DialogGateway, ShellGateway};
use kiln_core::notice::{Notice, NoticeLevel};
use kiln_core::serial::SerialSession;
use kiln_core::workbench::Workbench;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;

use crate::command::{self, Command};

/// Line-oriented stdin, shared between the loop and the dialogs.
pub type SharedInput = Arc<tokio::sync::Mutex<Lines<BufReader<Stdin>>>>;

pub fn stdin_lines() -> SharedInput {
    Arc::new(tokio::sync::Mutex::new(
        BufReader::new(tokio::io::stdin()).lines(),
    ))
}

async fn next_line(input: &SharedInput) -> Option<String> {
    input.lock().await.next_line().await.ok().flatten()
}

/// [`DialogGateway`] over the console: each pick is a prompt for one line.
pub struct ConsoleDialogs {
    input: SharedInput,
}

impl ConsoleDialogs {
    pub fn new(input: SharedInput) -> Self {
        Self { input }
    }

    async fn prompt(&self, text: &str) -> Option<PathBuf> {
        println!("{text} (blank to cancel):");
        let line = next_line(&self.input).await?;
        let line = line.trim();
        if line.is_empty() {
            None
        } else {
            Some(PathBuf::from(line))
        }
    }
}

#[async_trait]
impl DialogGateway for ConsoleDialogs {
    async fn pick_open_path(&self) -> Result<Option<PathBuf>> {
        Ok(self.prompt("Path to open").await)
    }

    async fn pick_save_path(&self, default_extension: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .prompt(&format!("Save as (default extension .{default_extension})"))
            .await)
    }
}

/// [`ShellGateway`] that stops the console loop.
pub struct ConsoleShell {
    exit: CancellationToken,
}

impl ConsoleShell {
    pub fn new(exit: CancellationToken) -> Self {
        Self { exit }
    }
}

#[async_trait]
impl ShellGateway for ConsoleShell {
    async fn request_exit(&self) -> Result<()> {
        self.exit.cancel();
        Ok(())
    }
}

/// Prints one notice the way the desktop shell would toast it.
pub fn print_notice(notice: &Notice) {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    };
    println!("[{tag}] {}: {}", notice.title, notice.message);
}

/// The interactive loop. Owns nothing but references into the workbench.
pub struct Console {
    workbench: Arc<Workbench>,
    input: SharedInput,
    exit: CancellationToken,
}

impl Console {
    pub fn new(workbench: Arc<Workbench>, input: SharedInput, exit: CancellationToken) -> Self {
        Self {
            workbench,
            input,
            exit,
        }
    }

    pub async fn run(&self) {
        println!("kiln console. Type `help` for commands.");
        loop {
            let line = tokio::select! {
                _ = self.exit.cancelled() => break,
                line = next_line(&self.input) => match line {
                    Some(line) => line,
                    None => break, // stdin closed
                },
            };
            match command::parse(&line) {
                Ok(Some(command)) => self.execute(command).await,
                Ok(None) => {}
                Err(message) => println!("{message}"),
            }
            // The exit request may have landed while executing.
            if self.exit.is_cancelled() {
                break;
            }
        }
        self.workbench.serial().shutdown().await;
    }

    async fn execute(&self, command: Command) {
        let documents = self.workbench.documents();
        let serial = self.workbench.serial();
        match command {
            Command::New => {
                let index = documents.create().await;
                println!("created tab {index}");
            }
            Command::Open(Some(path)) => {
                let _ = documents.open_path(path).await;
            }
            Command::Open(None) => {
                let _ = documents.open_from_dialog().await;
            }
            Command::Save => {
                let _ = documents.save_active().await;
            }
            Command::Close(index) => {
                let index = match index {
                    Some(index) => Some(index),
                    None => documents.snapshot().await.active_index(),
                };
                match index {
                    Some(index) => {
                        if documents.close(index).await {
                            println!("closed tab {index}");
                        } else {
                            println!("no tab {index}");
                        }
                    }
                    None => println!("nothing to close"),
                }
            }
            Command::Tabs => render_tabs(&documents.snapshot().await),
            Command::Tab(index) => {
                if !documents.set_active(index).await {
                    println!("no tab {index}");
                }
            }
            Command::Edit(content) => {
                match documents.snapshot().await.active_index() {
                    Some(index) => {
                        documents.update_content(index, content).await;
                    }
                    None => println!("no open document"),
                };
            }
            Command::Ports => {
                if let Ok(ports) = serial.refresh_ports().await {
                    for port in ports {
                        println!("{port}");
                    }
                }
            }
            Command::Connect(port) => {
                let _ = serial.connect(&port).await;
            }
            Command::Disconnect => {
                if let Err(err) = serial.disconnect().await {
                    println!("{err}");
                }
            }
            Command::Read => {
                if serial.manual_read().await.is_ok() {
                    println!("{}", serial.snapshot().await.receive_buffer());
                }
            }
            Command::Write(data) => {
                if let Err(err) = serial.write(&data).await {
                    println!("{err}");
                }
            }
            Command::AutoRead => {
                if let Ok(enabled) = serial.toggle_auto_read().await {
                    println!("auto read {}", if enabled { "on" } else { "off" });
                }
            }
            Command::LineMode => {
                let enabled = serial.toggle_line_mode().await;
                println!("line mode {}", if enabled { "on" } else { "off" });
            }
            Command::Buffer => render_serial(&serial.snapshot().await),
            Command::Build => {
                let _ = self.workbench.build_project().await;
            }
            Command::Run => {
                let _ = self.workbench.run_project().await;
            }
            Command::Info => {
                if let Ok(info) = serial.board_info().await {
                    println!("{info}");
                }
            }
            Command::ZoomIn => println!("font size {}", self.workbench.zoom_in()),
            Command::ZoomOut => println!("font size {}", self.workbench.zoom_out()),
            Command::Quit => {
                self.workbench.request_quit().await;
                println!("Quit kiln? (yes/no)");
            }
            Command::Yes => {
                let _ = self.workbench.confirm_pending().await;
            }
            Command::No => self.workbench.cancel_pending().await,
            Command::Key(chord) => {
                if !self.workbench.dispatch(chord).await {
                    println!("unbound chord");
                }
                if self.pending_quit().await {
                    println!("Quit kiln? (yes/no)");
                }
            }
            Command::Help => print_help(),
        }
    }

    async fn pending_quit(&self) -> bool {
        self.workbench.confirm_state().await.is_pending()
    }
}

fn render_tabs(collection: &DocumentCollection) {
    if collection.is_empty() {
        println!("no open documents");
        return;
    }
    let active = collection.active_index();
    for (index, doc) in collection.documents().iter().enumerate() {
        let marker = if Some(index) == active { '*' } else { ' ' };
        let dirty = if doc.dirty() { " [+]" } else { "" };
        println!("{marker} {index}: {}{dirty}", doc.label());
    }
}

fn render_serial(session: &SerialSession) {
    match session.port_name() {
        Some(port) => println!("connected: {port}"),
        None => println!("disconnected"),
    }
    println!(
        "auto read: {}, line mode: {}",
        session.auto_read(),
        session.line_mode()
    );
    if !session.receive_buffer().is_empty() {
        println!("{}", session.receive_buffer());
    }
}

fn print_help() {
    println!(
        "\
documents: new | open [path] | save | close [n] | tabs | tab <n> | edit <text>
serial:    ports | connect <port> | disconnect | read | write <text>
           autoread | linemode | buffer | info
project:   build | run
other:     zoom in|out | key <chord> | quit | help"
    );
}
