//! The workbench controller.
//!
//! Ties the document and serial managers together with the remaining
//! application-level state: zoom level, the quit-confirmation state machine,
//! build/run orchestration, and keyboard-chord dispatch.

mod confirm;

pub use confirm::{ConfirmState, PendingAction};

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::sync::RwLock;

use crate::document::DocumentManager;
use crate::error::{KilnError, Result};
use crate::gateway::{ShellGateway, ToolchainGateway};
use crate::notice::{Notice, NoticeSender};
use crate::serial::SerialManager;
use crate::shortcut::{self, KeyChord, ShortcutAction};

const DEFAULT_FONT_SIZE: u32 = 14;
const MIN_FONT_SIZE: u32 = 6;
const MAX_FONT_SIZE: u32 = 72;

/// Application-level controller over the two session managers.
pub struct Workbench {
    documents: Arc<DocumentManager>,
    serial: Arc<SerialManager>,
    toolchain: Arc<dyn ToolchainGateway>,
    shell: Arc<dyn ShellGateway>,
    notices: NoticeSender,
    font_size: AtomicU32,
    confirm: RwLock<ConfirmState>,
}

impl Workbench {
    pub fn new(
        documents: Arc<DocumentManager>,
        serial: Arc<SerialManager>,
        toolchain: Arc<dyn ToolchainGateway>,
        shell: Arc<dyn ShellGateway>,
        notices: NoticeSender,
    ) -> Self {
        Self {
            documents,
            serial,
            toolchain,
            shell,
            notices,
            font_size: AtomicU32::new(DEFAULT_FONT_SIZE),
            confirm: RwLock::new(ConfirmState::default()),
        }
    }

    pub fn documents(&self) -> &Arc<DocumentManager> {
        &self.documents
    }

    pub fn serial(&self) -> &Arc<SerialManager> {
        &self.serial
    }

    pub fn font_size(&self) -> u32 {
        self.font_size.load(Ordering::Relaxed)
    }

    pub fn zoom_in(&self) -> u32 {
        self.adjust_font(1)
    }

    pub fn zoom_out(&self) -> u32 {
        self.adjust_font(-1)
    }

    fn adjust_font(&self, delta: i32) -> u32 {
        let mut size = self.font_size.load(Ordering::Relaxed);
        size = (size as i32 + delta).clamp(MIN_FONT_SIZE as i32, MAX_FONT_SIZE as i32) as u32;
        self.font_size.store(size, Ordering::Relaxed);
        size
    }

    pub async fn confirm_state(&self) -> ConfirmState {
        *self.confirm.read().await
    }

    /// Asks for quit confirmation; actual exit happens in
    /// [`Workbench::confirm_pending`].
    pub async fn request_quit(&self) {
        self.confirm.write().await.request(PendingAction::Quit);
    }

    /// Confirms the pending action, if any, and executes it.
    pub async fn confirm_pending(&self) -> Result<()> {
        let action = self.confirm.write().await.confirm();
        match action {
            Some(PendingAction::Quit) => {
                // Tear the poll down before asking the host to exit.
                self.serial.shutdown().await;
                if let Err(err) = self.shell.request_exit().await {
                    self.notices.send(Notice::error(
                        "Error",
                        format!("Failed to exit the application: {err}"),
                    ));
                    return Err(err);
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Cancels the pending confirmation, if any.
    pub async fn cancel_pending(&self) {
        self.confirm.write().await.cancel();
    }

    /// Builds the project owning the active document.
    ///
    /// Requires an active document that has been saved to a path; rejected
    /// before any gateway call otherwise.
    pub async fn build_project(&self) -> Result<String> {
        let main_file = self.eligible_main_file().await?;
        match self.toolchain.build(&main_file).await {
            Ok(output) => {
                self.notices.send(Notice::info("Build Finished", &output));
                Ok(output)
            }
            Err(err) => {
                self.notices
                    .send(Notice::error("Build Failed", err.to_string()));
                Err(err)
            }
        }
    }

    /// Runs the project owning the active document.
    pub async fn run_project(&self) -> Result<String> {
        let main_file = self.eligible_main_file().await?;
        match self.toolchain.run(&main_file).await {
            Ok(output) => {
                self.notices.send(Notice::info("Run Finished", &output));
                Ok(output)
            }
            Err(err) => {
                self.notices
                    .send(Notice::error("Run Failed", err.to_string()));
                Err(err)
            }
        }
    }

    async fn eligible_main_file(&self) -> Result<std::path::PathBuf> {
        match self.documents.active_path().await {
            Some(path) => Ok(path),
            None => {
                let err = KilnError::validation("save the active document before building");
                self.notices
                    .send(Notice::warning("Nothing to Build", err.to_string()));
                Err(err)
            }
        }
    }

    /// Routes a key-down event through the shortcut table.
    ///
    /// Returns `true` when the chord was recognized and handled, telling the
    /// caller to suppress the platform default for that combination.
    pub async fn dispatch(&self, chord: KeyChord) -> bool {
        let Some(action) = shortcut::resolve(chord) else {
            return false;
        };
        tracing::debug!(?action, "dispatching shortcut");
        match action {
            ShortcutAction::SaveActiveDocument => {
                let _ = self.documents.save_active().await;
            }
            ShortcutAction::OpenDocument => {
                let _ = self.documents.open_from_dialog().await;
            }
            ShortcutAction::CreateDocument => {
                self.documents.create().await;
            }
            ShortcutAction::RequestQuit => {
                self.request_quit().await;
            }
            ShortcutAction::ZoomIn => {
                self.zoom_in();
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KilnConfig;
    use crate::gateway::{DeviceGateway, DialogGateway, WorkspaceGateway};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::AtomicBool;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct NullWorkspace;

    #[async_trait]
    impl WorkspaceGateway for NullWorkspace {
        async fn read_file(&self, _path: &Path) -> Result<String> {
            Ok(String::new())
        }

        async fn write_file(&self, _path: &Path, _content: &str) -> Result<()> {
            Ok(())
        }
    }

    /// Dialogs that always answer with a fixed save path (`None` = cancel).
    struct FixedDialogs {
        save_answer: Option<PathBuf>,
    }

    #[async_trait]
    impl DialogGateway for FixedDialogs {
        async fn pick_open_path(&self) -> Result<Option<PathBuf>> {
            Ok(None)
        }

        async fn pick_save_path(&self, _default_extension: &str) -> Result<Option<PathBuf>> {
            Ok(self.save_answer.clone())
        }
    }

    struct NullDevice;

    #[async_trait]
    impl DeviceGateway for NullDevice {
        async fn list_ports(&self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn open_port(&self, _port: &str) -> Result<()> {
            Ok(())
        }

        async fn close_port(&self) -> Result<()> {
            Ok(())
        }

        async fn read_chunk(&self) -> Result<String> {
            Ok(String::new())
        }

        async fn write_chunk(&self, _data: &str) -> Result<()> {
            Ok(())
        }

        async fn board_info(&self) -> Result<String> {
            Ok(String::new())
        }
    }

    struct MockToolchain {
        fail: bool,
    }

    #[async_trait]
    impl ToolchainGateway for MockToolchain {
        async fn build(&self, main_file: &Path) -> Result<String> {
            if self.fail {
                Err(KilnError::toolchain("error[E0599]: no method"))
            } else {
                Ok(format!("Finished building {}", main_file.display()))
            }
        }

        async fn run(&self, _main_file: &Path) -> Result<String> {
            Ok("Hello, board!".to_string())
        }
    }

    struct MockShell {
        exited: AtomicBool,
    }

    #[async_trait]
    impl ShellGateway for MockShell {
        async fn request_exit(&self) -> Result<()> {
            self.exited.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn workbench_with(
        toolchain: MockToolchain,
        save_answer: Option<PathBuf>,
    ) -> (Workbench, Arc<MockShell>, UnboundedReceiver<Notice>) {
        let (notices, rx) = NoticeSender::channel();
        let config = KilnConfig::default();
        let documents = Arc::new(DocumentManager::new(
            Arc::new(NullWorkspace),
            Arc::new(FixedDialogs { save_answer }),
            notices.clone(),
            &config,
        ));
        let serial = Arc::new(SerialManager::new(
            Arc::new(NullDevice),
            notices.clone(),
            &config,
        ));
        let shell = Arc::new(MockShell {
            exited: AtomicBool::new(false),
        });
        let workbench = Workbench::new(
            documents,
            serial,
            Arc::new(toolchain),
            shell.clone(),
            notices,
        );
        (workbench, shell, rx)
    }

    #[tokio::test]
    async fn test_zoom_clamps() {
        let (workbench, _, _rx) = workbench_with(MockToolchain { fail: false }, None);
        assert_eq!(workbench.zoom_in(), 15);
        assert_eq!(workbench.zoom_out(), 14);
        for _ in 0..100 {
            workbench.zoom_out();
        }
        assert_eq!(workbench.font_size(), MIN_FONT_SIZE);
        for _ in 0..100 {
            workbench.zoom_in();
        }
        assert_eq!(workbench.font_size(), MAX_FONT_SIZE);
    }

    #[tokio::test]
    async fn test_dispatch_create_and_quit() {
        let (workbench, _, _rx) = workbench_with(MockToolchain { fail: false }, None);

        assert!(workbench.dispatch(KeyChord::ctrl('n')).await);
        assert_eq!(workbench.documents().snapshot().await.len(), 1);

        assert!(workbench.dispatch(KeyChord::ctrl('q')).await);
        assert!(workbench.confirm_state().await.is_pending());

        // Unrecognized chords pass through untouched.
        assert!(!workbench.dispatch(KeyChord::ctrl('z')).await);
    }

    #[tokio::test]
    async fn test_quit_confirm_exits_and_cancel_does_not() {
        let (workbench, shell, _rx) = workbench_with(MockToolchain { fail: false }, None);

        workbench.request_quit().await;
        workbench.cancel_pending().await;
        workbench.confirm_pending().await.unwrap();
        assert!(!shell.exited.load(Ordering::SeqCst));

        workbench.request_quit().await;
        workbench.confirm_pending().await.unwrap();
        assert!(shell.exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_build_requires_saved_document() {
        let (workbench, _, mut rx) = workbench_with(MockToolchain { fail: false }, None);
        workbench.documents().create().await;

        let err = workbench.build_project().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(rx.try_recv().unwrap().title, "Nothing to Build");
    }

    #[tokio::test]
    async fn test_build_success_and_failure_notices() {
        let (workbench, _, mut rx) = workbench_with(
            MockToolchain { fail: false },
            Some(PathBuf::from("/w/main.rs")),
        );
        let index = workbench.documents().create().await;
        workbench.documents().save(index).await.unwrap();
        let _ = rx.try_recv(); // "File Saved"

        let output = workbench.build_project().await.unwrap();
        assert!(output.contains("/w/main.rs"));
        assert_eq!(rx.try_recv().unwrap().title, "Build Finished");

        let run_output = workbench.run_project().await.unwrap();
        assert_eq!(run_output, "Hello, board!");
        assert_eq!(rx.try_recv().unwrap().title, "Run Finished");
    }

    #[tokio::test]
    async fn test_build_failure_surfaces_notice() {
        let (workbench, _, mut rx) = workbench_with(
            MockToolchain { fail: true },
            Some(PathBuf::from("/w/main.rs")),
        );
        let index = workbench.documents().create().await;
        workbench.documents().save(index).await.unwrap();
        let _ = rx.try_recv(); // "File Saved"

        assert!(workbench.build_project().await.is_err());
        assert_eq!(rx.try_recv().unwrap().title, "Build Failed");
    }
}
