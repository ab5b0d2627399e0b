//! Document session management.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::collection::DocumentCollection;
use super::model::{Document, ensure_extension};
use crate::config::KilnConfig;
use crate::error::{KilnError, Result};
use crate::gateway::{DialogGateway, WorkspaceGateway};
use crate::notice::{Notice, NoticeSender};

/// Owns the ordered collection of open buffers and orchestrates persistence.
///
/// `DocumentManager` is responsible for:
/// - Creating and opening documents
/// - Tracking the active selection and dirty state
/// - Saving documents through the workspace gateway
/// - Closing tabs with the documented selection tie-break
///
/// Every gateway call is the only place this component performs I/O; all
/// other mutations are pure in-memory transitions on [`DocumentCollection`].
pub struct DocumentManager {
    collection: Arc<RwLock<DocumentCollection>>,
    workspace: Arc<dyn WorkspaceGateway>,
    dialogs: Arc<dyn DialogGateway>,
    notices: NoticeSender,
    default_extension: String,
    new_file_template: String,
}

impl DocumentManager {
    pub fn new(
        workspace: Arc<dyn WorkspaceGateway>,
        dialogs: Arc<dyn DialogGateway>,
        notices: NoticeSender,
        config: &KilnConfig,
    ) -> Self {
        Self {
            collection: Arc::new(RwLock::new(DocumentCollection::new())),
            workspace,
            dialogs,
            notices,
            default_extension: config.default_extension.clone(),
            new_file_template: config.new_file_template.clone(),
        }
    }

    /// Returns a point-in-time copy of the collection for rendering.
    pub async fn snapshot(&self) -> DocumentCollection {
        self.collection.read().await.clone()
    }

    /// Appends a new untitled document and makes it active.
    pub async fn create(&self) -> usize {
        let mut collection = self.collection.write().await;
        let index = collection.push_active(Document::untitled(self.new_file_template.clone()));
        tracing::debug!(index, "created untitled document");
        index
    }

    /// Opens `path` into a new tab and makes it active.
    ///
    /// On a read failure the collection is left unchanged and an I/O error
    /// notice is published.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the path is unreadable.
    pub async fn open_path(&self, path: PathBuf) -> Result<usize> {
        match self.workspace.read_file(&path).await {
            Ok(content) => {
                let mut collection = self.collection.write().await;
                let index = collection.push_active(Document::from_file(path, content));
                Ok(index)
            }
            Err(err) => {
                self.notices.send(Notice::error(
                    "Open Failed",
                    format!("Failed to open {}: {}", path.display(), err),
                ));
                Err(err)
            }
        }
    }

    /// Asks the user for a file and opens it.
    ///
    /// Returns `Ok(None)` when the dialog was dismissed (silent abort).
    pub async fn open_from_dialog(&self) -> Result<Option<usize>> {
        match self.dialogs.pick_open_path().await? {
            Some(path) => self.open_path(path).await.map(Some),
            None => Ok(None),
        }
    }

    /// Replaces the content of the document at `index`.
    ///
    /// Out-of-range indices are silently ignored.
    pub async fn update_content(&self, index: usize, content: impl Into<String>) -> bool {
        self.collection.write().await.update_content(index, content)
    }

    /// Saves the active document. See [`DocumentManager::save`].
    pub async fn save_active(&self) -> Result<bool> {
        let index = self.collection.read().await.active_index();
        match index {
            Some(index) => self.save(index).await,
            None => Err(KilnError::validation("no open document to save")),
        }
    }

    /// Saves the document at `index`.
    ///
    /// A document without a path first goes through the save dialog; the
    /// default extension is appended when the chosen name lacks one.
    /// Returns `Ok(false)` when the user cancelled the dialog.
    ///
    /// On a write failure the dirty flag is left unchanged (the save is not
    /// assumed to have partially succeeded) and an I/O error notice is
    /// published.
    pub async fn save(&self, index: usize) -> Result<bool> {
        let (existing_path, content) = {
            let collection = self.collection.read().await;
            let doc = collection
                .get(index)
                .ok_or_else(|| KilnError::validation(format!("no document at index {index}")))?;
            (doc.path.clone(), doc.content.clone())
        };

        let path = match existing_path {
            Some(path) => path,
            None => match self.dialogs.pick_save_path(&self.default_extension).await? {
                Some(chosen) => ensure_extension(chosen, &self.default_extension),
                None => return Ok(false),
            },
        };

        match self.workspace.write_file(&path, &content).await {
            Ok(()) => {
                let mut collection = self.collection.write().await;
                if let Some(doc) = collection.get_mut(index) {
                    doc.record_saved(path.clone(), content);
                }
                self.notices.send(Notice::info(
                    "File Saved",
                    format!("Saved {}.", path.display()),
                ));
                Ok(true)
            }
            Err(err) => {
                self.notices.send(Notice::error(
                    "Save Failed",
                    format!("Failed to save {}: {}", path.display(), err),
                ));
                Err(err)
            }
        }
    }

    /// Closes the tab at `index` with the documented selection tie-break.
    pub async fn close(&self, index: usize) -> bool {
        self.collection.write().await.close(index).is_some()
    }

    /// Selects the tab at `index`; out-of-range indices are a no-op.
    pub async fn set_active(&self, index: usize) -> bool {
        self.collection.write().await.set_active(index)
    }

    /// Path of the active document, when it has been saved somewhere.
    pub async fn active_path(&self) -> Option<PathBuf> {
        self.collection
            .read()
            .await
            .active()
            .and_then(|doc| doc.path.clone())
    }
}
