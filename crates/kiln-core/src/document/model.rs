//! The single open buffer.

use std::path::{Path, PathBuf};

/// One open text buffer, optionally backed by a file path.
///
/// `dirty` is derived rather than stored: a document is dirty whenever its
/// content differs from the last successfully persisted content. A freshly
/// created or freshly opened document is therefore never dirty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Backing file path; `None` means the buffer has never been saved.
    pub path: Option<PathBuf>,
    /// Full text content, mutated only through the manager's update operation.
    pub content: String,
    /// Content as of the last successful persist (or creation).
    persisted: String,
}

impl Document {
    /// Creates a buffer with no backing file.
    pub fn untitled(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: None,
            persisted: content.clone(),
            content,
        }
    }

    /// Creates a buffer for a file just read from disk.
    pub fn from_file(path: PathBuf, content: String) -> Self {
        Self {
            path: Some(path),
            persisted: content.clone(),
            content,
        }
    }

    /// True when the content differs from the last persisted value.
    pub fn dirty(&self) -> bool {
        self.content != self.persisted
    }

    /// Records a successful save of `content` to `path`.
    ///
    /// The persisted baseline is the content that was actually written, not
    /// the current buffer content, so edits made while the write was in
    /// flight keep the document dirty.
    pub fn record_saved(&mut self, path: PathBuf, content: String) {
        self.path = Some(path);
        self.persisted = content;
    }

    /// Display label for a tab: file name, or a placeholder when unsaved.
    pub fn label(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }
}

/// Appends `extension` to `path` unless the chosen name already ends with it.
///
/// A different existing extension is kept and the default is appended after
/// it, so `notes.txt` becomes `notes.txt.rs`.
pub fn ensure_extension(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_some_and(|existing| existing == extension) {
        path
    } else {
        let mut name = path.into_os_string();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untitled_starts_clean() {
        let doc = Document::untitled("// template\n");
        assert!(doc.path.is_none());
        assert!(!doc.dirty());
        assert_eq!(doc.label(), "untitled");
    }

    #[test]
    fn test_dirty_tracks_persisted_baseline() {
        let mut doc = Document::from_file(PathBuf::from("/tmp/main.rs"), "fn main() {}".into());
        assert!(!doc.dirty());

        doc.content = "fn main() { println!(); }".to_string();
        assert!(doc.dirty());

        // Reverting to the persisted value clears dirty without a save.
        doc.content = "fn main() {}".to_string();
        assert!(!doc.dirty());
    }

    #[test]
    fn test_record_saved_uses_written_content() {
        let mut doc = Document::untitled("a");
        doc.content = "b".to_string();
        // Simulate an edit racing the write: "b" was written, buffer moved on.
        doc.content = "c".to_string();
        doc.record_saved(PathBuf::from("/tmp/x.rs"), "b".to_string());
        assert!(doc.dirty());
        assert_eq!(doc.label(), "x.rs");
    }

    #[test]
    fn test_ensure_extension() {
        assert_eq!(
            ensure_extension(PathBuf::from("prog"), "rs"),
            PathBuf::from("prog.rs")
        );
        assert_eq!(
            ensure_extension(PathBuf::from("prog.rs"), "rs"),
            PathBuf::from("prog.rs")
        );
    }

    #[test]
    fn test_ensure_extension_appends_after_a_different_one() {
        assert_eq!(
            ensure_extension(PathBuf::from("notes.txt"), "rs"),
            PathBuf::from("notes.txt.rs")
        );
        assert_eq!(
            ensure_extension(PathBuf::from("blink.RS"), "rs"),
            PathBuf::from("blink.RS.rs")
        );
    }
}
