//! The ordered tab set and active selection.

use super::model::Document;

/// An ordered sequence of open documents plus the active selection.
///
/// Invariants:
/// - the active index is always a valid index while the collection is
///   non-empty, and meaningless (reported as `None`) when empty;
/// - new tabs append, preserving insertion order;
/// - duplicate paths across tabs are permitted.
///
/// All transitions here are pure in-memory mutations; I/O lives in the
/// manager.
#[derive(Debug, Clone, Default)]
pub struct DocumentCollection {
    documents: Vec<Document>,
    active: usize,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Document> {
        self.documents.get_mut(index)
    }

    /// Index of the active document, or `None` when the collection is empty.
    pub fn active_index(&self) -> Option<usize> {
        if self.documents.is_empty() {
            None
        } else {
            Some(self.active)
        }
    }

    pub fn active(&self) -> Option<&Document> {
        self.active_index().and_then(|i| self.documents.get(i))
    }

    /// Appends a document and makes it active. Returns its index.
    pub fn push_active(&mut self, document: Document) -> usize {
        self.documents.push(document);
        self.active = self.documents.len() - 1;
        self.active
    }

    /// Selects `index`. Out-of-range indices are a silent no-op.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index < self.documents.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Replaces the content of the document at `index`.
    ///
    /// Out-of-range indices are silently ignored (defensive; a well-formed
    /// presentation layer never produces them).
    pub fn update_content(&mut self, index: usize, content: impl Into<String>) -> bool {
        match self.documents.get_mut(index) {
            Some(doc) => {
                doc.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Removes the document at `index`, returning it.
    ///
    /// Selection tie-break: closing the active tab selects
    /// `max(0, index - 1)` among the remaining tabs; closing a tab before
    /// the active one shifts the selection down so the same document stays
    /// active; closing the last tab leaves the collection empty.
    pub fn close(&mut self, index: usize) -> Option<Document> {
        if index >= self.documents.len() {
            return None;
        }
        let removed = self.documents.remove(index);
        if self.documents.is_empty() {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        } else if index == self.active {
            self.active = index.saturating_sub(1);
        }
        removed.into()
    }
}
