//! The in-memory [`SearchIndex`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use docseal_registry::Document;
use docseal_types::DocumentId;
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// Lowercased searchable fields of one document.
#[derive(Debug)]
struct SearchText {
    title: String,
    description: String,
}

impl SearchText {
    fn of(document: &Document) -> Self {
        Self {
            title: document.title.to_lowercase(),
            description: document.description.to_lowercase(),
        }
    }

    fn contains(&self, needle: &str) -> bool {
        self.title.contains(needle) || self.description.contains(needle)
    }
}

/// Search projection over document titles and descriptions.
///
/// Deleted documents are never held, so query results never include them.
#[derive(Debug, Default)]
pub struct SearchIndex {
    inner: RwLock<BTreeMap<DocumentId, SearchText>>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `document`. A deleted document is
    /// removed instead.
    pub fn index(&self, document: &Document) -> IndexResult<()> {
        let mut docs = self.inner.write().map_err(|_| IndexError::LockPoisoned)?;
        if document.is_deleted() {
            docs.remove(&document.document_id);
            return Ok(());
        }
        docs.insert(document.document_id, SearchText::of(document));
        debug!(document = %document.document_id, "document indexed");
        Ok(())
    }

    /// Drop a document. Returns whether it was indexed.
    pub fn remove(&self, id: &DocumentId) -> IndexResult<bool> {
        let mut docs = self.inner.write().map_err(|_| IndexError::LockPoisoned)?;
        Ok(docs.remove(id).is_some())
    }

    /// Case-insensitive phrase search.
    ///
    /// A document matches when its title or its description contains `term`
    /// as one contiguous substring; words are not reordered or split. A
    /// blank term (empty or whitespace only) matches every indexed document.
    /// Results are in document id order, which for v7 ids is creation order.
    pub fn query(&self, term: &str) -> IndexResult<Vec<DocumentId>> {
        let docs = self.inner.read().map_err(|_| IndexError::LockPoisoned)?;
        if term.trim().is_empty() {
            return Ok(docs.keys().copied().collect());
        }
        let needle = term.to_lowercase();
        Ok(docs
            .iter()
            .filter(|(_, text)| text.contains(&needle))
            .map(|(id, _)| *id)
            .collect())
    }

    /// Replace the whole index with `documents`.
    pub fn rebuild<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> IndexResult<usize> {
        let fresh: BTreeMap<_, _> = documents
            .into_iter()
            .filter(|d| !d.is_deleted())
            .map(|d| (d.document_id, SearchText::of(d)))
            .collect();
        let count = fresh.len();
        let mut docs = self.inner.write().map_err(|_| IndexError::LockPoisoned)?;
        *docs = fresh;
        debug!(documents = count, "search index rebuilt");
        Ok(count)
    }

    pub fn contains(&self, id: &DocumentId) -> IndexResult<bool> {
        let docs = self.inner.read().map_err(|_| IndexError::LockPoisoned)?;
        Ok(docs.contains_key(id))
    }

    /// Number of indexed documents.
    pub fn len(&self) -> IndexResult<usize> {
        let docs = self.inner.read().map_err(|_| IndexError::LockPoisoned)?;
        Ok(docs.len())
    }

    pub fn is_empty(&self) -> IndexResult<bool> {
        Ok(self.len()? == 0)
    }
}
