//! In-memory store for testing.
//!
//! Provides [`MemoryStore`] for unit testing without a database.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::store::{
    ConvertedElement, ConvertedElementStore, DocumentKey, ElementDraft, SequenceEdit, StoreError,
    StoreErrorKind, with_positions,
};

const BACKEND: &str = "Memory";

/// In-memory converted element store.
///
/// All operations take the write lock for their whole duration, so every
/// create, recreate and edit batch is atomic.
///
/// # Example
///
/// ```ignore
/// use docunit_store::{ConvertedElementStore, DocumentKey, MemoryStore};
///
/// let store = MemoryStore::new().with_sequence(key.clone(), rows);
/// let stored = store.get(&key).await?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentKey, Vec<ElementDraft>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored sequence.
    #[must_use]
    pub fn with_sequence(self, key: DocumentKey, rows: Vec<ElementDraft>) -> Self {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, rows);
        self
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned() -> StoreError {
        StoreError::new(StoreErrorKind::Other)
            .with_backend(BACKEND)
            .with_message("lock poisoned")
    }
}

impl ConvertedElementStore for MemoryStore {
    async fn get(&self, key: &DocumentKey) -> Result<Vec<ConvertedElement>, StoreError> {
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        documents
            .get(key)
            .map(|rows| with_positions(rows.clone()))
            .ok_or_else(|| StoreError::not_found(key).with_backend(BACKEND))
    }

    async fn create(
        &self,
        key: &DocumentKey,
        rows: Vec<ElementDraft>,
    ) -> Result<Vec<ConvertedElement>, StoreError> {
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        let stored = documents.entry(key.clone()).or_insert(rows);
        Ok(with_positions(stored.clone()))
    }

    async fn recreate(
        &self,
        key: &DocumentKey,
        rows: Vec<ElementDraft>,
    ) -> Result<Vec<ConvertedElement>, StoreError> {
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        documents.insert(key.clone(), rows.clone());
        Ok(with_positions(rows))
    }

    async fn apply(
        &self,
        key: &DocumentKey,
        edits: Vec<SequenceEdit>,
    ) -> Result<Vec<ConvertedElement>, StoreError> {
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        let stored = documents
            .get_mut(key)
            .ok_or_else(|| StoreError::not_found(key).with_backend(BACKEND))?;

        let mut rows = stored.clone();
        for edit in edits {
            edit.apply_to(&mut rows)
                .map_err(|e| e.with_backend(BACKEND).with_key(key))?;
        }
        stored.clone_from(&rows);
        Ok(with_positions(rows))
    }
}

#[cfg(test)]
mod tests {
    use docunit_elements::ParagraphElement;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    fn key() -> DocumentKey {
        DocumentKey::new(Uuid::new_v4(), "decision.docx")
    }

    fn draft(text: &str) -> ElementDraft {
        ElementDraft {
            id: Uuid::new_v4(),
            content: format!("<p>{text}</p>"),
            element: ParagraphElement::from_text(text).into(),
        }
    }

    fn contents(rows: &[ConvertedElement]) -> Vec<&str> {
        rows.iter().map(|r| r.content.as_str()).collect()
    }

    #[test]
    fn test_len_survives_poisoned_lock() {
        let store = MemoryStore::new().with_sequence(key(), vec![draft("a")]);

        let joined = std::thread::scope(|s| {
            s.spawn(|| {
                let _guard = store.documents.write().unwrap();
                panic!("writer failed");
            })
            .join()
        });

        assert!(joined.is_err());
        assert!(store.documents.is_poisoned());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();

        let err = store.get(&key()).await.unwrap_err();

        assert_eq!(err.kind, StoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_create_keeps_first_sequence() {
        let store = MemoryStore::new();
        let key = key();

        let first = store.create(&key, vec![draft("a")]).await.unwrap();
        let second = store.create(&key, vec![draft("b")]).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(contents(&second), vec!["<p>a</p>"]);
    }

    #[tokio::test]
    async fn test_get_or_create_parses_once() {
        let store = MemoryStore::new();
        let key = key();

        let first = store
            .get_or_create(&key, || Ok::<_, StoreError>(vec![draft("a"), draft("b")]))
            .await
            .unwrap();
        let second = store
            .get_or_create(&key, || -> Result<Vec<ElementDraft>, StoreError> {
                panic!("parse must not run on a hit")
            })
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(second[1].position, 1);
    }

    #[tokio::test]
    async fn test_failed_parse_persists_nothing() {
        let store = MemoryStore::new();
        let key = key();

        let result = store
            .get_or_create(&key, || {
                Err::<Vec<ElementDraft>, _>(StoreError::new(StoreErrorKind::Other))
            })
            .await;

        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_recreate_replaces_sequence() {
        let key = key();
        let store = MemoryStore::new().with_sequence(key.clone(), vec![draft("old")]);

        store.recreate(&key, vec![draft("new")]).await.unwrap();

        assert_eq!(contents(&store.get(&key).await.unwrap()), vec!["<p>new</p>"]);
    }

    #[tokio::test]
    async fn test_positional_edits() {
        let key = key();
        let store =
            MemoryStore::new().with_sequence(key.clone(), vec![draft("a"), draft("b"), draft("c")]);
        let id_of_b = store.get(&key).await.unwrap()[1].id;

        store.replace_at(&key, 0, draft("x")).await.unwrap();
        store.insert_at(&key, 3, draft("d")).await.unwrap();
        let rows = store.remove_at(&key, 1).await.unwrap();

        assert_eq!(contents(&rows), vec!["<p>x</p>", "<p>c</p>", "<p>d</p>"]);
        assert!(rows.iter().all(|r| r.id != id_of_b));
        assert_eq!(
            rows.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_sequence_untouched() {
        let key = key();
        let store = MemoryStore::new().with_sequence(key.clone(), vec![draft("a"), draft("b")]);

        let err = store
            .apply(
                &key,
                vec![
                    SequenceEdit::Remove { position: 0 },
                    SequenceEdit::Remove { position: 5 },
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind, StoreErrorKind::InvalidPosition);
        assert_eq!(
            contents(&store.get(&key).await.unwrap()),
            vec!["<p>a</p>", "<p>b</p>"]
        );
    }

    #[tokio::test]
    async fn test_apply_to_missing_key() {
        let store = MemoryStore::new();

        let err = store.remove_at(&key(), 0).await.unwrap_err();

        assert!(err.is_not_found());
    }
}
