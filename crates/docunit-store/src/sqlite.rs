//! SQLite-backed store.
//!
//! Two tables: `converted_documents` records which keys exist (an empty
//! document is still a stored document) and `converted_elements` holds the
//! rows. Every write runs in a single transaction.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

use crate::store::{
    ConvertedElement, ConvertedElementStore, DocumentKey, ElementDraft, ErrorStatus,
    SequenceEdit, StoreError, StoreErrorKind,
};

const BACKEND: &str = "Sqlite";

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS converted_documents (
    documentation_unit_id TEXT NOT NULL,
    source_file TEXT NOT NULL,
    PRIMARY KEY (documentation_unit_id, source_file)
);

CREATE TABLE IF NOT EXISTS converted_elements (
    id TEXT PRIMARY KEY,
    documentation_unit_id TEXT NOT NULL,
    source_file TEXT NOT NULL,
    position INTEGER NOT NULL,
    content TEXT NOT NULL,
    element TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS converted_elements_by_document
    ON converted_elements (documentation_unit_id, source_file, position);
";

#[derive(Debug, sqlx::FromRow)]
struct ElementRow {
    id: String,
    position: i64,
    content: String,
    element: String,
}

impl ElementRow {
    fn decode(self) -> Result<ConvertedElement, StoreError> {
        let id = Uuid::parse_str(&self.id).map_err(|e| {
            StoreError::new(StoreErrorKind::Serialization)
                .with_backend(BACKEND)
                .with_source(e)
        })?;
        let position = usize::try_from(self.position).map_err(|e| {
            StoreError::new(StoreErrorKind::Serialization)
                .with_backend(BACKEND)
                .with_source(e)
        })?;
        let element = serde_json::from_str(&self.element)
            .map_err(|e| StoreError::serialization(e).with_backend(BACKEND))?;
        Ok(ConvertedElement {
            id,
            position,
            content: self.content,
            element,
        })
    }
}

/// Converted element store on a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` (e.g. `sqlite://.docunit/elements.db`) and create the schema.
    ///
    /// The database file is created when missing; its directory must exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the URL is invalid or the database cannot be opened.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_error)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(db_error)?;
        Self::with_pool(pool).await
    }

    /// Open a private in-memory database.
    ///
    /// The pool keeps exactly one connection alive for its whole lifetime, as
    /// every new connection to `sqlite::memory:` would see an empty database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the schema cannot be created.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_error)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_error)?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and create the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the schema cannot be created.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&pool)
            .await
            .map_err(db_error)?;
        tracing::debug!("SQLite schema ready");
        Ok(Self { pool })
    }

    async fn exists(
        tx: &mut Transaction<'_, Sqlite>,
        key: &DocumentKey,
    ) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM converted_documents WHERE documentation_unit_id = ? AND source_file = ?",
        )
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_error)?;
        Ok(found.is_some())
    }

    async fn load(
        tx: &mut Transaction<'_, Sqlite>,
        key: &DocumentKey,
    ) -> Result<Vec<ConvertedElement>, StoreError> {
        let rows: Vec<ElementRow> = sqlx::query_as(
            "SELECT id, position, content, element FROM converted_elements \
             WHERE documentation_unit_id = ? AND source_file = ? ORDER BY position",
        )
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .fetch_all(&mut **tx)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ElementRow::decode).collect()
    }

    async fn insert_row(
        tx: &mut Transaction<'_, Sqlite>,
        key: &DocumentKey,
        position: usize,
        row: &ElementDraft,
    ) -> Result<(), StoreError> {
        let element = serde_json::to_string(&row.element)
            .map_err(|e| StoreError::serialization(e).with_backend(BACKEND))?;
        sqlx::query(
            "INSERT INTO converted_elements \
             (id, documentation_unit_id, source_file, position, content, element) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id.to_string())
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .bind(to_sql_position(position)?)
        .bind(&row.content)
        .bind(element)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn insert_all(
        tx: &mut Transaction<'_, Sqlite>,
        key: &DocumentKey,
        rows: &[ElementDraft],
    ) -> Result<(), StoreError> {
        for (position, row) in rows.iter().enumerate() {
            Self::insert_row(tx, key, position, row).await?;
        }
        Ok(())
    }

    /// Move every row at or after `from` by `delta` positions.
    async fn shift(
        tx: &mut Transaction<'_, Sqlite>,
        key: &DocumentKey,
        from: usize,
        delta: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE converted_elements SET position = position + ? \
             WHERE documentation_unit_id = ? AND source_file = ? AND position >= ?",
        )
        .bind(delta)
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .bind(to_sql_position(from)?)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn delete_at(
        tx: &mut Transaction<'_, Sqlite>,
        key: &DocumentKey,
        position: usize,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "DELETE FROM converted_elements \
             WHERE documentation_unit_id = ? AND source_file = ? AND position = ?",
        )
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .bind(to_sql_position(position)?)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn apply_edit(
        tx: &mut Transaction<'_, Sqlite>,
        key: &DocumentKey,
        len: &mut usize,
        edit: &SequenceEdit,
    ) -> Result<(), StoreError> {
        match edit {
            SequenceEdit::Replace { position, row } => {
                if *position >= *len {
                    return Err(StoreError::invalid_position(*position, *len));
                }
                Self::delete_at(tx, key, *position).await?;
                Self::insert_row(tx, key, *position, row).await?;
            }
            SequenceEdit::Insert { position, row } => {
                if *position > *len {
                    return Err(StoreError::invalid_position(*position, *len));
                }
                Self::shift(tx, key, *position, 1).await?;
                Self::insert_row(tx, key, *position, row).await?;
                *len += 1;
            }
            SequenceEdit::Remove { position } => {
                if *position >= *len {
                    return Err(StoreError::invalid_position(*position, *len));
                }
                Self::delete_at(tx, key, *position).await?;
                Self::shift(tx, key, *position + 1, -1).await?;
                *len -= 1;
            }
        }
        Ok(())
    }
}

impl ConvertedElementStore for SqliteStore {
    async fn get(&self, key: &DocumentKey) -> Result<Vec<ConvertedElement>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        if !Self::exists(&mut tx, key).await? {
            return Err(StoreError::not_found(key).with_backend(BACKEND));
        }
        let rows = Self::load(&mut tx, key).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(rows)
    }

    async fn create(
        &self,
        key: &DocumentKey,
        rows: Vec<ElementDraft>,
    ) -> Result<Vec<ConvertedElement>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO converted_documents (documentation_unit_id, source_file) \
             VALUES (?, ?)",
        )
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

        if inserted == 0 {
            tracing::debug!(key = %key, "Sequence already stored, keeping it");
        } else {
            Self::insert_all(&mut tx, key, &rows).await?;
            tracing::info!(key = %key, rows = rows.len(), "Stored converted elements");
        }

        let stored = Self::load(&mut tx, key).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(stored)
    }

    async fn recreate(
        &self,
        key: &DocumentKey,
        rows: Vec<ElementDraft>,
    ) -> Result<Vec<ConvertedElement>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            "INSERT OR IGNORE INTO converted_documents (documentation_unit_id, source_file) \
             VALUES (?, ?)",
        )
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        sqlx::query(
            "DELETE FROM converted_elements WHERE documentation_unit_id = ? AND source_file = ?",
        )
        .bind(key.documentation_unit_id.to_string())
        .bind(&key.source_file)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        Self::insert_all(&mut tx, key, &rows).await?;
        let stored = Self::load(&mut tx, key).await?;
        tx.commit().await.map_err(db_error)?;

        tracing::info!(key = %key, rows = stored.len(), "Recreated converted elements");
        Ok(stored)
    }

    async fn apply(
        &self,
        key: &DocumentKey,
        edits: Vec<SequenceEdit>,
    ) -> Result<Vec<ConvertedElement>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        if !Self::exists(&mut tx, key).await? {
            return Err(StoreError::not_found(key).with_backend(BACKEND));
        }

        let mut len = Self::load(&mut tx, key).await?.len();
        for edit in &edits {
            // Dropping the transaction on error rolls it back.
            Self::apply_edit(&mut tx, key, &mut len, edit)
                .await
                .map_err(|e| e.with_backend(BACKEND).with_key(key))?;
        }

        let stored = Self::load(&mut tx, key).await?;
        tx.commit().await.map_err(db_error)?;

        tracing::debug!(key = %key, edits = edits.len(), "Applied sequence edits");
        Ok(stored)
    }
}

fn to_sql_position(position: usize) -> Result<i64, StoreError> {
    i64::try_from(position).map_err(|_| StoreError::invalid_position(position, 0))
}

fn db_error(err: sqlx::Error) -> StoreError {
    let (kind, status) = match &err {
        sqlx::Error::PoolTimedOut => (StoreErrorKind::Unavailable, ErrorStatus::Temporary),
        sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            (StoreErrorKind::Unavailable, ErrorStatus::Permanent)
        }
        _ => (StoreErrorKind::Other, ErrorStatus::Permanent),
    };
    StoreError::new(kind)
        .with_backend(BACKEND)
        .with_status(status)
        .with_source(err)
}

#[cfg(test)]
mod tests {
    use docunit_elements::{BorderNumberElement, ParagraphElement};
    use pretty_assertions::assert_eq;

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

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = SqliteStore::in_memory().await.unwrap();

        let err = store.get(&key()).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Sqlite"));
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip_elements() {
        let store = SqliteStore::in_memory().await.unwrap();
        let key = key();
        let marker = ElementDraft {
            id: Uuid::new_v4(),
            content: "<border-number><number>1</number></border-number>".to_owned(),
            element: BorderNumberElement::new("1").into(),
        };

        let created = store
            .create(&key, vec![marker.clone(), draft("Hello")])
            .await
            .unwrap();
        let loaded = store.get(&key).await.unwrap();

        assert_eq!(created, loaded);
        assert_eq!(loaded[0], marker.at(0));
        assert_eq!(loaded[1].position, 1);
    }

    #[tokio::test]
    async fn test_empty_document_is_stored() {
        let store = SqliteStore::in_memory().await.unwrap();
        let key = key();

        store.create(&key, Vec::new()).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn test_second_create_returns_first_sequence() {
        let store = SqliteStore::in_memory().await.unwrap();
        let key = key();

        let first = store.create(&key, vec![draft("a")]).await.unwrap();
        let second = store.create(&key, vec![draft("b"), draft("c")]).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let store = SqliteStore::in_memory().await.unwrap();
        let unit = Uuid::new_v4();
        let a = DocumentKey::new(unit, "a.docx");
        let b = DocumentKey::new(unit, "b.docx");

        store.create(&a, vec![draft("a")]).await.unwrap();
        store.create(&b, vec![draft("b")]).await.unwrap();
        store.remove_at(&a, 0).await.unwrap();

        assert_eq!(contents(&store.get(&b).await.unwrap()), vec!["<p>b</p>"]);
    }

    #[tokio::test]
    async fn test_positional_edits() {
        let store = SqliteStore::in_memory().await.unwrap();
        let key = key();
        let created = store
            .create(&key, vec![draft("a"), draft("b"), draft("c")])
            .await
            .unwrap();

        store.insert_at(&key, 1, draft("new")).await.unwrap();
        store.remove_at(&key, 3).await.unwrap();
        let rows = store.replace_at(&key, 0, draft("x")).await.unwrap();

        assert_eq!(contents(&rows), vec!["<p>x</p>", "<p>new</p>", "<p>b</p>"]);
        assert_eq!(rows[2].id, created[1].id);
        assert_eq!(
            rows.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back() {
        let store = SqliteStore::in_memory().await.unwrap();
        let key = key();
        store.create(&key, vec![draft("a"), draft("b")]).await.unwrap();

        let err = store
            .apply(
                &key,
                vec![
                    SequenceEdit::Remove { position: 0 },
                    SequenceEdit::Insert {
                        position: 9,
                        row: draft("x"),
                    },
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
    async fn test_recreate_replaces_rows() {
        let store = SqliteStore::in_memory().await.unwrap();
        let key = key();
        store.create(&key, vec![draft("a"), draft("b")]).await.unwrap();

        let rows = store.recreate(&key, vec![draft("fresh")]).await.unwrap();

        assert_eq!(contents(&rows), vec!["<p>fresh</p>"]);
        assert_eq!(store.get(&key).await.unwrap(), rows);
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("elements.db").display());
        let key = key();

        let store = SqliteStore::connect(&url, 2).await.unwrap();
        store.create(&key, vec![draft("kept")]).await.unwrap();
        drop(store);

        let reopened = SqliteStore::connect(&url, 2).await.unwrap();

        assert_eq!(
            contents(&reopened.get(&key).await.unwrap()),
            vec!["<p>kept</p>"]
        );
    }
}
