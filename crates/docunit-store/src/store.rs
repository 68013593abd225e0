//! Store trait, sequence types and error types.
//!
//! A converted document is persisted as an ordered sequence of rows keyed by
//! [`DocumentKey`]. The sequence is created in one piece and afterwards only
//! changed through positional edits.

use std::fmt;
use std::future::Future;

use docunit_elements::DocumentElement;
use uuid::Uuid;

/// Identity of a converted document: documentation unit plus source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub documentation_unit_id: Uuid,
    pub source_file: String,
}

impl DocumentKey {
    #[must_use]
    pub fn new(documentation_unit_id: Uuid, source_file: impl Into<String>) -> Self {
        Self {
            documentation_unit_id,
            source_file: source_file.into(),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.documentation_unit_id, self.source_file)
    }
}

/// A persisted top-level element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedElement {
    /// Stable identity, also embedded in `content` for elements that carry one.
    pub id: Uuid,
    /// 0-based index within the document's sequence.
    pub position: usize,
    /// Rendered HTML.
    pub content: String,
    /// The element the HTML was rendered from.
    pub element: DocumentElement,
}

/// A row to be written, before it has a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDraft {
    pub id: Uuid,
    pub content: String,
    pub element: DocumentElement,
}

impl ElementDraft {
    /// Attach a position.
    #[must_use]
    pub fn at(self, position: usize) -> ConvertedElement {
        ConvertedElement {
            id: self.id,
            position,
            content: self.content,
            element: self.element,
        }
    }
}

impl From<ConvertedElement> for ElementDraft {
    fn from(element: ConvertedElement) -> Self {
        Self {
            id: element.id,
            content: element.content,
            element: element.element,
        }
    }
}

/// One positional change to a sequence.
///
/// A batch of edits is applied in order; each position refers to the
/// sequence as left by the previous edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceEdit {
    /// Overwrite the row at `position`. Length and order are unchanged.
    Replace { position: usize, row: ElementDraft },
    /// Insert before `position` (`position == len` appends).
    Insert { position: usize, row: ElementDraft },
    /// Remove the row at `position`.
    Remove { position: usize },
}

impl SequenceEdit {
    /// Apply the edit to an in-memory sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::InvalidPosition`] when the position is out of range.
    /// The sequence is unchanged in that case.
    pub fn apply_to(self, rows: &mut Vec<ElementDraft>) -> Result<(), StoreError> {
        match self {
            Self::Replace { position, row } => {
                let len = rows.len();
                let slot = rows
                    .get_mut(position)
                    .ok_or_else(|| StoreError::invalid_position(position, len))?;
                *slot = row;
            }
            Self::Insert { position, row } => {
                if position > rows.len() {
                    return Err(StoreError::invalid_position(position, rows.len()));
                }
                rows.insert(position, row);
            }
            Self::Remove { position } => {
                if position >= rows.len() {
                    return Err(StoreError::invalid_position(position, rows.len()));
                }
                rows.remove(position);
            }
        }
        Ok(())
    }
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// No sequence is stored for the key.
    NotFound,
    /// An edit addresses a position outside the sequence.
    InvalidPosition,
    /// A stored element could not be encoded or decoded.
    Serialization,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid position, corrupt row).
    #[default]
    Permanent,
    /// Retry immediately (pool timeout, busy database).
    Temporary,
}

/// Store error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StoreError {
    /// Semantic error category.
    pub kind: StoreErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Document context (if applicable).
    pub key: Option<DocumentKey>,
    /// Backend identifier (e.g., "Sqlite", "Memory").
    pub backend: Option<&'static str>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    /// Create a new store error.
    #[must_use]
    pub fn new(kind: StoreErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            key: None,
            backend: None,
            message: None,
            source: None,
        }
    }

    /// Attach document context.
    #[must_use]
    pub fn with_key(mut self, key: &DocumentKey) -> Self {
        self.key = Some(key.clone());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach a message describing the failure.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error for a key.
    #[must_use]
    pub fn not_found(key: &DocumentKey) -> Self {
        Self::new(StoreErrorKind::NotFound).with_key(key)
    }

    /// Create an invalid position error.
    #[must_use]
    pub fn invalid_position(position: usize, len: usize) -> Self {
        Self::new(StoreErrorKind::InvalidPosition)
            .with_message(format!("position {position} out of range for {len} rows"))
    }

    /// Create an error for an element that cannot be (de)serialized.
    #[must_use]
    pub fn serialization(err: serde_json::Error) -> Self {
        Self::new(StoreErrorKind::Serialization).with_source(err)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "[Backend] Kind: message: source (key: unit/file)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StoreErrorKind::NotFound => "Not found",
            StoreErrorKind::InvalidPosition => "Invalid position",
            StoreErrorKind::Serialization => "Serialization failed",
            StoreErrorKind::Unavailable => "Unavailable",
            StoreErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(key) = &self.key {
            write!(f, " (key: {key})")?;
        }

        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Persistence of converted element sequences.
///
/// Implementations guarantee that a sequence is never partially visible:
/// creation, recreation and edit batches either apply completely or not at
/// all. At most one initial write per key succeeds.
pub trait ConvertedElementStore: Send + Sync {
    /// Ordered sequence stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::NotFound`] when nothing is stored for the key.
    fn get(
        &self,
        key: &DocumentKey,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, StoreError>> + Send;

    /// Persist a full sequence if the key is absent.
    ///
    /// When another writer got there first, its sequence is returned and
    /// `rows` is discarded.
    fn create(
        &self,
        key: &DocumentKey,
        rows: Vec<ElementDraft>,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, StoreError>> + Send;

    /// Atomically replace whatever is stored for `key` with `rows`.
    fn recreate(
        &self,
        key: &DocumentKey,
        rows: Vec<ElementDraft>,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, StoreError>> + Send;

    /// Apply a batch of positional edits atomically and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreErrorKind::NotFound`] for an unknown key and
    /// [`StoreErrorKind::InvalidPosition`] when any edit is out of range; the
    /// stored sequence is unchanged in both cases.
    fn apply(
        &self,
        key: &DocumentKey,
        edits: Vec<SequenceEdit>,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, StoreError>> + Send;

    /// Return the stored sequence, or build it with `parse` and persist it.
    ///
    /// `parse` runs only on a miss. A failing `parse` persists nothing.
    fn get_or_create<F, E>(
        &self,
        key: &DocumentKey,
        parse: F,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, E>> + Send
    where
        F: FnOnce() -> Result<Vec<ElementDraft>, E> + Send,
        E: From<StoreError> + Send,
    {
        async move {
            match self.get(key).await {
                Ok(rows) => return Ok(rows),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err.into()),
            }
            let rows = parse()?;
            Ok(self.create(key, rows).await?)
        }
    }

    /// Overwrite the row at `position`.
    fn replace_at(
        &self,
        key: &DocumentKey,
        position: usize,
        row: ElementDraft,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, StoreError>> + Send {
        self.apply(key, vec![SequenceEdit::Replace { position, row }])
    }

    /// Insert a row before `position`, shifting later rows.
    fn insert_at(
        &self,
        key: &DocumentKey,
        position: usize,
        row: ElementDraft,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, StoreError>> + Send {
        self.apply(key, vec![SequenceEdit::Insert { position, row }])
    }

    /// Remove the row at `position`, shifting later rows.
    fn remove_at(
        &self,
        key: &DocumentKey,
        position: usize,
    ) -> impl Future<Output = Result<Vec<ConvertedElement>, StoreError>> + Send {
        self.apply(key, vec![SequenceEdit::Remove { position }])
    }
}

/// Attach positions to drafts in order.
pub(crate) fn with_positions(rows: Vec<ElementDraft>) -> Vec<ConvertedElement> {
    rows.into_iter()
        .enumerate()
        .map(|(position, row)| row.at(position))
        .collect()
}
