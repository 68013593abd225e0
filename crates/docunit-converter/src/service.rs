//! Conversion service facade.
//!
//! Wires the source, the element parser, the renderer, the store and the
//! border-number editor together. Operations on the same document key are
//! serialized; different keys proceed independently.

use docunit_elements::{ConvertedDocument, HtmlRenderer, ParserOptions, convert};
use docunit_store::{
    ConvertedElement, ConvertedElementStore, DocumentKey, ElementDraft, SequenceEdit,
};
use uuid::Uuid;

use crate::editor::BorderNumberEditor;
use crate::error::{ConverterError, EditTargetError};
use crate::locks::KeyedLocks;
use crate::source::DocumentSource;

/// Converts source documents and edits their stored element sequences.
pub struct ConverterService<S, D> {
    store: S,
    source: D,
    options: ParserOptions,
    renderer: HtmlRenderer,
    editor: BorderNumberEditor,
    locks: KeyedLocks,
}

impl<S, D> ConverterService<S, D>
where
    S: ConvertedElementStore,
    D: DocumentSource,
{
    /// Create a service with default parser options.
    #[must_use]
    pub fn new(store: S, source: D) -> Self {
        let renderer = HtmlRenderer::new();
        Self {
            store,
            source,
            options: ParserOptions::default(),
            renderer,
            editor: BorderNumberEditor::new(renderer),
            locks: KeyedLocks::new(),
        }
    }

    /// Set parser options (e.g. the border-number style).
    #[must_use]
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parse a source file into its intermediate form without storing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError`] if the source cannot be loaded or converted.
    pub fn converted_document(&self, source_file: &str) -> Result<ConvertedDocument, ConverterError> {
        let raw = self.source.load(source_file)?;
        Ok(convert(&raw, &self.options)?)
    }

    /// Stored sequence for `key`, converting and storing the source on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError`] if conversion or storage fails. A failed
    /// conversion stores nothing.
    pub async fn converted_elements(
        &self,
        key: &DocumentKey,
    ) -> Result<Vec<ConvertedElement>, ConverterError> {
        let _guard = self.locks.lock(key).await;
        self.store
            .get_or_create(key, || self.render_source(&key.source_file))
            .await
    }

    /// Convert the source again and replace whatever is stored for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError`] if conversion or storage fails; the previous
    /// sequence is kept in that case.
    pub async fn reconvert_elements(
        &self,
        key: &DocumentKey,
    ) -> Result<Vec<ConvertedElement>, ConverterError> {
        let _guard = self.locks.lock(key).await;
        let rows = self.render_source(&key.source_file)?;
        Ok(self.store.recreate(key, rows).await?)
    }

    /// Promote the paragraph run starting at `start` into border numbers.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError`] if nothing is stored for `key` or `start` is not eligible.
    pub async fn add_border_numbers(
        &self,
        key: &DocumentKey,
        start: Uuid,
    ) -> Result<Vec<ConvertedElement>, ConverterError> {
        self.edit(key, "add", |editor, rows| {
            editor.add_border_numbers(rows, start)
        })
        .await
    }

    /// Demote every border number at or after `start`, or all of them.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError`] if nothing is stored for `key` or `start` is unknown.
    pub async fn remove_border_numbers(
        &self,
        key: &DocumentKey,
        start: Option<Uuid>,
    ) -> Result<Vec<ConvertedElement>, ConverterError> {
        self.edit(key, "remove", |editor, rows| {
            editor.remove_border_numbers(rows, start)
        })
        .await
    }

    /// Demote the border number at `start` and renumber the ones after it.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError`] if nothing is stored for `key` or `start` is not eligible.
    pub async fn remove_border_number(
        &self,
        key: &DocumentKey,
        start: Uuid,
    ) -> Result<Vec<ConvertedElement>, ConverterError> {
        self.edit(key, "remove-one", |editor, rows| {
            editor.remove_border_number(rows, start)
        })
        .await
    }

    /// Merge the border number at `start` into its predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`ConverterError`] if nothing is stored for `key` or `start`
    /// has no preceding border number.
    pub async fn join_border_numbers(
        &self,
        key: &DocumentKey,
        start: Uuid,
    ) -> Result<Vec<ConvertedElement>, ConverterError> {
        self.edit(key, "join", |editor, rows| {
            editor.join_border_numbers(rows, start)
        })
        .await
    }

    async fn edit<F>(
        &self,
        key: &DocumentKey,
        operation: &'static str,
        plan: F,
    ) -> Result<Vec<ConvertedElement>, ConverterError>
    where
        F: FnOnce(&BorderNumberEditor, &[ConvertedElement]) -> Result<Vec<SequenceEdit>, EditTargetError>
            + Send,
    {
        let _guard = self.locks.lock(key).await;
        let rows = self.store.get(key).await?;

        let edits = plan(&self.editor, &rows)?;
        if edits.is_empty() {
            tracing::debug!(key = %key, operation, "Border numbers already in place");
            return Ok(rows);
        }

        let count = edits.len();
        let rows = self.store.apply(key, edits).await?;
        tracing::info!(key = %key, operation, edits = count, "Edited border numbers");
        Ok(rows)
    }

    /// Convert a source file into rows with fresh ids.
    fn render_source(&self, source_file: &str) -> Result<Vec<ElementDraft>, ConverterError> {
        let document = self.converted_document(source_file)?;
        let rows: Vec<_> = document
            .into_top_level()
            .into_iter()
            .map(|element| {
                let id = Uuid::new_v4();
                let content = self
                    .renderer
                    .render_with_id(&element, Some(&id.to_string()));
                ElementDraft {
                    id,
                    content,
                    element,
                }
            })
            .collect();

        tracing::info!(source_file, rows = rows.len(), "Converted source document");
        Ok(rows)
    }
}
