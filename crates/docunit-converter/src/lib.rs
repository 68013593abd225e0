//! Document conversion and border-number editing.
//!
//! [`ConverterService`] is the entry point: it converts a source document
//! into a stored sequence of rendered elements on first request and applies
//! border-number edits to that sequence afterwards, never re-reading the
//! source for an edit.
//!
//! # Architecture
//!
//! - [`DocumentSource`]: loads raw document trees ([`DirectorySource`] for `.docx` files)
//! - [`BorderNumberEditor`]: plans add/remove/join edits as [`SequenceEdit`] batches
//! - [`ConverterService`]: serializes operations per document key and
//!   persists through a [`ConvertedElementStore`]
//!
//! [`SequenceEdit`]: docunit_store::SequenceEdit
//! [`ConvertedElementStore`]: docunit_store::ConvertedElementStore
//!
//! # Example
//!
//! ```ignore
//! use docunit_converter::{ConverterService, DirectorySource};
//! use docunit_store::{DocumentKey, SqliteStore};
//!
//! let store = SqliteStore::connect("sqlite://.docunit/elements.db", 4).await?;
//! let service = ConverterService::new(store, DirectorySource::new("documents"));
//! let key = DocumentKey::new(unit_id, "decision.docx");
//!
//! let rows = service.converted_elements(&key).await?;
//! let rows = service.add_border_numbers(&key, rows[0].id).await?;
//! ```

mod editor;
mod error;
mod locks;
mod service;
mod source;

pub use editor::BorderNumberEditor;
pub use error::{ConverterError, EditTargetError, SourceError};
pub use service::ConverterService;
pub use source::{DirectorySource, DocumentSource};
