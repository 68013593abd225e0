//! Persistence of converted document elements.
//!
//! A converted document is an ordered sequence of rendered top-level
//! elements keyed by documentation unit and source file. This crate
//! provides:
//!
//! - [`ConvertedElementStore`] trait: atomic create/recreate, positional edit
//!   batches and the get-or-create flow
//! - [`SqliteStore`] backed by `sqlx`
//! - [`MemoryStore`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use docunit_store::{ConvertedElementStore, DocumentKey, SqliteStore};
//!
//! let store = SqliteStore::connect("sqlite://.docunit/elements.db", 4).await?;
//! let rows = store.get(&DocumentKey::new(unit_id, "decision.docx")).await?;
//! for row in rows {
//!     println!("{} {}", row.position, row.content);
//! }
//! ```

#[cfg(any(test, feature = "mock"))]
mod memory;
mod sqlite;
mod store;

#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{
    ConvertedElement, ConvertedElementStore, DocumentKey, ElementDraft, ErrorStatus,
    SequenceEdit, StoreError, StoreErrorKind,
};
