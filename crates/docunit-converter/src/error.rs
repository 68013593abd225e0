//! Error types for the conversion service.

use std::path::PathBuf;

use docunit_elements::ConversionError;
use docunit_ooxml::OoxmlError;
use docunit_store::StoreError;
use uuid::Uuid;

/// The source document could not be loaded.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SourceError {
    /// No file with this name exists in the source.
    #[error("source file not found: {0}")]
    NotFound(String),

    /// The name escapes the source directory or is empty.
    #[error("invalid source file name: {0}")]
    InvalidName(String),

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a readable word-processing package.
    #[error(transparent)]
    Package(#[from] OoxmlError),
}

/// The element an edit is anchored at cannot take the edit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EditTargetError {
    /// No stored element has this id.
    #[error("no element with id {0}")]
    UnknownElement(Uuid),

    /// The element kind does not support the operation.
    #[error("element {id} is a {kind} and cannot be used here")]
    Ineligible { id: Uuid, kind: &'static str },

    /// Join target without a preceding border number.
    #[error("border number {0} has no preceding border number to join")]
    NoPredecessor(Uuid),
}

/// Error returned by [`ConverterService`](crate::ConverterService) operations.
///
/// Every failure leaves the stored sequence as it was before the call.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConverterError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    EditTarget(#[from] EditTargetError),
}

impl ConverterError {
    /// True when no stored sequence exists for the requested key.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use docunit_store::DocumentKey;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_conversion_error_display() {
        let err = ConverterError::from(ConversionError::MultipleGraphics);

        assert_eq!(
            err.to_string(),
            "conversion failed: more than one graphic data in a drawing"
        );
    }

    #[test]
    fn test_is_not_found() {
        let key = DocumentKey::new(Uuid::nil(), "a.docx");

        assert!(ConverterError::from(StoreError::not_found(&key)).is_not_found());
        assert!(!ConverterError::from(EditTargetError::UnknownElement(Uuid::nil())).is_not_found());
    }

    #[test]
    fn test_edit_target_display() {
        let err = EditTargetError::Ineligible {
            id: Uuid::nil(),
            kind: "table",
        };

        assert_eq!(
            err.to_string(),
            "element 00000000-0000-0000-0000-000000000000 is a table and cannot be used here"
        );
    }
}
