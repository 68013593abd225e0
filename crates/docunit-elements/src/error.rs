//! Error types for element conversion.

/// The raw document violates a structural assumption of the element parser.
///
/// Any of these aborts the conversion of the whole document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ConversionError {
    /// A drawing holds more than one inline or anchored graphic.
    #[error("more than one graphic data in a drawing")]
    MultipleGraphics,

    /// The drawing is not an inline graphic.
    #[error("unsupported drawing object")]
    UnsupportedDrawing,

    /// The drawing has no graphic data.
    #[error("no graphic data")]
    NoGraphicData,

    /// The graphic data is not a picture with an embedded image.
    #[error("not a picture")]
    NotAPicture,

    /// The picture references an image that is not part of the document.
    #[error("no image for embed id '{0}'")]
    MissingImage(String),
}
