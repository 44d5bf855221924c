use thiserror::Error;
use std::path::PathBuf;

/// Failure of a single card render.
///
/// Every variant is a deterministic consequence of the card record, its
/// assets or the configuration, so nothing here is ever retried.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("card name must not be empty")]
    EmptyName,

    #[error("unknown card category `{0}`")]
    CategoryUnknown(String),

    #[error("base layout `{0}` could not be loaded")]
    LayoutMissing(String),

    #[error("artwork `{0}` could not be loaded")]
    ArtworkMissing(String),

    /// Recoverable: the composer keeps the medallion ring and skips the icon.
    #[error("icon `{0}` could not be loaded")]
    IconMissing(String),

    #[error("font file `{}` could not be loaded", .0.display())]
    FontMissing(PathBuf),

    #[error("text runs past the card: cursor reached {cursor:.1}px, limit is {limit:.1}px")]
    TextOverflow { cursor: f32, limit: f32 },

    #[error("failed to rasterize card: {0}")]
    Raster(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CardError {
    /// Errors the composer absorbs instead of aborting the card.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CardError::IconMissing(_))
    }
}

pub type Result<T, E = CardError> = std::result::Result<T, E>;
