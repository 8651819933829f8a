// THEORY:
// Every failure the engine can produce lives in one enum. Render passes never
// panic on bad input; they return one of these and the session turns it into
// a `RenderOutcome::Failed` so the caller can simply try again on the next
// property change.

use std::fmt;
use thiserror::Error;

/// The drawing surfaces a render pass allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The offscreen buffer holding the image at sampling resolution.
    Source,
    /// The offscreen buffer holding the pixelated blocks and grid lines.
    Destination,
    /// The visible buffer at display size.
    OnScreen,
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Source => write!(f, "source"),
            Surface::Destination => write!(f, "destination"),
            Surface::OnScreen => write!(f, "on-screen"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PixelatorError {
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    #[error("unable to get {0} context")]
    ContextUnavailable(Surface),
    #[error("invalid color component: ({red}, {green}, {blue})")]
    InvalidColorComponent { red: u32, green: u32, blue: u32 },
    #[error("invalid grid size {x}x{y}: both dimensions must be at least 1")]
    InvalidGridSize { x: u32, y: u32 },
    #[error("invalid square index {index} for {squares_per_row} squares per row")]
    InvalidSquareIndex { index: u32, squares_per_row: u32 },
    #[error("cannot average an empty set of colors")]
    EmptySampleSet,
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("export store error: {0}")]
    Store(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PixelatorError>;
