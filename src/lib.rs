// THEORY:
// This file is the main entry point for the `pixelator` library crate.
//
// The primary export is the `Pixelator` session in `pipeline`, together with
// the data it produces (`RenderConfig`, `RenderOutput`, `PixelRecord`). The
// leaf components in `core_modules` are public as well, because the renderer is
// a pure function and is just as useful without a session around it.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use core_modules::grid::{GridSize, PIXELS_PER_GRID, PixelationFactor, compute_factor};
pub use core_modules::records::PixelRecord;
pub use core_modules::renderer::{RenderConfig, RenderOutput, render};
pub use error::{PixelatorError, Result};
pub use pipeline::{Pixelator, RenderEvents, RenderOutcome};
