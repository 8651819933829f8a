// THEORY:
// The pointer sampler reads the visible surface back under the user's pointer.
// It never feeds anything into rendering. The pointer position, relative to the
// surface's bounding box, names a surface pixel. The visible surface is the
// factored destination stretched to the display box, so that pixel is mapped
// back into factored space the same way the blit sampled it, and divided by the
// destination factor to name the cell.
//
// Hover tracking is sticky. Moving within the same cell updates
// the color but reports no cell change, so sub-cell jitter cannot thrash
// whatever is listening.

use crate::core_modules::color_math::{pixel_hex, resolve_opaque_color};
use crate::core_modules::frame_buffer::FrameBuffer;
use crate::core_modules::grid::PixelationFactor;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{PixelatorError, Result};
use log::{debug, warn};

/// Destination for click-to-copy.
pub trait Clipboard {
    fn copy_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| PixelatorError::Clipboard(err.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|err| PixelatorError::Clipboard(err.to_string()))
    }
}

/// Keeps the last copied text in memory, for headless use.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn copy_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_owned());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoords {
    pub x: u32,
    pub y: u32,
}

/// What lies under the pointer at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerProbe {
    /// Surface pixel column under the pointer.
    pub grid_x: u32,
    /// Surface pixel row under the pointer.
    pub grid_y: u32,
    /// `None` when pixelation is disabled.
    pub cell: Option<CellCoords>,
    pub color_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOutcome {
    pub color_hex: String,
    pub highlight: Option<CellCoords>,
    pub copied: bool,
}

pub fn pixel_at(surface: &FrameBuffer, x: u32, y: u32) -> Option<Pixel> {
    resolve_opaque_color(surface.as_bytes(), surface.pixel_offset(x, y)?)
}

pub fn cell_at(x: u32, y: u32, factor: u32) -> Option<CellCoords> {
    if factor == 0 {
        return None;
    }
    Some(CellCoords {
        x: x / factor,
        y: y / factor,
    })
}

/// Cell under the surface pixel `(x, y)` of a surface blitted from `destination`.
pub fn surface_cell(
    surface: &FrameBuffer,
    x: u32,
    y: u32,
    destination: PixelationFactor,
) -> Option<CellCoords> {
    if !destination.is_enabled() || surface.width() == 0 || surface.height() == 0 {
        return None;
    }
    let factored_x = (x as u64 * destination.factored_width as u64 / surface.width() as u64) as u32;
    let factored_y = (y as u64 * destination.factored_height as u64 / surface.height() as u64) as u32;
    let cell = cell_at(factored_x, factored_y, destination.factor)?;
    let (columns, rows) = destination.cells();
    Some(CellCoords {
        x: cell.x.min(columns.saturating_sub(1)),
        y: cell.y.min(rows.saturating_sub(1)),
    })
}

/// Probes the surface at a pointer position relative to its top-left corner.
pub fn probe(
    surface: &FrameBuffer,
    x: f64,
    y: f64,
    destination: PixelationFactor,
) -> Option<PointerProbe> {
    if !(x >= 0.0 && y >= 0.0) {
        return None;
    }
    let (grid_x, grid_y) = (x.floor() as u32, y.floor() as u32);
    let color = pixel_at(surface, grid_x, grid_y)?;
    Some(PointerProbe {
        grid_x,
        grid_y,
        cell: surface_cell(surface, grid_x, grid_y, destination),
        color_hex: pixel_hex(color),
    })
}

/// Hover, click and exit tracking over one visible surface.
#[derive(Debug, Default)]
pub struct PointerSampler {
    color: Option<String>,
    coords: Option<CellCoords>,
    highlight: Option<CellCoords>,
}

impl PointerSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn coords(&self) -> Option<CellCoords> {
        self.coords
    }

    pub fn highlight(&self) -> Option<CellCoords> {
        self.highlight
    }

    /// Tracks a pointer move. Returns `true` only when the hovered cell changed.
    pub fn on_move(
        &mut self,
        surface: &FrameBuffer,
        destination: PixelationFactor,
        x: f64,
        y: f64,
    ) -> bool {
        let probe = probe(surface, x, y, destination);
        self.color = probe.as_ref().map(|probe| probe.color_hex.clone());

        let cell = probe.and_then(|probe| probe.cell);
        if self.coords == cell {
            return false;
        }
        self.coords = cell;
        true
    }

    /// Copies the color under the pointer and toggles the highlight on that cell.
    pub fn on_click(
        &mut self,
        surface: &FrameBuffer,
        destination: PixelationFactor,
        x: f64,
        y: f64,
        clipboard: &mut impl Clipboard,
    ) -> Option<ClickOutcome> {
        let probe = probe(surface, x, y, destination)?;

        let copied = match clipboard.copy_text(&probe.color_hex) {
            Ok(()) => true,
            Err(err) => {
                warn!("Unable to copy {} to the clipboard: {err}", probe.color_hex);
                false
            }
        };

        if let Some(cell) = probe.cell {
            self.highlight = if self.highlight == Some(cell) {
                None
            } else {
                Some(cell)
            };
        }
        debug!("Clicked {:?}, highlight now {:?}", probe.cell, self.highlight);

        Some(ClickOutcome {
            color_hex: probe.color_hex,
            highlight: self.highlight,
            copied,
        })
    }

    /// The pointer left the surface.
    pub fn on_exit(&mut self) {
        self.color = None;
        self.coords = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Surface;

    struct BrokenClipboard;

    impl Clipboard for BrokenClipboard {
        fn copy_text(&mut self, _text: &str) -> Result<()> {
            Err(PixelatorError::Clipboard("no display".to_string()))
        }
    }

    /// Two 20px cells across a 40x40 factored area.
    const HALVES: PixelationFactor = PixelationFactor {
        factor: 20,
        factored_width: 40,
        factored_height: 40,
    };

    /// 40x40 surface: red on the left column of cells, blue on the right.
    fn two_cell_surface() -> FrameBuffer {
        let mut surface = FrameBuffer::new(Surface::OnScreen, 40, 40).unwrap();
        surface.fill_rect(0, 0, 20, 40, Pixel::rgb(255, 0, 0));
        surface.fill_rect(20, 0, 20, 40, Pixel::rgb(0, 0, 255));
        surface
    }

    #[test]
    fn cell_at_floors() {
        assert_eq!(cell_at(10, 10, 20), Some(CellCoords { x: 0, y: 0 }));
        assert_eq!(cell_at(20, 39, 20), Some(CellCoords { x: 1, y: 1 }));
        assert_eq!(cell_at(5, 5, 0), None);
    }

    #[test]
    fn probes_color_and_cell() {
        let surface = two_cell_surface();
        let probe = probe(&surface, 10.7, 10.2, HALVES).unwrap();
        assert_eq!(probe.color_hex, "FF0000");
        assert_eq!((probe.grid_x, probe.grid_y), (10, 10));
        assert_eq!(probe.cell, Some(CellCoords { x: 0, y: 0 }));
    }

    #[test]
    fn stretched_surface_maps_back_to_factored_cells() {
        // 40x40 factored area blitted into a 51x53 display box.
        let mut factored = two_cell_surface();
        factored.fill_rect(0, 20, 40, 20, Pixel::rgb(0, 255, 0));
        let mut surface = FrameBuffer::new(Surface::OnScreen, 51, 53).unwrap();
        factored.blit_scaled(&mut surface);

        let corner = probe(&surface, 50.0, 52.0, HALVES).unwrap();
        assert_eq!(corner.cell, Some(CellCoords { x: 1, y: 1 }));
        assert_eq!(corner.color_hex, "00FF00");

        for (x, y) in [(0, 0), (25, 26), (26, 27), (50, 0), (0, 52)] {
            let cell = surface_cell(&surface, x, y, HALVES).unwrap();
            assert!(cell.x < 2 && cell.y < 2);
            let expected = pixel_at(&factored, x * 40 / 51, y * 40 / 53).unwrap();
            assert_eq!(pixel_at(&surface, x, y).unwrap(), expected);
        }
        assert_eq!(surface_cell(&surface, 5, 5, PixelationFactor::default()), None);
    }

    #[test]
    fn probe_outside_the_surface_is_empty() {
        let surface = two_cell_surface();
        assert!(probe(&surface, -1.0, 3.0, HALVES).is_none());
        assert!(probe(&surface, 40.0, 3.0, HALVES).is_none());
        assert!(probe(&surface, f64::NAN, 3.0, HALVES).is_none());
    }

    #[test]
    fn hover_suppresses_same_cell_updates() {
        let surface = two_cell_surface();
        let mut sampler = PointerSampler::new();
        assert!(sampler.on_move(&surface, HALVES, 1.0, 1.0));
        assert!(!sampler.on_move(&surface, HALVES, 15.0, 19.0));
        assert_eq!(sampler.color(), Some("FF0000"));
        assert!(sampler.on_move(&surface, HALVES, 25.0, 1.0));
        assert_eq!(sampler.coords(), Some(CellCoords { x: 1, y: 0 }));
        assert_eq!(sampler.color(), Some("0000FF"));
    }

    #[test]
    fn click_copies_and_toggles_highlight() {
        let surface = two_cell_surface();
        let mut sampler = PointerSampler::new();
        let mut clipboard = MemoryClipboard::default();

        let first = sampler.on_click(&surface, HALVES, 10.0, 10.0, &mut clipboard).unwrap();
        assert_eq!(first.color_hex, "FF0000");
        assert_eq!(first.highlight, Some(CellCoords { x: 0, y: 0 }));
        assert_eq!(clipboard.contents.as_deref(), Some("FF0000"));

        let moved = sampler.on_click(&surface, HALVES, 30.0, 10.0, &mut clipboard).unwrap();
        assert_eq!(moved.highlight, Some(CellCoords { x: 1, y: 0 }));
        assert_eq!(clipboard.contents.as_deref(), Some("0000FF"));

        let toggled = sampler.on_click(&surface, HALVES, 35.0, 2.0, &mut clipboard).unwrap();
        assert_eq!(toggled.highlight, None);
        assert_eq!(sampler.highlight(), None);
    }

    #[test]
    fn clipboard_failure_still_highlights() {
        let surface = two_cell_surface();
        let mut sampler = PointerSampler::new();
        let outcome = sampler.on_click(&surface, HALVES, 1.0, 1.0, &mut BrokenClipboard).unwrap();
        assert!(!outcome.copied);
        assert_eq!(outcome.highlight, Some(CellCoords { x: 0, y: 0 }));
    }

    #[test]
    fn exit_clears_color_and_coords() {
        let surface = two_cell_surface();
        let mut sampler = PointerSampler::new();
        sampler.on_move(&surface, HALVES, 1.0, 1.0);
        sampler.on_click(&surface, HALVES, 1.0, 1.0, &mut MemoryClipboard::default());
        sampler.on_exit();
        assert_eq!(sampler.color(), None);
        assert_eq!(sampler.coords(), None);
        assert_eq!(sampler.highlight(), Some(CellCoords { x: 0, y: 0 }));

        sampler.reset();
        assert_eq!(sampler.highlight(), None);
    }
}
