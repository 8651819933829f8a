// THEORY:
// The grid module answers one question: how many buffer pixels does each cell
// get? A grid unit is `PIXELS_PER_GRID` cells across, and the caller asks for
// `grid_size.x` by `grid_size.y` units. The factor is the largest whole number
// of pixels per cell that keeps the full grid inside the available box. It
// always rounds down, trading a small unused margin for whole blocks.
//
// A factor of 0 means "no pixelation possible" and every consumer must treat it
// as a short-circuit rather than a divisor.

use crate::error::{PixelatorError, Result};
use serde::{Deserialize, Serialize};

/// Cells along one edge of a grid unit.
pub const PIXELS_PER_GRID: u32 = 25;

/// Logical size of the output, in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub x: u32,
    pub y: u32,
}

impl GridSize {
    pub fn new(x: u32, y: u32) -> Result<Self> {
        if x == 0 || y == 0 {
            return Err(PixelatorError::InvalidGridSize { x, y });
        }
        Ok(Self { x, y })
    }

    pub fn is_square(&self) -> bool {
        self.x == self.y
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self { x: 1, y: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelationFactor {
    /// Buffer pixels per cell edge. Zero disables pixelation.
    pub factor: u32,
    pub factored_width: u32,
    pub factored_height: u32,
}

impl PixelationFactor {
    pub fn is_enabled(&self) -> bool {
        self.factor > 0
    }

    /// Number of cells across and down the factored area.
    pub fn cells(&self) -> (u32, u32) {
        if self.factor == 0 {
            return (0, 0);
        }
        (
            self.factored_width / self.factor,
            self.factored_height / self.factor,
        )
    }
}

/// Pixelation factor with the default `PIXELS_PER_GRID`.
pub fn compute_factor(
    available_width: u32,
    available_height: u32,
    grid_size: Option<GridSize>,
) -> PixelationFactor {
    compute_factor_with(available_width, available_height, grid_size, PIXELS_PER_GRID)
}

pub fn compute_factor_with(
    available_width: u32,
    available_height: u32,
    grid_size: Option<GridSize>,
    pixels_per_grid: u32,
) -> PixelationFactor {
    let Some(grid) = grid_size else {
        return PixelationFactor::default();
    };
    let cells_x = grid.x.saturating_mul(pixels_per_grid);
    let cells_y = grid.y.saturating_mul(pixels_per_grid);
    if cells_x == 0 || cells_y == 0 {
        return PixelationFactor::default();
    }

    let factor = (available_width / cells_x).min(available_height / cells_y);
    PixelationFactor {
        factor,
        factored_width: factor * cells_x,
        factored_height: factor * cells_y,
    }
}

/// The display box actually used for a preview: the available box rounded
/// down so the blit from the destination buffer is 1:1.
pub fn preview_size(
    available_width: u32,
    available_height: u32,
    grid_size: Option<GridSize>,
    pixels_per_grid: u32,
) -> (u32, u32) {
    let pixelation =
        compute_factor_with(available_width, available_height, grid_size, pixels_per_grid);
    (pixelation.factored_width, pixelation.factored_height)
}

/// Whether an image's proportions suit the requested grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// The image has no measurable size.
    UnknownSize,
    /// A square grid was requested for a non-square image.
    NotSquare { width: u32, height: u32 },
    /// The image aspect ratio differs from the grid aspect ratio.
    AspectMismatch { width: u32, height: u32, grid: GridSize },
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn warning(&self) -> Option<String> {
        match self {
            Validity::Valid => None,
            Validity::UnknownSize => {
                Some("Unable to determine the image size of the uploaded image.".to_string())
            }
            Validity::NotSquare { width, height } => Some(format!(
                "The image must be square. The size of the uploaded image is {width}x{height}."
            )),
            Validity::AspectMismatch { width, height, grid } => Some(format!(
                "The image proportions {width}x{height} do not match the {}x{} grid.",
                grid.x, grid.y
            )),
        }
    }
}

/// Checks image proportions against the grid. Never blocks rendering.
pub fn validate_proportions(width: u32, height: u32, grid_size: GridSize) -> Validity {
    if width == 0 || height == 0 {
        return Validity::UnknownSize;
    }
    if grid_size.is_square() {
        if width != height {
            return Validity::NotSquare { width, height };
        }
        return Validity::Valid;
    }
    if width as u64 * grid_size.y as u64 != height as u64 * grid_size.x as u64 {
        return Validity::AspectMismatch {
            width,
            height,
            grid: grid_size,
        };
    }
    Validity::Valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_grid() {
        assert!(GridSize::new(0, 3).is_err());
        assert!(GridSize::new(3, 0).is_err());
        assert_eq!(GridSize::new(2, 3).unwrap(), GridSize { x: 2, y: 3 });
    }

    #[test]
    fn factor_for_single_unit() {
        let pixelation = compute_factor(500, 500, Some(GridSize::default()));
        assert_eq!(pixelation.factor, 20);
        assert_eq!(pixelation.factored_width, 500);
        assert_eq!(pixelation.factored_height, 500);
        assert_eq!(pixelation.cells(), (25, 25));
    }

    #[test]
    fn factor_uses_the_tighter_axis() {
        let pixelation = compute_factor(1000, 310, Some(GridSize { x: 2, y: 1 }));
        // min(1000 / 50, 310 / 25) = min(20, 12)
        assert_eq!(pixelation.factor, 12);
        assert_eq!(pixelation.factored_width, 600);
        assert_eq!(pixelation.factored_height, 300);
    }

    #[test]
    fn absent_grid_disables_pixelation() {
        for (width, height) in [(0, 0), (25, 25), (4000, 3000)] {
            let pixelation = compute_factor(width, height, None);
            assert_eq!(pixelation, PixelationFactor::default());
            assert!(!pixelation.is_enabled());
            assert_eq!(pixelation.cells(), (0, 0));
        }
    }

    #[test]
    fn factored_size_never_exceeds_the_box() {
        for grid_x in 1..6 {
            for grid_y in 1..6 {
                let grid = Some(GridSize { x: grid_x, y: grid_y });
                for width in (PIXELS_PER_GRID..900).step_by(37) {
                    for height in (PIXELS_PER_GRID..900).step_by(41) {
                        let pixelation = compute_factor(width, height, grid);
                        assert!(pixelation.factored_width <= width);
                        assert!(pixelation.factored_height <= height);
                        if pixelation.factor > 0 {
                            assert_eq!(pixelation.factored_width % pixelation.factor, 0);
                            assert_eq!(pixelation.factored_height % pixelation.factor, 0);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn unit_cells_make_one_cell_per_grid_unit() {
        let pixelation = compute_factor_with(60, 90, Some(GridSize { x: 2, y: 3 }), 1);
        assert_eq!(pixelation.factor, 30);
        assert_eq!(pixelation.cells(), (2, 3));
    }

    #[test]
    fn preview_size_rounds_down() {
        assert_eq!(preview_size(530, 530, Some(GridSize::default()), 25), (525, 525));
        assert_eq!(preview_size(530, 530, None, 25), (0, 0));
    }

    #[test]
    fn validates_proportions() {
        let square = GridSize::default();
        assert!(validate_proportions(100, 100, square).is_valid());
        assert_eq!(
            validate_proportions(100, 50, square),
            Validity::NotSquare { width: 100, height: 50 }
        );
        assert_eq!(validate_proportions(0, 50, square), Validity::UnknownSize);

        let wide = GridSize { x: 2, y: 1 };
        assert!(validate_proportions(200, 100, wide).is_valid());
        assert!(matches!(
            validate_proportions(200, 150, wide),
            Validity::AspectMismatch { .. }
        ));
        assert!(validate_proportions(200, 150, wide).warning().is_some());
    }
}
