// THEORY:
// The renderer turns one decoded image plus one immutable `RenderConfig` into a
// visible surface and the ordered list of per-cell records. It is a pure
// function of its inputs. The same image and configuration always produce the
// same bytes and the same records, and nothing outside the pass is touched
// until it finishes.
//
// A pass moves through fixed stages:
// 1.  **Sampling**: two pixelation factors are resolved, one against the image's
//     natural size (the best basis for averaging) and one against the display
//     box (the size of each output block). They are generally different.
// 2.  **Painting**: the image is drawn into a source buffer at the source
//     factored size. The pass then walks it cell by cell in row-major order,
//     stepping `source.factor` pixels at a time. Each cell's color is resolved
//     and painted as a flat `destination.factor` square into the destination
//     buffer. Optional grid lines go on top.
// 3.  **Blitting**: the destination buffer is scaled into the on-screen buffer at
//     the requested display size. This is the only surface anyone else sees, so
//     half-painted intermediate states are never observable.
//
// Any surface that cannot be allocated aborts the pass with an error naming that
// surface, and every buffer allocated so far is dropped with it.

use crate::core_modules::chunk::chunk::sample_cell;
use crate::core_modules::frame_buffer::{FrameBuffer, GRID_LINE_COLOR};
use crate::core_modules::grid::{GridSize, PIXELS_PER_GRID, PixelationFactor, compute_factor_with};
use crate::core_modules::records::PixelRecord;
use crate::error::{Result, Surface};
use image::RgbaImage;
use log::{debug, trace, warn};

pub const MAX_BLUR: u8 = 100;

/// Everything one render pass needs besides the image. Built fresh on every
/// property change and never mutated during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub display_width: u32,
    pub display_height: u32,
    /// `None` disables pixelation entirely.
    pub grid_size: Option<GridSize>,
    /// Neighbourhood blur, 0-100 percent of the sampling factor.
    pub blur: u8,
    pub pixelate: bool,
    /// Draw grid lines over the output.
    pub lined: bool,
    pub pixels_per_grid: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            display_width: 500,
            display_height: 500,
            grid_size: Some(GridSize::default()),
            blur: 0,
            pixelate: true,
            lined: false,
            pixels_per_grid: PIXELS_PER_GRID,
        }
    }
}

impl RenderConfig {
    pub fn with_display_size(mut self, width: u32, height: u32) -> Self {
        self.display_width = width;
        self.display_height = height;
        self
    }

    pub fn with_grid_size(mut self, grid_size: Option<GridSize>) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the blur, clamping anything above 100.
    pub fn with_blur(mut self, blur: u8) -> Self {
        if blur > MAX_BLUR {
            warn!("Blur {blur} is out of range, clamping to {MAX_BLUR}");
        }
        self.blur = blur.min(MAX_BLUR);
        self
    }

    pub fn with_pixelate(mut self, pixelate: bool) -> Self {
        self.pixelate = pixelate;
        self
    }

    pub fn with_lined(mut self, lined: bool) -> Self {
        self.lined = lined;
        self
    }

    pub fn with_pixels_per_grid(mut self, pixels_per_grid: u32) -> Self {
        self.pixels_per_grid = pixels_per_grid;
        self
    }

    /// Pixelation of the display box.
    pub fn destination_pixelation(&self) -> PixelationFactor {
        compute_factor_with(
            self.display_width,
            self.display_height,
            self.grid_size,
            self.pixels_per_grid,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Loading,
    Sampling,
    Painting,
    Blitting,
    Done,
    Error(String),
}

/// The result of a completed pass.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The visible surface, at display size and fully opaque where painted.
    pub surface: FrameBuffer,
    /// One record per source cell, row-major.
    pub records: Vec<PixelRecord>,
    pub source: PixelationFactor,
    pub destination: PixelationFactor,
}

pub struct RenderPass<'a> {
    image: &'a RgbaImage,
    config: &'a RenderConfig,
    state: RenderState,
}

impl<'a> RenderPass<'a> {
    pub fn new(image: &'a RgbaImage, config: &'a RenderConfig) -> Self {
        Self {
            image,
            config,
            state: RenderState::Idle,
        }
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn run(&mut self) -> Result<RenderOutput> {
        match self.execute() {
            Ok(output) => {
                self.transition(RenderState::Done);
                Ok(output)
            }
            Err(err) => {
                self.transition(RenderState::Error(err.to_string()));
                Err(err)
            }
        }
    }

    fn transition(&mut self, next: RenderState) {
        trace!("Render pass {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn execute(&mut self) -> Result<RenderOutput> {
        self.transition(RenderState::Sampling);
        let config = self.config;
        let (natural_width, natural_height) = self.image.dimensions();
        let destination = config.destination_pixelation();
        let mut source = compute_factor_with(
            natural_width,
            natural_height,
            config.grid_size,
            config.pixels_per_grid,
        );
        debug!(
            "Sampling {natural_width}x{natural_height} image: source factor {}, destination factor {}",
            source.factor, destination.factor
        );

        if !destination.is_enabled() {
            // Nothing to pixelate into; show the image as-is.
            self.transition(RenderState::Blitting);
            let mut on_screen =
                FrameBuffer::new(Surface::OnScreen, config.display_width, config.display_height)?;
            on_screen.draw_image(self.image);
            return Ok(RenderOutput {
                surface: on_screen,
                records: Vec::new(),
                source,
                destination,
            });
        }
        if !source.is_enabled() {
            debug!("Image is smaller than the grid, sampling at destination resolution");
            source = destination;
        }

        self.transition(RenderState::Painting);
        let mut destination_buffer = FrameBuffer::new(
            Surface::Destination,
            destination.factored_width,
            destination.factored_height,
        )?;
        let records = if config.pixelate {
            let mut source_buffer =
                FrameBuffer::new(Surface::Source, source.factored_width, source.factored_height)?;
            source_buffer.draw_image(self.image);
            paint_cells(&source_buffer, &mut destination_buffer, source, destination, config.blur)?
        } else {
            destination_buffer.draw_image(self.image);
            Vec::new()
        };
        if config.lined {
            destination_buffer.stroke_grid(destination.factor, GRID_LINE_COLOR);
        }

        self.transition(RenderState::Blitting);
        let mut on_screen =
            FrameBuffer::new(Surface::OnScreen, config.display_width, config.display_height)?;
        destination_buffer.blit_scaled(&mut on_screen);
        debug!("Rendered {} cells", records.len());

        Ok(RenderOutput {
            surface: on_screen,
            records,
            source,
            destination,
        })
    }
}

/// Walks the source buffer cell by cell, painting each resolved color as a
/// flat block into `destination_buffer`.
fn paint_cells(
    source_buffer: &FrameBuffer,
    destination_buffer: &mut FrameBuffer,
    source: PixelationFactor,
    destination: PixelationFactor,
    blur: u8,
) -> Result<Vec<PixelRecord>> {
    let (columns, rows) = source.cells();
    let mut records = Vec::with_capacity(columns as usize * rows as usize);

    for row in 0..rows {
        for column in 0..columns {
            let cell_x = column * source.factor;
            let cell_y = row * source.factor;
            let color = sample_cell(source_buffer, cell_x, cell_y, source.factor, blur)?;

            records.push(PixelRecord::new(column, row, color));
            destination_buffer.fill_rect(
                column * destination.factor,
                row * destination.factor,
                destination.factor,
                destination.factor,
                color,
            );
        }
    }

    Ok(records)
}

/// Runs a single pass with a throwaway `RenderPass`.
pub fn render(image: &RgbaImage, config: &RenderConfig) -> Result<RenderOutput> {
    RenderPass::new(image, config).run()
}
