// THEORY:
// A `FrameBuffer` is the engine's drawing surface: a flat RGBA byte vector with
// an explicit width and height, addressed the same way the chunk grid addresses
// raw frames (`((y * width) + x) * 4`). Each render pass owns its buffers
// outright and hands them from stage to stage by value, so an offscreen stage
// can never alias the surface the pointer sampler reads.
//
// Allocation is where "acquiring a drawing context" can fail: a zero-sized,
// oversized or unallocatable surface is refused with the name of the surface
// that was asked for.

use crate::core_modules::pixel::pixel::{Byte, CHANNELS, Pixel};
use crate::error::{PixelatorError, Result, Surface};
use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Color of grid lines (CSS `lightgrey`).
pub const GRID_LINE_COLOR: Pixel = Pixel {
    red: 211,
    green: 211,
    blue: 211,
    alpha: 255,
};

/// Largest surface, in pixels, a pass may allocate (16384 x 16384).
pub const MAX_SURFACE_PIXELS: usize = 1 << 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Vec<Byte>,
}

impl FrameBuffer {
    /// Allocates a fully transparent surface.
    pub fn new(surface: Surface, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PixelatorError::ContextUnavailable(surface));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .filter(|pixels| *pixels <= MAX_SURFACE_PIXELS)
            .and_then(|pixels| pixels.checked_mul(CHANNELS))
            .ok_or(PixelatorError::ContextUnavailable(surface))?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| PixelatorError::ContextUnavailable(surface))?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.data
    }

    /// Byte offset of the pixel at `(x, y)`, if it lies inside the surface.
    pub fn pixel_offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(((y as usize * self.width as usize) + x as usize) * CHANNELS)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        Pixel::read(&self.data, self.pixel_offset(x, y)?)
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: Pixel) {
        if let Some(offset) = self.pixel_offset(x, y) {
            self.data[offset..offset + CHANNELS].copy_from_slice(&color.to_bytes());
        }
    }

    /// Fills a rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Pixel) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        let bytes = color.to_bytes();
        for row in y.min(y_end)..y_end {
            for column in x.min(x_end)..x_end {
                let offset = ((row as usize * self.width as usize) + column as usize) * CHANNELS;
                self.data[offset..offset + CHANNELS].copy_from_slice(&bytes);
            }
        }
    }

    /// Draws `image` stretched over the whole surface.
    pub fn draw_image(&mut self, image: &RgbaImage) {
        if image.dimensions() == (self.width, self.height) {
            self.data.copy_from_slice(image.as_raw());
            return;
        }
        let scaled = imageops::resize(image, self.width, self.height, FilterType::Triangle);
        self.data = scaled.into_raw();
    }

    /// Strokes 1px lines every `spacing` pixels in both axes, from 0 up to and
    /// including the far edge (drawn on the last column/row).
    pub fn stroke_grid(&mut self, spacing: u32, color: Pixel) {
        if spacing == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let mut x = 0;
        while x <= self.width {
            let column = x.min(self.width - 1);
            self.fill_rect(column, 0, 1, self.height, color);
            x += spacing;
        }
        let mut y = 0;
        while y <= self.height {
            let row = y.min(self.height - 1);
            self.fill_rect(0, row, self.width, 1, color);
            y += spacing;
        }
    }

    /// Copies this surface into `target`, nearest-neighbour scaled to its size.
    pub fn blit_scaled(&self, target: &mut FrameBuffer) {
        if self.data.is_empty() {
            return;
        }
        if (self.width, self.height) == (target.width, target.height) {
            target.data.copy_from_slice(&self.data);
            return;
        }
        for y in 0..target.height {
            let source_y = (y as u64 * self.height as u64 / target.height as u64) as usize;
            for x in 0..target.width {
                let source_x = (x as u64 * self.width as u64 / target.width as u64) as usize;
                let from = ((source_y * self.width as usize) + source_x) * CHANNELS;
                let to = ((y as usize * target.width as usize) + x as usize) * CHANNELS;
                target.data[to..to + CHANNELS].copy_from_slice(&self.data[from..from + CHANNELS]);
            }
        }
    }

    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
    }
}
