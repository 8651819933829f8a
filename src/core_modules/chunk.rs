// THEORY:
// A `Chunk` is the spatial pool of source pixels that decides one cell's color.
// Without blur the pool is a single pixel, the cell's top-left corner. With
// blur the pool is a square neighbourhood centred on that corner whose
// half-width grows with both the sampling factor and the blur percentage, so a
// given blur setting looks the same regardless of source resolution.
//
// The neighbourhood is clamped to the buffer. Cells on the border just pool
// fewer pixels; nothing is ever read outside the surface.

pub mod chunk {
    use crate::core_modules::color_math::{average_colors, resolve_opaque_color};
    use crate::core_modules::frame_buffer::FrameBuffer;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{PixelatorError, Result};

    /// Neighbourhood half-width, in multiples of the neighbour range.
    pub const NEIGHBORHOOD_SPREAD: u32 = 4;

    /// A pool of opaque-resolved pixels around one cell origin.
    pub struct Chunk {
        /// The column of the pixel the pool is centred on.
        pub origin_x: u32,
        /// The row of the pixel the pool is centred on.
        pub origin_y: u32,
        /// Every pixel inside the clamped neighbourhood, row-major.
        pub pixels: Vec<Pixel>,
    }

    impl Chunk {
        /// Collects every pixel within `half_width` of `(x, y)` in both axes.
        pub fn gather(buffer: &FrameBuffer, x: u32, y: u32, half_width: u32) -> Self {
            let x_start = x.saturating_sub(half_width);
            let y_start = y.saturating_sub(half_width);
            let x_end = x.saturating_add(half_width).min(buffer.width().saturating_sub(1));
            let y_end = y.saturating_add(half_width).min(buffer.height().saturating_sub(1));

            let mut pixels = Vec::new();
            if x < buffer.width() && y < buffer.height() {
                let span = (x_end - x_start + 1) as usize * (y_end - y_start + 1) as usize;
                pixels.reserve(span);
                for row in y_start..=y_end {
                    for column in x_start..=x_end {
                        if let Some(pixel) = buffer
                            .pixel_offset(column, row)
                            .and_then(|offset| resolve_opaque_color(buffer.as_bytes(), offset))
                        {
                            pixels.push(pixel);
                        }
                    }
                }
            }

            Self {
                origin_x: x,
                origin_y: y,
                pixels,
            }
        }

        pub fn average_pixel(&self) -> Result<Pixel> {
            average_colors(&self.pixels)
        }
    }

    /// `round(factor * blur / 100)`.
    pub fn neighbor_range(factor: u32, blur: u8) -> u32 {
        (factor as f64 * blur as f64 / 100.0).round() as u32
    }

    /// Resolves the color of the cell whose top-left pixel is `(x, y)`.
    pub fn sample_cell(buffer: &FrameBuffer, x: u32, y: u32, factor: u32, blur: u8) -> Result<Pixel> {
        let range = neighbor_range(factor, blur);
        if range == 0 {
            let offset = buffer
                .pixel_offset(x, y)
                .ok_or(PixelatorError::EmptySampleSet)?;
            return resolve_opaque_color(buffer.as_bytes(), offset).ok_or(PixelatorError::EmptySampleSet);
        }
        Chunk::gather(buffer, x, y, NEIGHBORHOOD_SPREAD * range).average_pixel()
    }
}
