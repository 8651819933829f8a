// THEORY:
// Color math for the renderer and the pointer sampler. Channel values stored in
// 8-bit sRGB are roughly the square root of emitted light, so averaging them
// arithmetically darkens every blend. Averaging is therefore done as a
// root-mean-square per channel: square, take the mean, take the root.

use crate::core_modules::pixel::pixel::{Byte, Pixel};
use crate::error::{PixelatorError, Result};

/// Reads the pixel at `offset` and flattens any transparency onto white.
pub fn resolve_opaque_color(buffer: &[Byte], offset: usize) -> Option<Pixel> {
    Pixel::read(buffer, offset).map(Pixel::opaque)
}

/// Root-mean-square average of every channel, alpha included.
pub fn average_colors(colors: &[Pixel]) -> Result<Pixel> {
    if colors.is_empty() {
        return Err(PixelatorError::EmptySampleSet);
    }

    let mut sum_r = 0u64;
    let mut sum_g = 0u64;
    let mut sum_b = 0u64;
    let mut sum_a = 0u64;
    for pixel in colors {
        sum_r += (pixel.red as u64).pow(2);
        sum_g += (pixel.green as u64).pow(2);
        sum_b += (pixel.blue as u64).pow(2);
        sum_a += (pixel.alpha as u64).pow(2);
    }

    let count = colors.len() as f64;
    let root_mean = |sum: u64| -> u8 { (sum as f64 / count).sqrt().round().min(255.0) as u8 };
    Ok(Pixel::new(
        root_mean(sum_r),
        root_mean(sum_g),
        root_mean(sum_b),
        root_mean(sum_a),
    ))
}

/// Six uppercase hex digits, no `#`. Channels above 255 are rejected.
pub fn to_hex_color(red: u32, green: u32, blue: u32) -> Result<String> {
    if red > 255 || green > 255 || blue > 255 {
        return Err(PixelatorError::InvalidColorComponent { red, green, blue });
    }
    Ok(format!("{:06X}", (red << 16) | (green << 8) | blue))
}

pub fn pixel_hex(pixel: Pixel) -> String {
    format!("{:02X}{:02X}{:02X}", pixel.red, pixel.green, pixel.blue)
}

/// CSS-style form of a hex string, e.g. `#FF0000`.
pub fn display_hex(hex: &str) -> String {
    format!("#{hex}")
}
