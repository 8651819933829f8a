pub mod image_helper {
    use crate::core_modules::frame_buffer::FrameBuffer;
    use crate::error::{PixelatorError, Result};
    use image::{ImageEncoder, ImageFormat, RgbaImage};
    use std::path::Path;

    /// Upload formats the pixelator accepts.
    pub const SUPPORTED_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Gif, ImageFormat::Jpeg];

    /// Decodes an uploaded image into RGBA.
    pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
        let format = image::guess_format(bytes)
            .ok()
            .filter(|format| SUPPORTED_FORMATS.contains(format))
            .ok_or_else(|| {
                PixelatorError::DecodeFailed(
                    "Invalid file type. File types supported are PNG, GIF and JPG".to_string(),
                )
            })?;

        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|err| PixelatorError::DecodeFailed(err.to_string()))?
            .to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(PixelatorError::DecodeFailed(
                "unable to determine the image size".to_string(),
            ));
        }
        Ok(image)
    }

    /// Encodes a surface as PNG bytes.
    pub fn encode_png(buffer: &FrameBuffer) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
        encoder
            .write_image(
                buffer.as_bytes(),
                buffer.width(),
                buffer.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|err| PixelatorError::Io(std::io::Error::other(err)))?;
        Ok(bytes)
    }

    pub fn save(path: impl AsRef<Path>, buffer: &FrameBuffer) -> Result<()> {
        std::fs::write(path, encode_png(buffer)?)?;
        Ok(())
    }
}
