use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use slint::{Rgba8Pixel, SharedPixelBuffer};

/// Decode PNG (or any format the image crate detects) into a pixel buffer.
/// Runs off the UI thread; the buffer becomes a `slint::Image` on the event loop.
pub fn decode_frame_to_pixel_buffer(image_data: &[u8]) -> Result<SharedPixelBuffer<Rgba8Pixel>> {
    // Auto-detect the image format and decode
    let img = image::load_from_memory(image_data)?;

    // Convert to RGBA8 format
    let rgba_img = img.to_rgba8();
    let width = rgba_img.width();
    let height = rgba_img.height();

    Ok(SharedPixelBuffer::<Rgba8Pixel>::clone_from_slice(
        rgba_img.as_raw(),
        width,
        height,
    ))
}

/// Valid time of a frame in local time, e.g. "Tue 28 Jan 03:00".
pub fn format_valid_time(valid: DateTime<Utc>) -> String {
    valid.with_timezone(&Local).format("%a %d %b %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageOutputFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn decodes_png_bytes() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();

        let buffer = decode_frame_to_pixel_buffer(&bytes).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (4, 3));
    }

    #[test]
    fn rejects_non_images() {
        assert!(decode_frame_to_pixel_buffer(b"<html>404</html>").is_err());
    }
}
