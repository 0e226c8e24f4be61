use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::Path;

use crate::types::SkipReason;

/// Decode raw image bytes of any supported raster format
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, SkipReason> {
    image::load_from_memory(bytes).map_err(SkipReason::Decode)
}

/// Shrink to fit within `(max_width, max_height)`, keeping aspect ratio
///
/// Images already inside the box are returned unchanged, never upscaled.
pub fn fit_within(image: DynamicImage, (max_width, max_height): (u32, u32)) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max_width && height <= max_height {
        return image;
    }
    image.thumbnail(max_width, max_height)
}

/// Canonical extension for a URL's file, if the codec can write that format
pub fn known_extension(ext: &str) -> Option<String> {
    ImageFormat::from_extension(ext)
        .filter(|format| format.can_write())
        .map(|_| ext.to_ascii_lowercase())
}

/// Extension for bytes whose URL gave no usable one
pub fn sniffed_extension(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .filter(|format| format.can_write())
        .and_then(|format| format.extensions_str().first().copied())
}

/// Write `image` to `path` in the format named by its extension
///
/// The parent directory must already exist.
pub fn save(image: &DynamicImage, path: &Path) -> Result<(), SkipReason> {
    let encode_err = |source| SkipReason::Encode {
        path: path.display().to_string(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(encode_err)?;
    log::trace!("encoding {} as {:?}", path.display(), format);

    // JPEG has no alpha channel
    if format == ImageFormat::Jpeg && image.color().has_alpha() {
        return DynamicImage::ImageRgb8(image.to_rgb8())
            .save_with_format(path, format)
            .map_err(encode_err);
    }
    image.save_with_format(path, format).map_err(encode_err)
}

/// Decode, bound and persist one downloaded image
pub fn thumbnail_to_file(bytes: &[u8], bounds: (u32, u32), path: &Path) -> Result<(), SkipReason> {
    let decoded = decode(bytes)?;
    let resized = fit_within(decoded, bounds);
    save(&resized, path)
}

#[cfg(test)]
pub(crate) fn encode_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    let rgb = RgbImage::from_pixel(width, height, Rgb([90, 140, 210]));
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut encoded, format)
        .expect("test image encoding should succeed");
    encoded.into_inner()
}
