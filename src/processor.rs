use crate::cache::ThumbnailCache;
use crate::{Result, WallpaperPickerError};
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageEncoder};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Generated,
    AlreadyCached,
}

/// Largest centered square inside a `width` x `height` image, as `(x, y, side)`.
pub fn center_square(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}

/// Crops `img` to its centered square and shrinks it to at most `size` pixels per side.
/// Images already smaller than `size` are not enlarged.
pub fn square_thumbnail(img: &DynamicImage, size: u32) -> DynamicImage {
    let (x, y, side) = center_square(img.width(), img.height());
    let square = img.crop_imm(x, y, side, side);

    if side > size {
        square.resize(size, size, FilterType::Lanczos3)
    } else {
        square
    }
}

pub fn encode_png(img: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
    let rgba = img.to_rgba8();
    let mut bytes = Vec::new();

    PngEncoder::new(&mut bytes)
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ColorType::Rgba8)
        .map_err(|source| WallpaperPickerError::ImageEncode {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(bytes)
}

pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    let decode_err = |source: image::ImageError| WallpaperPickerError::ImageDecode {
        path: path.to_path_buf(),
        source,
    };

    image::io::Reader::open(path)
        .map_err(|e| decode_err(e.into()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.into()))?
        .decode()
        .map_err(decode_err)
}

/// Produces the cached thumbnail for `file_name` in `source_dir`.
///
/// Does nothing when the cache entry already exists; callers invalidate the entry
/// first when the source has changed.
pub fn process(source_dir: &Path, cache: &ThumbnailCache, file_name: &str, size: u32) -> Result<ProcessOutcome> {
    if cache.contains(file_name) {
        return Ok(ProcessOutcome::AlreadyCached);
    }

    let source = source_dir.join(file_name);
    let img = decode_image(&source)?;
    let thumbnail = square_thumbnail(&img, size);
    let bytes = encode_png(&thumbnail, &source)?;
    let cache_path = cache.store(file_name, &bytes)?;

    log::debug!("Generated thumbnail for {} at {:?}", file_name, cache_path);
    Ok(ProcessOutcome::Generated)
}
