//! I/O helpers used by the command-line tool.
//!
//! - `load_rgba_image`: read a PNG/JPEG/TIFF into an owned RGBA8 buffer.
//! - `save_channel_png`: write a 0..=255 level channel to a grayscale PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
//!
//! Nothing in the analysis pipeline itself touches the filesystem.
use super::{ImageF32, ImageRgba8, ImageView};
use crate::error::InputValidationError;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Owned RGBA8 buffer with borrowed view conversion.
#[derive(Clone, Debug)]
pub struct RgbaBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbaBuffer {
    /// Construct an owned RGBA buffer from raw bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Borrow as a validated `ImageRgba8` view.
    pub fn as_view(&self) -> Result<ImageRgba8<'_>, InputValidationError> {
        ImageRgba8::new(self.width, self.height, &self.data)
    }
}

/// Load an image from disk and convert to 8-bit RGBA.
pub fn load_rgba_image(path: &Path) -> Result<RgbaBuffer, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_rgba8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img.into_raw();
    Ok(RgbaBuffer::new(width, height, data))
}

/// Save a level channel (values in 0..=255) to a grayscale PNG.
pub fn save_channel_png(channel: &ImageF32, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(channel.w as u32, channel.h as u32);
    for y in 0..channel.h {
        let row = channel.row(y);
        for (x, &px) in row.iter().enumerate() {
            let v = px.round().clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
