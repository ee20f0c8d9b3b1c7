//! # Image Loading
//!
//! Resolves image sources into handles the layout engine can size and the
//! drawing surface can embed. Sources may be file paths, data URIs, or raw
//! base64 strings. Only the dimensions are read during resolution; pixel
//! decoding happens when a surface asks to embed the image.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use base64::Engine;

use crate::error::{LayoutError, Result};

/// Encoded image format, detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// A resolved image: display size in points plus the encoded bytes.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    /// Where the image came from.
    pub src: String,
    /// Display width in points.
    pub width: f64,
    /// Display height in points.
    pub height: f64,
    /// Intrinsic pixel size.
    pub width_px: u32,
    pub height_px: u32,
    /// Encoded bytes and their format. `None` for size-only placeholders.
    pub data: Option<(ImageFormat, Arc<[u8]>)>,
}

impl ImageHandle {
    /// A size-only image with no pixel data. Surfaces draw a placeholder.
    pub fn placeholder(width: f64, height: f64) -> Self {
        Self {
            src: String::new(),
            width,
            height,
            width_px: width.max(0.0).round() as u32,
            height_px: height.max(0.0).round() as u32,
            data: None,
        }
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.data.as_ref().map(|(f, _)| *f)
    }

    /// A `data:` URI for the encoded bytes.
    pub fn uri(&self) -> Option<String> {
        self.data.as_ref().map(|(format, bytes)| {
            format!(
                "data:{};base64,{}",
                format.mime(),
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )
        })
    }
}

/// The image collaborator: turns a source into a sized handle.
pub trait ImageProvider {
    fn resolve(&self, src: &str, width: Option<f64>, height: Option<f64>) -> Result<ImageHandle>;
}

/// Display size from the intrinsic size and the declared one.
///
/// A declared width alone scales the height by the aspect ratio; a declared
/// height alone keeps the natural width.
pub fn display_size(natural: (f64, f64), width: Option<f64>, height: Option<f64>) -> (f64, f64) {
    let (nw, nh) = natural;
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => {
            let scale = if nw > 0.0 { w / nw } else { 1.0 };
            (w, nh * scale)
        }
        (None, Some(h)) => (nw, h),
        (None, None) => (nw, nh),
    }
}

struct LoadedSource {
    format: ImageFormat,
    bytes: Arc<[u8]>,
    width_px: u32,
    height_px: u32,
}

/// Reads image sources from disk, data URIs, or raw base64, caching each
/// source's bytes and dimensions.
#[derive(Default)]
pub struct SourceImageProvider {
    cache: RefCell<HashMap<String, Arc<LoadedSource>>>,
}

impl SourceImageProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(&self, src: &str) -> Result<Arc<LoadedSource>> {
        if let Some(loaded) = self.cache.borrow().get(src) {
            return Ok(loaded.clone());
        }
        let bytes = read_source_bytes(src)?;
        let format = detect_format(&bytes)?;
        let (width_px, height_px) = read_dimensions(&bytes)?;
        let loaded = Arc::new(LoadedSource {
            format,
            bytes: bytes.into(),
            width_px,
            height_px,
        });
        self.cache
            .borrow_mut()
            .insert(src.to_string(), loaded.clone());
        Ok(loaded)
    }
}

impl ImageProvider for SourceImageProvider {
    fn resolve(&self, src: &str, width: Option<f64>, height: Option<f64>) -> Result<ImageHandle> {
        let loaded = self.load(src)?;
        let (w, h) = display_size(
            (loaded.width_px as f64, loaded.height_px as f64),
            width,
            height,
        );
        Ok(ImageHandle {
            src: src.to_string(),
            width: w,
            height: h,
            width_px: loaded.width_px,
            height_px: loaded.height_px,
            data: Some((loaded.format, loaded.bytes.clone())),
        })
    }
}

/// Resolve the source string to raw image bytes.
fn read_source_bytes(src: &str) -> Result<Vec<u8>> {
    // Data URI: data:image/png;base64,iVBOR...
    if src.starts_with("data:image/") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| LayoutError::Image("invalid data URI: missing comma".to_string()))?;
        return base64_decode(&src[comma_pos + 1..]);
    }

    // Only explicit path prefixes count as files, so base64 strings (which
    // may contain '/') are not mistaken for paths.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src)
            .map_err(|e| LayoutError::Image(format!("failed to read image file '{}': {}", src, e)));
    }

    base64_decode(src)
}

fn base64_decode(input: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| LayoutError::Image(format!("base64 decode error: {}", e)))
}

fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 4 {
        return Err(LayoutError::Image("image data too short".to_string()));
    }
    if is_jpeg(data) {
        Ok(ImageFormat::Jpeg)
    } else if is_png(data) {
        Ok(ImageFormat::Png)
    } else {
        Err(LayoutError::Image(
            "unsupported image format (expected JPEG or PNG)".to_string(),
        ))
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

fn is_png(data: &[u8]) -> bool {
    data.len() >= 4 && data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47
}

fn read_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| LayoutError::Image(format!("format detection error: {}", e)))?
        .into_dimensions()
        .map_err(|e| LayoutError::Image(format!("failed to read dimensions: {}", e)))
}

/// Pixel data in a form a PDF surface can embed directly.
#[derive(Debug, Clone)]
pub enum EmbeddedPixels {
    /// Raw JPEG bytes, embedded with DCTDecode.
    Jpeg { data: Arc<[u8]>, gray: bool },
    /// Decoded RGB pixels plus an alpha channel when not fully opaque.
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Prepare an image's bytes for embedding.
pub fn decode_for_embedding(format: ImageFormat, data: &Arc<[u8]>) -> Result<EmbeddedPixels> {
    match format {
        ImageFormat::Jpeg => Ok(EmbeddedPixels::Jpeg {
            data: data.clone(),
            gray: jpeg_is_gray(data),
        }),
        ImageFormat::Png => {
            let img = image::io::Reader::new(Cursor::new(&data[..]))
                .with_guessed_format()
                .map_err(|e| LayoutError::Image(format!("format detection error: {}", e)))?
                .decode()
                .map_err(|e| LayoutError::Image(format!("failed to decode PNG: {}", e)))?;
            let rgba = img.to_rgba8();
            let pixel_count = (rgba.width() * rgba.height()) as usize;
            let mut rgb = Vec::with_capacity(pixel_count * 3);
            let mut alpha = Vec::with_capacity(pixel_count);
            let mut translucent = false;
            for pixel in rgba.pixels() {
                rgb.extend_from_slice(&pixel.0[..3]);
                alpha.push(pixel[3]);
                translucent |= pixel[3] != 255;
            }
            Ok(EmbeddedPixels::Rgb {
                rgb,
                alpha: if translucent { Some(alpha) } else { None },
            })
        }
    }
}

/// Scan JPEG markers for the SOF segment and report a single-component
/// (grayscale) image.
fn jpeg_is_gray(data: &[u8]) -> bool {
    let mut i = 2; // skip SOI marker (FF D8)
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            break;
        }
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof && i + 9 < data.len() {
            // length(2) + precision(1) + height(2) + width(2) + components(1)
            return data[i + 9] == 1;
        }
        if i + 3 < data.len() {
            let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            i += 2 + seg_len;
        } else {
            break;
        }
    }
    false
}
