//! # PDF Surface
//!
//! A `Surface` that writes a PDF 1.7 file.
//!
//! Drawing calls are turned into content stream operators as they arrive;
//! the file itself is assembled in `finish`, once every page, font and image
//! is known.
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages, streams
//! ...
//! xref                <- byte offsets of each object
//! trailer             <- points to the catalog
//! %%EOF
//! ```
//!
//! Text uses the standard Type1 fonts with WinAnsiEncoding, so no font data
//! is embedded. Coordinates arrive top-down and are flipped here.
//! `{{pageNumber}}` and `{{totalPages}}` in drawn text are replaced when the
//! file is written.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use super::{DrawMode, Surface};
use crate::error::Result;
use crate::image_loader::{decode_for_embedding, EmbeddedPixels, ImageHandle};
use crate::style::{Color, FontStyle};
use crate::text::StandardFamily;

const BORDER_WIDTH: f64 = 0.5;

struct PdfPage {
    width: f64,
    height: f64,
    stream: String,
    images: Vec<usize>,
}

struct PdfImage {
    width_px: u32,
    height_px: u32,
    pixels: EmbeddedPixels,
}

struct PdfObject {
    data: Vec<u8>,
}

pub struct PdfSurface {
    title: Option<String>,
    pages: Vec<PdfPage>,
    /// Base font names, indexed as /F0, /F1, ...
    fonts: Vec<&'static str>,
    images: Vec<PdfImage>,
    image_index: HashMap<String, usize>,
    font: Option<(usize, f64)>,
    text_color: Color,
    draw_color: Color,
    fill_color: Color,
}

impl Default for PdfSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfSurface {
    pub fn new() -> Self {
        Self {
            title: None,
            pages: Vec::new(),
            fonts: Vec::new(),
            images: Vec::new(),
            image_index: HashMap::new(),
            font: None,
            text_color: Color::BLACK,
            draw_color: Color::BLACK,
            fill_color: Color::WHITE,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self) -> &mut PdfPage {
        if self.pages.is_empty() {
            self.begin_page(612.0, 792.0);
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn font_resource(&mut self, base_font: &'static str) -> usize {
        if let Some(i) = self.fonts.iter().position(|f| *f == base_font) {
            return i;
        }
        self.fonts.push(base_font);
        self.fonts.len() - 1
    }

    fn image_resource(&mut self, image: &ImageHandle) -> Result<Option<usize>> {
        let Some((format, data)) = &image.data else {
            return Ok(None);
        };
        if let Some(&i) = self.image_index.get(&image.src) {
            return Ok(Some(i));
        }
        let pixels = decode_for_embedding(*format, data)?;
        self.images.push(PdfImage {
            width_px: image.width_px,
            height_px: image.height_px,
            pixels,
        });
        let i = self.images.len() - 1;
        if !image.src.is_empty() {
            self.image_index.insert(image.src.clone(), i);
        }
        Ok(Some(i))
    }

    /// Assemble the PDF file.
    pub fn finish(mut self) -> Vec<u8> {
        if self.pages.is_empty() {
            self.begin_page(612.0, 792.0);
        }
        if self.fonts.is_empty() {
            self.fonts.push("Courier");
        }

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        let mut objects: Vec<PdfObject> = (0..3).map(|_| PdfObject { data: vec![] }).collect();

        let mut font_ids = Vec::with_capacity(self.fonts.len());
        for base_font in &self.fonts {
            font_ids.push(objects.len());
            objects.push(PdfObject {
                data: format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    base_font
                )
                .into_bytes(),
            });
        }
        let font_dict = font_ids
            .iter()
            .enumerate()
            .map(|(i, id)| format!("/F{} {} 0 R", i, id))
            .collect::<Vec<_>>()
            .join(" ");

        let image_ids: Vec<usize> = self
            .images
            .iter()
            .map(|image| write_image_xobject(&mut objects, image))
            .collect();

        let total_pages = self.pages.len();
        let mut page_ids = Vec::with_capacity(total_pages);
        for (page_idx, page) in self.pages.iter().enumerate() {
            let content = page
                .stream
                .replace("{{pageNumber}}", &(page_idx + 1).to_string())
                .replace("{{totalPages}}", &total_pages.to_string());
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);

            let content_id = objects.len();
            let mut data: Vec<u8> = Vec::new();
            let _ = write!(
                data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            data.extend_from_slice(&compressed);
            data.extend_from_slice(b"\nendstream");
            objects.push(PdfObject { data });

            let mut resources = format!("/Font << {} >>", font_dict);
            if !page.images.is_empty() {
                let xobjects = page
                    .images
                    .iter()
                    .map(|i| format!("/Im{} {} 0 R", i, image_ids[*i]))
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = write!(resources, " /XObject << {} >>", xobjects);
            }

            page_ids.push(objects.len());
            objects.push(PdfObject {
                data: format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                     /Contents {} 0 R /Resources << {} >> >>",
                    page.width, page.height, content_id, resources
                )
                .into_bytes(),
            });
        }

        objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_ids.len()
        )
        .into_bytes();

        let info_id = self.title.as_ref().map(|title| {
            let id = objects.len();
            objects.push(PdfObject {
                data: format!(
                    "<< /Title ({}) /Producer (quire) >>",
                    encode_text(title)
                )
                .into_bytes(),
            });
            id
        });

        serialize(&objects, info_id)
    }
}

impl Surface for PdfSurface {
    fn begin_page(&mut self, width: f64, height: f64) {
        self.pages.push(PdfPage {
            width,
            height,
            stream: String::new(),
            images: Vec::new(),
        });
    }

    fn set_font(&mut self, family: &str, style: FontStyle, size: f64) {
        let index = self.font_resource(base_font_name(family, style));
        self.font = Some((index, size));
    }

    fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    fn set_draw_color(&mut self, color: Color) {
        self.draw_color = color;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str) {
        let (font, size) = match self.font {
            Some(f) => f,
            None => {
                let index = self.font_resource("Courier");
                self.font = Some((index, 10.0));
                (index, 10.0)
            }
        };
        let color = self.text_color;
        let page = self.page();
        let pdf_y = page.height - y;
        let _ = write!(
            page.stream,
            "BT\n/F{} {:.1} Tf\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            font,
            size,
            color.r,
            color.g,
            color.b,
            x,
            pdf_y,
            encode_text(text)
        );
    }

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, mode: DrawMode) {
        let (fill, draw) = (self.fill_color, self.draw_color);
        let page = self.page();
        let pdf_y = page.height - y - height;
        let op = match mode {
            DrawMode::Stroke => "S",
            DrawMode::Fill => "f",
            DrawMode::Both => "B",
        };
        let _ = write!(
            page.stream,
            "q\n{:.3} {:.3} {:.3} rg\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\n{}\nQ\n",
            fill.r, fill.g, fill.b, draw.r, draw.g, draw.b, BORDER_WIDTH, x, pdf_y, width, height, op
        );
    }

    fn draw_image(
        &mut self,
        image: &ImageHandle,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        let resource = self.image_resource(image)?;
        let page = self.page();
        let pdf_y = page.height - y - height;
        match resource {
            Some(i) => {
                if !page.images.contains(&i) {
                    page.images.push(i);
                }
                let _ = write!(
                    page.stream,
                    "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                    width, height, x, pdf_y, i
                );
            }
            None => {
                // Grey placeholder for size-only images
                let _ = write!(
                    page.stream,
                    "q\n0.9 0.9 0.9 rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                    x, pdf_y, width, height
                );
            }
        }
        Ok(())
    }
}

/// Standard Type1 font name for a family and style.
fn base_font_name(family: &str, style: FontStyle) -> &'static str {
    match (StandardFamily::from_name(family), style) {
        (StandardFamily::Courier, FontStyle::Normal) => "Courier",
        (StandardFamily::Courier, FontStyle::Bold) => "Courier-Bold",
        (StandardFamily::Courier, FontStyle::Italic) => "Courier-Oblique",
        (StandardFamily::Courier, FontStyle::BoldItalic) => "Courier-BoldOblique",
        (StandardFamily::Helvetica, FontStyle::Normal) => "Helvetica",
        (StandardFamily::Helvetica, FontStyle::Bold) => "Helvetica-Bold",
        (StandardFamily::Helvetica, FontStyle::Italic) => "Helvetica-Oblique",
        (StandardFamily::Helvetica, FontStyle::BoldItalic) => "Helvetica-BoldOblique",
        (StandardFamily::Times, FontStyle::Normal) => "Times-Roman",
        (StandardFamily::Times, FontStyle::Bold) => "Times-Bold",
        (StandardFamily::Times, FontStyle::Italic) => "Times-Italic",
        (StandardFamily::Times, FontStyle::BoldItalic) => "Times-BoldItalic",
    }
}

/// Encode text as the body of a PDF literal string in WinAnsiEncoding.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let b = unicode_to_winansi(ch).unwrap_or(b'?');
        match b {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                // Octal escape for bytes outside ASCII printable range
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Codepoints in 0x20..=0x7E and
/// 0xA0..=0xFF map directly; 0x80..=0x9F holds smart quotes, dashes and the
/// like.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98),
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

/// Write an image as one XObject, plus an SMask for translucent PNGs.
/// Returns the main XObject ID.
fn write_image_xobject(objects: &mut Vec<PdfObject>, image: &PdfImage) -> usize {
    match &image.pixels {
        EmbeddedPixels::Jpeg { data, gray } => {
            let color_space = if *gray { "/DeviceGray" } else { "/DeviceRGB" };
            let mut obj: Vec<u8> = Vec::new();
            let _ = write!(
                obj,
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode \
                 /Length {} >>\nstream\n",
                image.width_px,
                image.height_px,
                color_space,
                data.len()
            );
            obj.extend_from_slice(data);
            obj.extend_from_slice(b"\nendstream");
            objects.push(PdfObject { data: obj });
            objects.len() - 1
        }
        EmbeddedPixels::Rgb { rgb, alpha } => {
            let smask_id = alpha.as_ref().map(|alpha| {
                let compressed = compress_to_vec_zlib(alpha, 6);
                let mut obj: Vec<u8> = Vec::new();
                let _ = write!(
                    obj,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceGray /BitsPerComponent 8 \
                     /Filter /FlateDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed.len()
                );
                obj.extend_from_slice(&compressed);
                obj.extend_from_slice(b"\nendstream");
                objects.push(PdfObject { data: obj });
                objects.len() - 1
            });

            let compressed = compress_to_vec_zlib(rgb, 6);
            let smask_ref = smask_id
                .map(|id| format!(" /SMask {} 0 R", id))
                .unwrap_or_default();
            let mut obj: Vec<u8> = Vec::new();
            let _ = write!(
                obj,
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 \
                 /Filter /FlateDecode /Length {}{} >>\nstream\n",
                image.width_px,
                image.height_px,
                compressed.len(),
                smask_ref
            );
            obj.extend_from_slice(&compressed);
            obj.extend_from_slice(b"\nendstream");
            objects.push(PdfObject { data: obj });
            objects.len() - 1
        }
    }
}

/// Serialize all objects into the final PDF byte stream.
fn serialize(objects: &[PdfObject], info_id: Option<usize>) -> Vec<u8> {
    let mut output: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = vec![0; objects.len()];

    output.extend_from_slice(b"%PDF-1.7\n");
    output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    for (i, obj) in objects.iter().enumerate().skip(1) {
        offsets[i] = output.len();
        let _ = write!(output, "{} 0 obj\n", i);
        output.extend_from_slice(&obj.data);
        output.extend_from_slice(b"\nendobj\n\n");
    }

    let xref_offset = output.len();
    let _ = write!(output, "xref\n0 {}\n", objects.len());
    let _ = write!(output, "0000000000 65535 f \n");
    for offset in offsets.iter().skip(1) {
        let _ = write!(output, "{:010} 00000 n \n", offset);
    }

    let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", objects.len());
    if let Some(id) = info_id {
        let _ = write!(output, " /Info {} 0 R", id);
    }
    let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

    output
}
