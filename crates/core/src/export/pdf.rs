//! Minimal PDF 1.4 writer for illustrated story books.
//!
//! Layout, one A4 page per chapter:
//! - chapter with a decodable image: the image fills the page (cropped to
//!   cover), with a translucent white box over the lower third holding the
//!   title and text;
//! - any other chapter: title and wrapped text on a plain page.
//!
//! Text uses the built-in Helvetica fonts with WinAnsi encoding, so
//! characters outside Latin-1 are replaced with `?`. Images are re-encoded
//! as baseline JPEG and embedded with `DCTDecode`. Text that does not fit
//! its box is cut with an ellipsis.

use std::fmt::Write as _;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use super::{ExportChapter, ExportStory};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const CM: f32 = 28.35;

const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const BODY_LEADING: f32 = 16.0;
const OVERLAY_ALPHA: f32 = 0.85;

/// Approximate Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// A JPEG ready to embed.
struct EmbeddedImage {
    width: u32,
    height: u32,
    jpeg: Vec<u8>,
}

/// Build the PDF for a story. Always produces at least one page.
pub fn build_pdf(story: &ExportStory) -> Vec<u8> {
    let mut doc = PdfDocument::new(&story.title);

    if story.chapters.is_empty() {
        doc.add_page(text_page_content(&story.title, ""), None);
    }

    for chapter in &story.chapters {
        match chapter.image_bytes.as_deref().and_then(prepare_image) {
            Some(img) => {
                let content = image_page_content(chapter, &img);
                doc.add_page(content, Some(img));
            }
            None => doc.add_page(text_page_content(&chapter.title, &chapter.text), None),
        }
    }

    doc.finish()
}

/// Decode arbitrary image bytes and re-encode them as RGB JPEG.
fn prepare_image(bytes: &[u8]) -> Option<EmbeddedImage> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .ok()?;
    Some(EmbeddedImage {
        width: rgb.width(),
        height: rgb.height(),
        jpeg,
    })
}

// ---------------------------------------------------------------------------
// Page content
// ---------------------------------------------------------------------------

fn image_page_content(chapter: &ExportChapter, img: &EmbeddedImage) -> Vec<u8> {
    let mut out = Vec::new();

    let scale = (PAGE_WIDTH / img.width as f32).max(PAGE_HEIGHT / img.height as f32);
    let w = img.width as f32 * scale;
    let h = img.height as f32 * scale;
    let x = (PAGE_WIDTH - w) / 2.0;
    let y = (PAGE_HEIGHT - h) / 2.0;
    push_str(
        &mut out,
        &format!("q {w:.2} 0 0 {h:.2} {x:.2} {y:.2} cm /Im1 Do Q\n"),
    );

    let pad = 1.2 * CM;
    let box_w = PAGE_WIDTH - 2.0 * pad;
    let box_h = PAGE_HEIGHT * 0.32;
    push_str(
        &mut out,
        &format!("q /GS1 gs 1 1 1 rg {pad:.2} {pad:.2} {box_w:.2} {box_h:.2} re f Q\n"),
    );

    let inner = 0.4 * CM;
    write_text_block(
        &mut out,
        &chapter.title,
        &chapter.text,
        pad + inner,
        pad + box_h - inner,
        box_w - 2.0 * inner,
        pad + inner,
    );
    out
}

fn text_page_content(title: &str, text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let margin = 2.0 * CM;
    write_text_block(
        &mut out,
        title,
        text,
        margin,
        PAGE_HEIGHT - 2.0 * margin,
        PAGE_WIDTH - 2.0 * margin,
        margin,
    );
    out
}

/// Title in bold then body lines, from `top` down to no lower than `bottom`.
fn write_text_block(
    out: &mut Vec<u8>,
    title: &str,
    text: &str,
    left: f32,
    top: f32,
    width: f32,
    bottom: f32,
) {
    let mut y = top - TITLE_SIZE;
    out.extend_from_slice(b"BT 0 0 0 rg\n");

    for line in wrap_text(title, width, TITLE_SIZE) {
        if y < bottom {
            break;
        }
        push_str(out, &format!("/F2 {TITLE_SIZE} Tf 1 0 0 1 {left:.2} {y:.2} Tm ("));
        out.extend_from_slice(&pdf_string(&line));
        out.extend_from_slice(b") Tj\n");
        y -= TITLE_SIZE * 1.3;
    }
    y -= BODY_LEADING * 0.5;

    let lines = wrap_text(text, width, BODY_SIZE);
    let capacity = ((y - bottom) / BODY_LEADING).floor().max(0.0) as usize + 1;
    let truncated = lines.len() > capacity;
    let shown = lines.len().min(capacity);

    for (i, line) in lines.iter().take(shown).enumerate() {
        if y < bottom {
            break;
        }
        let line = if truncated && i + 1 == shown {
            format!("{}...", line.trim_end_matches(['.', ' ']))
        } else {
            line.clone()
        };
        push_str(out, &format!("/F1 {BODY_SIZE} Tf 1 0 0 1 {left:.2} {y:.2} Tm ("));
        out.extend_from_slice(&pdf_string(&line));
        out.extend_from_slice(b") Tj\n");
        y -= BODY_LEADING;
    }

    out.extend_from_slice(b"ET\n");
}

/// Greedy word wrap by estimated glyph width. Newlines start new lines;
/// blank lines are kept as paragraph breaks.
pub(crate) fn wrap_text(text: &str, width: f32, font_size: f32) -> Vec<String> {
    let max_chars = ((width / (font_size * AVG_GLYPH_WIDTH)).floor() as usize).max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Encode text for a literal string in the WinAnsi-encoded base fonts.
pub(crate) fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let ch = match ch {
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{2026}' => {
                out.extend_from_slice(b"...");
                continue;
            }
            other => other,
        };
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            '\t' => out.push(b' '),
            c if (c as u32) < 0x20 => {}
            c if (0x20..0x7F).contains(&(c as u32)) || (0xA0..=0xFF).contains(&(c as u32)) => {
                out.push(c as u32 as u8)
            }
            _ => out.push(b'?'),
        }
    }
    out
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
}

// ---------------------------------------------------------------------------
// Document assembly
// ---------------------------------------------------------------------------

/// Object numbers 1-4 are fixed; pages start at 5.
const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const FONT_REGULAR_ID: usize = 3;
const FONT_BOLD_ID: usize = 4;

struct PdfPage {
    content: Vec<u8>,
    image: Option<EmbeddedImage>,
}

struct PdfDocument {
    title: String,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            pages: Vec::new(),
        }
    }

    fn add_page(&mut self, content: Vec<u8>, image: Option<EmbeddedImage>) {
        self.pages.push(PdfPage { content, image });
    }

    fn finish(self) -> Vec<u8> {
        let mut buf: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
        let mut offsets: Vec<(usize, usize)> = Vec::new();

        // Each page takes three ids: page, content stream, image (maybe unused).
        let page_id = |i: usize| 5 + i * 3;
        let kids = (0..self.pages.len())
            .map(|i| format!("{} 0 R", page_id(i)))
            .collect::<Vec<_>>()
            .join(" ");

        let info_id = 5 + self.pages.len() * 3;

        write_object(
            &mut buf,
            &mut offsets,
            CATALOG_ID,
            format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
        );
        write_object(
            &mut buf,
            &mut offsets,
            PAGES_ID,
            format!(
                "<< /Type /Pages /Kids [{kids}] /Count {} >>",
                self.pages.len()
            )
            .as_bytes(),
        );
        write_object(
            &mut buf,
            &mut offsets,
            FONT_REGULAR_ID,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        write_object(
            &mut buf,
            &mut offsets,
            FONT_BOLD_ID,
            b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
        );

        for (i, page) in self.pages.iter().enumerate() {
            let id = page_id(i);
            let content_id = id + 1;
            let image_id = id + 2;

            let mut resources = format!(
                "/Font << /F1 {FONT_REGULAR_ID} 0 R /F2 {FONT_BOLD_ID} 0 R >>"
            );
            if page.image.is_some() {
                let _ = write!(
                    resources,
                    " /XObject << /Im1 {image_id} 0 R >> /ExtGState << /GS1 << /Type /ExtGState /ca {OVERLAY_ALPHA} >> >>"
                );
            }

            write_object(
                &mut buf,
                &mut offsets,
                id,
                format!(
                    "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                     /Resources << {resources} >> /Contents {content_id} 0 R >>"
                )
                .as_bytes(),
            );
            write_stream(
                &mut buf,
                &mut offsets,
                content_id,
                &format!("<< /Length {} >>", page.content.len()),
                &page.content,
            );
            if let Some(img) = &page.image {
                write_stream(
                    &mut buf,
                    &mut offsets,
                    image_id,
                    &format!(
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>",
                        img.width,
                        img.height,
                        img.jpeg.len()
                    ),
                    &img.jpeg,
                );
            }
        }

        let mut info = b"<< /Title (".to_vec();
        info.extend_from_slice(&pdf_string(&self.title));
        info.extend_from_slice(b") /Producer (storyteller) >>");
        write_object(&mut buf, &mut offsets, info_id, &info);

        // Unused image slots are emitted as free entries.
        let size = info_id + 1;
        let xref_start = buf.len();
        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for id in 1..size {
            match offsets.iter().find(|(oid, _)| *oid == id) {
                Some((_, offset)) => {
                    let _ = writeln!(xref, "{offset:010} 00000 n ");
                }
                None => xref.push_str("0000000000 65535 f \n"),
            }
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {size} /Root {CATALOG_ID} 0 R /Info {info_id} 0 R >>\nstartxref\n{xref_start}\n%%EOF\n"
        );
        buf.extend_from_slice(xref.as_bytes());
        buf
    }
}

fn write_object(buf: &mut Vec<u8>, offsets: &mut Vec<(usize, usize)>, id: usize, body: &[u8]) {
    offsets.push((id, buf.len()));
    buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
    buf.extend_from_slice(body);
    buf.extend_from_slice(b"\nendobj\n");
}

fn write_stream(
    buf: &mut Vec<u8>,
    offsets: &mut Vec<(usize, usize)>,
    id: usize,
    dict: &str,
    data: &[u8],
) {
    offsets.push((id, buf.len()));
    buf.extend_from_slice(format!("{id} 0 obj\n{dict}\nstream\n").as_bytes());
    buf.extend_from_slice(data);
    buf.extend_from_slice(b"\nendstream\nendobj\n");
}
