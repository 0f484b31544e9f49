use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use pdf_writer::{Content, Finish, Name, Pdf, Rect as PdfRect, Ref, Str, TextStr};
use tempfile::NamedTempFile;

use crate::diagram::{DiagramUnit, VectorImage};
use crate::error::SheetError;
use crate::fonts::FontLibrary;
use crate::layout::{
    Header, PAGE_CAPACITY, PageGeometry, Point, Rect, Surface, TextAlign, compose_page,
};

const HEADER_FONT: Name<'static> = Name(b"F1");
const LINE_WIDTH: f32 = 1.0;
// Control point distance for a quarter circle drawn as one cubic.
const KAPPA: f32 = 0.552_284_8;

/// Builds a multi-page puzzle sheet and writes it to disk on [`finish`].
///
/// The document is staged in a temporary file next to the target so a failed
/// run never leaves a half-written PDF behind.
///
/// [`finish`]: SheetWriter::finish
pub struct SheetWriter {
    target: PathBuf,
    staging: NamedTempFile,
    pdf: Pdf,
    fonts: FontLibrary,
    geometry: PageGeometry,
    next_ref: Ref,
    catalog: Ref,
    page_tree: Ref,
    header_font: Ref,
    pages: Vec<Ref>,
    diagrams: usize,
}

impl SheetWriter {
    pub fn create(path: impl AsRef<Path>, fonts: &FontLibrary) -> Result<Self, SheetError> {
        let target = path.as_ref().to_path_buf();
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".puzzle-sheet-")
            .suffix(".pdf")
            .tempfile_in(dir)
            .map_err(|source| SheetError::RenderTarget {
                path: target.clone(),
                source,
            })?;
        debug!("staging {} in {}", target.display(), staging.path().display());

        let mut pdf = Pdf::new();
        let catalog = Ref::new(1);
        let page_tree = Ref::new(2);
        let header_font = Ref::new(3);
        pdf.type1_font(header_font)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        Ok(Self {
            target,
            staging,
            pdf,
            fonts: fonts.clone(),
            geometry: PageGeometry::a4(),
            next_ref: Ref::new(4),
            catalog,
            page_tree,
            header_font,
            pages: Vec::new(),
            diagrams: 0,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn diagram_count(&self) -> usize {
        self.diagrams
    }

    /// Adds one page holding at most [`PAGE_CAPACITY`] diagrams. Returns how
    /// many were placed.
    pub fn add_page(&mut self, header: &Header, diagrams: &[DiagramUnit]) -> Result<usize, SheetError> {
        let page_id = self.next_ref.bump();
        let content_id = self.next_ref.bump();

        let mut surface = PdfPage {
            pdf: &mut self.pdf,
            next_ref: &mut self.next_ref,
            fonts: &self.fonts,
            content: Content::new(),
            x_objects: Vec::new(),
            first_index: self.diagrams,
        };
        surface.content.set_line_width(LINE_WIDTH);
        let placed = compose_page(&mut surface, &self.geometry, header, diagrams)?;
        let PdfPage {
            content, x_objects, ..
        } = surface;
        self.pdf.stream(content_id, &content.finish());

        let mut page = self.pdf.page(page_id);
        page.media_box(PdfRect::new(0.0, 0.0, self.geometry.width, self.geometry.height))
            .parent(self.page_tree)
            .contents(content_id);
        let mut resources = page.resources();
        resources.fonts().pair(HEADER_FONT, self.header_font);
        let mut xobjects = resources.x_objects();
        for (name, id) in &x_objects {
            xobjects.pair(Name(name.as_bytes()), *id);
        }
        xobjects.finish();
        resources.finish();
        page.finish();

        self.pages.push(page_id);
        self.diagrams += placed;
        debug!("page {} with {placed} diagrams", self.pages.len());
        Ok(placed)
    }

    /// Adds as many pages as needed, twelve diagrams each. An empty list
    /// still produces one page carrying the header. Returns the page count.
    pub fn add_pages(&mut self, header: &Header, diagrams: &[DiagramUnit]) -> Result<usize, SheetError> {
        if diagrams.is_empty() {
            self.add_page(header, diagrams)?;
            return Ok(1);
        }
        let mut added = 0;
        for chunk in diagrams.chunks(PAGE_CAPACITY) {
            self.add_page(header, chunk)?;
            added += 1;
        }
        Ok(added)
    }

    /// Writes the document and moves it onto the target path.
    pub fn finish(mut self) -> Result<PathBuf, SheetError> {
        let count = self.pages.len();
        self.pdf.catalog(self.catalog).pages(self.page_tree);
        self.pdf
            .pages(self.page_tree)
            .kids(self.pages.iter().copied())
            .count(count as i32);
        let info = self.next_ref.bump();
        self.pdf
            .document_info(info)
            .title(TextStr("Chess puzzles"))
            .producer(TextStr(concat!("sheet-core ", env!("CARGO_PKG_VERSION"))));

        let bytes = self.pdf.finish();
        let target = self.target;
        let write_err = |source| SheetError::RenderTarget {
            path: target.clone(),
            source,
        };
        let file: &mut File = self.staging.as_file_mut();
        file.write_all(&bytes).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        self.staging
            .persist(&target)
            .map_err(|e| write_err(e.error))?;
        info!(
            "wrote {} ({count} pages, {} diagrams, {} bytes)",
            target.display(),
            self.diagrams,
            bytes.len()
        );
        Ok(target)
    }
}

/// One page's content stream while it is being composed.
struct PdfPage<'a> {
    pdf: &'a mut Pdf,
    next_ref: &'a mut Ref,
    fonts: &'a FontLibrary,
    content: Content,
    x_objects: Vec<(String, Ref)>,
    first_index: usize,
}

impl Surface for PdfPage<'_> {
    fn draw_image(&mut self, image: &VectorImage, rect: Rect) -> Result<(), SheetError> {
        let index = self.first_index + self.x_objects.len();
        let tree = self
            .fonts
            .parse(&image.svg)
            .map_err(|source| SheetError::DiagramConversion { index, source })?;
        let id = *self.next_ref;
        *self.next_ref = svg2pdf::convert_tree_into(&tree, svg2pdf::Options::default(), &mut *self.pdf, id);

        let name = format!("D{}", self.x_objects.len());
        self.content
            .save_state()
            .transform([rect.w, 0.0, 0.0, rect.h, rect.x, rect.y])
            .x_object(Name(name.as_bytes()))
            .restore_state();
        self.x_objects.push((name, id));
        Ok(())
    }

    fn draw_circle(&mut self, center: Point, radius: f32, filled: bool) {
        let (cx, cy, r) = (center.x, center.y, radius);
        let k = KAPPA * r;
        let c = &mut self.content;
        c.save_state().set_stroke_gray(0.0).set_fill_gray(0.0);
        c.move_to(cx + r, cy)
            .cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r)
            .cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy)
            .cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r)
            .cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy)
            .close_path();
        if filled {
            c.fill_nonzero_and_stroke();
        } else {
            c.stroke();
        }
        c.restore_state();
    }

    fn draw_text(&mut self, at: Point, text: &str, size: f32, align: TextAlign) {
        if text.is_empty() {
            return;
        }
        let encoded = win_ansi(text);
        let x = match align {
            TextAlign::Left => at.x,
            TextAlign::Right => at.x - text_width(&encoded, size),
        };
        self.content
            .begin_text()
            .set_font(HEADER_FONT, size)
            .next_line(x, at.y)
            .show(Str(&encoded))
            .end_text();
    }

    fn draw_line(&mut self, from: Point, to: Point) {
        self.content
            .set_stroke_gray(0.0)
            .move_to(from.x, from.y)
            .line_to(to.x, to.y)
            .stroke();
    }
}

/// Latin-1 subset of WinAnsi; anything outside it prints as `?`. C1 controls
/// are excluded since WinAnsi puts glyphs like `€` on those bytes.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u8::try_from(u32::from(c)) {
            Ok(0x80..=0x9f) | Err(_) => b'?',
            Ok(b) => b,
        })
        .collect()
}

fn text_width(encoded: &[u8], size: f32) -> f32 {
    let units: u32 = encoded.iter().map(|&b| u32::from(glyph_width(b))).sum();
    units as f32 * size / 1000.0
}

/// Helvetica-Bold advance widths from the standard AFM, in 1/1000 em.
fn glyph_width(byte: u8) -> u16 {
    #[rustfmt::skip]
    const ASCII: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278,
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
        975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
        667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
        278, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
        611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ];
    match byte {
        0x20..=0x7e => ASCII[usize::from(byte - 0x20)],
        _ => 556,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_bold_widths() {
        assert_eq!(glyph_width(b' '), 278);
        assert_eq!(glyph_width(b'M'), 833);
        assert_eq!(glyph_width(b'a'), 556);
        assert_eq!(glyph_width(b'i'), 278);
        assert_eq!(glyph_width(b'~'), 584);
        assert_eq!(glyph_width(0xe4), 556);
        // "Matt in 1" = M a t t space i n space 1
        let w = text_width(b"Matt in 1", 18.0);
        let units = 833 + 556 + 333 + 333 + 278 + 278 + 611 + 278 + 556;
        assert!((w - units as f32 * 0.018).abs() < 1e-3);
    }

    #[test]
    fn non_latin_text_is_replaced() {
        assert_eq!(win_ansi("Matt"), b"Matt".to_vec());
        assert_eq!(win_ansi("Zug\u{e4}"), vec![b'Z', b'u', b'g', 0xe4]);
        assert_eq!(win_ansi("\u{265a}+"), b"?+".to_vec());
        assert_eq!(win_ansi("a\u{80}\u{9f}\u{a0}"), vec![b'a', b'?', b'?', 0xa0]);
    }
}
