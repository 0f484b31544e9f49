use log::{debug, warn};
use puzzle_core::Color;

use crate::diagram::{DiagramUnit, VectorImage};
use crate::error::SheetError;

/// One centimetre in PDF points.
pub const CM: f32 = 72.0 / 2.54;
pub const COLUMNS: usize = 3;
pub const ROWS: usize = 4;
pub const PAGE_CAPACITY: usize = COLUMNS * ROWS;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned box in page space, `y` is the bottom edge (PDF is y-up).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y + self.h
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

/// Drawing primitives a page is composed from.
pub trait Surface {
    fn draw_image(&mut self, image: &VectorImage, rect: Rect) -> Result<(), SheetError>;
    fn draw_circle(&mut self, center: Point, radius: f32, filled: bool);
    fn draw_text(&mut self, at: Point, text: &str, size: f32, align: TextAlign);
    fn draw_line(&mut self, from: Point, to: Point);
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Header {
    /// General theme, printed on the left.
    pub left: String,
    /// Sheet name or author, printed on the right.
    pub right: String,
}

impl Header {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Position of a diagram in the 3-column grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    pub column: usize,
    pub row: usize,
}

impl GridCell {
    pub fn of(index: usize) -> Self {
        Self {
            column: index % COLUMNS,
            row: index / COLUMNS,
        }
    }
}

/// Page size and the metrics everything else is derived from, in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self {
            width: 595.2756,
            height: 841.8898,
            font_size: 18.0,
        }
    }

    pub fn header_height(&self) -> f32 {
        1.5 * CM + self.font_size
    }

    pub fn header_baseline(&self) -> f32 {
        self.height - CM - self.font_size
    }

    /// Side length of a diagram cell.
    pub fn cell_size(&self) -> f32 {
        (self.width - 5.0 * CM) / COLUMNS as f32
    }

    pub fn cell_rect(&self, cell: GridCell) -> Rect {
        let w = self.cell_size();
        let x = 1.5 * CM + cell.column as f32 * (w + CM);
        let top = self.height - self.header_height() - CM - cell.row as f32 * (w + 1.2 * CM);
        Rect {
            x,
            y: top - w,
            w,
            h: w,
        }
    }

    /// Center and radius of the side-to-move marker next to a cell.
    pub fn indicator(&self, cell: GridCell) -> (Point, f32) {
        let r = self.cell_rect(cell);
        let center = Point {
            x: r.right() + 0.3 * CM,
            y: r.top() - 0.1 * r.w,
        };
        (center, 0.18 * CM)
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Fits `image` into `cell` with one scale factor for both axes, centered.
pub fn fit(image: &VectorImage, cell: Rect) -> Rect {
    let scale = (cell.w / image.width).min(cell.h / image.height);
    let w = image.width * scale;
    let h = image.height * scale;
    Rect {
        x: cell.x + (cell.w - w) / 2.0,
        y: cell.y + (cell.h - h) / 2.0,
        w,
        h,
    }
}

/// Draws the header and the first [`PAGE_CAPACITY`] diagrams. Returns how
/// many diagrams were placed.
pub fn compose_page<S: Surface>(
    surface: &mut S,
    geometry: &PageGeometry,
    header: &Header,
    diagrams: &[DiagramUnit],
) -> Result<usize, SheetError> {
    let baseline = geometry.header_baseline();
    surface.draw_text(
        Point {
            x: geometry.width * 0.15,
            y: baseline,
        },
        &header.left,
        geometry.font_size,
        TextAlign::Left,
    );
    surface.draw_text(
        Point {
            x: geometry.width * 0.85,
            y: baseline,
        },
        &header.right,
        geometry.font_size,
        TextAlign::Right,
    );
    let rule = geometry.height - geometry.header_height();
    surface.draw_line(
        Point { x: CM, y: rule },
        Point {
            x: geometry.width - CM,
            y: rule,
        },
    );

    if diagrams.len() > PAGE_CAPACITY {
        warn!(
            "page holds {PAGE_CAPACITY} diagrams, dropping {}",
            diagrams.len() - PAGE_CAPACITY
        );
    }
    let placed = &diagrams[..diagrams.len().min(PAGE_CAPACITY)];
    for (index, unit) in placed.iter().enumerate() {
        let cell = GridCell::of(index);
        let target = fit(&unit.image, geometry.cell_rect(cell));
        debug!("diagram {index} at {cell:?} -> {target:?}");
        surface.draw_image(&unit.image, target)?;
        let (center, radius) = geometry.indicator(cell);
        surface.draw_circle(center, radius, unit.to_move == Color::Black);
    }
    Ok(placed.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        images: Vec<Rect>,
        circles: Vec<(Point, f32, bool)>,
        texts: Vec<(Point, String, TextAlign)>,
        lines: Vec<(Point, Point)>,
    }

    impl Surface for Recorder {
        fn draw_image(&mut self, _image: &VectorImage, rect: Rect) -> Result<(), SheetError> {
            self.images.push(rect);
            Ok(())
        }
        fn draw_circle(&mut self, center: Point, radius: f32, filled: bool) {
            self.circles.push((center, radius, filled));
        }
        fn draw_text(&mut self, at: Point, text: &str, _size: f32, align: TextAlign) {
            self.texts.push((at, text.to_string(), align));
        }
        fn draw_line(&mut self, from: Point, to: Point) {
            self.lines.push((from, to));
        }
    }

    fn unit(to_move: Color, w: f32, h: f32) -> DiagramUnit {
        DiagramUnit {
            image: VectorImage {
                svg: String::new(),
                width: w,
                height: h,
            },
            to_move,
        }
    }

    fn units(n: usize) -> Vec<DiagramUnit> {
        (0..n)
            .map(|i| {
                let side = if i % 2 == 0 { Color::White } else { Color::Black };
                unit(side, 480.0, 480.0)
            })
            .collect()
    }

    #[test]
    fn twelve_diagrams_fill_a_three_by_four_grid() {
        let geom = PageGeometry::a4();
        let mut rec = Recorder::default();
        let placed = compose_page(&mut rec, &geom, &Header::new("Matt", "Matt in 1"), &units(12)).unwrap();
        assert_eq!(placed, 12);
        assert_eq!(rec.images.len(), 12);
        for (i, a) in rec.images.iter().enumerate() {
            assert!(a.x >= 0.0 && a.right() <= geom.width, "{a:?}");
            assert!(a.y >= 0.0 && a.top() <= geom.height - geom.header_height(), "{a:?}");
            for b in &rec.images[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
        let columns: Vec<f32> = rec.images[..3].iter().map(|r| r.x).collect();
        assert!(columns[0] < columns[1] && columns[1] < columns[2]);
        assert_eq!(rec.images[3].x, rec.images[0].x);
        assert!(rec.images[3].y < rec.images[0].y);
    }

    #[test]
    fn thirteenth_diagram_is_dropped() {
        let geom = PageGeometry::a4();
        let mut rec = Recorder::default();
        let mut diagrams = units(12);
        diagrams.push(unit(Color::White, 100.0, 100.0));
        let placed = compose_page(&mut rec, &geom, &Header::default(), &diagrams).unwrap();
        assert_eq!(placed, 12);
        assert_eq!(rec.images.len(), 12);
        assert_eq!(rec.circles.len(), 12);
    }

    #[test]
    fn header_and_separator() {
        let geom = PageGeometry::a4();
        let mut rec = Recorder::default();
        compose_page(&mut rec, &geom, &Header::new("Matt", "Matt in 1"), &[]).unwrap();
        assert_eq!(rec.texts.len(), 2);
        let (left_at, left, left_align) = &rec.texts[0];
        let (right_at, right, right_align) = &rec.texts[1];
        assert_eq!((left.as_str(), *left_align), ("Matt", TextAlign::Left));
        assert_eq!((right.as_str(), *right_align), ("Matt in 1", TextAlign::Right));
        assert_eq!(left_at.y, right_at.y);
        assert!(left_at.x < right_at.x);

        assert_eq!(rec.lines.len(), 1);
        let (from, to) = rec.lines[0];
        assert_eq!(from.y, to.y);
        assert!(from.y < left_at.y);
        assert!((from.x - CM).abs() < 1e-3);
        assert!((to.x - (geom.width - CM)).abs() < 1e-3);
    }

    #[test]
    fn indicator_is_filled_for_black() {
        let geom = PageGeometry::a4();
        let mut rec = Recorder::default();
        compose_page(&mut rec, &geom, &Header::default(), &units(4)).unwrap();
        let filled: Vec<bool> = rec.circles.iter().map(|c| c.2).collect();
        assert_eq!(filled, vec![false, true, false, true]);
        for ((center, _, _), img) in rec.circles.iter().zip(&rec.images) {
            assert!(center.x > img.right());
            assert!(center.y < img.top() && center.y > img.y);
        }
    }

    #[test]
    fn non_square_images_keep_their_aspect_ratio() {
        let cell = PageGeometry::a4().cell_rect(GridCell::of(0));
        let wide = unit(Color::White, 400.0, 200.0);
        let r = fit(&wide.image, cell);
        assert!((r.w / r.h - 2.0).abs() < 1e-4);
        assert!((r.w - cell.w).abs() < 1e-3);
        assert!(r.y > cell.y && r.top() < cell.top());
    }

    #[test]
    fn grid_cells_are_row_major() {
        assert_eq!(GridCell::of(0), GridCell { column: 0, row: 0 });
        assert_eq!(GridCell::of(5), GridCell { column: 2, row: 1 });
        assert_eq!(GridCell::of(11), GridCell { column: 2, row: 3 });
    }

    #[test]
    fn last_row_stays_on_the_page() {
        let geom = PageGeometry::a4();
        let bottom = geom.cell_rect(GridCell::of(PAGE_CAPACITY - 1));
        assert!(bottom.y > 0.0);
    }
}
