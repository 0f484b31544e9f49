//! Diagrams and printable pages for chess puzzle sheets.
//!
//! [`render`] turns a [`BoardState`](puzzle_core::BoardState) into an SVG
//! board, [`compose_page`] arranges up to twelve of them under a header on any
//! [`Surface`], and [`SheetWriter`] backs that surface with a PDF document.

mod diagram;
mod error;
mod fonts;
mod layout;
mod pdf;
mod raster;
mod theme;

pub use diagram::{DiagramOptions, DiagramUnit, VectorImage, render};
pub use error::SheetError;
pub use fonts::{FONT_ENV, FontLibrary};
pub use layout::{
    COLUMNS, GridCell, Header, PAGE_CAPACITY, PageGeometry, Point, ROWS, Rect, Surface, TextAlign,
    compose_page,
};
pub use pdf::SheetWriter;
pub use raster::{encode_png, rasterize, write_png};
pub use theme::{ColorTheme, ThemeError};
