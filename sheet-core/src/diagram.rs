use puzzle_core::{BoardState, Color, Role};

use crate::theme::ColorTheme;

const SQUARE: f32 = 45.0;
const COORD_MARGIN: f32 = 15.0;
const FILES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// An SVG document and the size it asks to be drawn at.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorImage {
    pub svg: String,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagramOptions {
    /// Nominal width and height in px.
    pub size: u32,
    pub coordinates: bool,
    pub borders: bool,
    pub highlight_last_move: bool,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            size: 480,
            coordinates: true,
            borders: true,
            highlight_last_move: false,
        }
    }
}

/// A rendered puzzle plus whose turn it is, for the page indicator.
#[derive(Clone, Debug)]
pub struct DiagramUnit {
    pub image: VectorImage,
    pub to_move: Color,
}

impl DiagramUnit {
    /// Renders from the point of view of the side to move.
    pub fn new(state: &BoardState, theme: &ColorTheme, options: &DiagramOptions) -> Self {
        let to_move = state.turn();
        Self {
            image: render(state, theme, to_move, options),
            to_move,
        }
    }
}

struct Frame {
    outer: f32,
    margin: f32,
    inner: f32,
}

impl Frame {
    fn new(options: &DiagramOptions) -> Self {
        let outer = if options.borders { 1.0 } else { 0.0 };
        let margin = if options.coordinates {
            COORD_MARGIN
        } else {
            0.0
        };
        let inner = if options.borders && options.coordinates {
            1.0
        } else {
            0.0
        };
        Self {
            outer,
            margin,
            inner,
        }
    }

    fn board_origin(&self) -> f32 {
        self.outer + self.margin + self.inner
    }

    fn full_size(&self) -> f32 {
        2.0 * self.board_origin() + 8.0 * SQUARE
    }
}

/// Draws the board with `orientation`'s first rank at the bottom.
pub fn render(
    state: &BoardState,
    theme: &ColorTheme,
    orientation: Color,
    options: &DiagramOptions,
) -> VectorImage {
    let frame = Frame::new(options);
    let full = frame.full_size();
    let origin = frame.board_origin();
    let px = options.size as f32;

    let mut s = String::new();
    s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    s.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{px}\" height=\"{px}\" viewBox=\"0 0 {full} {full}\">\n"
    ));

    if frame.outer > 0.0 {
        s.push_str(&rect(0.0, 0.0, full, full, &theme.outer_border));
    }
    if frame.margin > 0.0 {
        let m = full - 2.0 * frame.outer;
        s.push_str(&rect(frame.outer, frame.outer, m, m, &theme.margin));
    }
    if frame.inner > 0.0 {
        let at = frame.outer + frame.margin;
        let w = 8.0 * SQUARE + 2.0 * frame.inner;
        s.push_str(&rect(at, at, w, w, &theme.inner_border));
    }

    let highlight = options
        .highlight_last_move
        .then(|| state.last_move())
        .flatten();
    for rank in 0..8u32 {
        for file in 0..8u32 {
            let (x, y) = square_origin(file, rank, orientation, origin);
            let light = (file + rank) % 2 == 1;
            let moved = highlight.is_some_and(|(from, to)| {
                [from, to]
                    .iter()
                    .any(|sq| sq.file().to_u32() == file && sq.rank().to_u32() == rank)
            });
            let fill = match (light, moved) {
                (true, false) => &theme.square_light,
                (false, false) => &theme.square_dark,
                (true, true) => &theme.square_light_lastmove,
                (false, true) => &theme.square_dark_lastmove,
            };
            s.push_str(&rect(x, y, SQUARE, SQUARE, fill));
        }
    }

    if options.coordinates {
        push_coordinates(&mut s, &frame, theme, orientation);
    }

    for rank in 0..8u32 {
        for file in 0..8u32 {
            if let Some(piece) = state.piece_at(file, rank) {
                let (x, y) = square_origin(file, rank, orientation, origin);
                let fill = match piece.color {
                    Color::White => &theme.piece_white,
                    Color::Black => &theme.piece_black,
                };
                s.push_str(&piece_group(piece.role, x, y, fill, &theme.piece_outline));
            }
        }
    }

    s.push_str("</svg>\n");
    VectorImage {
        svg: s,
        width: px,
        height: px,
    }
}

fn square_origin(file: u32, rank: u32, orientation: Color, origin: f32) -> (f32, f32) {
    let (col, row) = match orientation {
        Color::White => (file, 7 - rank),
        Color::Black => (7 - file, rank),
    };
    (
        origin + col as f32 * SQUARE,
        origin + row as f32 * SQUARE,
    )
}

fn push_coordinates(s: &mut String, frame: &Frame, theme: &ColorTheme, orientation: Color) {
    let origin = frame.board_origin();
    let near = frame.outer + frame.margin / 2.0;
    let far = frame.full_size() - near;
    s.push_str(&format!(
        "<g fill=\"{}\" font-family=\"sans-serif\" font-size=\"11\" text-anchor=\"middle\">\n",
        svg_escape(&theme.coord)
    ));
    for i in 0..8u32 {
        let (file, rank) = match orientation {
            Color::White => (i, 7 - i),
            Color::Black => (7 - i, i),
        };
        let center = origin + (i as f32 + 0.5) * SQUARE;
        let file_label = FILES[file as usize];
        let rank_label = rank + 1;
        // 4 units drops the baseline to roughly center 11px text
        for y in [near, far] {
            s.push_str(&format!(
                "<text x=\"{center:.2}\" y=\"{:.2}\">{file_label}</text>\n",
                y + 4.0
            ));
        }
        for x in [near, far] {
            s.push_str(&format!(
                "<text x=\"{x:.2}\" y=\"{:.2}\">{rank_label}</text>\n",
                center + 4.0
            ));
        }
    }
    s.push_str("</g>\n");
}

fn rect(x: f32, y: f32, w: f32, h: f32, fill: &str) -> String {
    format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" fill=\"{}\"/>\n",
        svg_escape(fill)
    )
}

fn circle(cx: f32, cy: f32, r: f32) -> String {
    format!(
        "M {:.2} {cy:.2} a {r:.2} {r:.2} 0 1 0 {:.2} 0 a {r:.2} {r:.2} 0 1 0 {:.2} 0 Z",
        cx - r,
        2.0 * r,
        -2.0 * r
    )
}

// Glyph outlines in a 45x45 square, y down.
fn piece_paths(role: Role) -> Vec<String> {
    let fixed = |d: &[&str]| d.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    match role {
        Role::Pawn => {
            let mut v = fixed(&[
                "M 12 38 L 33 38 L 33 34 L 12 34 Z",
                "M 16 34 L 29 34 C 29 28 27 24 25 22 L 20 22 C 18 24 16 28 16 34 Z",
            ]);
            v.push(circle(22.5, 16.0, 5.5));
            v
        }
        Role::Knight => fixed(&[
            "M 12 38 L 33 38 L 33 34 L 12 34 Z",
            "M 14 34 L 32 34 C 33 24 30 14 22 10 L 21 7 L 18 10 L 15 14 L 10 22 L 12 25 L 16 23 L 19 21 C 19 25 15 29 14 34 Z",
        ]),
        Role::Bishop => {
            let mut v = fixed(&[
                "M 12 38 L 33 38 L 33 35 L 12 35 Z",
                "M 15 33 L 30 33 C 31 26 28 19 22.5 12 C 17 19 14 26 15 33 Z",
            ]);
            v.push(circle(22.5, 9.0, 2.5));
            v
        }
        Role::Rook => fixed(&[
            "M 11 38 L 34 38 L 34 34 L 31 31 L 31 17 L 34 14 L 34 9 L 30 9 L 30 12 L 25 12 L 25 9 L 20 9 L 20 12 L 15 12 L 15 9 L 11 9 L 11 14 L 14 17 L 14 31 L 11 34 Z",
        ]),
        Role::Queen => {
            let mut v = fixed(&[
                "M 11 38 L 34 38 L 34 34 L 37 14 L 30 27 L 28 11 L 22.5 25 L 17 11 L 15 27 L 8 14 L 11 34 Z",
            ]);
            for (cx, cy) in [(8.0, 12.0), (17.0, 9.0), (28.0, 9.0), (37.0, 12.0)] {
                v.push(circle(cx, cy, 2.0));
            }
            v
        }
        Role::King => fixed(&[
            "M 11 38 L 34 38 L 34 34 C 38 26 34 19 28 21 L 22.5 26 L 17 21 C 11 19 7 26 11 34 Z",
            "M 21 6 L 24 6 L 24 9 L 27 9 L 27 12 L 24 12 L 24 18 L 21 18 L 21 12 L 18 12 L 18 9 L 21 9 Z",
        ]),
    }
}

fn piece_group(role: Role, x: f32, y: f32, fill: &str, outline: &str) -> String {
    let mut g = format!(
        "<g transform=\"translate({x:.2} {y:.2})\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.5\" stroke-linejoin=\"round\">\n",
        svg_escape(fill),
        svg_escape(outline)
    );
    for d in piece_paths(role) {
        g.push_str(&format!("<path d=\"{d}\"/>\n"));
    }
    g.push_str("</g>\n");
    g
}

fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
