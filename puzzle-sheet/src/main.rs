//! Printable chess puzzle sheets from the Lichess puzzle database.
//!
//! Example:
//!   puzzle-sheet --dataset lichess_db_puzzle.csv --mate-in 2 \
//!     --min-rating 1400 --max-rating 1600 --count 24 -o mate-in-2.pdf

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};
use puzzle_core::{
    DEFAULT_MAX_RATING_DEVIATION, DEFAULT_MIN_POPULARITY, FilterCriteria, PuzzleIndex,
    PuzzleRecord, resolve, sample,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use sheet_core::{
    ColorTheme, DiagramOptions, DiagramUnit, FontLibrary, Header, SheetWriter, rasterize,
    write_png,
};

#[derive(Parser, Debug)]
#[command(name = "puzzle-sheet", version, about = "Lay out random Lichess puzzles on A4 PDF pages")]
struct Cli {
    /// Lichess puzzle CSV
    #[arg(long, value_name = "CSV", default_value = "lichess_db_puzzle.csv")]
    dataset: PathBuf,

    /// Theme tag every puzzle must carry
    #[arg(long, default_value = "mate", conflicts_with = "mate_in")]
    theme: String,

    /// Mate in N moves (overrides --theme)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    mate_in: Option<u16>,

    #[arg(long, default_value_t = 1200)]
    min_rating: u32,

    #[arg(long, default_value_t = 1300)]
    max_rating: u32,

    /// Largest accepted rating deviation
    #[arg(long, default_value_t = DEFAULT_MAX_RATING_DEVIATION)]
    max_deviation: u32,

    #[arg(long, default_value_t = DEFAULT_MIN_POPULARITY, allow_negative_numbers = true)]
    min_popularity: i32,

    /// Number of puzzles to print
    #[arg(long, default_value_t = 12)]
    count: usize,

    /// Header text on the left (defaults to the general theme)
    #[arg(long)]
    left: Option<String>,

    /// Header text on the right (defaults to the specific theme)
    #[arg(long)]
    right: Option<String>,

    /// JSON color theme for the boards
    #[arg(long, value_name = "JSON")]
    colors: Option<PathBuf>,

    /// Font file for board coordinates (also read from PUZZLE_SHEET_FONT)
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// RNG seed for a reproducible selection
    #[arg(long)]
    seed: Option<u64>,

    /// Highlight the squares of the move that led to the puzzle
    #[arg(long)]
    highlight_last_move: bool,

    #[arg(long)]
    no_coordinates: bool,

    /// Also write one PNG per diagram into this directory
    #[arg(long, value_name = "DIR")]
    preview_dir: Option<PathBuf>,

    #[arg(short, long, value_name = "PDF", default_value = "puzzles.pdf")]
    output: PathBuf,
}

impl Cli {
    fn criteria(&self) -> FilterCriteria {
        let base = match self.mate_in {
            Some(n) => FilterCriteria::mate_in(usize::from(n), self.min_rating, self.max_rating),
            None => FilterCriteria::new(&self.theme, self.min_rating, self.max_rating),
        };
        base.with_max_rating_deviation(self.max_deviation)
            .with_min_popularity(self.min_popularity)
    }

    fn header(&self) -> Header {
        let (left, right) = match self.mate_in {
            Some(n) => ("Matt".to_string(), format!("Matt in {n}")),
            None if self.theme == "mate" => ("Matt".to_string(), "Matt".to_string()),
            None => (self.theme.clone(), self.theme.clone()),
        };
        Header::new(
            self.left.clone().unwrap_or(left),
            self.right.clone().unwrap_or(right),
        )
    }

    fn diagram_options(&self) -> DiagramOptions {
        DiagramOptions {
            coordinates: !self.no_coordinates,
            highlight_last_move: self.highlight_last_move,
            ..DiagramOptions::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    if cli.min_rating > cli.max_rating {
        bail!(
            "--min-rating {} is above --max-rating {}",
            cli.min_rating,
            cli.max_rating
        );
    }
    let theme = match &cli.colors {
        Some(path) => ColorTheme::load(path).context("loading --colors")?,
        None => ColorTheme::default(),
    };
    let fonts = FontLibrary::load(cli.font.as_deref());
    // Fail on an unwritable target before spending time on the dataset.
    let mut writer = SheetWriter::create(&cli.output, &fonts)?;

    let index = PuzzleIndex::load(&cli.dataset)?;
    let criteria = cli.criteria();
    let matching = index.query(&criteria);
    info!("{} of {} puzzles match {criteria:?}", matching.len(), index.len());

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let picked = sample(&matching, cli.count, &mut rng)
        .with_context(|| format!("not enough puzzles in {}", cli.dataset.display()))?;

    let options = cli.diagram_options();
    let rendered = build_diagrams(&picked, &theme, &options);
    if rendered.len() < picked.len() {
        warn!(
            "{} of {} puzzles could not be set up",
            picked.len() - rendered.len(),
            picked.len()
        );
    }
    if let Some(dir) = &cli.preview_dir {
        write_previews(dir, &rendered, options.size, &fonts)?;
    }

    let units: Vec<DiagramUnit> = rendered.into_iter().map(|(_, unit)| unit).collect();
    let pages = writer.add_pages(&cli.header(), &units)?;
    let path = writer.finish()?;
    info!("{} puzzles on {pages} pages in {}", units.len(), path.display());
    Ok(())
}

/// Resolves and renders every record, skipping those whose setup move
/// cannot be played.
fn build_diagrams<'a>(
    picked: &[&'a PuzzleRecord],
    theme: &ColorTheme,
    options: &DiagramOptions,
) -> Vec<(&'a str, DiagramUnit)> {
    picked
        .iter()
        .filter_map(|record| match resolve(record) {
            Ok((state, _)) => Some((record.id.as_str(), DiagramUnit::new(&state, theme, options))),
            Err(e) => {
                warn!("skipping puzzle {}: {e}", record.id);
                None
            }
        })
        .collect()
}

fn write_previews(
    dir: &Path,
    rendered: &[(&str, DiagramUnit)],
    px: u32,
    fonts: &FontLibrary,
) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    for (i, (id, unit)) in rendered.iter().enumerate() {
        let path = dir.join(format!("{:02}-{id}.png", i + 1));
        let pixmap = rasterize(&unit.image, px, fonts)
            .with_context(|| format!("preview of puzzle {id}"))?;
        write_png(&path, &pixmap)?;
    }
    info!("wrote {} previews to {}", rendered.len(), dir.display());
    Ok(())
}
