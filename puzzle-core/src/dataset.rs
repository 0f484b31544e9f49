use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;
use shakmaty::fen::{Fen, ParseFenError};

use crate::filter::FilterCriteria;
use crate::record::{PuzzleRecord, RawRow, split_tags};

/// Themes whose matching records are indexed at load time.
const BUCKET_THEMES: [&str; 4] = ["mate", "mateIn1", "mateIn2", "mateIn3"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot open dataset {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: missing {field}")]
    MissingField { line: u64, field: &'static str },
    #[error("line {line}: invalid FEN {fen:?}: {source}")]
    Fen {
        line: u64,
        fen: String,
        source: ParseFenError,
    },
}

#[derive(Debug, thiserror::Error)]
#[error("requested {requested} puzzles but only {available} match")]
pub struct InsufficientDataError {
    pub requested: usize,
    pub available: usize,
}

/// The puzzle database, loaded once and read-only afterwards.
#[derive(Debug, Default)]
pub struct PuzzleIndex {
    records: Vec<PuzzleRecord>,
    buckets: HashMap<&'static str, Vec<usize>>,
}

impl PuzzleIndex {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let started = Instant::now();
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_reader(BufReader::new(file))?;
        info!(
            "loaded {} puzzles from {} in {:.2?}",
            index.len(),
            path.display(),
            started.elapsed()
        );
        Ok(index)
    }

    /// Reads CSV with a header row. Trailing columns may be left out.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut records = Vec::new();
        for row in csv.records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            let raw: RawRow = row.deserialize(None)?;
            records.push(record_from_raw(raw, line)?);
        }
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<PuzzleRecord>) -> Self {
        let mut buckets: HashMap<&'static str, Vec<usize>> = HashMap::new();
        for theme in BUCKET_THEMES {
            let hits: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.has_theme(theme))
                .map(|(i, _)| i)
                .collect();
            debug!("bucket {theme}: {} puzzles", hits.len());
            buckets.insert(theme, hits);
        }
        Self { records, buckets }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PuzzleRecord] {
        &self.records
    }

    /// Records matching `criteria`, in dataset order.
    pub fn query(&self, criteria: &FilterCriteria) -> Vec<&PuzzleRecord> {
        match self.buckets.get(criteria.theme.as_str()) {
            Some(bucket) => bucket
                .iter()
                .map(|&i| &self.records[i])
                .filter(|r| criteria.matches_metadata(r))
                .collect(),
            None => self.scan(criteria),
        }
    }

    /// [`query`](Self::query) without the theme buckets.
    pub fn scan(&self, criteria: &FilterCriteria) -> Vec<&PuzzleRecord> {
        self.records.iter().filter(|r| criteria.matches(r)).collect()
    }
}

/// Picks `k` distinct records uniformly at random.
pub fn sample<'a, R: Rng + ?Sized>(
    subset: &[&'a PuzzleRecord],
    k: usize,
    rng: &mut R,
) -> Result<Vec<&'a PuzzleRecord>, InsufficientDataError> {
    if k > subset.len() {
        return Err(InsufficientDataError {
            requested: k,
            available: subset.len(),
        });
    }
    Ok(subset.choose_multiple(rng, k).copied().collect())
}

fn record_from_raw(raw: RawRow, line: u64) -> Result<PuzzleRecord, LoadError> {
    let required = [
        ("PuzzleId", &raw.puzzle_id),
        ("FEN", &raw.fen),
        ("Moves", &raw.moves),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(LoadError::MissingField { line, field });
        }
    }
    let fen = Fen::from_ascii(raw.fen.trim().as_bytes()).map_err(|source| LoadError::Fen {
        line,
        fen: raw.fen.clone(),
        source,
    })?;
    Ok(PuzzleRecord {
        id: raw.puzzle_id,
        fen,
        moves: split_tags(&raw.moves),
        rating: raw.rating,
        rating_deviation: raw.rating_deviation,
        popularity: raw.popularity,
        nb_plays: raw.nb_plays,
        themes: split_tags(&raw.themes),
        game_url: raw.game_url,
        opening_tags: split_tags(&raw.opening_tags),
    })
}
