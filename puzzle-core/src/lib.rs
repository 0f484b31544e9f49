//! Puzzle selection for printable chess sheets.
//!
//! Loads the Lichess puzzle CSV into an immutable [`PuzzleIndex`], filters it
//! with [`FilterCriteria`], samples puzzles, and turns each record into the
//! position the solver has to look at ([`resolve`]).

mod dataset;
mod filter;
mod record;
mod resolve;

pub use dataset::{InsufficientDataError, LoadError, PuzzleIndex, sample};
pub use filter::{DEFAULT_MAX_RATING_DEVIATION, DEFAULT_MIN_POPULARITY, FilterCriteria};
pub use record::PuzzleRecord;
pub use resolve::{BoardState, ResolveError, resolve, resolve_position};

pub use shakmaty::{Color, Piece, Role, Square};
