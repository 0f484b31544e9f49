use serde::Deserialize;
use shakmaty::fen::Fen;

/// One row of the puzzle database.
///
/// `moves[0]` is the opponent's setup move; the solver plays from `moves[1]` on.
#[derive(Clone, Debug)]
pub struct PuzzleRecord {
    pub id: String,
    pub fen: Fen,
    pub moves: Vec<String>,
    pub rating: u32,
    pub rating_deviation: u32,
    pub popularity: i32,
    pub nb_plays: u64,
    pub themes: Vec<String>,
    pub game_url: String,
    pub opening_tags: Vec<String>,
}

impl PuzzleRecord {
    pub fn has_theme(&self, tag: &str) -> bool {
        self.themes.iter().any(|t| t == tag)
    }

    /// Number of moves the solver makes: a mate in N is stored as the setup
    /// move, N solver moves and N-1 replies.
    pub fn solver_moves(&self) -> usize {
        self.moves.len() / 2
    }

    pub fn setup_move(&self) -> Option<&str> {
        self.moves.first().map(String::as_str)
    }
}

// Columns are read by position, the header row only names them.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRow {
    pub puzzle_id: String,
    pub fen: String,
    pub moves: String,
    pub rating: u32,
    pub rating_deviation: u32,
    pub popularity: i32,
    pub nb_plays: u64,
    #[serde(default)]
    pub themes: String,
    #[serde(default)]
    pub game_url: String,
    #[serde(default)]
    pub opening_tags: String,
}

pub(crate) fn split_tags(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}
