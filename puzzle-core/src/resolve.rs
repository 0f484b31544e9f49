use log::debug;
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, File, Move, Piece, Position, PositionError, Rank,
    Role, Square,
};

use crate::record::PuzzleRecord;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("puzzle {id} has no moves")]
    NoMoves { id: String },
    #[error("cannot set up position {fen}: {reason}")]
    Position { fen: String, reason: String },
    #[error("cannot apply move {uci:?} to {fen}")]
    MoveParse { uci: String, fen: String },
}

/// A position after exactly one move has been played from a puzzle's FEN.
#[derive(Clone, Debug)]
pub struct BoardState {
    position: Chess,
    last_move: Option<(Square, Square)>,
}

impl BoardState {
    /// `file` and `rank` are 0-based, `(0, 0)` is a1.
    pub fn piece_at(&self, file: u32, rank: u32) -> Option<Piece> {
        if file > 7 || rank > 7 {
            return None;
        }
        let sq = Square::from_coords(File::new(file), Rank::new(rank));
        self.position.board().piece_at(sq)
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    /// Origin and destination of the move that produced this state.
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }
}

/// Plays the record's setup move and returns the position the solver sees.
pub fn resolve(record: &PuzzleRecord) -> Result<(BoardState, Color), ResolveError> {
    let setup = record.setup_move().ok_or_else(|| ResolveError::NoMoves {
        id: record.id.clone(),
    })?;
    debug!("puzzle {}: setup move {setup}", record.id);
    resolve_position(&record.fen, setup)
}

/// Applies one UCI move to `start`. Returns the new state and the side that
/// has to move next.
pub fn resolve_position(start: &Fen, uci: &str) -> Result<(BoardState, Color), ResolveError> {
    let mut position: Chess = start
        .clone()
        .into_position::<Chess>(CastlingMode::Standard)
        .or_else(PositionError::ignore_invalid_castling_rights)
        .or_else(PositionError::ignore_invalid_ep_square)
        .map_err(|e| ResolveError::Position {
            fen: start.to_string(),
            reason: e.to_string(),
        })?;

    let move_parse = || ResolveError::MoveParse {
        uci: uci.to_string(),
        fen: start.to_string(),
    };
    let parsed: UciMove = uci.trim().parse().map_err(|_| move_parse())?;
    let UciMove::Normal {
        from,
        to,
        promotion,
    } = parsed
    else {
        return Err(move_parse());
    };
    let board = position.board();
    let role = board.role_at(from).ok_or_else(move_parse)?;
    let capture = board.role_at(to);

    // Castling and en passant touch a second square; let shakmaty work those
    // out. Everything else is played as written, legal or not.
    let special = match role {
        Role::King => from.file().distance(to.file()) > 1,
        Role::Pawn => from.file() != to.file() && capture.is_none(),
        _ => false,
    };
    let m = special
        .then(|| parsed.to_move(&position).ok())
        .flatten()
        .unwrap_or(Move::Normal {
            role,
            from,
            capture,
            to,
            promotion,
        });
    position.play_unchecked(m);

    let turn = position.turn();
    Ok((
        BoardState {
            position,
            last_move: Some((from, to)),
        },
        turn,
    ))
}
