/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt::Write;

use super::{Castling, Figure, PieceKind, Square};

/// Maximum possible number of moves in a given chess position.
///
/// Found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>)
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
///
/// A move list always lives in the stack frame of the search node that
/// generated it; workers sharing the list borrow it and are joined before
/// the frame is destroyed.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// Represents the different kinds of moves that can be made during a chess game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum MoveKind {
    /// A move that is not special in any way: a piece travels, possibly capturing.
    Quiet,

    /// A special case on a Pawn's first move, wherein it advances two squares forward.
    DoublePush,

    /// A Pawn captures onto the en passant square, removing the passing Pawn
    /// on the adjacent square.
    EnPassant,

    /// The King and the Rook on his side of the board swing around each other.
    ShortCastle,

    /// The King and the Rook on the Queen's side of the board swing around each other.
    LongCastle,

    /// A Pawn reaches the last rank and becomes a Queen.
    PromoteQueen,

    /// A Pawn reaches the last rank and becomes a Knight.
    PromoteKnight,

    /// A Pawn reaches the last rank and becomes a Rook.
    PromoteRook,

    /// A Pawn reaches the last rank and becomes a Bishop.
    PromoteBishop,
}

impl MoveKind {
    /// Creates a new [`MoveKind`] that is a promotion to the provided [`PieceKind`].
    ///
    /// # Panics
    /// This function will panic if `promotion` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub fn promotion(promotion: PieceKind) -> Self {
        match promotion {
            PieceKind::Queen => Self::PromoteQueen,
            PieceKind::Knight => Self::PromoteKnight,
            PieceKind::Rook => Self::PromoteRook,
            PieceKind::Bishop => Self::PromoteBishop,
            _ => unreachable!(),
        }
    }

    /// The promotion target of this kind, if it is a promotion.
    #[inline(always)]
    pub const fn promotion_target(&self) -> Option<PieceKind> {
        match self {
            Self::PromoteQueen => Some(PieceKind::Queen),
            Self::PromoteKnight => Some(PieceKind::Knight),
            Self::PromoteRook => Some(PieceKind::Rook),
            Self::PromoteBishop => Some(PieceKind::Bishop),
            _ => None,
        }
    }
}

/// Represents a move made on a chess board.
///
/// Castling moves encode *from* as the King's square and *to* as the square
/// of the participating *Rook*, not the King's destination. The unmake code
/// recovers the Rook from `to` without any additional state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Move {
    /// What kind of move this is.
    pub kind: MoveKind,

    /// Source square. For castling, the King's square.
    pub from: Square,

    /// Destination square. For castling, the Rook's square.
    pub to: Square,
}

impl Move {
    /// Creates a new [`Move`] from the given squares and a [`MoveKind`].
    #[inline(always)]
    pub const fn new(kind: MoveKind, from: Square, to: Square) -> Self {
        Self { kind, from, to }
    }

    /// Appends a human-readable form of this move to `out`.
    ///
    /// The moved and captured figures are taken as arguments rather than read
    /// from a board, so that history can be rendered from undo records whose
    /// figures are no longer on the board. The notation is the short form
    /// used by problemists: `Qd1*h5`, `e2-e4`, `e5*d6ep`, `e7-e8=N`, `0-0`.
    pub fn append_text(&self, out: &mut String, from_figure: Figure, to_figure: Figure) {
        match self.kind {
            MoveKind::ShortCastle => {
                out.push_str("0-0");
                return;
            }
            MoveKind::LongCastle => {
                out.push_str("0-0-0");
                return;
            }
            _ => {}
        }
        if from_figure.is_piece() {
            out.push_str(from_figure.kind().letter());
        }
        // En passant lands on an empty square but is still a capture.
        let capture = to_figure.is_piece() || self.kind == MoveKind::EnPassant;
        let _ = write!(out, "{}{}{}", self.from, if capture { '*' } else { '-' }, self.to);
        match self.kind {
            MoveKind::EnPassant => out.push_str("ep"),
            MoveKind::PromoteQueen => out.push_str("=Q"),
            MoveKind::PromoteKnight => out.push_str("=N"),
            MoveKind::PromoteRook => out.push_str("=R"),
            MoveKind::PromoteBishop => out.push_str("=B"),
            _ => {}
        }
    }

    /// Returns a human-readable form of this move; see [`Move::append_text`].
    #[inline(always)]
    pub fn to_text(&self, from_figure: Figure, to_figure: Figure) -> String {
        let mut s = String::new();
        self.append_text(&mut s, from_figure, to_figure);
        s
    }
}

/// Everything needed to take a pushed [`Move`] back off the board.
///
/// Captured before the edit; restoring `ep`, `castling`, and the two figure
/// cells reverses the move exactly.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Undo {
    /// The move that was applied.
    pub mv: Move,

    /// En passant square before the move.
    pub ep: Option<Square>,

    /// Castling rights before the move.
    pub castling: Castling,

    /// Figure that stood on `mv.from` before the move.
    pub from_figure: Figure,

    /// Figure that stood on `mv.to` before the move ([`Figure::EMPTY`] for quiets).
    pub to_figure: Figure,
}

impl Undo {
    /// Returns a human-readable form of the recorded move.
    #[inline(always)]
    pub fn to_text(&self) -> String {
        self.mv.to_text(self.from_figure, self.to_figure)
    }
}

/// Renders a whole line of undo records as space-separated moves.
pub fn line_text(stack: &[Undo]) -> String {
    let mut out = String::new();
    for undo in stack {
        if !out.is_empty() {
            out.push(' ');
        }
        undo.mv
            .append_text(&mut out, undo.from_figure, undo.to_figure);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn test_move_notation() {
        let quiet = Move::new(MoveKind::Quiet, Square::new(4, 1), Square::new(4, 2));
        assert_eq!(quiet.to_text(Figure::WHITE_PAWN, Figure::EMPTY), "e2-e3");

        let capture = Move::new(MoveKind::Quiet, Square::new(3, 0), Square::new(7, 4));
        assert_eq!(
            capture.to_text(
                Figure::new(Color::White, PieceKind::Queen),
                Figure::BLACK_PAWN
            ),
            "Qd1*h5"
        );

        let ep = Move::new(MoveKind::EnPassant, Square::new(4, 4), Square::new(3, 5));
        assert_eq!(ep.to_text(Figure::WHITE_PAWN, Figure::EMPTY), "e5*d6ep");

        let promote = Move::new(MoveKind::PromoteKnight, Square::new(4, 6), Square::new(4, 7));
        assert_eq!(promote.to_text(Figure::WHITE_PAWN, Figure::EMPTY), "e7-e8=N");

        let short = Move::new(MoveKind::ShortCastle, Square::E1, Square::H1);
        assert_eq!(short.to_text(Figure::WHITE_KING, Figure::WHITE_ROOK), "0-0");

        let long = Move::new(MoveKind::LongCastle, Square::E8, Square::A8);
        assert_eq!(long.to_text(Figure::BLACK_KING, Figure::BLACK_ROOK), "0-0-0");
    }

    #[test]
    fn test_line_text() {
        let first = Undo {
            mv: Move::new(MoveKind::DoublePush, Square::new(4, 1), Square::new(4, 3)),
            ep: None,
            castling: Castling::ALL,
            from_figure: Figure::WHITE_PAWN,
            to_figure: Figure::EMPTY,
        };
        let second = Undo {
            mv: Move::new(MoveKind::Quiet, Square::new(1, 7), Square::new(2, 5)),
            ep: Some(Square::new(4, 2)),
            castling: Castling::ALL,
            from_figure: Figure::new(Color::Black, PieceKind::Knight),
            to_figure: Figure::EMPTY,
        };
        assert_eq!(line_text(&[first, second]), "e2-e4 Nb8-c6");
    }
}
