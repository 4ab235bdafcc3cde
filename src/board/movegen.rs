/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{
    Castling, Color, Delta, Figure, Move, MoveKind, MoveList, PieceKind, Position, Square,
    BISHOP_DELTAS, BLACK_PAWN_CAPTURES, DOWN, KING_DELTAS, KNIGHT_DELTAS, LEFT, RIGHT, ROOK_DELTAS,
    UP, WHITE_PAWN_CAPTURES,
};

impl Position {
    /// Walks from `square` along `delta` until the first non-empty cell.
    ///
    /// Thanks to the sentinel border this needs no bounds check: the walk
    /// terminates on a piece or on [`Figure::OFF_BOARD`].
    #[inline(always)]
    fn long_add_delta(&self, square: Square, delta: Delta) -> Square {
        let mut sq = square.offset(delta);
        while self.board[sq.index()] == Figure::EMPTY {
            sq = sq.offset(delta);
        }
        sq
    }

    /// Would a piece of `color` on `square` be attacked by the other side?
    pub fn is_threatened(&self, square: Square, color: Color) -> bool {
        let enemy = color.opponent();
        let queen = Figure::new(enemy, PieceKind::Queen);
        let king = Figure::new(enemy, PieceKind::King);

        let bishop = Figure::new(enemy, PieceKind::Bishop);
        for delta in BISHOP_DELTAS {
            let dest = self.long_add_delta(square, delta);
            let figure = self.board[dest.index()];
            if figure == bishop
                || figure == queen
                || (figure == king && dest == square.offset(delta))
            {
                return true;
            }
        }

        let rook = Figure::new(enemy, PieceKind::Rook);
        for delta in ROOK_DELTAS {
            let dest = self.long_add_delta(square, delta);
            let figure = self.board[dest.index()];
            if figure == rook
                || figure == queen
                || (figure == king && dest == square.offset(delta))
            {
                return true;
            }
        }

        let knight = Figure::new(enemy, PieceKind::Knight);
        for delta in KNIGHT_DELTAS {
            if self.board[square.offset(delta).index()] == knight {
                return true;
            }
        }

        // Pawns capture towards their own side, so probe against the
        // capture deltas of the *threatened* color.
        let pawn = Figure::new(enemy, PieceKind::Pawn);
        let deltas = if color.is_white() {
            WHITE_PAWN_CAPTURES
        } else {
            BLACK_PAWN_CAPTURES
        };
        deltas
            .iter()
            .any(|&delta| self.board[square.offset(delta).index()] == pawn)
    }

    /// Is `color`'s King attacked?
    #[inline(always)]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.is_threatened(self.king(color), color)
    }

    /// Is the side to move checkmated? This generates moves, so it is not cheap.
    #[inline(always)]
    pub fn is_checkmate(&mut self) -> bool {
        self.is_in_check(self.side_to_move) && !self.has_any_move()
    }

    /// Would moving the piece on `from` to `to` leave the mover's King safe?
    ///
    /// Only the two cells are edited for the test; the piece lists are left
    /// alone, which is safe because the threat probe reads cells only. Both
    /// cells are restored before returning.
    fn is_valid_move(&mut self, from: Square, to: Square) -> bool {
        let figure_from = self.board[from.index()];
        let figure_to = self.board[to.index()];
        self.board[from.index()] = Figure::EMPTY;
        self.board[to.index()] = figure_from;

        let mut king = self.kings[self.side_to_move.index()];
        if king == from {
            king = to;
        }
        let valid = !self.is_threatened(king, self.side_to_move);

        self.board[from.index()] = figure_from;
        self.board[to.index()] = figure_to;
        valid
    }

    /// Checks one castling of the side to move: `dir` is [`RIGHT`] for short,
    /// [`LEFT`] for long. Returns the Rook's square if the castling is legal.
    ///
    /// `in_check` caches the "King currently attacked" probe across the two
    /// directions; pass `None` initially.
    ///
    /// Legality: the path between King and Rook holds nothing, the Rook
    /// actually stands on its home corner, the King is not in check, and the
    /// two squares the King crosses are not attacked. For long castling the
    /// b-file square must merely be empty; it may be attacked.
    fn castling_rook(&self, in_check: &mut Option<bool>, king: Square, dir: Delta) -> Option<Square> {
        if *in_check == Some(true) {
            return None;
        }
        let color = self.side_to_move;

        let rook = self.long_add_delta(king, dir);
        if self.board[rook.offset(dir).index()] != Figure::OFF_BOARD {
            return None;
        }
        if self.board[rook.index()] != Figure::new(color, PieceKind::Rook) {
            return None;
        }

        if in_check.is_none() {
            let checked = self.is_threatened(king, color);
            *in_check = Some(checked);
            if checked {
                return None;
            }
        }

        for to in [king.offset(dir), king.offset(dir + dir)] {
            if self.is_threatened(to, color) {
                return None;
            }
        }
        Some(rook)
    }

    /// All legal moves of the side to move, in generation order: castling
    /// (short before long) first, then per piece in piece-list order.
    #[inline(always)]
    pub fn legal_moves(&mut self) -> MoveList {
        let mut moves = MoveList::new();
        self.generate::<true>(&mut moves);
        moves
    }

    /// Returns `true` if the side to move has at least one legal move,
    /// stopping at the first one found.
    #[inline(always)]
    pub fn has_any_move(&mut self) -> bool {
        let mut moves = MoveList::new();
        self.generate::<false>(&mut moves)
    }

    /// Shared implementation of [`Position::legal_moves`] and
    /// [`Position::has_any_move`]. With `COLLECT`, appends every legal move
    /// and reports whether any was found; without, returns `true` as soon as
    /// the first legal move exists, appending nothing.
    fn generate<const COLLECT: bool>(&mut self, moves: &mut MoveList) -> bool {
        debug_assert!(self.legal_values());
        let color = self.side_to_move;

        if !self.castling.is_empty() {
            let king = self.kings[color.index()];
            let mut in_check = None;
            if self.castling.intersects(Castling::short(color)) {
                if let Some(rook) = self.castling_rook(&mut in_check, king, RIGHT) {
                    if !COLLECT {
                        return true;
                    }
                    moves.push(Move::new(MoveKind::ShortCastle, king, rook));
                }
            }
            if self.castling.intersects(Castling::long(color)) {
                if let Some(rook) = self.castling_rook(&mut in_check, king, LEFT) {
                    if !COLLECT {
                        return true;
                    }
                    moves.push(Move::new(MoveKind::LongCastle, king, rook));
                }
            }
        }

        let mut from = self.first_piece(color);
        while let Some(sq) = from {
            let found = match self.board[sq.index()].kind() {
                PieceKind::Bishop => self.generate_slider::<COLLECT>(moves, sq, &BISHOP_DELTAS),
                PieceKind::Rook => self.generate_slider::<COLLECT>(moves, sq, &ROOK_DELTAS),
                PieceKind::Queen => self.generate_slider::<COLLECT>(moves, sq, &KING_DELTAS),
                PieceKind::King => self.generate_leaper::<COLLECT>(moves, sq, &KING_DELTAS),
                PieceKind::Knight => self.generate_leaper::<COLLECT>(moves, sq, &KNIGHT_DELTAS),
                PieceKind::Pawn => self.generate_pawn::<COLLECT>(moves, sq),
            };
            if found {
                return true;
            }
            from = self.next_piece(sq);
        }

        if COLLECT {
            !moves.is_empty()
        } else {
            false
        }
    }

    /// Ray moves of a Bishop, Rook, or Queen on `from`.
    fn generate_slider<const COLLECT: bool>(
        &mut self,
        moves: &mut MoveList,
        from: Square,
        deltas: &[Delta],
    ) -> bool {
        let color = self.side_to_move;
        for &dir in deltas {
            let mut to = from.offset(dir);
            loop {
                let figure = self.board[to.index()];
                if figure == Figure::OFF_BOARD || (figure.is_piece() && figure.color() == color) {
                    break;
                }
                if self.is_valid_move(from, to) {
                    if !COLLECT {
                        return true;
                    }
                    moves.push(Move::new(MoveKind::Quiet, from, to));
                }
                if figure != Figure::EMPTY {
                    // A capture ends the ray.
                    break;
                }
                to = to.offset(dir);
            }
        }
        false
    }

    /// Single-step moves of a King or Knight on `from`.
    fn generate_leaper<const COLLECT: bool>(
        &mut self,
        moves: &mut MoveList,
        from: Square,
        deltas: &[Delta],
    ) -> bool {
        let color = self.side_to_move;
        for &dir in deltas {
            let to = from.offset(dir);
            let figure = self.board[to.index()];
            if figure == Figure::OFF_BOARD || (figure.is_piece() && figure.color() == color) {
                continue;
            }
            if self.is_valid_move(from, to) {
                if !COLLECT {
                    return true;
                }
                moves.push(Move::new(MoveKind::Quiet, from, to));
            }
        }
        false
    }

    /// One quiet move per promotion target, Queen first.
    fn push_promotions(moves: &mut MoveList, from: Square, to: Square) {
        moves.push(Move::new(MoveKind::PromoteQueen, from, to));
        moves.push(Move::new(MoveKind::PromoteKnight, from, to));
        moves.push(Move::new(MoveKind::PromoteRook, from, to));
        moves.push(Move::new(MoveKind::PromoteBishop, from, to));
    }

    /// Moves of the pawn on `from`: push, double push, captures, en passant,
    /// with promotions fanned out on the last rank.
    fn generate_pawn<const COLLECT: bool>(&mut self, moves: &mut MoveList, from: Square) -> bool {
        let color = self.side_to_move;
        let (forward, captures, start_rank, promotion_rank) = if color.is_white() {
            (UP, WHITE_PAWN_CAPTURES, 1, 6)
        } else {
            (DOWN, BLACK_PAWN_CAPTURES, 6, 1)
        };

        let to = from.offset(forward);
        if self.board[to.index()] == Figure::EMPTY && self.is_valid_move(from, to) {
            if !COLLECT {
                return true;
            }
            if from.rank() == promotion_rank {
                Self::push_promotions(moves, from, to);
            } else {
                moves.push(Move::new(MoveKind::Quiet, from, to));
            }
            if from.rank() == start_rank {
                let to = to.offset(forward);
                if self.board[to.index()] == Figure::EMPTY && self.is_valid_move(from, to) {
                    moves.push(Move::new(MoveKind::DoublePush, from, to));
                }
            }
        }

        for &delta in &captures {
            let to = from.offset(delta);
            if Some(to) == self.ep {
                // Lift the passed pawn off its square for the legality probe;
                // it is the piece removed by this capture.
                let passed = to.offset(-forward);
                let pawn = self.board[passed.index()];
                self.board[passed.index()] = Figure::EMPTY;
                let valid = self.is_valid_move(from, to);
                self.board[passed.index()] = pawn;
                if valid {
                    if !COLLECT {
                        return true;
                    }
                    moves.push(Move::new(MoveKind::EnPassant, from, to));
                }
            } else {
                let target = self.board[to.index()];
                if target.is_piece() && target.color() != color && self.is_valid_move(from, to) {
                    if !COLLECT {
                        return true;
                    }
                    if from.rank() == promotion_rank {
                        Self::push_promotions(moves, from, to);
                    } else {
                        moves.push(Move::new(MoveKind::Quiet, from, to));
                    }
                }
            }
        }
        false
    }
}
