/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{bail, ensure, Result};

use crate::{Color, Move, Position, Solver, Undo};

/// The goal of a composed chess problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// The side to move mates the opponent in N moves against any defence.
    Mate,

    /// The side to move forces the opponent to deliver mate within N moves,
    /// against the opponent's will.
    SelfMate,

    /// Both sides cooperate to mate the side that moves first, in exactly N moves.
    HelpMate,
}

impl Mode {
    /// The number of half-moves a problem of this mode spans: `2N - 1` for a
    /// direct mate, `2N` otherwise.
    #[inline(always)]
    pub const fn half_moves(&self, moves: usize) -> usize {
        match self {
            Self::Mate => 2 * moves - 1,
            Self::SelfMate | Self::HelpMate => 2 * moves,
        }
    }

    /// The side conventionally to move first when the problem does not say:
    /// Black for a help-mate, White otherwise.
    #[inline(always)]
    pub const fn default_first_mover(&self) -> Color {
        match self {
            Self::HelpMate => Color::Black,
            _ => Color::White,
        }
    }
}

/// Receives solutions and progress events from a running solve.
///
/// All methods default to "keep going". Returning `false` from any of them
/// cancels the whole search cooperatively. When workers are running, every
/// call is made under a single per-problem lock, so implementations observe
/// a serialized stream even though the search is concurrent.
pub trait Observer: Sync {
    /// A solution was recorded; `count` is its 1-based number.
    ///
    /// The position's move stack holds the full line for a help-mate, and
    /// only the first move for a direct mate or self-mate (so cooks are
    /// distinguished by their first move).
    #[inline(always)]
    fn solution(&self, _position: &Position, _count: usize) -> bool {
        true
    }

    /// An interior node is about to iterate `moves`.
    #[inline(always)]
    fn progress_list(&self, _moves: &[Move], _position: &Position) -> bool {
        true
    }

    /// `mv` is about to be tried.
    #[inline(always)]
    fn progress_move(&self, _mv: &Move, _position: &Position) -> bool {
        true
    }
}

/// The no-op observer: solutions are only counted.
impl Observer for () {}

/// A composed chess problem: a position, a goal, and the solving knobs.
///
/// Configure with the `set_*` methods and the placement methods of
/// [`Problem::position_mut`], then call [`Problem::solve`]. The
/// configuration is validated once, when the solve starts.
///
/// ```
/// # use problemist::*;
/// let mut problem = Problem::new();
/// problem.set_mode(Mode::Mate, 1);
/// let pos = problem.position_mut();
/// pos.place(Figure::new(Color::White, PieceKind::King), "b6".parse().unwrap());
/// pos.place(Figure::new(Color::White, PieceKind::Rook), "h1".parse().unwrap());
/// pos.place(Figure::new(Color::Black, PieceKind::King), "a8".parse().unwrap());
/// assert_eq!(problem.solve(&()).unwrap(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Problem {
    /// The position under examination.
    position: Position,

    /// The goal, once set.
    mode: Option<Mode>,

    /// Depth of the full problem in half-moves.
    half_moves: usize,

    /// Whether the caller picked the first mover explicitly.
    color_explicit: bool,

    /// Upper bound on concurrently running threads, the caller included.
    max_parallel: usize,

    /// Forking stops once fewer than this many half-moves of subtree remain.
    min_fork_depth: usize,
}

impl Problem {
    /// Default bound on concurrent threads: one per hardware thread.
    #[inline(always)]
    pub fn default_max_parallel() -> usize {
        num_cpus::get()
    }

    /// Default minimum remaining depth for forking a worker.
    pub const DEFAULT_MIN_FORK_DEPTH: usize = 3;

    /// Creates an unconfigured [`Problem`] over an empty board.
    pub fn new() -> Self {
        Self {
            position: Position::new(),
            mode: None,
            half_moves: 0,
            color_explicit: false,
            max_parallel: Self::default_max_parallel(),
            min_fork_depth: Self::DEFAULT_MIN_FORK_DEPTH,
        }
    }

    /// Returns the problem to its freshly-constructed state.
    pub fn clear(&mut self) {
        self.position.clear();
        self.mode = None;
        self.half_moves = 0;
        self.color_explicit = false;
    }

    /// The position under examination.
    #[inline(always)]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The position under examination, for piece placement and metadata.
    #[inline(always)]
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    /// Sets the goal: `mode` in `moves` moves. If the first mover was not
    /// set explicitly, the mode's conventional default applies.
    pub fn set_mode(&mut self, mode: Mode, moves: usize) {
        debug_assert!(moves > 0);
        self.mode = Some(mode);
        self.half_moves = mode.half_moves(moves);
        if !self.color_explicit {
            self.position.set_side_to_move(mode.default_first_mover());
        }
    }

    /// The goal mode, once set.
    #[inline(always)]
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// Depth of the full problem in half-moves.
    #[inline(always)]
    pub fn half_moves(&self) -> usize {
        self.half_moves
    }

    /// Picks the first mover explicitly, overriding the mode's default.
    pub fn set_color(&mut self, color: Color) {
        self.position.set_side_to_move(color);
        self.color_explicit = true;
    }

    /// Bounds the number of concurrently running threads (the calling thread
    /// counts). Clamped to the hardware concurrency; `1` disables workers.
    pub fn set_max_parallel(&mut self, max_parallel: usize) {
        self.max_parallel = max_parallel.min(Self::default_max_parallel());
    }

    /// The effective thread bound.
    #[inline(always)]
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Requires at least this many half-moves of remaining subtree for a
    /// fork: deeper plies run sequentially on the originating thread.
    pub fn set_min_fork_depth(&mut self, min_fork_depth: usize) {
        self.min_fork_depth = min_fork_depth.max(1);
    }

    /// Checks the configuration, then walks the whole tree, reporting every
    /// solution (cooks included) to `observer`.
    ///
    /// Returns the number of solutions found, which is independent of the
    /// thread configuration. On return the move stack is as it was before
    /// the call (cancellation included).
    pub fn solve<O: Observer>(&mut self, observer: &O) -> Result<usize> {
        let Some(mode) = self.mode else {
            bail!("no goal mode was set; the problem is incomplete");
        };
        ensure!(self.half_moves > 0, "the problem depth must be positive");
        if !self.color_explicit {
            self.position.set_side_to_move(mode.default_first_mover());
        }
        ensure!(
            self.position.have_kings(),
            "there are not white and black kings on the board"
        );
        ensure!(
            self.position.is_ep_valid(self.position.ep(), false),
            "the en passant square is not possible for the side to move"
        );
        ensure!(
            self.position.calc_castling(self.position.castling()) == self.position.castling(),
            "the castling rights are not possible for this piece placement"
        );

        let threads = if self.half_moves < self.min_fork_depth {
            0
        } else {
            self.max_parallel.saturating_sub(1)
        };
        let fork_depth = self.half_moves.saturating_sub(self.min_fork_depth);

        Ok(Solver::new(mode, self.half_moves, threads, fork_depth, observer)
            .run(&mut self.position))
    }
}

impl Default for Problem {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience for observers: renders the move stack the way solutions are
/// conventionally printed, space separated.
#[inline(always)]
pub fn solution_line(stack: &[Undo]) -> String {
    crate::line_text(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Figure, PieceKind};

    #[test]
    fn test_half_move_arithmetic() {
        assert_eq!(Mode::Mate.half_moves(1), 1);
        assert_eq!(Mode::Mate.half_moves(3), 5);
        assert_eq!(Mode::SelfMate.half_moves(2), 4);
        assert_eq!(Mode::HelpMate.half_moves(2), 4);
    }

    #[test]
    fn test_default_first_mover() {
        let mut problem = Problem::new();
        problem.set_mode(Mode::HelpMate, 2);
        assert_eq!(problem.position().side_to_move(), Color::Black);

        problem.set_mode(Mode::Mate, 2);
        assert_eq!(problem.position().side_to_move(), Color::White);

        // An explicit choice survives a later set_mode.
        problem.set_color(Color::Black);
        problem.set_mode(Mode::Mate, 2);
        assert_eq!(problem.position().side_to_move(), Color::Black);
    }

    #[test]
    fn test_solve_rejects_incomplete_configuration() {
        let mut problem = Problem::new();
        assert!(problem.solve(&()).is_err(), "no mode set");

        problem.set_mode(Mode::Mate, 1);
        assert!(problem.solve(&()).is_err(), "no kings placed");

        let pos = problem.position_mut();
        pos.place(
            Figure::new(Color::White, PieceKind::King),
            "e1".parse().unwrap(),
        );
        pos.place(
            Figure::new(Color::Black, PieceKind::King),
            "e8".parse().unwrap(),
        );
        pos.set_ep(Some("d6".parse().unwrap()));
        assert!(problem.solve(&()).is_err(), "no pawn justifies the ep square");

        problem.position_mut().set_ep(None);
        assert!(problem.solve(&()).is_ok());
    }
}
