/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

/// Represents the color of a player or piece.
///
/// White traditionally moves first, and therefore [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// Creates a new [`Color`] from a set of bits, ignoring safety checks.
    ///
    /// `bits` must be `[0,1]`.
    #[inline(always)]
    pub const fn from_bits_unchecked(bits: u8) -> Self {
        debug_assert!(bits <= 1);
        // Safety: Since `Color` is a `repr(u8)` enum, we can cast safely here.
        unsafe { std::mem::transmute(bits) }
    }

    /// Returns `true` if this [`Color`] is White.
    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        *self as u8 == 0
    }

    /// Returns this [`Color`]'s opposite / enemy.
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        Self::from_bits_unchecked(*self as u8 ^ 1)
    }

    /// Returns this [`Color`] as a `usize`, for indexing into lists.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// A human-readable name, `white` or `black`.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Represents the kind of a chess piece, independent of its color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 1,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Creates a new [`PieceKind`] from a set of bits, ignoring safety checks.
    ///
    /// `bits` must be `[1,6]`.
    #[inline(always)]
    pub(crate) const fn from_bits_unchecked(bits: u8) -> Self {
        debug_assert!(bits >= 1 && bits <= 6);
        // Safety: Since `PieceKind` is a `repr(u8)` enum, we can cast safely here.
        unsafe { std::mem::transmute(bits) }
    }

    /// Parses a [`PieceKind`] from its uppercase letter (`P`, `N`, `B`, `R`, `Q`, `K`).
    #[inline(always)]
    pub fn from_letter(letter: char) -> Result<Self> {
        match letter {
            'P' => Ok(Self::Pawn),
            'N' => Ok(Self::Knight),
            'B' => Ok(Self::Bishop),
            'R' => Ok(Self::Rook),
            'Q' => Ok(Self::Queen),
            'K' => Ok(Self::King),
            _ => bail!("Piece letters must be one of [P, N, B, R, Q, K]. Got {letter:?}"),
        }
    }

    /// The uppercase letter of this kind, with the Pawn rendered as an empty string.
    ///
    /// This matches problem notation, where `e2-e4` carries no piece letter.
    #[inline(always)]
    pub const fn letter(&self) -> &'static str {
        match self {
            Self::Pawn => "",
            Self::Knight => "N",
            Self::Bishop => "B",
            Self::Rook => "R",
            Self::Queen => "Q",
            Self::King => "K",
        }
    }
}

/// The contents of a single mailbox cell: a colored piece, an empty playable
/// square, or the off-board sentinel.
///
/// Internally encoded in a single byte: bit 0 is the color, the remaining
/// bits select the [`PieceKind`]. The two special codes [`Figure::EMPTY`]
/// and [`Figure::OFF_BOARD`] are disjoint from every colored figure, which
/// makes "walk this ray until the cell is not empty" terminate on the board
/// border without a bounds check.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Figure(pub(crate) u8);

impl Figure {
    /// A playable square with no piece on it.
    pub const EMPTY: Self = Self(0);

    /// The border sentinel. Never appears on a playable square.
    pub const OFF_BOARD: Self = Self(1);

    pub const WHITE_PAWN: Self = Self::new(Color::White, PieceKind::Pawn);
    pub const BLACK_PAWN: Self = Self::new(Color::Black, PieceKind::Pawn);
    pub const WHITE_ROOK: Self = Self::new(Color::White, PieceKind::Rook);
    pub const BLACK_ROOK: Self = Self::new(Color::Black, PieceKind::Rook);
    pub const WHITE_KING: Self = Self::new(Color::White, PieceKind::King);
    pub const BLACK_KING: Self = Self::new(Color::Black, PieceKind::King);

    /// Creates a new [`Figure`] of the given color and kind.
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self((kind as u8) << 1 | color as u8)
    }

    /// Returns `true` if this cell holds an actual piece (not empty, not the border).
    #[inline(always)]
    pub const fn is_piece(&self) -> bool {
        self.0 >= Self::new(Color::White, PieceKind::Pawn).0
    }

    /// The color of the piece in this cell.
    ///
    /// Only meaningful when [`Figure::is_piece`] holds.
    #[inline(always)]
    pub const fn color(&self) -> Color {
        Color::from_bits_unchecked(self.0 & 1)
    }

    /// The kind of the piece in this cell.
    ///
    /// Only meaningful when [`Figure::is_piece`] holds.
    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        PieceKind::from_bits_unchecked(self.0 >> 1)
    }

    /// A two-character name for board rendering: `wK`, `bP`, or `__` for empty.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self.0 {
            0 => "__",
            2 => "wP",
            3 => "bP",
            4 => "wN",
            5 => "bN",
            6 => "wB",
            7 => "bB",
            8 => "wR",
            9 => "bR",
            10 => "wQ",
            11 => "bQ",
            12 => "wK",
            13 => "bK",
            _ => "??",
        }
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Debug for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::OFF_BOARD {
            write!(f, "<off board>")
        } else {
            write!(f, "{} ({})", self.name(), self.0)
        }
    }
}

/// The four castling rights, packed into a bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Castling(pub(crate) u8);

impl Castling {
    /// No right remains.
    pub const NONE: Self = Self(0);

    pub const WHITE_SHORT: Self = Self(1);
    pub const WHITE_LONG: Self = Self(2);
    pub const BLACK_SHORT: Self = Self(4);
    pub const BLACK_LONG: Self = Self(8);

    /// Both rights of White.
    pub const WHITE: Self = Self(Self::WHITE_SHORT.0 | Self::WHITE_LONG.0);

    /// Both rights of Black.
    pub const BLACK: Self = Self(Self::BLACK_SHORT.0 | Self::BLACK_LONG.0);

    /// All four rights.
    pub const ALL: Self = Self(Self::WHITE.0 | Self::BLACK.0);

    /// The short-castling right of `color`.
    #[inline(always)]
    pub const fn short(color: Color) -> Self {
        Self(Self::WHITE_SHORT.0 << (2 * color as u8))
    }

    /// The long-castling right of `color`.
    #[inline(always)]
    pub const fn long(color: Color) -> Self {
        Self(Self::WHITE_LONG.0 << (2 * color as u8))
    }

    /// Both rights of `color`.
    #[inline(always)]
    pub const fn both(color: Color) -> Self {
        Self(Self::WHITE.0 << (2 * color as u8))
    }

    /// Returns `true` if any right of `rights` is held.
    #[inline(always)]
    pub const fn intersects(&self, rights: Self) -> bool {
        self.0 & rights.0 != 0
    }

    /// These rights with all rights in `rights` retired.
    #[inline(always)]
    pub const fn without(self, rights: Self) -> Self {
        Self(self.0 & !rights.0)
    }

    /// These rights restricted to those also in `rights`.
    #[inline(always)]
    pub const fn intersection(self, rights: Self) -> Self {
        Self(self.0 & rights.0)
    }

    /// Returns `true` if no right is held.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Castling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (right, c) in [
            (Self::WHITE_SHORT, 'K'),
            (Self::WHITE_LONG, 'Q'),
            (Self::BLACK_SHORT, 'k'),
            (Self::BLACK_LONG, 'q'),
        ] {
            if self.intersects(right) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_codes_are_disjoint() {
        for color in [Color::White, Color::Black] {
            for kind in [
                PieceKind::Pawn,
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Rook,
                PieceKind::Queen,
                PieceKind::King,
            ] {
                let fig = Figure::new(color, kind);
                assert!(fig.is_piece());
                assert_ne!(fig, Figure::EMPTY);
                assert_ne!(fig, Figure::OFF_BOARD);
                assert_eq!(fig.color(), color);
                assert_eq!(fig.kind(), kind);
            }
        }
        assert!(!Figure::EMPTY.is_piece());
        assert!(!Figure::OFF_BOARD.is_piece());
    }

    #[test]
    fn test_castling_masks() {
        assert_eq!(Castling::short(Color::White), Castling::WHITE_SHORT);
        assert_eq!(Castling::long(Color::Black), Castling::BLACK_LONG);
        assert_eq!(Castling::both(Color::Black), Castling::BLACK);

        let rights = Castling::ALL.without(Castling::WHITE_SHORT);
        assert!(rights.intersects(Castling::WHITE_LONG));
        assert!(rights.intersects(Castling::BLACK));
        assert!(!rights.intersects(Castling::WHITE_SHORT));
        assert_eq!(format!("{rights:?}"), "Qkq");
    }
}
