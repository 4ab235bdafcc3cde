/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Squares of the 10x12 mailbox board, and the deltas between them.
mod square;

/// Colors, piece kinds, and the packed figure codes stored in board cells.
mod piece;

/// Moves, move lists, undo records, and human-readable notation.
mod moves;

/// The board itself: mailbox cells, piece lists, and reversible move application.
mod position;

/// Threat detection, legality filtering, and legal move generation.
mod movegen;

pub use moves::*;
pub use piece::*;
pub use position::*;
pub use square::*;
