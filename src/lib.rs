/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// All code related to the board itself: squares, figures, moves, move generation.
mod board;

/// Command-line options for the front end, and how to parse them.
mod cli;

/// Configuration of a chess problem: goal mode, depth, parallelism, callbacks.
mod problem;

/// The solver: two-valued minimax with parallel workers near the root.
mod solver;

pub use board::*;
pub use cli::*;
pub use problem::*;
pub use solver::*;
