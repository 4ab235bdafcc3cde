/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use anyhow::{bail, Result};
use clap::Parser;

use crate::Mode;

/// Solve a composed chess problem, printing every solution (cooks included).
///
/// The pieces of each side are a single string in the usual chess notation,
/// separated by commas or spaces, e.g. "Ke1,Qd1,Ra1,Rh1,Nc1,Bb1,a2,Pb2"
/// (the "P" can be omitted, as in this example). When no pieces are given on
/// the command line, they are read from standard input.
///
/// The exit status is 0 exactly when the problem has a unique solution.
#[derive(Debug, Clone, Parser)]
#[command(version, about, rename_all = "kebab-case")]
pub struct Cli {
    /// Mate in N moves (2N - 1 half-moves).
    #[arg(short = 'm', short_alias = 'M', long, value_name = "N", group = "goal")]
    pub mate: Option<usize>,

    /// Self-mate in N moves (2N half-moves).
    #[arg(short = 's', short_alias = 'S', long, value_name = "N", group = "goal")]
    pub selfmate: Option<usize>,

    /// Help-mate in N moves (2N half-moves).
    #[arg(short = 'H', long, value_name = "N", group = "goal")]
    pub helpmate: Option<usize>,

    /// Use up to this many parallel threads.
    #[arg(short = 'j', long = "threads", value_name = "X")]
    pub threads: Option<usize>,

    /// Require at least this many half-moves of depth for a new thread.
    #[arg(short = 'J', long = "fork-depth", value_name = "X")]
    pub fork_depth: Option<usize>,

    /// Print at most this many solutions. 0 means print all.
    #[arg(short = 'n', long = "solutions", value_name = "X", default_value_t = 2)]
    pub max_solutions: usize,

    /// Exclude castling with pieces that are assumed to have moved earlier.
    ///
    /// The argument is a list of their fields, separated by commas, out of
    /// e1, a1, h1, e8, a8, h8. For instance "e1,a8" excludes all white
    /// castling and long castling of black.
    #[arg(short = 'c', long = "no-castling", value_name = "FIELDS", value_delimiter = ',')]
    pub no_castling: Vec<String>,

    /// Allow en passant as the first move in this column (a..h).
    #[arg(short = 'e', long = "en-passant", value_name = "COLUMN")]
    pub en_passant: Option<char>,

    /// First move is from black (default only for help-mate).
    #[arg(short = 'b', long, conflicts_with = "white")]
    pub black: bool,

    /// First move is from white (default for mate or self-mate).
    #[arg(short = 'w', long)]
    pub white: bool,

    /// Output progress on stdout.
    #[arg(short = 'p', long, conflicts_with = "progress_stderr")]
    pub progress: bool,

    /// Output progress on stderr.
    #[arg(short = 'P', long = "progress-stderr")]
    pub progress_stderr: bool,

    /// Progress output is extremely verbose.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Do not output the initial position or warnings.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// White pieces, e.g. "Ke1,Qd1,a2".
    pub white_pieces: Option<String>,

    /// Black pieces, in the same notation.
    pub black_pieces: Option<String>,
}

impl Cli {
    /// The requested goal. Exactly one of the three mode options must be given.
    pub fn goal(&self) -> Result<(Mode, usize)> {
        match (self.mate, self.selfmate, self.helpmate) {
            (Some(n), None, None) => Self::positive(Mode::Mate, n),
            (None, Some(n), None) => Self::positive(Mode::SelfMate, n),
            (None, None, Some(n)) => Self::positive(Mode::HelpMate, n),
            _ => bail!("one of the options --mate, --selfmate, or --helpmate has to be specified"),
        }
    }

    fn positive(mode: Mode, moves: usize) -> Result<(Mode, usize)> {
        if moves == 0 {
            bail!("the number of moves must be at least 1");
        }
        Ok((mode, moves))
    }
}
