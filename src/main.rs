/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io::{self, BufRead, Write},
    process::ExitCode,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use problemist::{
    solution_line, Castling, Cli, Color, Figure, Move, Observer, PieceKind, Position, Problem,
    Square,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        // The whole point of the program: verify uniqueness.
        Ok(solutions) => {
            if solutions == 1 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("problemist: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<usize> {
    let mut problem = Problem::new();
    let (mode, moves) = cli.goal()?;

    if cli.black {
        problem.set_color(Color::Black);
    } else if cli.white {
        problem.set_color(Color::White);
    }
    problem.set_mode(mode, moves);

    if let Some(threads) = cli.threads {
        if threads == 0 {
            bail!("at least one thread is required");
        }
        problem.set_max_parallel(threads);
        if !cli.quiet && problem.max_parallel() < threads {
            eprintln!("warning: --threads {} forced", problem.max_parallel());
        }
    }
    if let Some(depth) = cli.fork_depth {
        problem.set_min_fork_depth(depth);
    }

    place_all(&mut problem, cli)?;

    if !problem.position().have_kings() {
        bail!("there are not white and black kings on the board");
    }

    let ep = cli
        .en_passant
        .map(|column| {
            let rank = if problem.position().side_to_move().is_white() {
                '6'
            } else {
                '3'
            };
            Square::from_chars(column, rank)
        })
        .transpose()
        .context("the --en-passant column is not understood")?;
    if !problem.position().is_ep_valid(ep, true) {
        let admissible = problem.position().calc_en_passant();
        if admissible.is_empty() {
            bail!("invalid en passant field; in this position no en passant is possible");
        }
        let columns: Vec<String> = admissible
            .iter()
            .map(|sq| ((b'a' + sq.file()) as char).to_string())
            .collect();
        bail!(
            "invalid or useless en passant field; admissible value(s): {}",
            columns.join(", ")
        );
    }
    problem.position_mut().set_ep(ep);

    let mut castling = Castling::ALL;
    for field in &cli.no_castling {
        castling = castling.without(match field.as_str() {
            "e1" => Castling::WHITE,
            "a1" => Castling::WHITE_LONG,
            "h1" => Castling::WHITE_SHORT,
            "e8" => Castling::BLACK,
            "a8" => Castling::BLACK_LONG,
            "h8" => Castling::BLACK_SHORT,
            _ => bail!("field {field:?} of --no-castling is not understood"),
        });
    }
    let castling = problem.position().calc_castling(castling);
    problem.position_mut().set_castling(castling);

    if !cli.quiet {
        println!("{}", problem.position());
    }

    let console = Console {
        max_solutions: cli.max_solutions,
        progress: cli.progress || cli.progress_stderr,
        to_stderr: cli.progress_stderr,
        verbose: cli.verbose,
    };
    let solutions = problem.solve(&console)?;
    if solutions == 0 {
        println!("No solution exists");
    }
    Ok(solutions)
}

/// Places both sides' pieces, from the command line or standard input.
fn place_all(problem: &mut Problem, cli: &Cli) -> Result<()> {
    match (&cli.white_pieces, &cli.black_pieces) {
        (Some(white), Some(black)) => {
            place_figures(problem, Color::White, white)?;
            place_figures(problem, Color::Black, black)
        }
        (Some(_), None) => bail!("either both sides' pieces or neither must be specified"),
        (None, _) => {
            let white = read_pieces_line(Color::White, cli.quiet)?;
            place_figures(problem, Color::White, &white)?;
            let black = read_pieces_line(Color::Black, cli.quiet)?;
            place_figures(problem, Color::Black, &black)
        }
    }
}

/// Reads one side's piece string from standard input.
fn read_pieces_line(color: Color, quiet: bool) -> Result<String> {
    if !quiet {
        println!("Enter the {color} position in chess notation:");
        io::stdout().flush().ok();
    }
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("standard input ended before the {color} pieces were given");
    }
    Ok(line)
}

/// Parses a piece string like `Ke1,Qd1,a2` and puts the figures on the board.
fn place_figures(problem: &mut Problem, color: Color, figures: &str) -> Result<()> {
    let mut any = false;
    for word in figures.split([' ', '\t', '\r', '\n', ',', '.', ':', ';', '!', '?', '_', '-']) {
        if word.is_empty() {
            continue;
        }
        let (kind, square) = match word.len() {
            2 => (PieceKind::Pawn, word),
            3 => {
                let letter = word.chars().next().ok_or_else(|| anyhow!("empty figure"))?;
                (PieceKind::from_letter(letter)?, &word[1..])
            }
            _ => bail!("figure or placement not understood: {word:?}"),
        };
        let square: Square = square
            .parse()
            .with_context(|| format!("figure or placement not understood: {word:?}"))?;
        if problem.position().figure_at(square) != Figure::EMPTY {
            bail!("a figure was already placed on this field: {word:?}");
        }
        problem
            .position_mut()
            .place(Figure::new(color, kind), square);
        any = true;
    }
    if !any {
        bail!("no figures of color {color} specified");
    }
    Ok(())
}

/// The command-line observer: prints solutions, honors the solution cap,
/// and optionally reports progress.
struct Console {
    /// Stop after this many solutions; 0 reports all of them.
    max_solutions: usize,

    /// Whether to report progress at all.
    progress: bool,

    /// Report progress on stderr instead of stdout.
    to_stderr: bool,

    /// Report progress for every node instead of only the shallow ones.
    verbose: bool,
}

impl Console {
    fn say(&self, line: String) {
        if self.to_stderr {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }
}

impl Observer for Console {
    fn solution(&self, position: &Position, count: usize) -> bool {
        println!("Solution {count}: {}", solution_line(position.move_stack()));
        self.max_solutions == 0 || count < self.max_solutions
    }

    fn progress_list(&self, moves: &[Move], position: &Position) -> bool {
        if !self.progress {
            return true;
        }
        let level = position.ply();
        if level == 0 {
            self.say(format!(
                "{}\n{} start moves to check: {}",
                position,
                moves.len(),
                position.render_moves(moves)
            ));
        } else if self.verbose {
            self.say(format!(
                "{} replies to {} to check: {}",
                moves.len(),
                solution_line(position.move_stack()),
                position.render_moves(moves)
            ));
        }
        true
    }

    fn progress_move(&self, mv: &Move, position: &Position) -> bool {
        if !self.progress {
            return true;
        }
        let level = position.ply();
        if level == 0 {
            self.say(format!("Checking {}", position.render_move(mv)));
        } else if level == 1 || self.verbose {
            self.say(format!(
                "Checking {} {}",
                solution_line(position.move_stack()),
                position.render_move(mv)
            ));
        }
        true
    }
}
