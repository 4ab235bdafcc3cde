/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::Mutex;

use problemist::{
    solution_line, Castling, Color, Figure, Mode, MoveKind, Observer, PieceKind, Position, Problem,
    Square,
};

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn fig(color: Color, kind: PieceKind) -> Figure {
    Figure::new(color, kind)
}

fn problem(mode: Mode, moves: usize, pieces: &[(Figure, &str)]) -> Problem {
    let mut problem = Problem::new();
    problem.set_mode(mode, moves);
    for &(figure, square) in pieces {
        problem.position_mut().place(figure, sq(square));
    }
    problem
}

/// Collects every reported solution as its rendered move line.
#[derive(Default)]
struct Lines(Mutex<Vec<String>>);

impl Lines {
    fn sorted(&self) -> Vec<String> {
        let mut lines = self.0.lock().unwrap().clone();
        lines.sort();
        lines
    }
}

impl Observer for Lines {
    fn solution(&self, position: &Position, _count: usize) -> bool {
        self.0
            .lock()
            .unwrap()
            .push(solution_line(position.move_stack()));
        true
    }
}

/// Scenario 1: a trivial mate in 1 with exactly one solution.
///
/// Only Rh1-h8 works; the a-file check instead lets the king out to b8.
#[test]
fn test_trivial_mate_in_one() {
    let mut problem = problem(
        Mode::Mate,
        1,
        &[
            (fig(Color::White, PieceKind::King), "b6"),
            (fig(Color::White, PieceKind::Rook), "h1"),
            (fig(Color::Black, PieceKind::King), "a8"),
        ],
    );
    let lines = Lines::default();
    assert_eq!(problem.solve(&lines).unwrap(), 1);
    assert_eq!(lines.sorted(), vec!["Rh1-h8"]);
    assert_eq!(problem.position().ply(), 0, "the stack unwound");
}

/// Scenario 2: stalemate is not mate.
///
/// The white king is too far away to support the queen; the thematic try
/// Qb6-c7 stalemates Black and must not be counted.
#[test]
fn test_stalemate_is_not_a_solution() {
    let mut problem = problem(
        Mode::Mate,
        1,
        &[
            (fig(Color::White, PieceKind::King), "a1"),
            (fig(Color::White, PieceKind::Queen), "b6"),
            (fig(Color::Black, PieceKind::King), "a8"),
        ],
    );
    assert_eq!(problem.solve(&()).unwrap(), 0);
}

/// Scenario 3: castling out of check is illegal; the generator must omit
/// both castling moves while the king is attacked.
#[test]
fn test_castling_out_of_check_is_illegal() {
    let mut position = Position::new();
    position.place(fig(Color::White, PieceKind::King), sq("e1"));
    position.place(fig(Color::White, PieceKind::Rook), sq("a1"));
    position.place(fig(Color::White, PieceKind::Rook), sq("h1"));
    position.place(fig(Color::Black, PieceKind::King), sq("b5"));
    position.place(fig(Color::Black, PieceKind::Rook), sq("e8"));
    position.set_castling(position.calc_castling(Castling::ALL));
    assert_eq!(position.castling(), Castling::WHITE);

    assert!(position.is_in_check(Color::White));
    let moves = position.legal_moves();
    assert!(!moves.is_empty(), "the check can be answered");
    assert!(
        moves
            .iter()
            .all(|mv| mv.kind != MoveKind::ShortCastle && mv.kind != MoveKind::LongCastle),
        "no castling while in check: {}",
        position.render_moves(&moves)
    );
}

/// Scenario 4: a mate in 1 that requires under-promotion to a knight.
///
/// The black king is buried under its own pieces; only e8=N gives check at
/// all, and none of Black's pieces can capture the knight.
#[test]
fn test_knight_under_promotion_is_the_only_mate() {
    let mut problem = problem(
        Mode::Mate,
        1,
        &[
            (fig(Color::White, PieceKind::King), "a1"),
            (fig(Color::White, PieceKind::Pawn), "e7"),
            (fig(Color::Black, PieceKind::King), "g7"),
            (fig(Color::Black, PieceKind::Pawn), "f6"),
            (fig(Color::Black, PieceKind::Pawn), "f7"),
            (fig(Color::Black, PieceKind::Pawn), "g6"),
            (fig(Color::Black, PieceKind::Pawn), "h6"),
            (fig(Color::Black, PieceKind::Pawn), "h7"),
            (fig(Color::Black, PieceKind::Bishop), "f8"),
            (fig(Color::Black, PieceKind::Knight), "g8"),
            (fig(Color::Black, PieceKind::Rook), "h8"),
        ],
    );

    // The generator must fan the push out into all four promotions.
    let promotions: Vec<_> = problem
        .position_mut()
        .legal_moves()
        .iter()
        .filter(|mv| mv.from == sq("e7") && mv.to == sq("e8"))
        .map(|mv| mv.kind)
        .collect();
    assert_eq!(
        promotions,
        vec![
            MoveKind::PromoteQueen,
            MoveKind::PromoteKnight,
            MoveKind::PromoteRook,
            MoveKind::PromoteBishop
        ]
    );

    let lines = Lines::default();
    assert_eq!(problem.solve(&lines).unwrap(), 1);
    assert_eq!(lines.sorted(), vec!["e7-e8=N"]);
}

/// Scenario 5: a help-mate reports the full line on the move stack.
///
/// Black (to move, by the help-mate default) shuttles the king while White
/// brings the rook to the eighth rank. Several rook routes work; every
/// reported solution must be a full game of four half-moves.
#[test]
fn test_helpmate_reports_full_lines() {
    struct FullLines(Mutex<Vec<String>>);

    impl Observer for FullLines {
        fn solution(&self, position: &Position, _count: usize) -> bool {
            assert_eq!(
                position.move_stack().len(),
                4,
                "a help-mate solution is the whole game"
            );
            self.0
                .lock()
                .unwrap()
                .push(solution_line(position.move_stack()));
            true
        }
    }

    let mut problem = problem(
        Mode::HelpMate,
        2,
        &[
            (fig(Color::White, PieceKind::King), "a6"),
            (fig(Color::White, PieceKind::Rook), "h1"),
            (fig(Color::Black, PieceKind::King), "a8"),
        ],
    );
    assert_eq!(problem.position().side_to_move(), Color::Black);

    let lines = FullLines(Mutex::new(Vec::new()));
    let count = problem.solve(&lines).unwrap();
    assert!(count >= 1, "at least the Rh2 route mates");
    assert!(lines
        .0
        .lock()
        .unwrap()
        .contains(&"Ka8-b8 Rh1-h2 Kb8-a8 Rh2-h8".to_string()));
}

/// Scenario 6: an en-passant capture as the only mating first move.
///
/// Black just played d7-d5; e5*d6ep checks from d6 with every flight of the
/// buried king covered, and no other white move even checks.
#[test]
fn test_en_passant_mate_in_one() {
    let mut problem = problem(
        Mode::Mate,
        1,
        &[
            (fig(Color::White, PieceKind::King), "a1"),
            (fig(Color::White, PieceKind::Pawn), "e5"),
            (fig(Color::White, PieceKind::Knight), "b5"),
            (fig(Color::White, PieceKind::Bishop), "h3"),
            (fig(Color::Black, PieceKind::King), "e7"),
            (fig(Color::Black, PieceKind::Pawn), "d5"),
            (fig(Color::Black, PieceKind::Pawn), "f6"),
            (fig(Color::Black, PieceKind::Pawn), "f7"),
            (fig(Color::Black, PieceKind::Knight), "d8"),
            (fig(Color::Black, PieceKind::Bishop), "e8"),
            (fig(Color::Black, PieceKind::Bishop), "f8"),
        ],
    );
    problem.position_mut().set_ep(Some(sq("d6")));
    assert!(problem.position().is_ep_valid(Some(sq("d6")), true));

    // The generator emits the en-passant capture...
    let ep_moves: Vec<_> = problem
        .position_mut()
        .legal_moves()
        .iter()
        .filter(|mv| mv.kind == MoveKind::EnPassant)
        .copied()
        .collect();
    assert_eq!(ep_moves.len(), 1);

    // ...applying and reversing it restores the captured pawn.
    let before = problem.position().clone();
    problem.position_mut().push(ep_moves[0]);
    assert_eq!(problem.position().figure_at(sq("d5")), Figure::EMPTY);
    problem.position_mut().pop();
    assert_eq!(problem.position(), &before);
    assert_eq!(
        problem.position().figure_at(sq("d5")),
        Figure::new(Color::Black, PieceKind::Pawn)
    );

    let lines = Lines::default();
    assert_eq!(problem.solve(&lines).unwrap(), 1);
    assert_eq!(lines.sorted(), vec!["e5*d6ep"]);
}

/// The set of solutions must not depend on the thread configuration.
#[test]
fn test_helpmate_solutions_stable_across_thread_counts() {
    let build = || {
        problem(
            Mode::HelpMate,
            2,
            &[
                (fig(Color::White, PieceKind::King), "a6"),
                (fig(Color::White, PieceKind::Rook), "h1"),
                (fig(Color::Black, PieceKind::King), "a8"),
            ],
        )
    };

    let baseline = Lines::default();
    let mut reference = build();
    reference.set_max_parallel(1);
    let count = reference.solve(&baseline).unwrap();
    assert!(count >= 1);

    for threads in [2, 4] {
        let lines = Lines::default();
        let mut p = build();
        p.set_max_parallel(threads);
        p.set_min_fork_depth(1);
        assert_eq!(p.solve(&lines).unwrap(), count, "count with {threads} threads");
        assert_eq!(
            lines.sorted(),
            baseline.sorted(),
            "solution set with {threads} threads"
        );
    }
}
