/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    ops::{Deref, DerefMut},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    thread,
};

use crate::{Mode, Move, Observer, Position};

/// One signal node per ply that hands out moves to workers.
///
/// Nodes form a tree through parent links and never move once parented; the
/// node for a ply lives in the stack frame that generated that ply's move
/// list, and every worker reading it is joined before the frame dies.
///
/// Both flags are write-once monotone: `kill` only ever becomes `true`
/// ("stop this subtree"), and `result` only ever becomes `true` ("a child
/// here returned a loss for the opponent").
struct Signal<'a> {
    /// The signal node of the enclosing ply; `None` at the root.
    parent: Option<&'a Signal<'a>>,

    /// Stop signal for this subtree. Checked by every worker between moves.
    kill: AtomicBool,

    /// Outcome of this ply: `true` once any child won for the mover here.
    result: AtomicBool,

    /// Next unclaimed index into `moves`.
    cursor: AtomicUsize,

    /// The ply's generated moves, shared by all workers on this node.
    moves: &'a [Move],

    /// Slow-path guard for the cursor, taken only while workers race on it.
    lock: Mutex<()>,

    /// Set (before the first fork) once equal-level workers may exist.
    shared: AtomicBool,
}

impl<'a> Signal<'a> {
    /// The root of the signal tree: no parent, no moves, used only to carry
    /// the user-cancel flag.
    fn root() -> Self {
        Self::new(None, &[], false)
    }

    fn new(parent: Option<&'a Signal<'a>>, moves: &'a [Move], result: bool) -> Self {
        Self {
            parent,
            kill: AtomicBool::new(false),
            result: AtomicBool::new(result),
            cursor: AtomicUsize::new(0),
            moves,
            lock: Mutex::new(()),
            shared: AtomicBool::new(false),
        }
    }

    /// Claims the next move of this ply, if one is left.
    ///
    /// With `threadsafe`, the claim happens under the cursor lock with
    /// acquire/release ordering; otherwise this worker owns the cursor
    /// alone and relaxed loads and stores suffice.
    fn next(&self, threadsafe: bool) -> Option<Move> {
        if threadsafe {
            let _guard = self.lock.lock().unwrap();
            let current = self.cursor.load(Ordering::Acquire);
            if current == self.moves.len() {
                return None;
            }
            self.cursor.store(current + 1, Ordering::Release);
            Some(self.moves[current])
        } else {
            let current = self.cursor.load(Ordering::Relaxed);
            if current == self.moves.len() {
                return None;
            }
            self.cursor.store(current + 1, Ordering::Relaxed);
            Some(self.moves[current])
        }
    }

    /// Lock-free peek: would [`Signal::next`] probably find another move?
    /// The answer can be stale by the time it returns.
    #[inline(always)]
    fn has_more(&self) -> bool {
        self.cursor.load(Ordering::Acquire) < self.moves.len()
    }

    /// Marks that equal-level workers may race on this node's cursor.
    /// Must happen before the first fork.
    #[inline(always)]
    fn set_shared(&self) {
        self.shared.store(true, Ordering::Release);
    }

    /// Whether equal-level workers may exist on this node.
    #[inline(always)]
    fn is_shared(&self) -> bool {
        self.shared.load(Ordering::Acquire)
    }

    /// Signals this subtree to stop.
    #[inline(always)]
    fn kill(&self) {
        self.kill.store(true, Ordering::Release);
    }

    /// Has this node been killed directly? Meaningful on the root, where
    /// there is no chain to walk.
    #[inline(always)]
    fn killed(&self) -> bool {
        self.kill.load(Ordering::Acquire)
    }

    /// Has this node or any of its ancestors been killed?
    fn got_signal(&self) -> bool {
        let mut node = Some(self);
        while let Some(current) = node {
            if current.killed() {
                return true;
            }
            node = current.parent;
        }
        false
    }

    /// Records that a child of this ply won for the mover here.
    #[inline(always)]
    fn win(&self) {
        self.result.store(true, Ordering::Release);
    }

    /// The outcome of this ply.
    #[inline(always)]
    fn result(&self) -> bool {
        self.result.load(Ordering::Acquire)
    }
}

/// Applies a move on construction and takes it back when dropped.
///
/// This postpones the pop past the solution callback on every exit path
/// from a worker's loop body, so the callback can read the pushed move off
/// the stack.
struct PushGuard<'a> {
    position: &'a mut Position,
}

impl<'a> PushGuard<'a> {
    #[inline(always)]
    fn new(position: &'a mut Position, mv: Move) -> Self {
        position.push(mv);
        Self { position }
    }
}

impl Deref for PushGuard<'_> {
    type Target = Position;

    #[inline(always)]
    fn deref(&self) -> &Position {
        self.position
    }
}

impl DerefMut for PushGuard<'_> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Position {
        self.position
    }
}

impl Drop for PushGuard<'_> {
    #[inline(always)]
    fn drop(&mut self) {
        self.position.pop();
    }
}

/// Walks the move tree of one problem.
///
/// The state space has exactly two values per node (the mover reached its
/// goal or it did not), so the minimax degenerates to a single cut: after a
/// win, no further siblings need exploration, except at the root, where
/// every solution (cook) must still be enumerated.
pub(crate) struct Solver<'a, O> {
    /// The goal being solved for.
    mode: Mode,

    /// Depth of the full problem in half-moves.
    half_moves: usize,

    /// Value of a leaf where the side to move is mated.
    mate_value: bool,

    /// Value of a leaf where the side to move is not mated.
    nomate_value: bool,

    /// Value of a ply none of whose children won.
    default_value: bool,

    /// How many extra workers may run beyond the calling thread.
    max_threads: usize,

    /// Forking is allowed only while the ply is at most this deep.
    fork_depth: usize,

    /// Receiver of solutions and progress events.
    observer: &'a O,

    /// Serializes every observer call while workers are alive.
    io_lock: Mutex<()>,

    /// Number of currently live extra workers.
    workers: AtomicUsize,

    /// Number of solutions found so far.
    solutions: AtomicUsize,
}

impl<'a, O: Observer> Solver<'a, O> {
    pub(crate) fn new(
        mode: Mode,
        half_moves: usize,
        max_threads: usize,
        fork_depth: usize,
        observer: &'a O,
    ) -> Self {
        // The labels a leaf gets, from the perspective of the side to move
        // there. Mate on the last ply means the *solver* failed for a direct
        // mate and succeeded for a self-mate; a help-mate never prunes, so
        // everything is a win there.
        let (mate_value, nomate_value, default_value) = match mode {
            Mode::Mate => (false, true, false),
            Mode::SelfMate => (true, false, false),
            Mode::HelpMate => (true, true, true),
        };

        Self {
            mode,
            half_moves,
            mate_value,
            nomate_value,
            default_value,
            max_threads,
            fork_depth,
            observer,
            io_lock: Mutex::new(()),
            workers: AtomicUsize::new(0),
            solutions: AtomicUsize::new(0),
        }
    }

    /// Runs the search to completion (or cancellation) and returns the
    /// number of solutions found.
    pub(crate) fn run(&self, position: &mut Position) -> usize {
        let root = Signal::root();
        self.recursive(&root, &root, position);
        self.solutions.load(Ordering::Acquire)
    }

    /// Whether forking is enabled at all for this problem.
    #[inline(always)]
    fn threading(&self) -> bool {
        self.max_threads > 0
    }

    /// Whether any extra worker is currently alive.
    #[inline(always)]
    fn have_workers(&self) -> bool {
        self.workers.load(Ordering::Acquire) > 0
    }

    /// Claims a worker slot if the global budget allows one more.
    #[inline(always)]
    fn try_reserve_worker(&self) -> bool {
        self.workers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < self.max_threads).then_some(count + 1)
            })
            .is_ok()
    }

    /// Releases a worker slot claimed with [`Solver::try_reserve_worker`].
    #[inline(always)]
    fn release_worker(&self) {
        self.workers.fetch_sub(1, Ordering::AcqRel);
    }

    /// Runs `event` under the observer-serialization protocol and converts
    /// its continue-bit into a cancel-bit.
    ///
    /// While workers are alive, the observer lock is taken first; a raised
    /// cancellation is committed *before* the lock is released, so no
    /// further observer call can race in behind it. A cancellation another
    /// worker raced in first suppresses `event` entirely.
    fn cancel_guarded(&self, root: &Signal, event: impl FnOnce() -> bool) -> bool {
        let _guard = self
            .have_workers()
            .then(|| self.io_lock.lock().unwrap());
        if root.killed() {
            return true;
        }
        if event() {
            return false;
        }
        root.kill();
        true
    }

    /// Records and reports a solution. Returns `true` to cancel.
    fn output_cancel(&self, position: &Position, root: &Signal) -> bool {
        self.cancel_guarded(root, || {
            let count = self.solutions.fetch_add(1, Ordering::AcqRel) + 1;
            self.observer.solution(position, count)
        })
    }

    /// Reports a ply's move list. Returns `true` to cancel.
    fn progress_list_cancel(&self, moves: &[Move], position: &Position, root: &Signal) -> bool {
        self.cancel_guarded(root, || self.observer.progress_list(moves, position))
    }

    /// Reports a move about to be tried. Returns `true` to cancel.
    fn progress_move_cancel(&self, mv: &Move, position: &Position, root: &Signal) -> bool {
        self.cancel_guarded(root, || self.observer.progress_move(mv, position))
    }

    /// Labels the subtree under `position`, from the perspective of its side
    /// to move: did that side reach its goal?
    ///
    /// Cancellation also returns `true`; the caller distinguishes it through
    /// the root's kill flag.
    fn recursive(&self, parent: &Signal, root: &Signal, position: &mut Position) -> bool {
        let remaining = self.half_moves - position.ply();
        if remaining == 0 {
            if position.is_checkmate() {
                if self.mode == Mode::HelpMate {
                    self.output_cancel(position, root);
                    return true;
                }
                return self.mate_value;
            }
            return self.nomate_value;
        }

        let moves = position.legal_moves();
        if moves.is_empty() {
            // Mate or stalemate before the final ply. This is hairy...
            if remaining % 2 != 0 {
                // The party that must be mated on the last move still has the
                // move below us, so mate and stalemate label the same: for a
                // direct mate the goal was missed, for a self-mate the
                // opponent reached theirs, and a help-mate ignores the leaf.
                return self.mate_value;
            }
            if !position.is_in_check(position.side_to_move()) {
                // Early stalemate.
                return self.nomate_value;
            }
            // Early mate. Reachable in a help-mate only through an ill-posed
            // problem whose cook is shorter than the intended solution.
            if self.mode != Mode::HelpMate {
                return self.mate_value;
            }
            self.output_cancel(position, root);
            return true;
        }

        if self.progress_list_cancel(&moves, position, root) {
            return true;
        }

        let node = Signal::new(Some(parent), &moves, self.default_value);
        self.worker(&node, root, position);
        node.result()
    }

    /// Drains moves from `node`'s cursor, possibly forking equal-level
    /// workers that race on the same cursor with cloned positions.
    ///
    /// Every worker this call spawns is joined before it returns, because
    /// the shared move list lives in the caller's frame.
    fn worker(&self, node: &Signal<'_>, root: &Signal<'_>, position: &mut Position) {
        thread::scope(|scope| {
            while let Some(mv) = node.next(node.is_shared() && self.have_workers()) {
                if self.threading() {
                    if node.got_signal() {
                        break;
                    }
                    // Fork for the remaining moves of this ply, if any are
                    // left, the ply is shallow enough, and the global worker
                    // budget has room.
                    if position.ply() <= self.fork_depth
                        && node.has_more()
                        && self.try_reserve_worker()
                    {
                        node.set_shared();
                        let mut clone = position.clone();
                        scope.spawn(move || {
                            self.worker(node, root, &mut clone);
                            self.release_worker();
                        });
                    }
                }

                if self.progress_move_cancel(&mv, position, root) {
                    break;
                }

                let mut position = PushGuard::new(position, mv);
                let opponent_won = self.recursive(node, root, &mut position);
                if root.killed() {
                    break;
                }
                if opponent_won {
                    // The opponent reached their goal below (or this is a
                    // help-mate): try the next sibling.
                    continue;
                }
                node.win();
                if position.ply() != 1 {
                    // Below the root one winning child settles the ply; no
                    // sibling can change the label.
                    node.kill();
                    break;
                }
                // At the root every winning first move is a solution of its
                // own; report it and keep enumerating cooks.
                if self.output_cancel(&position, root) {
                    break;
                }
            }
        });
    }
}
