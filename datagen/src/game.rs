use ahash::AHashMap;
use arrayvec::ArrayVec;
use cozy_chess::{Board, Color, Move, Piece};
use nnue::{evaluate, Accumulators, Network};
use rand::rngs::SmallRng;
use rand::Rng;

use crate::adjudicate::{AdjudicationConfig, OutcomeTracker};
use crate::format::{Outcome, PackedBoard};

/// Bounds for the randomized opening phase.
pub const MIN_OPENING_PLIES: usize = 8;
pub const MAX_OPENING_PLIES: usize = 9;

/// Hard ceiling on game length; anything longer is scored a draw.
pub const MAX_GAME_PLIES: usize = 999;

/// Upper bound on legal moves in any reachable position.
const MAX_MOVES: usize = 218;

type MoveList = ArrayVec<Move, MAX_MOVES>;

/// One finished game: quiet positions stamped with the final outcome.
pub struct CompletedGame {
    pub records: Vec<PackedBoard>,
    pub outcome: Outcome,
}

/// Plays one randomized game to completion and returns its stamped
/// training records. Move selection is uniformly random; only the final
/// outcome and position diversity matter for evaluator training.
pub fn simulate(network: &Network, adjudication: &AdjudicationConfig, rng: &mut SmallRng) -> CompletedGame {
    let mut board = Board::default();

    // Opening phase: a short burst of random moves for data diversity.
    // A game that ends inside the opening contributes nothing.
    let opening_plies = rng.gen_range(MIN_OPENING_PLIES..=MAX_OPENING_PLIES);
    for _ in 0..opening_plies {
        let moves = legal_moves(&board);
        if moves.is_empty() {
            return CompletedGame {
                records: Vec::new(),
                outcome: Outcome::Draw,
            };
        }
        board.play_unchecked(moves[rng.gen_range(0..moves.len())]);
    }

    let mut accumulators = Accumulators::new();
    accumulators.reset(Some(network), &board);

    let mut tracker = OutcomeTracker::new(adjudication.clone());
    let mut repetitions: AHashMap<u64, u32> = AHashMap::new();
    let mut records: Vec<PackedBoard> = Vec::with_capacity(256);
    let mut outcome = Outcome::Draw;

    for ply in 0..MAX_GAME_PLIES {
        // Move-count rule.
        if board.halfmove_clock() >= 100 {
            break;
        }

        // A repeated position means the random walk is cycling.
        let seen = repetitions.entry(board.hash()).or_insert(0);
        *seen += 1;
        if *seen >= 2 {
            break;
        }

        let moves = legal_moves(&board);
        let in_check = !board.checkers().is_empty();
        if moves.is_empty() {
            if in_check {
                // Checkmate: the side to move loses.
                outcome = match board.side_to_move() {
                    Color::White => Outcome::WhiteLoss,
                    Color::Black => Outcome::WhiteWin,
                };
            }
            break;
        }

        let chosen = moves[rng.gen_range(0..moves.len())];

        // Static eval of the pre-move position, side-to-move relative.
        let score = evaluate(Some(network), &accumulators, board.side_to_move());
        let white_score = match board.side_to_move() {
            Color::White => score,
            Color::Black => -score,
        };
        if let Some(adjudicated) = tracker.update(white_score, ply) {
            outcome = adjudicated;
            break;
        }

        if !in_check && !is_noisy(&board, chosen) {
            records.push(PackedBoard::pack(&board, score as i16));
        }

        let previous = board.clone();
        board.play_unchecked(chosen);
        accumulators.apply_diff(network, &previous, &board);
    }

    for record in &mut records {
        record.set_outcome(outcome);
    }

    CompletedGame { records, outcome }
}

fn legal_moves(board: &Board) -> MoveList {
    let mut moves = MoveList::new();
    board.generate_moves(|piece_moves| {
        for mv in piece_moves {
            moves.push(mv);
        }
        false
    });
    moves
}

/// A move is noisy iff it captures, promotes, or gives check. Noisy moves
/// and in-check positions are excluded from the training buffer.
pub(crate) fn is_noisy(board: &Board, mv: Move) -> bool {
    is_capture(board, mv) || mv.promotion.is_some() || gives_check(board, mv)
}

fn is_capture(board: &Board, mv: Move) -> bool {
    if board.colors(!board.side_to_move()).has(mv.to) {
        return true;
    }
    // En passant: a pawn moving diagonally onto an empty square.
    board.piece_on(mv.from) == Some(Piece::Pawn)
        && mv.from.file() != mv.to.file()
        && board.piece_on(mv.to).is_none()
}

fn gives_check(board: &Board, mv: Move) -> bool {
    let mut next = board.clone();
    next.play_unchecked(mv);
    !next.checkers().is_empty()
}
