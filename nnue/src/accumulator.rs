use cozy_chess::{Board, Color, Piece, Square};

use crate::features::feature_index;
use crate::network::{Network, HIDDEN_SIZE};

/// Running sum of active feature weight rows for one perspective.
///
/// All updates use wrapping 16-bit arithmetic. The wraparound is part of
/// the fixed-point format the trainer quantizes for and must be preserved
/// exactly.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Accumulator {
    vals: [i16; HIDDEN_SIZE],
}

impl Accumulator {
    fn zeroed() -> Self {
        Self {
            vals: [0; HIDDEN_SIZE],
        }
    }

    #[inline(always)]
    fn add_row(&mut self, row: &[i16]) {
        for (val, weight) in self.vals.iter_mut().zip(row) {
            *val = val.wrapping_add(*weight);
        }
    }

    #[inline(always)]
    fn sub_row(&mut self, row: &[i16]) {
        for (val, weight) in self.vals.iter_mut().zip(row) {
            *val = val.wrapping_sub(*weight);
        }
    }

    #[inline(always)]
    pub(crate) fn vals(&self) -> &[i16; HIDDEN_SIZE] {
        &self.vals
    }
}

/// Both perspectives of a position. Owned exclusively by the game being
/// evaluated; these methods are the only way accumulator contents change.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Accumulators {
    acc: [Accumulator; Color::NUM],
}

impl Default for Accumulators {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulators {
    pub fn new() -> Self {
        Self {
            acc: [Accumulator::zeroed(), Accumulator::zeroed()],
        }
    }

    #[inline(always)]
    pub(crate) fn perspective(&self, color: Color) -> &Accumulator {
        &self.acc[color as usize]
    }

    /// Rebuilds both perspectives from scratch: feature bias plus one add
    /// per occupied square, in ascending square order. With no network
    /// loaded the accumulators are zero-filled.
    pub fn reset(&mut self, network: Option<&Network>, board: &Board) {
        let Some(network) = network else {
            self.acc = [Accumulator::zeroed(), Accumulator::zeroed()];
            return;
        };

        for acc in &mut self.acc {
            acc.vals.copy_from_slice(network.feature_bias());
        }

        for square in board.occupied() {
            if let Some((piece, color)) = piece_at(board, square) {
                self.add(network, color, piece, square);
            }
        }
    }

    /// Adds one piece's weight rows to both perspectives.
    pub fn add(&mut self, network: &Network, color: Color, piece: Piece, square: Square) {
        for perspective in Color::ALL {
            let index = feature_index(perspective, color, piece, square);
            self.acc[perspective as usize].add_row(network.feature_row(index));
        }
    }

    /// Removes one piece's weight rows from both perspectives.
    pub fn remove(&mut self, network: &Network, color: Color, piece: Piece, square: Square) {
        for perspective in Color::ALL {
            let index = feature_index(perspective, color, piece, square);
            self.acc[perspective as usize].sub_row(network.feature_row(index));
        }
    }

    /// Incrementally carries the accumulators across a move by diffing the
    /// two board states square by square. Equivalent to `reset` on `next`
    /// as long as `self` was consistent with `prev`.
    pub fn apply_diff(&mut self, network: &Network, prev: &Board, next: &Board) {
        for square in Square::ALL {
            let before = piece_at(prev, square);
            let after = piece_at(next, square);
            if before == after {
                continue;
            }
            if let Some((piece, color)) = before {
                self.remove(network, color, piece, square);
            }
            if let Some((piece, color)) = after {
                self.add(network, color, piece, square);
            }
        }
    }
}

#[inline(always)]
fn piece_at(board: &Board, square: Square) -> Option<(Piece, Color)> {
    let piece = board.piece_on(square)?;
    let color = board.color_on(square)?;
    Some((piece, color))
}
