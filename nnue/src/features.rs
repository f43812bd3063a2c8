use cozy_chess::{Color, Piece, Square};

use crate::network::INPUT_SIZE;

const COLOR_STRIDE: usize = 6 * 64;
const PIECE_STRIDE: usize = 64;

/// Maps a piece on a square to its input-feature index for one perspective.
///
/// The index depends only on the piece color relative to the perspective,
/// the piece type and the perspective-relative square (ranks are flipped
/// for Black), so the two perspectives see mirrored positions identically.
#[inline(always)]
pub fn feature_index(
    perspective: Color,
    piece_color: Color,
    piece: Piece,
    square: Square,
) -> usize {
    let rel_color = usize::from(piece_color != perspective);
    let rel_square = match perspective {
        Color::White => square,
        Color::Black => square.flip_rank(),
    };

    let index = rel_color * COLOR_STRIDE + piece as usize * PIECE_STRIDE + rel_square as usize;
    debug_assert!(index < INPUT_SIZE);
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn indices_are_injective_and_in_range() {
        for perspective in Color::ALL {
            let mut seen = HashSet::new();
            for piece_color in Color::ALL {
                for piece in Piece::ALL {
                    for square in Square::ALL {
                        let index = feature_index(perspective, piece_color, piece, square);
                        assert!(index < INPUT_SIZE);
                        assert!(seen.insert(index), "duplicate feature index {}", index);
                    }
                }
            }
            assert_eq!(seen.len(), INPUT_SIZE);
        }
    }

    #[test]
    fn perspectives_mirror_each_other() {
        // A white pawn on a2 seen by White matches a black pawn on a7 seen by Black.
        assert_eq!(
            feature_index(Color::White, Color::White, Piece::Pawn, Square::A2),
            feature_index(Color::Black, Color::Black, Piece::Pawn, Square::A7),
        );
        // Same piece, opposite perspective lands in the "theirs" half.
        assert_eq!(
            feature_index(Color::White, Color::Black, Piece::Queen, Square::D8),
            feature_index(Color::Black, Color::White, Piece::Queen, Square::D1),
        );
    }
}
