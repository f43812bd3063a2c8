use cozy_chess::Color;

use crate::accumulator::Accumulators;
use crate::network::{Network, EVAL_SCALE, HIDDEN_SIZE, KNOWN_WIN, QA, QB};

/// Clipped square activation on a quantized hidden unit.
#[inline(always)]
fn screlu(x: i16) -> i64 {
    let clipped = (x as i32).clamp(0, QA) as i64;
    clipped * clipped
}

/// Computes the centipawn score of a position from its accumulators,
/// relative to the side to move. Returns 0 when no network is loaded.
///
/// The sum runs in i64: with a few thousand hidden units, QA^2 activations
/// and full-range i16 output weights the products do not fit 32 bits.
pub fn evaluate(network: Option<&Network>, accs: &Accumulators, side_to_move: Color) -> i32 {
    let Some(network) = network else {
        return 0;
    };

    let us = accs.perspective(side_to_move).vals();
    let them = accs.perspective(!side_to_move).vals();
    let output_weights = network.output_weights();

    let mut sum: i64 = 0;
    for i in 0..HIDDEN_SIZE {
        sum += screlu(us[i]) * output_weights[i] as i64;
        sum += screlu(them[i]) * output_weights[HIDDEN_SIZE + i] as i64;
    }

    let mut score = sum / QA as i64;
    score += network.output_bias() as i64;
    score *= EVAL_SCALE as i64;
    score /= (QA * QB) as i64;

    let clamp = (KNOWN_WIN - 1) as i64;
    score.clamp(-clamp, clamp) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{patterned_network, EXPECTED_BYTES, INPUT_SIZE};
    use cozy_chess::Board;

    fn accumulators_for(network: &Network, board: &Board) -> Accumulators {
        let mut accs = Accumulators::new();
        accs.reset(Some(network), board);
        accs
    }

    #[test]
    fn unloaded_network_is_neutral() {
        let accs = Accumulators::new();
        assert_eq!(evaluate(None, &accs, Color::White), 0);
        assert_eq!(evaluate(None, &accs, Color::Black), 0);
    }

    #[test]
    fn evaluation_is_mirror_symmetric() {
        // The feature encoding is perspective-relative, so a color-flipped
        // position evaluated from the other side must score identically for
        // any network.
        let network = patterned_network();

        let position: Board = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3"
            .parse()
            .unwrap();
        let mirrored: Board = "rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 2 3"
            .parse()
            .unwrap();

        let accs = accumulators_for(&network, &position);
        let mirrored_accs = accumulators_for(&network, &mirrored);

        assert_eq!(
            accs.perspective(Color::White),
            mirrored_accs.perspective(Color::Black)
        );
        assert_eq!(
            accs.perspective(Color::Black),
            mirrored_accs.perspective(Color::White)
        );
        assert_eq!(
            evaluate(Some(&network), &accs, Color::White),
            evaluate(Some(&network), &mirrored_accs, Color::Black)
        );
    }

    #[test]
    fn saturated_network_clamps_below_known_win() {
        // Bias and weights at their quantization extremes drive the raw sum
        // far past the mate boundary; the clamp must hold it just below.
        let mut bytes = Vec::with_capacity(EXPECTED_BYTES);
        let sections = [
            (INPUT_SIZE * HIDDEN_SIZE, QA as i16), // feature weights
            (HIDDEN_SIZE, QA as i16),              // feature bias
            (2 * HIDDEN_SIZE, i16::MAX),           // output weights
            (1, i16::MAX),                         // output bias
        ];
        for (count, word) in sections {
            for _ in 0..count {
                bytes.extend_from_slice(&word.to_le_bytes());
            }
        }
        let network = Network::from_bytes(&bytes).unwrap();

        let accs = accumulators_for(&network, &Board::default());
        assert_eq!(
            evaluate(Some(&network), &accs, Color::White),
            KNOWN_WIN - 1
        );
    }
}
