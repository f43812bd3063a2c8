use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Number of input features: 2 colors x 6 piece types x 64 squares.
pub const INPUT_SIZE: usize = 768;

/// Width of the single hidden layer.
pub const HIDDEN_SIZE: usize = 2048;

/// Quantization factor for the hidden layer activations.
pub const QA: i32 = 255;

/// Quantization factor for the output weights.
pub const QB: i32 = 64;

/// Scale from network output to centipawns.
pub const EVAL_SCALE: i32 = 400;

/// Mate-score boundary. Static evaluations are clamped to stay below it
/// so they remain distinguishable from mate encodings.
pub const KNOWN_WIN: i32 = 15000;

/// Exact payload length of a network file: feature weights, feature bias,
/// output weights and output bias, all as little-endian i16.
pub const EXPECTED_BYTES: usize =
    (INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + 2 * HIDDEN_SIZE + 1) * 2;

#[derive(Debug)]
pub enum LoadError {
    NotFound(PathBuf),
    TooSmall { expected: usize, actual: usize },
    Read(io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(path) => {
                write!(f, "network file not found: {}", path.display())
            }
            LoadError::TooSmall { expected, actual } => {
                write!(
                    f,
                    "network file too small or wrong format: expected {} bytes, got {}",
                    expected, actual
                )
            }
            LoadError::Read(err) => write!(f, "failed to read network file: {}", err),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Read(err) => Some(err),
            _ => None,
        }
    }
}

/// Quantized network parameters, immutable after loading.
///
/// Feature weights are stored as one row of `HIDDEN_SIZE` i16 values per
/// input feature, in the same order the trainer writes them.
pub struct Network {
    feature_weights: Box<[i16]>,
    feature_bias: Box<[i16]>,
    output_weights: Box<[i16]>,
    output_bias: i16,
}

impl Network {
    /// Reads a network from a raw binary file. The file may carry trailing
    /// padding; only the exact expected payload is consumed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();

        let bytes = fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Read(err),
        })?;

        Self::from_bytes(&bytes)
    }

    /// Parses a network from its little-endian i16 byte layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() < EXPECTED_BYTES {
            return Err(LoadError::TooSmall {
                expected: EXPECTED_BYTES,
                actual: bytes.len(),
            });
        }

        let mut words = bytes[..EXPECTED_BYTES]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]));

        let feature_weights: Box<[i16]> =
            words.by_ref().take(INPUT_SIZE * HIDDEN_SIZE).collect();
        let feature_bias: Box<[i16]> = words.by_ref().take(HIDDEN_SIZE).collect();
        let output_weights: Box<[i16]> = words.by_ref().take(2 * HIDDEN_SIZE).collect();
        let output_bias = words.next().unwrap_or(0);

        Ok(Self {
            feature_weights,
            feature_bias,
            output_weights,
            output_bias,
        })
    }

    /// Weight row for one input feature.
    #[inline(always)]
    pub(crate) fn feature_row(&self, feature_idx: usize) -> &[i16] {
        let offset = feature_idx * HIDDEN_SIZE;
        &self.feature_weights[offset..offset + HIDDEN_SIZE]
    }

    #[inline(always)]
    pub(crate) fn feature_bias(&self) -> &[i16] {
        &self.feature_bias
    }

    #[inline(always)]
    pub(crate) fn output_weights(&self) -> &[i16] {
        &self.output_weights
    }

    #[inline(always)]
    pub(crate) fn output_bias(&self) -> i16 {
        self.output_bias
    }
}

/// Deterministic non-trivial network for tests in this crate.
#[cfg(test)]
pub(crate) fn patterned_network() -> Network {
    let mut bytes = Vec::with_capacity(EXPECTED_BYTES);
    for i in 0..EXPECTED_BYTES / 2 {
        let word = ((i * 17) % 127) as i16 - 63;
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    Network::from_bytes(&bytes).unwrap()
}
