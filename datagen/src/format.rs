use cozy_chess::{Board, Color, File, Piece, Rank, Square};

/// Size of one serialized training record.
pub const RECORD_SIZE: usize = 32;

const STM_BLACK_BIT: u8 = 0x80;
const EP_NONE: u8 = 64;
const PIECE_COLOR_BIT: u8 = 0x8;

/// Game outcome, always from White's perspective (White moves first in
/// every generated game).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Outcome {
    WhiteLoss = 0,
    Draw = 1,
    WhiteWin = 2,
}

impl Outcome {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Outcome::WhiteLoss),
            1 => Some(Outcome::Draw),
            2 => Some(Outcome::WhiteWin),
            _ => None,
        }
    }
}

/// A position packed into the fixed 32-byte training record.
///
/// Layout: 8 bytes occupancy, 16 bytes of 4-bit piece codes (one per
/// occupied square in ascending square order, low nibble first; piece type
/// 1-6 with bit 3 set for Black), 1 byte side-to-move (bit 7) plus
/// en-passant square (bits 0-6, 64 = none), 1 byte half-move clock,
/// 2 bytes full-move number, 2 bytes eval, 1 byte outcome, 1 reserved.
/// All multi-byte fields little-endian.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PackedBoard {
    occupancy: u64,
    pieces: [u8; 16],
    stm_ep: u8,
    halfmove_clock: u8,
    fullmove_number: u16,
    eval: i16,
    outcome: Outcome,
    extra: u8,
}

impl PackedBoard {
    /// Packs a position and its side-to-move-relative eval. The outcome is
    /// written as a `Draw` placeholder; the simulator stamps the real one
    /// once the game ends.
    pub fn pack(board: &Board, eval: i16) -> Self {
        let occupancy = board.occupied();

        let mut pieces = [0u8; 16];
        for (idx, square) in occupancy.into_iter().enumerate() {
            let piece = board.piece_on(square).expect("occupied square");
            let mut code = piece_code(piece);
            if board.color_on(square) == Some(Color::Black) {
                code |= PIECE_COLOR_BIT;
            }
            if idx % 2 == 0 {
                pieces[idx / 2] = code;
            } else {
                pieces[idx / 2] |= code << 4;
            }
        }

        let mut stm_ep = match board.en_passant() {
            Some(file) => ep_target(board.side_to_move(), file) as u8,
            None => EP_NONE,
        };
        if board.side_to_move() == Color::Black {
            stm_ep |= STM_BLACK_BIT;
        }

        Self {
            occupancy: occupancy.0,
            pieces,
            stm_ep,
            halfmove_clock: board.halfmove_clock(),
            fullmove_number: board.fullmove_number(),
            eval,
            outcome: Outcome::Draw,
            extra: 0,
        }
    }

    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = outcome;
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut bytes = [0u8; RECORD_SIZE];
        bytes[0..8].copy_from_slice(&self.occupancy.to_le_bytes());
        bytes[8..24].copy_from_slice(&self.pieces);
        bytes[24] = self.stm_ep;
        bytes[25] = self.halfmove_clock;
        bytes[26..28].copy_from_slice(&self.fullmove_number.to_le_bytes());
        bytes[28..30].copy_from_slice(&self.eval.to_le_bytes());
        bytes[30] = self.outcome as u8;
        bytes[31] = self.extra;
        bytes
    }

    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut pieces = [0u8; 16];
        pieces.copy_from_slice(&bytes[8..24]);

        Self {
            occupancy: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            pieces,
            stm_ep: bytes[24],
            halfmove_clock: bytes[25],
            fullmove_number: u16::from_le_bytes(bytes[26..28].try_into().unwrap()),
            eval: i16::from_le_bytes(bytes[28..30].try_into().unwrap()),
            outcome: Outcome::from_u8(bytes[30]).unwrap_or(Outcome::Draw),
            extra: bytes[31],
        }
    }

    pub fn occupancy(&self) -> u64 {
        self.occupancy
    }

    /// Decodes the piece on a square from the occupancy-driven nibble array.
    pub fn piece_on(&self, square: Square) -> Option<(Piece, Color)> {
        let bit = 1u64 << square as usize;
        if self.occupancy & bit == 0 {
            return None;
        }

        let idx = (self.occupancy & (bit - 1)).count_ones() as usize;
        let code = if idx % 2 == 0 {
            self.pieces[idx / 2] & 0xF
        } else {
            self.pieces[idx / 2] >> 4
        };

        let piece = decode_piece(code & 0x7)?;
        let color = if code & PIECE_COLOR_BIT != 0 {
            Color::Black
        } else {
            Color::White
        };
        Some((piece, color))
    }

    pub fn side_to_move(&self) -> Color {
        if self.stm_ep & STM_BLACK_BIT != 0 {
            Color::Black
        } else {
            Color::White
        }
    }

    pub fn en_passant(&self) -> Option<Square> {
        let square = self.stm_ep & !STM_BLACK_BIT;
        if square == EP_NONE {
            None
        } else {
            Square::try_index(square as usize)
        }
    }

    pub fn halfmove_clock(&self) -> u8 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    pub fn eval(&self) -> i16 {
        self.eval
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

#[inline]
fn piece_code(piece: Piece) -> u8 {
    piece as u8 + 1
}

#[inline]
fn decode_piece(code: u8) -> Option<Piece> {
    match code {
        1 => Some(Piece::Pawn),
        2 => Some(Piece::Knight),
        3 => Some(Piece::Bishop),
        4 => Some(Piece::Rook),
        5 => Some(Piece::Queen),
        6 => Some(Piece::King),
        _ => None,
    }
}

/// The capture target square of an en-passant file for the given side to move.
#[inline]
fn ep_target(side_to_move: Color, file: File) -> Square {
    let rank = match side_to_move {
        Color::White => Rank::Sixth,
        Color::Black => Rank::Third,
    };
    Square::new(file, rank)
}
