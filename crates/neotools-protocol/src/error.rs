use thiserror::Error as ThisError;

use crate::opcode::OpCode;

/// The protocol layer's error type. Lower-level byte-codec failures are
/// wrapped via `#[from]`; everything specific to framing and dialogue lives
/// here directly.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] neotools_core::Error),

    #[error("invalid message argument shape: offset={offset}, width={width}")]
    InvalidArgumentShape { offset: usize, width: usize },

    #[error(
        "expected response {expected:?} (0x{expected_byte:02x}), got {got:?} (0x{got_byte:02x}): {detail}\nframe: {frame:02x?}",
        expected_byte = expected.to_byte(),
        got_byte = got.to_byte(),
        detail = got.error_text().unwrap_or("Unknown error"),
    )]
    UnexpectedResponse {
        expected: OpCode,
        got: OpCode,
        frame: [u8; 8],
    },
}
