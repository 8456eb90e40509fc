use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("failed to read character map file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("character map file {path} must contain 256 lines, one character per line (found {found})")]
    WrongLineCount { path: PathBuf, found: usize },
    #[error("break-character mismatch at buffer position {position}: byte 0x{byte:02x} was marked breakable but has no breaking form")]
    UnbreakableMarkedBreakable { position: usize, byte: u8 },
}
