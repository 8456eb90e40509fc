//! The ASM dialogue session bracket (hello/reset/switch-applet) and the
//! extended-data block-read/block-write loops built on top of it.

mod constants;
mod dialogue;
mod error;

pub use constants::{
    extended_read_timeout, BLOCK_WRITE_CHUNK_SIZE, HELLO_BACKOFF, HELLO_RETRIES, HELLO_TIMEOUT,
    PROTOCOL_VERSION, RESET_COMMAND,
};
pub use dialogue::Dialogue;
pub use error::Error;
