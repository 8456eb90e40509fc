use std::time::Duration;

/// Number of times `hello` retries before giving up.
pub const HELLO_RETRIES: u32 = 10;
/// Per-attempt timeout for the hello ping.
pub const HELLO_TIMEOUT: Duration = Duration::from_millis(100);
/// Delay between hello retries.
pub const HELLO_BACKOFF: Duration = Duration::from_millis(100);

/// Minimum ASM protocol version the device must report during hello.
pub const PROTOCOL_VERSION: u16 = 0x0230;

/// Maximum bytes written per `REQUEST_BLOCK_WRITE` chunk.
pub const BLOCK_WRITE_CHUNK_SIZE: usize = 0x400;

/// Literal 8-byte reset command: `?\xFF\x00reset`.
pub const RESET_COMMAND: [u8; 8] = [b'?', 0xff, 0x00, b'r', b'e', b's', b'e', b't'];

pub fn extended_read_timeout(block_size: usize) -> Duration {
    Duration::from_millis(block_size as u64 * 10 + 600)
}
