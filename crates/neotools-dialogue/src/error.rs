use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] neotools_transport::Error),
    #[error(transparent)]
    Protocol(#[from] neotools_protocol::Error),

    #[error("device did not respond to hello after 10 retries - it doesn't look like it wants to talk to us")]
    HelloFailed,
    #[error("unsupported ASM protocol version 0x{found:04x} (need at least 0x{required:04x})")]
    UnsupportedProtocolVersion { found: u16, required: u16 },
    #[error("failed to switch to applet 0x{applet_id:04x}")]
    SwitchAppletFailed { applet_id: u16 },
    #[error("extended data checksum mismatch: expected 0x{expected:04x}, got 0x{got:04x}")]
    ChecksumMismatch { expected: u16, got: u16 },
}
