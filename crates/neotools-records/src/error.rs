use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] neotools_core::Error),

    #[error("invalid applet signature: expected start 0x{expected_start:08x} and end 0x{expected_end:08x}, got start 0x{got_start:08x} end 0x{got_end:08x}")]
    InvalidAppletSignature {
        expected_start: u32,
        expected_end: u32,
        got_start: u32,
        got_end: u32,
    },

    #[error("applet content is too short ({len} bytes) to contain a header or ROM signature")]
    AppletTooShort { len: usize },

    #[error("unrecognized ROM signature at offset 0x400: {signature:?}")]
    UnknownRomSignature { signature: Vec<u8> },

    #[error("file space code {code} is not one of the known file space codes")]
    UnknownFileSpaceCode { code: u8 },

    #[error("file space {space} is out of range (must be 0..=8)")]
    FileSpaceOutOfRange { space: u8 },

    #[error("settings item buffer too short: need at least 6 bytes for the header, got {len}")]
    SettingsItemTooShort { len: usize },

    #[error("unrecognized settings item type 0x{type_value:04x}")]
    UnknownSettingsType { type_value: u16 },

    #[error("settings item of type {item_type} expects {expected} values, got {actual}")]
    WrongValueCount {
        item_type: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("password must be at least 6 characters")]
    PasswordTooShort,

    #[error("option value {ident} is not one of this item's candidates")]
    OptionNotACandidate { ident: u16 },
}
