/// The full ASM message opcode catalog.
///
/// Numeric values and the `(args)` shapes mentioned in each doc comment come
/// straight from the protocol's command table; opcodes whose purpose was
/// never reverse-engineered upstream keep their original numeric name
/// (`Request0x01`, `Error0x87`, ...) rather than inventing a meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum OpCode {
    /// (len32, csum16): obtain the OS version information.
    RequestVersion,
    /// Unknown, generates response 0x8f.
    Request0x01,
    /// (len32, csum16): write a 1k-or-less block of data.
    RequestBlockWrite,
    /// Unknown, generates response 0x8f.
    Request0x03,
    /// (first32, count16): read an array of applet headers.
    RequestListApplets,
    /// (5, applet16): constant 5.
    RequestRemoveApplet,
    /// (len32, z16): write a new applet.
    RequestWriteApplet,
    /// (z48): used when writing an applet.
    RequestFinalizeWritingApplet,
    /// (z48): causes the device to reset and restart as a HID device.
    RequestRestart,
    /// (baud32, z16): try to set the specified baud rate.
    RequestSetBaudrate,
    /// Unknown, returns response 0x90, device displays nothing.
    Request0x0a,
    /// (z48): used when writing an applet.
    RequestProgrammingAppletBlock,
    /// (flags, applet16): read the specified settings.
    RequestGetSettings,
    /// (flags, applet16): write the specified settings.
    RequestSetSettings,
    /// (z32, applet16): used when setting applet properties.
    RequestSetApplet,
    /// (z32, applet16): used when reading an applet.
    RequestReadApplet,
    /// (z48): request the next block of data from the device.
    RequestBlockRead,
    /// (z48): erase all smart applets; may take a long time to return.
    RequestEraseApplets,
    /// (index32, applet16): read data from the specified file.
    RequestReadFile,
    /// (index32, applet16): read the file attributes.
    RequestGetFileAttributes,
    /// (index8, len24, applet16): request write of a file.
    RequestWriteFile,
    /// (z48): complete writing of a file.
    RequestConfirmWriteFile,
    /// (z48): used when updating ROM for System 3 and System 3 Neo.
    RequestClearSegmentMap,
    /// (unknown): used when updating ROM for System 3 and System 3 Neo.
    RequestEraseSegments,
    /// (z48?): used to enter the updater ROM when adding an applet.
    RequestSmallRomUpdater,
    /// Unknown; may be specific to AlphaHub devices, generates response 0x57.
    Request0x19,
    /// (z48): return the available space.
    RequestGetAvailSpace,
    /// (select32, applet16): file space used by an applet; select32 zero
    /// means the largest file, non-zero means all files.
    RequestGetUsedSpace,
    /// (index32, applet16): read a file in raw mode.
    RequestReadRawFile,
    /// (index32, applet16): set file attributes.
    RequestSetFileAttributes,
    /// (index32, applet16): commit changes following set-file-attributes.
    RequestCommit,
    /// (index8, len24, applet16): request write of a file.
    RequestWriteRawFile,

    /// (len32, csum16): version information.
    ResponseVersion,
    /// Unknown.
    Response0x41,
    /// (z48): reply to a block write request.
    ResponseBlockWrite,
    /// (z48): reply to a block write request, transfer complete.
    ResponseBlockWriteDone,
    /// (len32, csum16): array of applet headers.
    ResponseListApplets,
    /// (z48): reply to `RequestRemoveApplet`.
    ResponseRemoveApplet,
    /// (z48?): reply to `RequestWriteApplet`.
    ResponseWriteApplet,
    /// (z48?): reply to `RequestProgrammingAppletBlock`.
    ResponseProgrammingAppletBlock,
    /// (z48?): reply to `RequestFinalizeWritingApplet`.
    ResponseFinalizeWritingApplet,
    /// Unknown.
    Response0x49,
    /// (baud32, z16): reply to `RequestSetBaudrate`.
    ResponseSetBaudrate,
    /// (len32, csum16): settings data.
    ResponseGetSettings,
    /// (z48?): reply to `RequestSetApplet`.
    ResponseSetApplet,
    /// (len32, csum16): reply to `RequestBlockRead`.
    ResponseBlockRead,
    /// No more blocks remain for the current block-read loop.
    ResponseBlockReadEmpty,
    /// (z48?): reply to `RequestEraseApplets`.
    ResponseEraseApplets,
    /// (z48): reply to `RequestWriteFile`.
    ResponseWriteFile,
    /// (z48): reply to `RequestConfirmWriteFile`.
    ResponseConfirmWriteFile,
    /// (z48): reply to `RequestRestart`.
    ResponseRestart,
    /// (length32, ?16): reply to `RequestReadFile`.
    ResponseReadFile,
    /// (z48?): reply to `RequestClearSegmentMap`.
    ResponseClearSegmentMap,
    /// (z48?): reply to `RequestEraseSegments`.
    ResponseEraseSegments,
    /// (z48): reply to `RequestSmallRomUpdater`, using the small ROM.
    ResponseSmallRomUpdater,
    /// Unknown; reply to `Request0x19`.
    Response0x57,
    /// (flash32, ram16): reply to `RequestGetAvailSpace`; ram is in units of 256 bytes.
    ResponseGetAvailSpace,
    /// (ram32, files16): reply to `RequestGetUsedSpace`.
    ResponseGetUsedSpace,
    /// Reply to `RequestGetFileAttributes`.
    ResponseGetFileAttributes,
    /// Reply to `RequestSetFileAttributes`.
    ResponseSetFileAttributes,
    /// Reply to `RequestCommit`.
    ResponseCommit,

    /// (z48): sent if a bad baud rate is given.
    ErrorInvalidBaudrate,
    /// Unknown; seen in response to a bogus request 0x0b.
    Error0x87,
    /// (z48): specified applet ID is not recognised.
    ErrorInvalidApplet,
    /// (z48): sent in response to command block checksum errors or invalid command codes.
    ErrorProtocol,
    /// (error32, z16): an error number, usually negative.
    ErrorParameter,
    /// Seen when trying to write too large a file.
    ErrorOutOfMemory,
    /// Unknown; seen in response to command code 0x20.
    Error0x94,

    /// An opcode byte that doesn't match any known value.
    Unrecognized(u8),
}

impl OpCode {
    pub const fn to_byte(self) -> u8 {
        use OpCode::*;
        match self {
            RequestVersion => 0x00,
            Request0x01 => 0x01,
            RequestBlockWrite => 0x02,
            Request0x03 => 0x03,
            RequestListApplets => 0x04,
            RequestRemoveApplet => 0x05,
            RequestWriteApplet => 0x06,
            RequestFinalizeWritingApplet => 0x07,
            RequestRestart => 0x08,
            RequestSetBaudrate => 0x09,
            Request0x0a => 0x0a,
            RequestProgrammingAppletBlock => 0x0b,
            RequestGetSettings => 0x0c,
            RequestSetSettings => 0x0d,
            RequestSetApplet => 0x0e,
            RequestReadApplet => 0x0f,
            RequestBlockRead => 0x10,
            RequestEraseApplets => 0x11,
            RequestReadFile => 0x12,
            RequestGetFileAttributes => 0x13,
            RequestWriteFile => 0x14,
            RequestConfirmWriteFile => 0x15,
            RequestClearSegmentMap => 0x16,
            RequestEraseSegments => 0x17,
            RequestSmallRomUpdater => 0x18,
            Request0x19 => 0x19,
            RequestGetAvailSpace => 0x1a,
            RequestGetUsedSpace => 0x1b,
            RequestReadRawFile => 0x1c,
            RequestSetFileAttributes => 0x1d,
            RequestCommit => 0x1e,
            RequestWriteRawFile => 0x1f,

            ResponseVersion => 0x40,
            Response0x41 => 0x41,
            ResponseBlockWrite => 0x42,
            ResponseBlockWriteDone => 0x43,
            ResponseListApplets => 0x44,
            ResponseRemoveApplet => 0x45,
            ResponseWriteApplet => 0x46,
            ResponseProgrammingAppletBlock => 0x47,
            ResponseFinalizeWritingApplet => 0x48,
            Response0x49 => 0x49,
            ResponseSetBaudrate => 0x4a,
            ResponseGetSettings => 0x4b,
            ResponseSetApplet => 0x4c,
            ResponseBlockRead => 0x4d,
            ResponseBlockReadEmpty => 0x4e,
            ResponseEraseApplets => 0x4f,
            ResponseWriteFile => 0x50,
            ResponseConfirmWriteFile => 0x51,
            ResponseRestart => 0x52,
            ResponseReadFile => 0x53,
            ResponseClearSegmentMap => 0x54,
            ResponseEraseSegments => 0x55,
            ResponseSmallRomUpdater => 0x56,
            Response0x57 => 0x57,
            ResponseGetAvailSpace => 0x58,
            ResponseGetUsedSpace => 0x59,
            ResponseGetFileAttributes => 0x5a,
            ResponseSetFileAttributes => 0x5b,
            ResponseCommit => 0x5c,

            ErrorInvalidBaudrate => 0x86,
            Error0x87 => 0x87,
            ErrorInvalidApplet => 0x8a,
            ErrorProtocol => 0x8f,
            ErrorParameter => 0x90,
            ErrorOutOfMemory => 0x91,
            Error0x94 => 0x94,

            Unrecognized(byte) => byte,
        }
    }

    pub const fn from_byte(byte: u8) -> Self {
        use OpCode::*;
        match byte {
            0x00 => RequestVersion,
            0x01 => Request0x01,
            0x02 => RequestBlockWrite,
            0x03 => Request0x03,
            0x04 => RequestListApplets,
            0x05 => RequestRemoveApplet,
            0x06 => RequestWriteApplet,
            0x07 => RequestFinalizeWritingApplet,
            0x08 => RequestRestart,
            0x09 => RequestSetBaudrate,
            0x0a => Request0x0a,
            0x0b => RequestProgrammingAppletBlock,
            0x0c => RequestGetSettings,
            0x0d => RequestSetSettings,
            0x0e => RequestSetApplet,
            0x0f => RequestReadApplet,
            0x10 => RequestBlockRead,
            0x11 => RequestEraseApplets,
            0x12 => RequestReadFile,
            0x13 => RequestGetFileAttributes,
            0x14 => RequestWriteFile,
            0x15 => RequestConfirmWriteFile,
            0x16 => RequestClearSegmentMap,
            0x17 => RequestEraseSegments,
            0x18 => RequestSmallRomUpdater,
            0x19 => Request0x19,
            0x1a => RequestGetAvailSpace,
            0x1b => RequestGetUsedSpace,
            0x1c => RequestReadRawFile,
            0x1d => RequestSetFileAttributes,
            0x1e => RequestCommit,
            0x1f => RequestWriteRawFile,

            0x40 => ResponseVersion,
            0x42 => ResponseBlockWrite,
            0x43 => ResponseBlockWriteDone,
            0x44 => ResponseListApplets,
            0x45 => ResponseRemoveApplet,
            0x46 => ResponseWriteApplet,
            0x47 => ResponseProgrammingAppletBlock,
            0x48 => ResponseFinalizeWritingApplet,
            0x49 => Response0x49,
            0x4a => ResponseSetBaudrate,
            0x4b => ResponseGetSettings,
            0x4c => ResponseSetApplet,
            0x4d => ResponseBlockRead,
            0x4e => ResponseBlockReadEmpty,
            0x4f => ResponseEraseApplets,
            0x50 => ResponseWriteFile,
            0x51 => ResponseConfirmWriteFile,
            0x52 => ResponseRestart,
            0x53 => ResponseReadFile,
            0x54 => ResponseClearSegmentMap,
            0x55 => ResponseEraseSegments,
            0x56 => ResponseSmallRomUpdater,
            0x57 => Response0x57,
            0x58 => ResponseGetAvailSpace,
            0x59 => ResponseGetUsedSpace,
            0x5a => ResponseGetFileAttributes,
            0x5b => ResponseSetFileAttributes,
            0x5c => ResponseCommit,
            0x41 => Response0x41,

            0x86 => ErrorInvalidBaudrate,
            0x87 => Error0x87,
            0x8a => ErrorInvalidApplet,
            0x8f => ErrorProtocol,
            0x90 => ErrorParameter,
            0x91 => ErrorOutOfMemory,
            0x94 => Error0x94,

            other => Unrecognized(other),
        }
    }

    /// True for any opcode in the 0x86..=0x9f device error range.
    pub const fn is_error(self) -> bool {
        matches!(
            self,
            OpCode::ErrorInvalidBaudrate
                | OpCode::Error0x87
                | OpCode::ErrorInvalidApplet
                | OpCode::ErrorProtocol
                | OpCode::ErrorParameter
                | OpCode::ErrorOutOfMemory
                | OpCode::Error0x94
        )
    }

    /// The human-readable text the device error maps to, mirroring the
    /// original `error_map` in `assert_success`. `None` for non-error opcodes.
    pub const fn error_text(self) -> Option<&'static str> {
        use OpCode::*;
        match self {
            ErrorInvalidBaudrate => Some("Bad baud rate"),
            Error0x87 => Some("Unknown error"),
            Error0x94 => Some("Unknown error"),
            ErrorInvalidApplet => Some("Specified Applet ID is not recognised"),
            ErrorProtocol => Some("Protocol error"),
            ErrorParameter => Some("Error number"),
            ErrorOutOfMemory => Some("Out of memory"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_named_opcode() {
        let known = [
            OpCode::RequestVersion,
            OpCode::RequestBlockRead,
            OpCode::ResponseBlockRead,
            OpCode::ResponseBlockReadEmpty,
            OpCode::ErrorProtocol,
            OpCode::ResponseRemoveApplet,
        ];
        for op in known {
            assert_eq!(OpCode::from_byte(op.to_byte()), op);
        }
    }

    #[test]
    fn remove_applet_response_is_0x45_not_0x41() {
        assert_eq!(OpCode::ResponseRemoveApplet.to_byte(), 0x45);
        assert_eq!(OpCode::from_byte(0x41), OpCode::Response0x41);
    }

    #[test]
    fn unrecognized_byte_round_trips() {
        assert_eq!(OpCode::from_byte(0x20), OpCode::Unrecognized(0x20));
        assert_eq!(OpCode::Unrecognized(0x20).to_byte(), 0x20);
    }

    #[test]
    fn error_text_matches_known_device_errors() {
        assert_eq!(OpCode::ErrorOutOfMemory.error_text(), Some("Out of memory"));
        assert_eq!(OpCode::RequestVersion.error_text(), None);
    }
}
