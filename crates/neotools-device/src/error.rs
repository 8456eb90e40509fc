use neotools_records::AppletType;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Dialogue(#[from] neotools_dialogue::Error),
    #[error(transparent)]
    Protocol(#[from] neotools_protocol::Error),
    #[error(transparent)]
    Records(#[from] neotools_records::Error),
    #[error(transparent)]
    Text(#[from] neotools_text::Error),

    #[error("refusing to install a {applet_type:?} ROM image — ROM installation has never been tested and can brick the device")]
    RomInstallRefused { applet_type: AppletType },
    #[error("applet {name} (id 0x{applet_id:04x}) is already installed")]
    AppletAlreadyInstalled { applet_id: u32, name: String },
    #[error("applet needs {required} bytes of ROM but only {available} are free")]
    InsufficientRom { required: u32, available: u32 },
    #[error("applet needs {required} bytes of RAM but only {available} are free")]
    InsufficientRam { required: u32, available: u32 },
    #[error("the device does not have enough RAM to create a {size}-byte file ({available} free)")]
    InsufficientRamForFile { size: usize, available: u32 },
    #[error("file {identifier} not found")]
    FileNotFound { identifier: String },
    #[error("settings item with ident={ident} not found")]
    SettingsItemNotFound { ident: u16 },
    #[error("applet with id 0x{applet_id:08x} not found")]
    AppletNotFound { applet_id: u32 },
    #[error("list_applets reply would return more data than the {max} header slots requested")]
    AppletListReplyTooLarge { max: usize },
    #[error("file attributes reply had length {got}, expected {expected}")]
    FileAttributesWrongLength { expected: usize, got: u32 },
    #[error("data checksum mismatch: expected 0x{expected:04x}, got 0x{got:04x}")]
    ChecksumMismatch { expected: u16, got: u16 },
}
