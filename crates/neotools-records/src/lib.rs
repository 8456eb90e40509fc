//! Fixed-layout record codecs shared by the ASM protocol's higher-level
//! operations: applet headers and classification, file attributes, the
//! settings item model, and the firmware version record.

mod applet_classify;
mod applet_header;
mod error;
mod file_attributes;
mod settings;
mod version;

pub use applet_classify::{classify_applet, AppletType};
pub use applet_header::{AppletHeader, FLAGS_HIDDEN, HEADER_SIZE, LIST_APPLETS_REQUEST_COUNT, SIGNATURE_END, SIGNATURE_START};
pub use error::Error;
pub use file_attributes::{flags as file_flags, FileAttributes, FILE_SPACE_CODES, SIZE as FILE_ATTRIBUTES_SIZE};
pub use settings::{
    well_known_ident, AppletSettingsCollection, AppletSettingsItem, RenderedSettingsItem,
    RenderedSettingsValue,
};
pub use version::FirmwareVersion;
