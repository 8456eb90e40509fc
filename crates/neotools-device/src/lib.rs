//! High-level AlphaSmart Neo operations, composed from [`neotools_dialogue`]
//! sessions: mode detection, applet management, file access, settings, and
//! AlphaWord text convenience wrappers.

mod applets;
mod device;
mod error;
mod files;
mod settings;
mod system;
mod text;

pub use device::{Device, Mode};
pub use error::Error;
pub use settings::DEFAULT_SETTINGS_FLAGS;
pub use system::{AppletResourceUsage, AvailableSpace, SystemInfo};

pub use neotools_records::{
    AppletHeader, AppletSettingsCollection, AppletSettingsItem, AppletType, FileAttributes,
    FirmwareVersion, RenderedSettingsItem, RenderedSettingsValue,
};
