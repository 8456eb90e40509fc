use neotools_protocol::{applet_id, Message, OpCode};
use neotools_records::{AppletSettingsCollection, AppletSettingsItem, RenderedSettingsItem};
use tracing::info;

use crate::device::Device;
use crate::system::extended_timeout;
use crate::Error;

/// Settings flags queried by default when none are given explicitly: global,
/// and the two per-applet groups the firmware actually uses.
pub const DEFAULT_SETTINGS_FLAGS: [u32; 3] = [0, 7, 15];

impl Device {
    /// Reads one settings group (`flags`) for `target_applet_id`.
    pub fn get_settings(&self, target_applet_id: u16, flags: u32) -> Result<AppletSettingsCollection, Error> {
        info!(applet_id = target_applet_id, flags, "requesting settings");
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message = Message::new(OpCode::RequestGetSettings, &[(flags, 1, 4), (target_applet_id as u32, 5, 2)])?;
        let response = dialogue.send(&message, Some(OpCode::ResponseGetSettings))?;
        let size = response.argument(1, 4)? as usize;
        let expected_checksum = response.argument(5, 2)? as u16;
        let buf = dialogue.read_raw(size, extended_timeout(size))?;
        let got_checksum = neotools_core::checksum16(&buf);
        if got_checksum != expected_checksum {
            return Err(Error::ChecksumMismatch { expected: expected_checksum, got: got_checksum });
        }
        dialogue.close()?;
        Ok(AppletSettingsCollection::decode(&buf)?)
    }

    /// Writes back a single settings item (the device only ever accepts one
    /// item per write, unlike the batched read).
    pub fn set_settings_item(&self, target_applet_id: u16, item: &AppletSettingsItem) -> Result<(), Error> {
        let buf = item.encode_one()?;
        let checksum = neotools_core::checksum16(&buf);
        info!(applet_id = target_applet_id, ident = item.ident(), "writing settings item");

        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message = Message::new(OpCode::RequestSetSettings, &[(buf.len() as u32, 1, 4), (checksum as u32, 5, 2)])?;
        dialogue.send(&message, Some(OpCode::ResponseBlockWrite))?;
        dialogue.write_raw(&buf, extended_timeout(buf.len()))?;
        let done = dialogue.receive()?;
        neotools_protocol::assert_success(&done, OpCode::ResponseBlockWriteDone)?;

        let set_applet = Message::new(OpCode::RequestSetApplet, &[(0, 1, 4), (target_applet_id as u32, 5, 2)])?;
        dialogue.send(&set_applet, Some(OpCode::ResponseSetApplet))?;
        dialogue.close()?;
        Ok(())
    }

    /// Merges the applet's settings across `flags` (or [`DEFAULT_SETTINGS_FLAGS`]
    /// if empty) with the system's own labels/descriptions layered in, and
    /// renders the result for display — mirrors the upstream CLI's
    /// `applet_read_settings`.
    pub fn read_settings_rendered(&self, target_applet_id: u16, flags: &[u32]) -> Result<Vec<RenderedSettingsItem>, Error> {
        let flags = if flags.is_empty() { &DEFAULT_SETTINGS_FLAGS[..] } else { flags };

        let mut system_settings = AppletSettingsCollection::default();
        for &flag in &DEFAULT_SETTINGS_FLAGS {
            system_settings.merge(self.get_settings(applet_id::SYSTEM, flag)?);
        }

        let mut settings = AppletSettingsCollection::default();
        for &flag in flags {
            settings.merge(self.get_settings(target_applet_id, flag)?);
        }
        settings.labels.extend(system_settings.labels);
        settings.descriptions.extend(system_settings.descriptions);

        Ok(settings.render())
    }

    /// Finds `ident` across the settings groups applets actually use (`[7, 15]`),
    /// applies `values`, validates `APPLET_ID` references against the live
    /// applet list, and writes the item back.
    pub fn write_settings_item(&self, target_applet_id: u16, ident: u16, values: &[String]) -> Result<(), Error> {
        const WRITABLE_FLAGS: [u32; 2] = [7, 15];

        let mut found = None;
        for &flag in &WRITABLE_FLAGS {
            let settings = self.get_settings(target_applet_id, flag)?;
            if let Some(item) = settings.settings.get(&ident) {
                found = Some(item.clone());
                break;
            }
        }
        let mut item = found.ok_or(Error::SettingsItemNotFound { ident })?;

        if let AppletSettingsItem::AppletId { applet_id: referenced, .. } = &item {
            let referenced = *referenced;
            let applets = self.list_applets()?;
            if !applets.iter().any(|a| a.applet_id as u32 == referenced) {
                return Err(Error::AppletNotFound { applet_id: referenced });
            }
        }

        item.apply_values(values)?;
        self.set_settings_item(target_applet_id, &item)
    }
}
