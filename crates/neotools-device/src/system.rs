use neotools_protocol::{applet_id, Message, OpCode};
use neotools_records::FirmwareVersion;
use serde::Serialize;

use crate::device::Device;
use crate::Error;

/// Free space reported by `RequestGetAvailSpace`, RAM expressed in bytes
/// (the device reports it in units of 256).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailableSpace {
    pub free_rom: u32,
    pub free_ram: u32,
}

/// Used space for one applet, from `RequestGetUsedSpace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppletResourceUsage {
    pub ram: u32,
    pub file_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub version: FirmwareVersion,
    pub space: AvailableSpace,
}

impl Device {
    pub fn get_version(&self) -> Result<FirmwareVersion, Error> {
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message = Message::new(OpCode::RequestVersion, &[])?;
        let response = dialogue.send(&message, Some(OpCode::ResponseVersion))?;
        let size = response.argument(1, 4)? as usize;
        let expected_checksum = response.argument(5, 2)? as u16;
        let buf = dialogue.read_raw(size, extended_timeout(size))?;
        FirmwareVersion::check_checksum(&buf, expected_checksum);
        let version = FirmwareVersion::decode(&buf)?;
        dialogue.close()?;
        Ok(version)
    }

    pub fn get_available_space(&self) -> Result<AvailableSpace, Error> {
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message = Message::new(OpCode::RequestGetAvailSpace, &[])?;
        let response = dialogue.send(&message, Some(OpCode::ResponseGetAvailSpace))?;
        let free_rom = response.argument(1, 4)?;
        let free_ram = response.argument(5, 2)? * 256;
        dialogue.close()?;
        Ok(AvailableSpace { free_rom, free_ram })
    }

    pub fn get_applet_resource_usage(&self, target_applet_id: u16) -> Result<AppletResourceUsage, Error> {
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message = Message::new(
            OpCode::RequestGetUsedSpace,
            &[(0x0000_0001, 1, 4), (target_applet_id as u32, 5, 2)],
        )?;
        let response = dialogue.send(&message, Some(OpCode::ResponseGetUsedSpace))?;
        let usage = AppletResourceUsage { ram: response.argument(1, 4)?, file_count: response.argument(5, 2)? };
        dialogue.close()?;
        Ok(usage)
    }

    pub fn system_info(&self) -> Result<SystemInfo, Error> {
        Ok(SystemInfo { version: self.get_version()?, space: self.get_available_space()? })
    }
}

pub(crate) fn extended_timeout(size: usize) -> std::time::Duration {
    std::time::Duration::from_millis(size as u64 * 10 + 600)
}
