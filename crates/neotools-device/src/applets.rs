use std::time::Duration;

use neotools_protocol::{applet_id, Message, OpCode};
use neotools_records::{classify_applet, AppletHeader, AppletType, HEADER_SIZE, LIST_APPLETS_REQUEST_COUNT};
use tracing::{debug, info};

use crate::device::Device;
use crate::system::extended_timeout;
use crate::Error;

/// `NEO Manager` uses this as the ceiling on RAM/ROM requirements; both are
/// 32-bit device-reported quantities that should never legitimately reach it.
const MAX_PLAUSIBLE_SIZE: u32 = 0xff00_0000;

impl Device {
    /// Lists every applet installed on the device, driving
    /// `RequestListApplets` in batches of [`LIST_APPLETS_REQUEST_COUNT`]
    /// headers until a short batch signals the end of the list.
    pub fn list_applets(&self) -> Result<Vec<AppletHeader>, Error> {
        info!("retrieving list of applets");
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let mut applets = Vec::new();
        loop {
            let index = applets.len() as u32;
            let message = Message::new(
                OpCode::RequestListApplets,
                &[(index, 1, 4), (LIST_APPLETS_REQUEST_COUNT as u32, 5, 2)],
            )?;
            let response = dialogue.send(&message, None)?;
            let size = response.argument(1, 4)? as usize;
            let expected_checksum = response.argument(5, 2)? as u16;
            let max_size = LIST_APPLETS_REQUEST_COUNT * HEADER_SIZE;
            if size > max_size {
                return Err(Error::AppletListReplyTooLarge { max: max_size });
            }
            if size == 0 {
                break;
            }
            let buf = dialogue.read_raw(size, extended_timeout(size))?;
            let got_checksum = neotools_core::checksum16(&buf);
            if got_checksum != expected_checksum {
                return Err(Error::ChecksumMismatch { expected: expected_checksum, got: got_checksum });
            }
            let header_count = buf.len() / HEADER_SIZE;
            for chunk in buf.chunks_exact(HEADER_SIZE).take(header_count) {
                applets.push(AppletHeader::decode(chunk)?);
            }
            if header_count < LIST_APPLETS_REQUEST_COUNT {
                break;
            }
        }
        dialogue.close()?;
        Ok(applets)
    }

    /// Removes one applet. Does not free up the space it occupied; the
    /// device's applet table goes stale, so the release sequence is
    /// skipped the way the original skips disposal here.
    pub fn remove_applet(&self, target_applet_id: u16) -> Result<(), Error> {
        info!(applet_id = target_applet_id, "removing applet");
        self.suppress_release();
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message =
            Message::new(OpCode::RequestRemoveApplet, &[(5, 1, 4), (target_applet_id as u32, 5, 2)])?;
        dialogue.send(&message, Some(OpCode::ResponseRemoveApplet))?;
        dialogue.close()?;
        Ok(())
    }

    /// Erases every applet. Takes up to 90 seconds; the device reboots
    /// automatically afterwards, so no release sequence is needed.
    pub fn remove_applets(&self) -> Result<(), Error> {
        info!("removing all applets, this may take a minute");
        self.suppress_release();
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message = Message::new(OpCode::RequestEraseApplets, &[])?;
        dialogue.send_with_timeout(
            &message,
            Some(OpCode::ResponseEraseApplets),
            Duration::from_secs(90),
            Duration::from_secs(90),
        )?;
        dialogue.close()?;
        Ok(())
    }

    pub fn fetch_applet(&self, target_applet_id: u16) -> Result<Vec<u8>, Error> {
        info!(applet_id = target_applet_id, "fetching applet binary");
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message =
            Message::new(OpCode::RequestReadApplet, &[(0, 1, 4), (target_applet_id as u32, 5, 2)])?;
        let response = dialogue.send(&message, Some(OpCode::ResponseReadFile))?;
        let size = response.argument(1, 4)? as usize;
        let content = dialogue.read_extended_data(size)?;
        dialogue.close()?;
        Ok(content)
    }

    /// Installs an applet binary. Refuses anything but a regular applet
    /// image — ROM installation is technically supported by the protocol
    /// but has never been validated and can brick the device.
    pub fn install_applet(&self, content: &[u8], force: bool) -> Result<(), Error> {
        let applet_type = classify_applet(content)?;
        if applet_type != AppletType::Regular {
            return Err(Error::RomInstallRefused { applet_type });
        }

        let header = AppletHeader::decode(&content[..HEADER_SIZE])?;
        debug!(?header, "applet details");

        if !force {
            let installed = self.list_applets()?;
            if let Some(existing) = installed.iter().find(|a| a.applet_id == header.applet_id) {
                return Err(Error::AppletAlreadyInstalled {
                    applet_id: existing.applet_id as u32,
                    name: existing.name.clone(),
                });
            }
        }

        let required_ram = header.ram_size + header.file_space;
        let required_rom = header.rom_size;
        let available = self.get_available_space()?;

        if required_rom > MAX_PLAUSIBLE_SIZE || required_rom > available.free_rom {
            return Err(Error::InsufficientRom { required: required_rom, available: available.free_rom });
        }
        if required_ram > MAX_PLAUSIBLE_SIZE || required_ram > available.free_ram {
            return Err(Error::InsufficientRam { required: required_ram, available: available.free_ram });
        }

        info!(name = %header.name, "installing applet");
        let dialogue = self.dialogue(applet_id::SYSTEM)?;

        let size_requirement = required_rom | ((required_ram & 0xffff_0000) << 8);
        let init_message = Message::new(
            OpCode::RequestWriteApplet,
            &[(size_requirement, 1, 4), (required_ram, 5, 2)],
        )?;
        dialogue.send_with_timeout(
            &init_message,
            Some(OpCode::ResponseWriteApplet),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )?;

        write_applet_content(&dialogue, content)?;

        info!("finalizing applet installation, this may take a minute");
        let finalize_message = Message::new(OpCode::RequestFinalizeWritingApplet, &[])?;
        dialogue.write_raw(finalize_message.as_bytes(), Duration::from_secs(24))?;

        // The original tolerates transport timeouts here across ten tries;
        // only the final attempt's failure is surfaced.
        let mut last_err = None;
        for _ in 0..10 {
            match dialogue.receive_with_timeout(Duration::from_secs(5)) {
                Ok(response) => {
                    if let Err(err) = neotools_protocol::assert_success(&response, OpCode::ResponseFinalizeWritingApplet) {
                        last_err = Some(err.into());
                        continue;
                    }
                    last_err = None;
                    break;
                }
                Err(err) => {
                    debug!(%err, "waiting for finalization");
                    last_err = Some(err);
                }
            }
        }
        if let Some(err) = last_err {
            return Err(err);
        }

        dialogue.close()?;
        info!("applet installed");
        Ok(())
    }
}

fn write_applet_content(dialogue: &neotools_dialogue::Dialogue<'_, neotools_transport::Transport>, content: &[u8]) -> Result<(), Error> {
    const CHUNK: usize = 0x400;
    let mut offset = 0;
    while offset < content.len() {
        let chunk_len = (content.len() - offset).min(CHUNK);
        let chunk = &content[offset..offset + chunk_len];
        let checksum = neotools_core::checksum16(chunk);

        let request = Message::new(OpCode::RequestBlockWrite, &[(chunk_len as u32, 1, 4), (checksum as u32, 5, 2)])?;
        dialogue.send_with_timeout(&request, Some(OpCode::ResponseBlockWrite), Duration::from_millis(600), Duration::from_millis(600))?;
        dialogue.write_raw(chunk, Duration::from_millis(600))?;
        let done = dialogue.receive_with_timeout(Duration::from_millis(300))?;
        neotools_protocol::assert_success(&done, OpCode::ResponseBlockWriteDone)?;

        let block_ack = Message::new(OpCode::RequestProgrammingAppletBlock, &[])?;
        dialogue.send_with_timeout(&block_ack, Some(OpCode::ResponseProgrammingAppletBlock), Duration::from_secs(5), Duration::from_secs(5))?;

        offset += chunk_len;
    }
    Ok(())
}
