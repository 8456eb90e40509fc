use neotools_protocol::{applet_id, assert_success, Message, OpCode};
use neotools_records::{FileAttributes, FILE_ATTRIBUTES_SIZE};
use tracing::{debug, info};

use crate::device::Device;
use crate::system::extended_timeout;
use crate::Error;

impl Device {
    /// Fetches one file's attributes, or `None` once `file_index` runs past
    /// the last file (the device answers `ErrorParameter`).
    pub fn get_file_attributes(&self, target_applet_id: u16, file_index: u32) -> Result<Option<FileAttributes>, Error> {
        debug!(applet_id = target_applet_id, file_index, "getting file attributes");
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let message = Message::new(OpCode::RequestGetFileAttributes, &[(file_index, 4, 1), (target_applet_id as u32, 5, 2)])?;
        let response = dialogue.send(&message, None)?;
        if response.opcode() == OpCode::ErrorParameter {
            dialogue.close()?;
            return Ok(None);
        }
        assert_success(&response, OpCode::ResponseGetFileAttributes)?;
        let length = response.argument(1, 4)? as usize;
        let expected_checksum = response.argument(5, 2)? as u16;
        if length != FILE_ATTRIBUTES_SIZE {
            return Err(Error::FileAttributesWrongLength { expected: FILE_ATTRIBUTES_SIZE, got: length as u32 });
        }
        let buf = dialogue.read_raw(FILE_ATTRIBUTES_SIZE, extended_timeout(FILE_ATTRIBUTES_SIZE))?;
        let got_checksum = neotools_core::checksum16(&buf);
        if got_checksum != expected_checksum {
            return Err(Error::ChecksumMismatch { expected: expected_checksum, got: got_checksum });
        }
        dialogue.close()?;
        Ok(Some(FileAttributes::decode(file_index, &buf)?))
    }

    /// Lists every file an applet owns, sorted by `(space, name)`.
    pub fn list_files(&self, target_applet_id: u16) -> Result<Vec<FileAttributes>, Error> {
        let mut files = Vec::new();
        let mut file_index = 1;
        loop {
            match self.get_file_attributes(target_applet_id, file_index)? {
                Some(attrs) => {
                    files.push(attrs);
                    file_index += 1;
                }
                None => break,
            }
        }
        files.sort_by(|a, b| (a.space, &a.name).cmp(&(b.space, &b.name)));
        Ok(files)
    }

    pub fn get_file_by_name_or_space(&self, target_applet_id: u16, file_name_or_space: &str) -> Result<Option<FileAttributes>, Error> {
        let files = self.list_files(target_applet_id)?;
        Ok(find_by_name_or_space(&files, file_name_or_space))
    }

    /// Reads a file's full contents via the block-read loop.
    pub fn read_file(&self, target_applet_id: u16, file_attrs: &FileAttributes, raw: bool) -> Result<Vec<u8>, Error> {
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let command = if raw { OpCode::RequestReadRawFile } else { OpCode::RequestReadFile };
        let message = Message::new(
            command,
            &[(file_attrs.alloc_size, 1, 3), (file_attrs.file_index, 4, 1), (target_applet_id as u32, 5, 2)],
        )?;
        dialogue.send(&message, None)?;
        let data = dialogue.read_extended_data(file_attrs.alloc_size as usize)?;
        dialogue.close()?;
        Ok(data)
    }

    /// Overwrites an existing file's body (attributes unchanged).
    pub fn write_file(&self, target_applet_id: u16, file_index: u32, data: &[u8], raw: bool) -> Result<(), Error> {
        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        raw_write_file(&dialogue, data, target_applet_id, file_index, raw)?;
        dialogue.close()?;
        Ok(())
    }

    /// Zeroes a file's allocation without deleting it.
    pub fn clear_file(&self, target_applet_id: u16, file_index: u32) -> Result<(), Error> {
        let mut attrs = match self.get_file_attributes(target_applet_id, file_index)? {
            Some(attrs) => attrs,
            None => return Ok(()),
        };
        attrs.alloc_size = 0;
        attrs.min_size = 0;

        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        raw_set_file_attributes(&dialogue, &attrs, target_applet_id, file_index)?;
        let commit = Message::new(OpCode::RequestCommit, &[(file_index, 4, 1), (target_applet_id as u32, 5, 2)])?;
        dialogue.send(&commit, Some(OpCode::ResponseCommit))?;
        raw_write_file(&dialogue, &[], target_applet_id, file_index, true)?;
        dialogue.close()?;
        Ok(())
    }

    /// Creates a new file, bound to no file space, with `data` as its body.
    pub fn create_file(&self, target_applet_id: u16, filename: &str, password: &str, data: &[u8]) -> Result<FileAttributes, Error> {
        let usage = self.get_applet_resource_usage(target_applet_id)?;
        let available = self.get_available_space()?;

        let size = data.len();
        if size + 1024 > available.free_ram as usize {
            return Err(Error::InsufficientRamForFile { size, available: available.free_ram });
        }

        let dialogue = self.dialogue(applet_id::SYSTEM)?;
        let file_index = usage.file_count + 1;
        let attrs = FileAttributes::new(file_index, filename, 0, password, size as u32, size as u32, 0);
        raw_set_file_attributes(&dialogue, &attrs, target_applet_id, file_index)?;

        let commit = Message::new(OpCode::RequestCommit, &[(file_index, 4, 1), (target_applet_id as u32, 5, 2)])?;
        dialogue.send(&commit, Some(OpCode::ResponseCommit))?;
        raw_write_file(&dialogue, data, target_applet_id, file_index, true)?;
        dialogue.close()?;

        info!(name = filename, file_index, "created file");
        Ok(attrs)
    }
}

fn raw_set_file_attributes(
    dialogue: &neotools_dialogue::Dialogue<'_, neotools_transport::Transport>,
    attrs: &FileAttributes,
    target_applet_id: u16,
    file_index: u32,
) -> Result<(), Error> {
    let message = Message::new(OpCode::RequestSetFileAttributes, &[(file_index, 1, 4), (target_applet_id as u32, 5, 2)])?;
    dialogue.send(&message, Some(OpCode::ResponseSetFileAttributes))?;
    dialogue.write_extended_data(&attrs.encode()?)?;
    Ok(())
}

/// A digit 1-8 selects by file space; anything else (or a digit outside that
/// range) falls back to matching the file's name exactly.
fn find_by_name_or_space(files: &[FileAttributes], name_or_space: &str) -> Option<FileAttributes> {
    if let Ok(space) = name_or_space.parse::<u8>() {
        if (1..=8).contains(&space) {
            if let Some(found) = files.iter().find(|f| f.space == space) {
                return Some(found.clone());
            }
        }
    }
    files.iter().find(|f| f.name == name_or_space).cloned()
}

fn raw_write_file(
    dialogue: &neotools_dialogue::Dialogue<'_, neotools_transport::Transport>,
    data: &[u8],
    target_applet_id: u16,
    file_index: u32,
    raw: bool,
) -> Result<(), Error> {
    let command = if raw { OpCode::RequestWriteRawFile } else { OpCode::RequestWriteFile };
    let message = Message::new(command, &[(file_index, 1, 1), (data.len() as u32, 2, 3), (target_applet_id as u32, 5, 2)])?;
    dialogue.send(&message, Some(OpCode::ResponseWriteFile))?;
    dialogue.write_extended_data(data)?;
    let confirm = Message::new(OpCode::RequestConfirmWriteFile, &[])?;
    dialogue.send(&confirm, Some(OpCode::ResponseConfirmWriteFile))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(file_index: u32, name: &str, space: u8) -> FileAttributes {
        FileAttributes::new(file_index, name, space, "", 0, 1024, 0)
    }

    #[test]
    fn finds_by_space_digit() {
        let files = vec![sample(1, "a", 1), sample(2, "b", 3)];
        let found = find_by_name_or_space(&files, "3").unwrap();
        assert_eq!(found.name, "b");
    }

    #[test]
    fn falls_back_to_name_when_space_out_of_range() {
        let files = vec![sample(1, "9", 2)];
        let found = find_by_name_or_space(&files, "9").unwrap();
        assert_eq!(found.file_index, 1);
    }

    #[test]
    fn falls_back_to_name_when_space_has_no_match() {
        let files = vec![sample(1, "5", 2)];
        let found = find_by_name_or_space(&files, "5").unwrap();
        assert_eq!(found.file_index, 1);
    }

    #[test]
    fn falls_back_to_name_match() {
        let files = vec![sample(1, "notes", 0)];
        let found = find_by_name_or_space(&files, "notes").unwrap();
        assert_eq!(found.file_index, 1);
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let files = vec![sample(1, "notes", 0)];
        assert!(find_by_name_or_space(&files, "missing").is_none());
    }
}
