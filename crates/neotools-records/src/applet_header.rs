use crate::Error;

/// Total size of an on-wire applet header.
pub const HEADER_SIZE: usize = 0x84;

/// Expected first four bytes of a regular (non-ROM) applet's header.
pub const SIGNATURE_START: u32 = 0xc0ffeead;
/// Expected last four bytes of a regular applet's content.
pub const SIGNATURE_END: u32 = 0xcafefeed;

/// Set in `AppletHeader::flags` if the applet should not be shown in menus.
pub const FLAGS_HIDDEN: u32 = 0x01;

/// Reading more than this many headers at once crashes some Neo units (a
/// 1k buffer overflow in the device firmware).
pub const LIST_APPLETS_REQUEST_COUNT: u16 = 7;

/// The fixed 132-byte header every installed applet carries at its start.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AppletHeader {
    pub rom_size: u32,
    pub ram_size: u32,
    pub settings_offset: u32,
    pub flags: u32,
    pub applet_id: u16,
    pub header_version: u8,
    pub file_count: u8,
    pub name: String,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_revision: u8,
    pub language_id: u8,
    pub info: String,
    pub min_asm_version: u32,
    pub file_space: u32,
}

impl AppletHeader {
    /// Decodes a header from exactly [`HEADER_SIZE`] bytes, validating the
    /// leading signature word against [`SIGNATURE_START`].
    ///
    /// The trailing [`SIGNATURE_END`] word lives past the header, at the
    /// end of the applet's full content; checking it is
    /// [`crate::applet_classify::classify_applet`]'s job, not this one's.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != HEADER_SIZE {
            return Err(neotools_core::Error::SizeMismatch {
                expected: HEADER_SIZE,
                actual: buf.len(),
            }
            .into());
        }

        let signature = neotools_core::read_int_named("signature", buf, 0x00, 4)?;
        if signature != SIGNATURE_START {
            return Err(Error::InvalidAppletSignature {
                expected_start: SIGNATURE_START,
                expected_end: SIGNATURE_END,
                got_start: signature,
                got_end: 0,
            });
        }

        Ok(AppletHeader {
            rom_size: neotools_core::read_int_named("rom_size", buf, 0x04, 4)?,
            ram_size: neotools_core::read_int_named("ram_size", buf, 0x08, 4)?,
            settings_offset: neotools_core::read_int_named("settings_offset", buf, 0x0c, 4)?,
            flags: neotools_core::read_int_named("flags", buf, 0x10, 4)?,
            applet_id: neotools_core::read_int_named("applet_id", buf, 0x14, 2)? as u16,
            header_version: neotools_core::read_int_named("header_version", buf, 0x16, 1)? as u8,
            file_count: neotools_core::read_int_named("file_count", buf, 0x17, 1)? as u8,
            name: neotools_core::read_string_named("name", buf, 0x18, 36)?,
            version_major: neotools_core::read_int_named("version_major", buf, 0x3c, 1)? as u8,
            version_minor: neotools_core::read_int_named("version_minor", buf, 0x3d, 1)? as u8,
            version_revision: neotools_core::read_int_named("version_revision", buf, 0x3e, 1)? as u8,
            language_id: neotools_core::read_int_named("language_id", buf, 0x3f, 1)? as u8,
            info: neotools_core::read_string_named("info", buf, 0x40, 60)?,
            min_asm_version: neotools_core::read_int_named("min_asm_version", buf, 0x7c, 4)?,
            file_space: neotools_core::read_int_named("file_space", buf, 0x80, 4)?,
        })
    }

    /// Encodes the header to exactly [`HEADER_SIZE`] bytes.
    pub fn encode(&self) -> Result<[u8; HEADER_SIZE], Error> {
        let mut buf = [0u8; HEADER_SIZE];
        neotools_core::write_int_named("signature", &mut buf, 0x00, 4, SIGNATURE_START)?;
        neotools_core::write_int_named("rom_size", &mut buf, 0x04, 4, self.rom_size)?;
        neotools_core::write_int_named("ram_size", &mut buf, 0x08, 4, self.ram_size)?;
        neotools_core::write_int_named("settings_offset", &mut buf, 0x0c, 4, self.settings_offset)?;
        neotools_core::write_int_named("flags", &mut buf, 0x10, 4, self.flags)?;
        neotools_core::write_int_named("applet_id", &mut buf, 0x14, 2, self.applet_id as u32)?;
        neotools_core::write_int_named("header_version", &mut buf, 0x16, 1, self.header_version as u32)?;
        neotools_core::write_int_named("file_count", &mut buf, 0x17, 1, self.file_count as u32)?;
        neotools_core::write_string_named("name", &mut buf, 0x18, 36, &self.name)?;
        neotools_core::write_int_named("version_major", &mut buf, 0x3c, 1, self.version_major as u32)?;
        neotools_core::write_int_named("version_minor", &mut buf, 0x3d, 1, self.version_minor as u32)?;
        neotools_core::write_int_named("version_revision", &mut buf, 0x3e, 1, self.version_revision as u32)?;
        neotools_core::write_int_named("language_id", &mut buf, 0x3f, 1, self.language_id as u32)?;
        neotools_core::write_string_named("info", &mut buf, 0x40, 60, &self.info)?;
        neotools_core::write_int_named("min_asm_version", &mut buf, 0x7c, 4, self.min_asm_version)?;
        neotools_core::write_int_named("file_space", &mut buf, 0x80, 4, self.file_space)?;
        Ok(buf)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags & FLAGS_HIDDEN != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> AppletHeader {
        AppletHeader {
            rom_size: 0x1000,
            ram_size: 0x2000,
            settings_offset: 0x84,
            flags: FLAGS_HIDDEN,
            applet_id: 0xa000,
            header_version: 1,
            file_count: 3,
            name: "AlphaWord".to_string(),
            version_major: 3,
            version_minor: 2,
            version_revision: b'a' as u8,
            language_id: 0,
            info: "(c) AlphaSmart".to_string(),
            min_asm_version: 0x0200,
            file_space: 0x4000,
        }
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let header = sample_header();
        let encoded = header.encode().unwrap();
        let decoded = AppletHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn rejects_wrong_size_buffer() {
        let err = AppletHeader::decode(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::Codec(neotools_core::Error::SizeMismatch { .. })));
    }

    #[test]
    fn rejects_bad_signature() {
        let mut buf = sample_header().encode().unwrap();
        buf[0] = 0;
        let err = AppletHeader::decode(&buf).unwrap_err();
        assert!(matches!(err, Error::InvalidAppletSignature { .. }));
    }

    #[test]
    fn is_hidden_reflects_flags() {
        let mut header = sample_header();
        header.flags = 0;
        assert!(!header.is_hidden());
        header.flags = FLAGS_HIDDEN;
        assert!(header.is_hidden());
    }
}
