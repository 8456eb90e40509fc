use crate::Error;

/// Total size of an on-wire file attributes record.
pub const SIZE: usize = 40;

/// Values for `FileAttributes::flags`.
pub mod flags {
    /// Unknown flag, always clear.
    pub const UNKNOWN_0: u32 = 0x01;
    /// Set if the file is the currently active file for its applet.
    pub const CURRENT: u32 = 0x02;
    /// Unknown flag, always set for AlphaWord files and clear otherwise.
    pub const UNKNOWN_1: u32 = 0x04;
}

/// File space codes as they appear on the wire, indexed by the file space
/// number (0 = unbound, 1..=8 = file spaces 1 through 8). The mapping looks
/// arbitrary but is load-bearing: using any other byte value upsets the Neo.
pub const FILE_SPACE_CODES: [u8; 9] = [0xff, 0x2d, 0x2c, 0x04, 0x0f, 0x0e, 0x0a, 0x01, 0x27];

fn space_to_wire(space: u8) -> Result<u8, Error> {
    FILE_SPACE_CODES
        .get(space as usize)
        .copied()
        .ok_or(Error::FileSpaceOutOfRange { space })
}

fn space_from_wire(code: u8) -> Result<u8, Error> {
    FILE_SPACE_CODES
        .iter()
        .position(|&c| c == code)
        .map(|pos| pos as u8)
        .ok_or(Error::UnknownFileSpaceCode { code })
}

/// A file's attributes as stored alongside its data: name, password, sizing,
/// flags, and which of the device's 8 file spaces (if any) it occupies.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FileAttributes {
    pub file_index: u32,
    pub name: String,
    /// 0 = unbound, 1..=8 = file spaces 1 through 8.
    pub space: u8,
    pub password: String,
    pub min_size: u32,
    pub alloc_size: u32,
    pub flags: u32,
    /// Preserved across decode/encode round-trips; zero on a freshly
    /// constructed record. Meaning was never recovered upstream.
    pub unknown1: u8,
    /// Preserved across decode/encode round-trips; zero on a freshly
    /// constructed record. Appears ignored on write and near-random on read.
    pub unknown2: u16,
}

impl FileAttributes {
    /// Builds a fresh record for a file about to be created; `unknown1`/`unknown2` are zeroed.
    pub fn new(
        file_index: u32,
        name: impl Into<String>,
        space: u8,
        password: impl Into<String>,
        min_size: u32,
        alloc_size: u32,
        flags: u32,
    ) -> Self {
        FileAttributes {
            file_index,
            name: name.into(),
            space,
            password: password.into(),
            min_size,
            alloc_size,
            flags,
            unknown1: 0,
            unknown2: 0,
        }
    }

    /// Decodes a record from exactly [`SIZE`] bytes. `file_index` comes from
    /// the request that fetched this record, not from the wire format.
    pub fn decode(file_index: u32, buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != SIZE {
            return Err(neotools_core::Error::SizeMismatch {
                expected: SIZE,
                actual: buf.len(),
            }
            .into());
        }
        let space_code = neotools_core::read_int_named("space", buf, 0x25, 1)? as u8;
        Ok(FileAttributes {
            file_index,
            name: neotools_core::read_string_named("name", buf, 0x00, 15)?,
            password: neotools_core::read_string_named("password", buf, 0x10, 7)?,
            min_size: neotools_core::read_int_named("min_size", buf, 0x18, 4)?,
            alloc_size: neotools_core::read_int_named("alloc_size", buf, 0x1c, 4)?,
            flags: neotools_core::read_int_named("flags", buf, 0x20, 4)?,
            unknown1: neotools_core::read_int_named("unknown1", buf, 0x24, 1)? as u8,
            space: space_from_wire(space_code)?,
            unknown2: neotools_core::read_int_named("unknown2", buf, 0x26, 2)? as u16,
        })
    }

    /// Encodes the record to exactly [`SIZE`] bytes.
    pub fn encode(&self) -> Result<[u8; SIZE], Error> {
        let mut buf = [0u8; SIZE];
        neotools_core::write_string_named("name", &mut buf, 0x00, 15, &self.name)?;
        neotools_core::write_string_named("password", &mut buf, 0x10, 7, &self.password)?;
        neotools_core::write_int_named("min_size", &mut buf, 0x18, 4, self.min_size)?;
        neotools_core::write_int_named("alloc_size", &mut buf, 0x1c, 4, self.alloc_size)?;
        neotools_core::write_int_named("flags", &mut buf, 0x20, 4, self.flags)?;
        neotools_core::write_int_named("unknown1", &mut buf, 0x24, 1, self.unknown1 as u32)?;
        neotools_core::write_int_named(
            "space",
            &mut buf,
            0x25,
            1,
            space_to_wire(self.space)? as u32,
        )?;
        neotools_core::write_int_named("unknown2", &mut buf, 0x26, 2, self.unknown2 as u32)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> FileAttributes {
        let mut attrs = FileAttributes::new(3, "notes", 2, "", 0, 4096, flags::CURRENT);
        attrs.unknown1 = 7;
        attrs.unknown2 = 0xBEEF;
        attrs
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let attrs = sample();
        let encoded = attrs.encode().unwrap();
        let decoded = FileAttributes::decode(attrs.file_index, &encoded).unwrap();
        assert_eq!(decoded, attrs);
    }

    #[test]
    fn fresh_record_zeroes_unknown_fields() {
        let attrs = FileAttributes::new(1, "f", 0, "", 0, 0, 0);
        assert_eq!(attrs.unknown1, 0);
        assert_eq!(attrs.unknown2, 0);
    }

    #[test]
    fn rejects_out_of_range_space() {
        let mut attrs = sample();
        attrs.space = 9;
        assert!(matches!(attrs.encode(), Err(Error::FileSpaceOutOfRange { space: 9 })));
    }

    #[test]
    fn rejects_unknown_wire_space_code() {
        let mut buf = sample().encode().unwrap();
        buf[0x25] = 0x99;
        assert!(matches!(
            FileAttributes::decode(3, &buf),
            Err(Error::UnknownFileSpaceCode { code: 0x99 })
        ));
    }

    proptest! {
        #[test]
        fn space_round_trips_for_all_valid_values(space in 0u8..=8) {
            let mut attrs = sample();
            attrs.space = space;
            let encoded = attrs.encode().unwrap();
            let decoded = FileAttributes::decode(attrs.file_index, &encoded).unwrap();
            prop_assert_eq!(decoded.space, space);
        }
    }
}
