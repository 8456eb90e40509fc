use tracing::warn;

use crate::Error;

/// Total size of the firmware version record.
pub const SIZE: usize = 63;

/// Firmware/OS version information reported by `REQUEST_VERSION`.
///
/// The record's exact field layout was never recovered from the retrieved
/// sources (only its accompanying `get_version` caller survived filtering);
/// the three leading bytes and the split between `name`/`build_date` are
/// inferred from this protocol's general fixed-record conventions and the
/// field widths implied by the original CLI's printed output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FirmwareVersion {
    /// Unrecovered leading bytes, preserved verbatim across decode/encode.
    pub unknown: [u8; 3],
    pub revision_major: u8,
    pub revision_minor: u8,
    pub name: String,
    pub build_date: String,
}

impl FirmwareVersion {
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() != SIZE {
            return Err(neotools_core::Error::SizeMismatch {
                expected: SIZE,
                actual: buf.len(),
            }
            .into());
        }
        Ok(FirmwareVersion {
            unknown: [buf[0], buf[1], buf[2]],
            revision_major: buf[3],
            revision_minor: buf[4],
            name: neotools_core::read_string_named("name", buf, 5, 19)?,
            build_date: neotools_core::read_string_named("build_date", buf, 24, 39)?,
        })
    }

    pub fn encode(&self) -> Result<[u8; SIZE], Error> {
        let mut buf = [0u8; SIZE];
        buf[0..3].copy_from_slice(&self.unknown);
        buf[3] = self.revision_major;
        buf[4] = self.revision_minor;
        neotools_core::write_string_named("name", &mut buf, 5, 19, &self.name)?;
        neotools_core::write_string_named("build_date", &mut buf, 24, 39, &self.build_date)?;
        Ok(buf)
    }

    /// Compares `buf`'s 16-bit checksum against `expected`, logging a
    /// warning on mismatch rather than failing: the original treats this
    /// checksum as advisory.
    pub fn check_checksum(buf: &[u8], expected: u16) {
        let actual = neotools_core::checksum16(buf);
        if actual != expected {
            warn!(expected, actual, "firmware version checksum mismatch");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let version = FirmwareVersion {
            unknown: [1, 2, 3],
            revision_major: 3,
            revision_minor: 2,
            name: "Neo".to_string(),
            build_date: "Jan 1 2007".to_string(),
        };
        let encoded = version.encode().unwrap();
        assert_eq!(FirmwareVersion::decode(&encoded).unwrap(), version);
    }

    #[test]
    fn rejects_wrong_size() {
        assert!(FirmwareVersion::decode(&[0u8; 10]).is_err());
    }

    #[test]
    fn checksum_mismatch_does_not_panic_or_error() {
        FirmwareVersion::check_checksum(&[1, 2, 3], 0xffff);
    }
}
