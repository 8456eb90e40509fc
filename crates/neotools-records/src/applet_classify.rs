use crate::applet_header::{SIGNATURE_END, SIGNATURE_START};
use crate::Error;

/// What a blob of applet content turns out to be once classified.
///
/// Only [`AppletType::Regular`] is a normal user applet with a header this
/// crate can decode; the ROM variants are whole-firmware images identified
/// purely by a signature string at a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppletType {
    Regular,
    System3,
    Os3000SmallRom,
    AlphasmartUpdater,
    System3Neo,
    Os3kNeoSmallRom,
}

impl AppletType {
    pub fn as_str(self) -> &'static str {
        match self {
            AppletType::Regular => "Applet program",
            AppletType::System3 => "System 3",
            AppletType::Os3000SmallRom => "OS3000 Small ROM",
            AppletType::AlphasmartUpdater => "Alphasmart Updater",
            AppletType::System3Neo => "System 3 Neo",
            AppletType::Os3kNeoSmallRom => "OS3KNeo Small ROM",
        }
    }
}

/// Offset of the 18-byte ROM signature string within a non-regular applet blob.
const ROM_SIGNATURE_OFFSET: usize = 0x400;
const ROM_SIGNATURE_WIDTH: usize = 0x412 - 0x400;

const SYSTEM_3: &[u8] = b"System 3          ";
const OS3000_SMALL_ROM: &[u8] = b"OS 3000 Small ROM ";
const ALPHASMART_UPDATER: &[u8] = b"AlphaSmart Updater";
const SYSTEM_3_NEO: &[u8] = b"System 3 Neo      ";
const OS3KNEO_SMALL_ROM: &[u8] = b"OS 3KNeo Small ROM";

/// Classifies a blob of applet/ROM content by its signature word or, failing
/// that, the 18-byte ROM signature string at offset `0x400`.
pub fn classify_applet(content: &[u8]) -> Result<AppletType, Error> {
    if content.len() < 4 {
        return Err(Error::AppletTooShort { len: content.len() });
    }
    let start = neotools_core::read_int(content, 0, 4)?;
    if start == SIGNATURE_START {
        if content.len() < 4 {
            return Err(Error::AppletTooShort { len: content.len() });
        }
        let end = neotools_core::read_int(content, content.len() - 4, 4)?;
        if end != SIGNATURE_END {
            return Err(Error::InvalidAppletSignature {
                expected_start: SIGNATURE_START,
                expected_end: SIGNATURE_END,
                got_start: start,
                got_end: end,
            });
        }
        return Ok(AppletType::Regular);
    }

    if content.len() < ROM_SIGNATURE_OFFSET + ROM_SIGNATURE_WIDTH {
        return Err(Error::AppletTooShort { len: content.len() });
    }
    let signature = &content[ROM_SIGNATURE_OFFSET..ROM_SIGNATURE_OFFSET + ROM_SIGNATURE_WIDTH];
    let applet_type = match signature {
        SYSTEM_3 => AppletType::System3,
        OS3000_SMALL_ROM => AppletType::Os3000SmallRom,
        ALPHASMART_UPDATER => AppletType::AlphasmartUpdater,
        SYSTEM_3_NEO => AppletType::System3Neo,
        OS3KNEO_SMALL_ROM => AppletType::Os3kNeoSmallRom,
        other => {
            return Err(Error::UnknownRomSignature {
                signature: other.to_vec(),
            })
        }
    };
    Ok(applet_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_applet(extra_len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; 4 + extra_len + 4];
        buf[0..4].copy_from_slice(&SIGNATURE_START.to_be_bytes());
        let end = buf.len();
        buf[end - 4..].copy_from_slice(&SIGNATURE_END.to_be_bytes());
        buf
    }

    #[test]
    fn classifies_regular_applet() {
        let content = regular_applet(100);
        assert_eq!(classify_applet(&content).unwrap(), AppletType::Regular);
    }

    #[test]
    fn rejects_regular_applet_with_bad_trailer() {
        let mut content = regular_applet(100);
        let len = content.len();
        content[len - 1] = 0;
        assert!(matches!(
            classify_applet(&content),
            Err(Error::InvalidAppletSignature { .. })
        ));
    }

    #[test]
    fn classifies_rom_by_signature_string() {
        let mut content = vec![0u8; 0x412];
        content[0x400..0x412].copy_from_slice(SYSTEM_3_NEO);
        assert_eq!(classify_applet(&content).unwrap(), AppletType::System3Neo);
    }

    #[test]
    fn rejects_unknown_rom_signature() {
        let mut content = vec![0u8; 0x412];
        content[0x400..0x412].copy_from_slice(b"Totally Bogus ROM!");
        assert!(matches!(
            classify_applet(&content),
            Err(Error::UnknownRomSignature { .. })
        ));
    }

    #[test]
    fn rejects_too_short_content() {
        assert!(matches!(classify_applet(&[0, 1]), Err(Error::AppletTooShort { .. })));
    }
}
