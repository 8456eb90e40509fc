use neotools_protocol::applet_id;

use crate::device::Device;
use crate::Error;

impl Device {
    /// Reads a file's body, decoding it from the Neo's character encoding
    /// when it belongs to AlphaWord. Any other applet's files are returned
    /// as their raw bytes reinterpreted as UTF-8 text.
    pub fn read_text_file(&self, target_applet_id: u16, file_attrs: &neotools_records::FileAttributes) -> Result<String, Error> {
        let raw = self.read_file(target_applet_id, file_attrs, true)?;
        if target_applet_id == applet_id::ALPHAWORD {
            let map = neotools_text::CharacterMap::default();
            Ok(neotools_text::decode(&raw, &map))
        } else {
            Ok(String::from_utf8_lossy(&raw).into_owned())
        }
    }

    /// Writes `text` to `file_name_or_space`, overwriting it if it already
    /// exists and creating it (with password `"write"`) otherwise — mirrors
    /// the upstream CLI's `write_file` command, quirk and all: an existing
    /// file gets the Neo-encoded bytes, but a freshly created one is written
    /// as plain UTF-8, since the original never Neo-encodes on the create path.
    pub fn write_text_file(&self, file_name_or_space: &str, text: &str) -> Result<(), Error> {
        let existing = self.get_file_by_name_or_space(applet_id::ALPHAWORD, file_name_or_space)?;
        match existing {
            Some(attrs) => {
                let map = neotools_text::CharacterMap::default();
                let raw = neotools_text::encode(text, &map)?;
                self.write_file(applet_id::ALPHAWORD, attrs.file_index, &raw, true)
            }
            None => {
                self.create_file(applet_id::ALPHAWORD, file_name_or_space, "write", text.as_bytes())?;
                Ok(())
            }
        }
    }
}
