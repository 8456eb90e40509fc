use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Error;

/// A Neo byte code (0-255) to Unicode character mapping, plus its inverse.
///
/// The device's built-in table is proprietary and not recovered here; the
/// bundled [`CharacterMap::default`] is a Latin-1 identity mapping (byte
/// `n` maps to code point `n`), which is correct for the plain ASCII range
/// that dominates AlphaWord text and is the documented fallback for
/// anything beyond it. Real deployments should supply the device's actual
/// map via [`CharacterMap::from_file`].
#[derive(Debug, Clone)]
pub struct CharacterMap {
    neo_to_unicode: [char; 256],
    unicode_to_neo: HashMap<char, u8>,
}

impl CharacterMap {
    pub fn from_lines(lines: &[String]) -> Self {
        let mut neo_to_unicode = ['\u{FFFD}'; 256];
        for (index, line) in lines.iter().enumerate().take(256) {
            if let Some(ch) = line.chars().next() {
                neo_to_unicode[index] = ch;
            }
        }
        Self::from_table(neo_to_unicode)
    }

    fn from_table(neo_to_unicode: [char; 256]) -> Self {
        let mut unicode_to_neo = HashMap::with_capacity(256);
        for (code, &ch) in neo_to_unicode.iter().enumerate() {
            // First writer wins, matching the source's dict-from-enumerate
            // construction where later duplicate characters lose.
            unicode_to_neo.entry(ch).or_insert(code as u8);
        }
        CharacterMap { neo_to_unicode, unicode_to_neo }
    }

    /// Loads a 256-line textual character map file, one character per
    /// line, mirroring `read_character_map_file`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let lines: Vec<String> = contents.lines().map(str::to_owned).collect();
        if lines.len() != 256 {
            return Err(Error::WrongLineCount { path, found: lines.len() });
        }
        Ok(Self::from_lines(&lines))
    }

    pub fn neo_to_unicode(&self, code: u8) -> char {
        self.neo_to_unicode[code as usize]
    }

    pub fn unicode_to_neo(&self, ch: char) -> Option<u8> {
        self.unicode_to_neo.get(&ch).copied()
    }
}

impl Default for CharacterMap {
    fn default() -> Self {
        let mut table = ['\u{FFFD}'; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = char::from_u32(code as u32).unwrap();
        }
        Self::from_table(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_is_identity_over_ascii() {
        let map = CharacterMap::default();
        assert_eq!(map.neo_to_unicode(b'A'), 'A');
        assert_eq!(map.unicode_to_neo('A'), Some(b'A'));
    }

    #[test]
    fn from_lines_builds_inverse_map() {
        let lines: Vec<String> = (0..256u32)
            .map(|i| char::from_u32(i).unwrap_or('?').to_string())
            .collect();
        let map = CharacterMap::from_lines(&lines);
        assert_eq!(map.neo_to_unicode(65), 'A');
        assert_eq!(map.unicode_to_neo('A'), Some(65));
    }
}
