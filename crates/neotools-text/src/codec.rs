use tracing::error;

use crate::character_map::CharacterMap;
use crate::Error;

/// Byte codes the device uses that carry meaning beyond "look up this
/// character" in the decode path.
const UNUSED: [u8; 2] = [0xa4, 0xa7];
const ESCAPE_MARKER: u8 = 0xb0;
const HARD_BREAK: u8 = 0x8f;
const NEO_UNTRANSLATABLE: u8 = 0;

const SOFTBREAK_INTERVAL: usize = 40;
const HARDBREAK_INTERVAL: usize = 24;
const MIN_FILE_SIZE: usize = 256;
const PAD_BYTE: u8 = 0xa7;

/// Decodes a Neo-encoded AlphaWord byte buffer into text, translating
/// device-specific line-break hints and escape sequences back to plain
/// Unicode.
pub fn decode(bytes: &[u8], map: &CharacterMap) -> String {
    let mut result = String::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        let mut code = bytes[index] as u32;
        index += 1;
        let mut is_escaped = false;

        if UNUSED.contains(&(code as u8)) {
            continue;
        } else if code == 0x0d {
            code = 0x0a;
        } else if code == 0x81 || code == 0xa1 {
            code = 0x20; // line-breaking space, 0xa1 from older software
        } else if code == 0x8d {
            code = 0x09; // line-breaking tab
        } else if code as u8 == HARD_BREAK {
            continue; // period break in a run of contiguous characters
        } else if code == 0xa3 {
            code = 0x09; // line-breaking tab, older software
        } else if code == 0xad {
            code = 0x2d; // line-breaking hyphen
        } else if code as u8 == ESCAPE_MARKER {
            if bytes.len() - index < 2 {
                error!("truncated escape sequence near byte {}", index);
            } else {
                is_escaped = true;
                code = bytes[index] as u32;
                index += 1;
                if bytes[index] == ESCAPE_MARKER {
                    index += 1;
                }
            }
        } else if (0xa1..=0xbf).contains(&code) {
            error!(code, "possibly untrapped escape");
            continue;
        }

        let skip_conversion = matches!(code, 0x09 | 0x0a | 0x0d) && !is_escaped;
        let ch = if skip_conversion {
            char::from_u32(code).unwrap_or('\u{FFFD}')
        } else {
            map.neo_to_unicode(code as u8)
        };
        result.push(ch);
    }
    result
}

/// Encodes text into a Neo-compatible byte buffer, inserting soft and hard
/// line-break hints the way AlphaWord expects, and padding to the
/// device's minimum file size.
pub fn encode(text: &str, map: &CharacterMap) -> Result<Vec<u8>, Error> {
    let mut buffer: Vec<u8> = Vec::with_capacity(text.len());
    let mut softbreak_count = 0usize;
    let mut hardbreak_count = 0usize;
    let mut last_break_opportunity: Option<usize> = None;

    for ch in text.chars() {
        let mut escape = false;
        let mut code = map.unicode_to_neo(ch).unwrap_or(NEO_UNTRANSLATABLE);

        if code == 0x81 {
            // Re-map the "not" alternate character so it doesn't clash
            // with the line-break hint at the same code point.
            code = 0xac;
        }
        if (0xa1..=0xbf).contains(&code) || matches!(code, 0x09 | 0x0a | 0x0d) {
            escape = true;
        }
        if ch == '\t' {
            code = 0x09;
        } else if ch == '\r' || ch == '\n' {
            code = 0x0d;
        }

        let is_break = !escape && code == 0x0d;
        let is_breakable = !escape && matches!(code, 0x2d | 0x20 | 0x09);
        hardbreak_count += 1;
        softbreak_count += 1;

        if is_break {
            last_break_opportunity = None;
            softbreak_count = 0;
            hardbreak_count = 0;
        } else if is_breakable {
            last_break_opportunity = Some(buffer.len());
            hardbreak_count = 0;
        } else if hardbreak_count >= HARDBREAK_INTERVAL {
            buffer.push(HARD_BREAK);
            softbreak_count = 0;
            hardbreak_count = 0;
            last_break_opportunity = None;
        }

        if escape {
            buffer.extend([ESCAPE_MARKER, code, ESCAPE_MARKER]);
        } else {
            buffer.push(code);
        }

        if softbreak_count >= SOFTBREAK_INTERVAL {
            if let Some(position) = last_break_opportunity {
                let breaking_form = match buffer[position] {
                    0x2d => 0xad,
                    0x20 => 0x81,
                    0x09 => 0x8d,
                    other => {
                        return Err(Error::UnbreakableMarkedBreakable { position, byte: other })
                    }
                };
                buffer[position] = breaking_form;
                softbreak_count = 0;
                hardbreak_count = 0;
                last_break_opportunity = None;
            }
        }
    }

    if buffer.len() < MIN_FILE_SIZE {
        buffer.resize(MIN_FILE_SIZE, PAD_BYTE);
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plain_ascii_padded_to_minimum_size() {
        let map = CharacterMap::default();
        let encoded = encode("hello world", &map).unwrap();
        assert_eq!(encoded.len(), MIN_FILE_SIZE);
        assert!(encoded[11..].iter().all(|&b| b == PAD_BYTE));
        // Pad bytes are in the "unused code" set and get dropped entirely on decode.
        let decoded = decode(&encoded, &map);
        assert_eq!(decoded, "hello world");
    }

    #[test]
    fn cr_decodes_to_lf() {
        let map = CharacterMap::default();
        assert_eq!(decode(&[0x0d], &map), "\n");
    }

    #[test]
    fn hard_break_byte_is_dropped_on_decode() {
        let map = CharacterMap::default();
        assert_eq!(decode(&[b'a', HARD_BREAK, b'b'], &map), "ab");
    }

    #[test]
    fn unused_codes_are_dropped() {
        let map = CharacterMap::default();
        assert_eq!(decode(&[b'a', 0xa4, 0xa7, b'b'], &map), "ab");
    }

    #[test]
    fn newline_is_escape_framed_on_encode() {
        let map = CharacterMap::default();
        // \n resolves to 0x0d on encode, and 0x0d is always escape-framed.
        let encoded = encode("a\nb", &map).unwrap();
        assert_eq!(&encoded[0..5], &[b'a', ESCAPE_MARKER, 0x0d, ESCAPE_MARKER, b'b']);
    }

    #[test]
    fn decode_consumes_escape_marker_and_trailing_marker_together() {
        let map = CharacterMap::default();
        let bytes = [b'a', ESCAPE_MARKER, 0x0d, ESCAPE_MARKER, b'b'];
        // The escaped code is looked up in the character map, not passed
        // through as a bare LF, since skip_conversion only applies to the
        // unescaped path.
        let decoded = decode(&bytes, &map);
        assert_eq!(decoded.chars().count(), 3);
        assert_eq!(decoded.chars().next(), Some('a'));
        assert_eq!(decoded.chars().last(), Some('b'));
    }

    #[test]
    fn inserts_hard_break_after_24_unbreakable_characters() {
        let map = CharacterMap::default();
        let text = "a".repeat(30);
        let encoded = encode(&text, &map).unwrap();
        assert!(encoded[..30].contains(&HARD_BREAK));
    }

    #[test]
    fn substitutes_breaking_form_at_soft_break_interval() {
        let map = CharacterMap::default();
        // Spaces every 10 characters keep resetting the hard-break counter
        // (so no 0x8f gets inserted) while the soft-break counter keeps
        // accumulating across them, until it crosses 40 and the most
        // recent space gets rewritten to its breaking form (0x81).
        let text = format!("{} {} {} {}", "a".repeat(10), "a".repeat(10), "a".repeat(10), "a".repeat(15));
        let encoded = encode(&text, &map).unwrap();
        assert!(encoded.contains(&0x81));
        assert!(!encoded[..48].contains(&HARD_BREAK));
    }

    #[test]
    fn unknown_character_maps_to_untranslatable_code() {
        let map = CharacterMap::from_lines(&vec!["a".to_string(); 256]);
        let encoded = encode("z", &map).unwrap();
        assert_eq!(encoded[0], NEO_UNTRANSLATABLE);
    }

    proptest::proptest! {
        #[test]
        fn encode_always_produces_at_least_the_minimum_file_size(s in "[a-zA-Z0-9]{0,64}") {
            let map = CharacterMap::default();
            let encoded = encode(&s, &map).unwrap();
            proptest::prop_assert!(encoded.len() >= MIN_FILE_SIZE);
        }

        #[test]
        fn short_alnum_runs_encode_without_break_hints(s in "[a-zA-Z0-9]{0,20}") {
            // Too short to cross either the hard-break or soft-break
            // interval, and none of these bytes are breakable, so the
            // prefix should be an untouched identity copy of the input.
            let map = CharacterMap::default();
            let encoded = encode(&s, &map).unwrap();
            proptest::prop_assert_eq!(&encoded[..s.len()], s.as_bytes());
        }
    }
}
