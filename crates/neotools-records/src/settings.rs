use std::collections::BTreeMap;

use crate::Error;

/// Well-known settings ident values, supplemental documentation only — never
/// load-bearing in the decode/encode paths below.
pub mod well_known_ident {
    pub const NONE: u16 = 0x0000;
    pub const SYSTEM_ON: u16 = 0x1001;
    pub const SYSTEM_OFF: u16 = 0x1002;
    pub const SYSTEM_YES: u16 = 0x100c;
    pub const SYSTEM_NO: u16 = 0x100d;
    pub const SYSTEM_PASSWORD: u16 = 0x400b;
    pub const ALPHAWORD_CLEARFILES: u16 = 0x8003;
    pub const ALPHAWORD_MAXFILESIZE: u16 = 0x1010;
    pub const ALPHAWORD_MINFILESIZE: u16 = 0x1011;
}

const TYPE_NONE: u16 = 0x0000;
const TYPE_LABEL: u16 = 0x0001;
const TYPE_RANGE_32: u16 = 0x0102;
const TYPE_OPTION: u16 = 0x0103;
const TYPE_PASSWORD_6: u16 = 0x0105;
const TYPE_DESCRIPTION: u16 = 0x0106;
const TYPE_FILE_PASSWORD: u16 = 0xc001;
const TYPE_APPLET_ID: u16 = 0x8002;

/// A single decoded settings item. The variant carries the item's wire type;
/// `ident` identifies which setting it is within its applet (or globally,
/// for system settings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppletSettingsItem {
    /// A fixed, non-editable label string used purely to look up display text.
    Label { ident: u16, text: String },
    /// An editable integer range with a current default, minimum, and maximum.
    Range32 {
        ident: u16,
        default: u32,
        min: u32,
        max: u32,
    },
    /// A selection from a fixed set of candidate idents, stored exactly as
    /// it appears on the wire: `values[0]` is the currently selected ident,
    /// `values[1..]` are the other candidates. Kept as one ordered vector
    /// (rather than split selected/candidates fields) so re-encoding doesn't
    /// reshuffle the device's candidate ordering.
    Option { ident: u16, values: Vec<u16> },
    /// A short password, at least 6 characters once set.
    Password6 { ident: u16, password: String },
    /// A constant, non-editable descriptive string.
    Description { ident: u16, text: String },
    /// A password tied to a specific file, identified by `ident`.
    FilePassword { ident: u16, password: String },
    /// A reference to another applet, stored as a 4-byte integer on the wire
    /// despite applet IDs being 16-bit everywhere else in the protocol.
    AppletId { ident: u16, applet_id: u32 },
}

impl AppletSettingsItem {
    pub fn ident(&self) -> u16 {
        match self {
            AppletSettingsItem::Label { ident, .. }
            | AppletSettingsItem::Range32 { ident, .. }
            | AppletSettingsItem::Option { ident, .. }
            | AppletSettingsItem::Password6 { ident, .. }
            | AppletSettingsItem::Description { ident, .. }
            | AppletSettingsItem::FilePassword { ident, .. }
            | AppletSettingsItem::AppletId { ident, .. } => *ident,
        }
    }

    fn type_value(&self) -> u16 {
        match self {
            AppletSettingsItem::Label { .. } => TYPE_LABEL,
            AppletSettingsItem::Range32 { .. } => TYPE_RANGE_32,
            AppletSettingsItem::Option { .. } => TYPE_OPTION,
            AppletSettingsItem::Password6 { .. } => TYPE_PASSWORD_6,
            AppletSettingsItem::Description { .. } => TYPE_DESCRIPTION,
            AppletSettingsItem::FilePassword { .. } => TYPE_FILE_PASSWORD,
            AppletSettingsItem::AppletId { .. } => TYPE_APPLET_ID,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AppletSettingsItem::Label { .. } => "LABEL",
            AppletSettingsItem::Range32 { .. } => "RANGE_32",
            AppletSettingsItem::Option { .. } => "OPTION",
            AppletSettingsItem::Password6 { .. } => "PASSWORD_6",
            AppletSettingsItem::Description { .. } => "DESCRIPTION",
            AppletSettingsItem::FilePassword { .. } => "FILE_PASSWORD",
            AppletSettingsItem::AppletId { .. } => "APPLET_ID",
        }
    }

    /// Decodes one item starting at `buf[0]`; `buf` must contain at least
    /// the item's full (6-byte-header + payload + alignment pad) length,
    /// though it may be longer (the remainder is simply ignored).
    fn decode_one(buf: &[u8]) -> Result<Self, Error> {
        if buf.len() < 6 {
            return Err(Error::SettingsItemTooShort { len: buf.len() });
        }
        let type_value = neotools_core::read_int_named("type", buf, 0, 2)? as u16;
        let ident = neotools_core::read_int_named("ident", buf, 2, 2)? as u16;
        let length = neotools_core::read_int_named("length", buf, 4, 2)? as usize;
        let payload = &buf[6..];

        Ok(match type_value {
            TYPE_LABEL => AppletSettingsItem::Label {
                ident,
                text: neotools_core::read_string_named("label", payload, 0, length)?,
            },
            TYPE_DESCRIPTION => AppletSettingsItem::Description {
                ident,
                text: neotools_core::read_string_named("description", payload, 0, length)?,
            },
            TYPE_RANGE_32 => AppletSettingsItem::Range32 {
                ident,
                default: neotools_core::read_int_named("default", payload, 0, 4)?,
                min: neotools_core::read_int_named("min", payload, 4, 4)?,
                max: neotools_core::read_int_named("max", payload, 8, 4)?,
            },
            TYPE_OPTION => {
                let mut values = Vec::with_capacity(length / 2);
                let mut offset = 0;
                while offset < length {
                    values.push(neotools_core::read_int_named("option", payload, offset, 2)? as u16);
                    offset += 2;
                }
                AppletSettingsItem::Option { ident, values }
            }
            TYPE_PASSWORD_6 => AppletSettingsItem::Password6 {
                ident,
                password: neotools_core::read_string_named("password", payload, 0, length)?,
            },
            TYPE_FILE_PASSWORD => AppletSettingsItem::FilePassword {
                ident,
                password: neotools_core::read_string_named("file_password", payload, 0, length)?,
            },
            TYPE_APPLET_ID => AppletSettingsItem::AppletId {
                ident,
                applet_id: neotools_core::read_int_named("applet_id", payload, 0, 4)?,
            },
            other => return Err(Error::UnknownSettingsType { type_value: other }),
        })
    }

    /// Encodes the item to its wire form: a 6-byte header followed by the
    /// payload and a single alignment byte if the payload's length is odd.
    pub fn encode_one(&self) -> Result<Vec<u8>, Error> {
        let mut payload = Vec::new();
        match self {
            AppletSettingsItem::Label { text, .. } | AppletSettingsItem::Description { text, .. } => {
                payload = encode_c_string(text);
            }
            AppletSettingsItem::Range32 { default, min, max, .. } => {
                payload.extend_from_slice(&default.to_be_bytes());
                payload.extend_from_slice(&min.to_be_bytes());
                payload.extend_from_slice(&max.to_be_bytes());
            }
            AppletSettingsItem::Option { values, .. } => {
                for value in values {
                    payload.extend_from_slice(&value.to_be_bytes());
                }
            }
            AppletSettingsItem::Password6 { password, .. } => {
                if password.len() < 6 && !password.is_empty() {
                    return Err(Error::PasswordTooShort);
                }
                payload = encode_c_string(password);
            }
            AppletSettingsItem::FilePassword { password, .. } => {
                if password.len() < 6 && !password.is_empty() {
                    return Err(Error::PasswordTooShort);
                }
                payload = encode_c_string(password);
            }
            AppletSettingsItem::AppletId { applet_id, .. } => {
                payload.extend_from_slice(&applet_id.to_be_bytes());
            }
        }

        let data_len = payload.len();
        let padded_len = data_len + (data_len & 1);
        let mut buf = vec![0u8; 6 + padded_len];
        neotools_core::write_int_named("type", &mut buf, 0, 2, self.type_value() as u32)?;
        neotools_core::write_int_named("ident", &mut buf, 2, 2, self.ident() as u32)?;
        neotools_core::write_int_named("length", &mut buf, 4, 2, data_len as u32)?;
        buf[6..6 + data_len].copy_from_slice(&payload);
        Ok(buf)
    }

    /// Applies new values the way the original CLI's `change-settings`
    /// command does: one string per `RANGE_32` field, a single ident for
    /// `OPTION`/password/applet-id items.
    pub fn apply_values(&mut self, values: &[String]) -> Result<(), Error> {
        match self {
            AppletSettingsItem::Range32 { default, min, max, .. } => {
                if values.len() != 3 {
                    return Err(Error::WrongValueCount {
                        item_type: "RANGE_32",
                        expected: 3,
                        actual: values.len(),
                    });
                }
                *default = values[0].parse().unwrap_or(*default);
                *min = values[1].parse().unwrap_or(*min);
                *max = values[2].parse().unwrap_or(*max);
                Ok(())
            }
            AppletSettingsItem::Option { values: candidates, .. } => {
                if values.len() != 1 {
                    return Err(Error::WrongValueCount {
                        item_type: "OPTION",
                        expected: 1,
                        actual: values.len(),
                    });
                }
                let ident: u16 = values[0]
                    .parse()
                    .map_err(|_| Error::OptionNotACandidate { ident: 0 })?;
                if !candidates.contains(&ident) {
                    return Err(Error::OptionNotACandidate { ident });
                }
                candidates[0] = ident;
                Ok(())
            }
            AppletSettingsItem::Password6 { password, .. }
            | AppletSettingsItem::FilePassword { password, .. } => {
                if values.len() != 1 {
                    return Err(Error::WrongValueCount {
                        item_type: "PASSWORD",
                        expected: 1,
                        actual: values.len(),
                    });
                }
                if values[0].len() < 6 {
                    return Err(Error::PasswordTooShort);
                }
                *password = values[0].clone();
                Ok(())
            }
            AppletSettingsItem::AppletId { applet_id, .. } => {
                if values.len() != 1 {
                    return Err(Error::WrongValueCount {
                        item_type: "APPLET_ID",
                        expected: 1,
                        actual: values.len(),
                    });
                }
                *applet_id = values[0].parse().unwrap_or(*applet_id);
                Ok(())
            }
            AppletSettingsItem::Label { .. } | AppletSettingsItem::Description { .. } => {
                Err(Error::WrongValueCount {
                    item_type: self.type_name(),
                    expected: 0,
                    actual: values.len(),
                })
            }
        }
    }
}

fn encode_c_string(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// A parsed collection of settings items for one request, classified into
/// labels, descriptions, and "real" settings the way the upstream CLI does
/// for its JSON rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppletSettingsCollection {
    pub labels: BTreeMap<u16, String>,
    pub descriptions: BTreeMap<u16, String>,
    pub settings: BTreeMap<u16, AppletSettingsItem>,
}

impl AppletSettingsCollection {
    pub fn from_items(items: Vec<AppletSettingsItem>) -> Self {
        let mut collection = AppletSettingsCollection::default();
        for item in items {
            match item {
                AppletSettingsItem::Label { ident, text } => {
                    collection.labels.insert(ident, text);
                }
                AppletSettingsItem::Description { ident, text } => {
                    collection.descriptions.insert(ident, text);
                }
                other => {
                    collection.settings.insert(other.ident(), other);
                }
            }
        }
        collection
    }

    /// Decodes a settings collection from a buffer containing zero or more
    /// back-to-back items, terminated by either running out of bytes or a
    /// `type=0, ident=0, length=0` sentinel item.
    pub fn decode(buf: &[u8]) -> Result<Self, Error> {
        let mut offset = 0;
        let mut items = Vec::new();
        while offset + 6 <= buf.len() {
            let type_value = neotools_core::read_int_named("type", buf, offset, 2)? as u16;
            let ident = neotools_core::read_int_named("ident", buf, offset + 2, 2)? as u16;
            let length = neotools_core::read_int_named("length", buf, offset + 4, 2)? as usize;
            if type_value == TYPE_NONE && ident == 0 && length == 0 {
                break;
            }
            let padded_len = length + (length & 1);
            let item_total_len = 6 + padded_len;
            let item_buf = &buf[offset..(offset + item_total_len).min(buf.len())];
            items.push(AppletSettingsItem::decode_one(item_buf)?);
            offset += item_total_len;
        }
        Ok(AppletSettingsCollection::from_items(items))
    }

    /// Encodes every settings item (not labels/descriptions — those are only
    /// ever read, never written back) concatenated in ident order.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        for item in self.settings.values() {
            buf.extend(item.encode_one()?);
        }
        Ok(buf)
    }

    /// Merges `other` into `self`; on key collisions `other`'s values win,
    /// matching the upstream `AppletSettings.merge_settings`.
    pub fn merge(&mut self, other: AppletSettingsCollection) {
        self.labels.extend(other.labels);
        self.descriptions.extend(other.descriptions);
        self.settings.extend(other.settings);
    }
}

/// One settings item flattened for display/JSON output, mirroring the
/// upstream CLI's `AppletSettings.to_dict`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RenderedSettingsItem {
    pub label: String,
    pub ident: u16,
    pub type_name: &'static str,
    pub description: Option<String>,
    pub value: RenderedSettingsValue,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum RenderedSettingsValue {
    Label(String),
    Int(u32),
    Option { selected: String, options: Vec<String> },
}

impl AppletSettingsCollection {
    /// Flattens `settings` into a list sorted by label text, resolving each
    /// ident to a human label where one is known (falling back to "Unknown").
    pub fn render(&self) -> Vec<RenderedSettingsItem> {
        let label_for = |ident: u16| -> String {
            let text = self
                .labels
                .get(&ident)
                .map(String::as_str)
                .unwrap_or("Unknown");
            format!("{text} ({ident})")
        };

        let mut rendered: Vec<RenderedSettingsItem> = self
            .settings
            .values()
            .map(|item| {
                let value = match item {
                    AppletSettingsItem::Range32 { default, .. } => RenderedSettingsValue::Int(*default),
                    AppletSettingsItem::Option { values, .. } => RenderedSettingsValue::Option {
                        selected: label_for(*values.first().unwrap_or(&0)),
                        options: values.iter().skip(1).map(|&c| label_for(c)).collect(),
                    },
                    AppletSettingsItem::Password6 { password, .. }
                    | AppletSettingsItem::FilePassword { password, .. } => {
                        RenderedSettingsValue::Label(password.clone())
                    }
                    AppletSettingsItem::AppletId { applet_id, .. } => {
                        RenderedSettingsValue::Int(*applet_id)
                    }
                    AppletSettingsItem::Label { text, .. } | AppletSettingsItem::Description { text, .. } => {
                        RenderedSettingsValue::Label(text.clone())
                    }
                };
                RenderedSettingsItem {
                    label: label_for(item.ident()),
                    ident: item.ident(),
                    type_name: item.type_name(),
                    description: self.descriptions.get(&item.ident()).cloned(),
                    value,
                }
            })
            .collect();
        rendered.sort_by(|a, b| a.label.cmp(&b.label));
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(item: AppletSettingsItem) -> AppletSettingsItem {
        let encoded = item.encode_one().unwrap();
        AppletSettingsItem::decode_one(&encoded).unwrap()
    }

    #[test]
    fn label_round_trips() {
        let item = AppletSettingsItem::Label { ident: 1, text: "Hello".into() };
        assert_eq!(round_trip(item.clone()), item);
    }

    #[test]
    fn description_round_trips() {
        let item = AppletSettingsItem::Description { ident: 2, text: "A description".into() };
        assert_eq!(round_trip(item.clone()), item);
    }

    #[test]
    fn range32_round_trips() {
        let item = AppletSettingsItem::Range32 { ident: 3, default: 10, min: 0, max: 100 };
        assert_eq!(round_trip(item.clone()), item);
    }

    #[test]
    fn option_round_trips_preserving_order() {
        let item = AppletSettingsItem::Option { ident: 4, values: vec![8, 7, 9] };
        assert_eq!(round_trip(item.clone()), item);
    }

    #[test]
    fn password6_round_trips() {
        let item = AppletSettingsItem::Password6 { ident: 5, password: "secret".into() };
        assert_eq!(round_trip(item.clone()), item);
    }

    #[test]
    fn file_password_round_trips() {
        let item = AppletSettingsItem::FilePassword { ident: 6, password: "abcdef".into() };
        assert_eq!(round_trip(item.clone()), item);
    }

    #[test]
    fn applet_id_round_trips() {
        let item = AppletSettingsItem::AppletId { ident: 7, applet_id: 0xa000 };
        assert_eq!(round_trip(item.clone()), item);
    }

    #[test]
    fn collection_decodes_multiple_items_and_stops_at_sentinel() {
        let label = AppletSettingsItem::Label { ident: 1, text: "L".into() };
        let range = AppletSettingsItem::Range32 { ident: 2, default: 1, min: 0, max: 5 };
        let mut buf = label.encode_one().unwrap();
        buf.extend(range.encode_one().unwrap());
        buf.extend([0u8; 6]); // sentinel
        buf.extend([0xffu8; 20]); // garbage past the sentinel, must be ignored

        let collection = AppletSettingsCollection::decode(&buf).unwrap();
        assert_eq!(collection.labels.get(&1), Some(&"L".to_string()));
        assert!(collection.settings.contains_key(&2));
    }

    #[test]
    fn merge_prefers_other_on_conflict() {
        let mut a = AppletSettingsCollection::default();
        a.labels.insert(1, "a".into());
        let mut b = AppletSettingsCollection::default();
        b.labels.insert(1, "b".into());
        a.merge(b);
        assert_eq!(a.labels.get(&1), Some(&"b".to_string()));
    }

    #[test]
    fn render_sorts_by_label_and_resolves_option_candidates() {
        let mut collection = AppletSettingsCollection::default();
        collection.labels.insert(10, "On".into());
        collection.labels.insert(11, "Off".into());
        collection.settings.insert(
            20,
            AppletSettingsItem::Option { ident: 20, values: vec![10, 11] },
        );
        let rendered = collection.render();
        assert_eq!(rendered.len(), 1);
        assert!(matches!(&rendered[0].value, RenderedSettingsValue::Option { .. }));
    }

    #[test]
    fn apply_values_rejects_non_candidate_option() {
        let mut item = AppletSettingsItem::Option { ident: 1, values: vec![1, 2, 3] };
        let err = item.apply_values(&["99".to_string()]).unwrap_err();
        assert!(matches!(err, Error::OptionNotACandidate { ident: 99 }));
    }

    #[test]
    fn apply_values_accepts_candidate_option() {
        let mut item = AppletSettingsItem::Option { ident: 1, values: vec![1, 2, 3] };
        item.apply_values(&["2".to_string()]).unwrap();
        assert!(matches!(item, AppletSettingsItem::Option { values, .. } if values[0] == 2));
    }
}
