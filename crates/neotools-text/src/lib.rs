//! The Neo-to-Unicode text codec used for AlphaWord file bodies: a 256-entry
//! character map plus line-break-hint framing on encode and the matching
//! unframing on decode.

mod character_map;
mod codec;
mod error;

pub use character_map::CharacterMap;
pub use codec::{decode, encode};
pub use error::Error;
