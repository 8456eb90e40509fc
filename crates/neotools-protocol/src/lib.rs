//! The ASM message frame, its opcode catalog, and the error taxonomy shared
//! with the layers built on top of this crate.

mod applet_id;
mod error;
mod message;
mod opcode;

pub use applet_id::applet_id;
pub use error::Error;
pub use message::{assert_success, Message};
pub use opcode::OpCode;
