//! USB bulk transport for the AlphaSmart Neo: device discovery, the
//! keyboard/comms personality flip, and chunked 8-byte bulk I/O.

mod constants;
mod error;
mod transport;

pub use constants::*;
pub use error::Error;
pub use transport::{RawIo, Transport};
