use std::time::Duration;

/// USB vendor ID for the AlphaSmart Neo in either personality.
pub const VENDOR_ID: u16 = 0x081e;
/// Product ID while the Neo presents itself as a keyboard (HID).
pub const HID_PRODUCT_ID: u16 = 0xbd04;
/// Product ID while the Neo presents itself as a comms device.
pub const COM_PRODUCT_ID: u16 = 0xbd01;
/// Product ID of the Neo's internal USB hub.
pub const HUB_PRODUCT_ID: u16 = 0x0100;

/// Minimum ASM protocol version the device must report during `hello`.
pub const PROTOCOL_VERSION: u16 = 0x0230;

/// Default per-transfer timeout used by [`crate::Transport::read`] and
/// [`crate::Transport::write`] when the caller doesn't override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Poll interval while waiting for the device to re-enumerate in comms mode.
pub const REENUMERATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on re-enumeration polls before giving up. The upstream
/// implementation polls forever; a library is better off failing loudly
/// after a generous but finite wait.
pub const REENUMERATE_MAX_ATTEMPTS: u32 = 50;

/// The five undocumented vendor-class control requests that flip the Neo
/// from keyboard to comms mode, determined from a USB bus trace rather than
/// from any datasheet.
pub const COMMS_MODE_FLIP_REPORTS: [u8; 5] = [0xe0, 0xe1, 0xe2, 0xe3, 0xe4];

/// Every bulk transfer chunk, in either direction, is exactly this many bytes.
pub const BULK_CHUNK_SIZE: usize = 8;
