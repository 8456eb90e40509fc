use std::cell::Cell;

use neotools_dialogue::Dialogue;
use neotools_protocol::{applet_id, Message, OpCode};
use neotools_transport::Transport;
use tracing::warn;

use crate::Error;

/// Which USB personality the device presented when it was first opened,
/// before any comms-mode flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Keyboard,
    Comms,
    Unknown,
}

/// An open connection to one AlphaSmart Neo. Each high-level operation
/// opens and closes its own dialogue session against this transport, the
/// same way the original opens `dialogue_start`/`dialogue_end` once per
/// command rather than holding a session open across commands.
pub struct Device {
    pub(crate) transport: Transport,
    release_on_drop: Cell<bool>,
}

impl Device {
    /// Connects to the single attached Neo, flipping it into comms mode
    /// unless `flip_to_comms` is false.
    pub fn connect(flip_to_comms: bool) -> Result<Self, Error> {
        Ok(Device { transport: Transport::connect(flip_to_comms)?, release_on_drop: Cell::new(true) })
    }

    /// The USB personality the device presented before any mode flip.
    pub fn mode(&self) -> Mode {
        match self.transport.original_product_id() {
            id if id == neotools_transport::HID_PRODUCT_ID => Mode::Keyboard,
            id if id == neotools_transport::COM_PRODUCT_ID => Mode::Comms,
            _ => Mode::Unknown,
        }
    }

    /// Flips a device that came up in comms mode back to keyboard mode by
    /// sending the ASM restart request.
    pub fn flip_to_keyboard_mode(&self) -> Result<(), Error> {
        let dialogue = Dialogue::start(&self.transport, applet_id::SYSTEM)?;
        let message = Message::new(OpCode::RequestRestart, &[])?;
        dialogue.send(&message, Some(OpCode::ResponseRestart))?;
        dialogue.close()?;
        Ok(())
    }

    /// Opts this handle out of the automatic release-sequence restart run on
    /// drop. Used by callers that intentionally leave the device in comms
    /// mode (an explicit mode flip) or that know the device is about to
    /// reboot on its own (applet removal).
    pub fn suppress_release(&self) {
        self.release_on_drop.set(false);
    }

    pub(crate) fn dialogue(&self, target_applet_id: u16) -> Result<Dialogue<'_, Transport>, Error> {
        Ok(Dialogue::start(&self.transport, target_applet_id)?)
    }
}

impl Drop for Device {
    /// Mirrors the original's default `dispose=True` context-manager
    /// teardown: a Neo that was actually flipped into comms mode for this
    /// session gets restarted back into keyboard mode before the handle
    /// goes away, unless the caller opted out via [`Device::suppress_release`].
    /// A Neo that was already in comms mode (or that we were asked not to
    /// flip at all) is left untouched, matching the original's
    /// `original_product == HID_PRODUCT_ID and dev.idProduct == COM_PRODUCT_ID`
    /// check.
    fn drop(&mut self) {
        if self.release_on_drop.get() && self.transport.flipped_to_comms() {
            if let Err(err) = self.flip_to_keyboard_mode() {
                warn!(%err, "failed to restore device to keyboard mode on exit");
            }
        }
    }
}
