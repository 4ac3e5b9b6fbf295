//! Machine devices the System VIA drives but does not own.

use crate::latch::Led;

/// Consumers of the System VIA's outputs.
///
/// Every method defaults to doing nothing, so a host only implements the
/// sinks it cares about.
pub trait SystemHost {
    /// The sound chip was strobed with the slow data bus value.
    fn sound_write(&mut self, _value: u8) {}

    /// CB2 rose: latch the CRTC light pen address.
    fn light_pen_strobe(&mut self) {}

    /// An LED's state was (re)asserted. Called on every IC32 write.
    fn led_update(&mut self, _led: Led, _on: bool) {}
}

/// Host with nothing attached.
impl SystemHost for () {}
