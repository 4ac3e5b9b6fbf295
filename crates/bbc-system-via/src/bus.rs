//! The slow data bus and its port wiring.
//!
//! Port A drives the slow data bus shared with the keyboard, the sound
//! chip and the speech processor. Port B addresses IC32 and reads the
//! joystick fire buttons. Several devices can drive the bus at once; the
//! result is the AND of everything driven.

use mos_via_6522::ViaPorts;

use crate::host::SystemHost;
use crate::keyboard::KeyboardScanner;
use crate::latch::{Ic32, Led};

/// Port B bits pulled low by the joystick fire buttons.
const FIRE_BUTTONS: [u8; 2] = [0x10, 0x20];

/// Slow data bus state plus the devices hanging off it.
#[derive(Debug)]
pub struct SlowDataBus<K, H> {
    ic32: Ic32,
    /// What port A drives.
    sdb_out: u8,
    /// Resolved bus value after the last resolve.
    sdb: u8,
    screen_size: u8,
    fire: [bool; 2],
    keyboard: K,
    host: H,
}

impl<K: KeyboardScanner, H: SystemHost> SlowDataBus<K, H> {
    #[must_use]
    pub fn new(keyboard: K, host: H) -> Self {
        Self {
            ic32: Ic32::new(),
            sdb_out: 0,
            sdb: 0,
            screen_size: 0,
            fire: [false; 2],
            keyboard,
            host,
        }
    }

    /// Clear the latch and bus, then tell the host the LED state.
    pub fn reset(&mut self) {
        self.ic32 = Ic32::new();
        self.sdb_out = 0;
        self.sdb = 0;
        self.screen_size = 0;
        self.report_leds();
    }

    /// Recompute the bus value.
    ///
    /// The keyboard sees the row and column on the bus. It pulls PA7 low
    /// unless it is auto-scanning or the selected key is down.
    pub fn resolve(&mut self) -> u8 {
        let mut sdb = self.sdb_out;
        self.keyboard.scan((sdb >> 4) & 0x07, sdb & 0x0F);
        if !self.ic32.keyboard_autoscan() && !self.keyboard.key_down() {
            sdb &= 0x7F;
        }
        self.sdb = sdb;
        sdb
    }

    /// Keyboard interrupt level for CA2.
    #[must_use]
    pub fn keyboard_interrupt(&self) -> bool {
        self.keyboard.interrupt(self.ic32.keyboard_autoscan())
    }

    /// Press or release a joystick fire button. Unknown buttons are ignored.
    pub fn set_fire_button(&mut self, button: usize, pressed: bool) {
        if let Some(slot) = self.fire.get_mut(button) {
            *slot = pressed;
        }
    }

    /// Get the IC32 latch.
    #[must_use]
    pub fn ic32(&self) -> Ic32 {
        self.ic32
    }

    /// Bus value as last resolved.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.sdb
    }

    /// What the VIA is driving onto the bus.
    #[must_use]
    pub fn driven(&self) -> u8 {
        self.sdb_out
    }

    /// Screen size code as last latched.
    #[must_use]
    pub fn screen_size(&self) -> u8 {
        self.screen_size
    }

    /// Whether a fire button is held.
    #[must_use]
    pub fn fire_button(&self, button: usize) -> bool {
        self.fire.get(button).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut K {
        &mut self.keyboard
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_parts(self) -> (K, H) {
        (self.keyboard, self.host)
    }

    fn report_leds(&mut self) {
        for led in [Led::CapsLock, Led::ShiftLock] {
            self.host.led_update(led, self.ic32.led(led));
        }
    }
}

impl<K: KeyboardScanner, H: SystemHost> ViaPorts for SlowDataBus<K, H> {
    fn read_port_a(&mut self) -> u8 {
        self.resolve()
    }

    fn read_port_b(&mut self) -> u8 {
        FIRE_BUTTONS
            .iter()
            .zip(self.fire)
            .filter(|&(_, pressed)| pressed)
            .fold(0xFF, |value, (&mask, _)| value & !mask)
    }

    fn write_port_a(&mut self, value: u8, ddr: u8) {
        // Undriven pins float high
        self.sdb_out = (value & ddr) | !ddr;
        self.resolve();
    }

    fn write_port_b(&mut self, value: u8, ddr: u8) {
        let pins = (value & ddr) | !ddr;
        let before = self.ic32;
        self.ic32.write(pins);
        let sdb = self.resolve();

        if before.value() & 0x06 != self.ic32.value() & 0x06 {
            log::trace!("speech selects now {:#04x}", self.ic32.value() & 0x06);
        }
        if before.sound_enabled() != self.ic32.sound_enabled() && self.ic32.sound_enabled() {
            log::debug!("sound chip write {sdb:#04x}");
            self.host.sound_write(sdb);
        }
        self.screen_size = self.ic32.screen_size();
        self.report_leds();
    }

    fn cb2_rising(&mut self) {
        self.host.light_pen_strobe();
    }

    fn timer1_expired(&mut self) {
        self.keyboard.paste_poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::KeyMatrix;

    #[derive(Default)]
    struct Sink {
        sound: Vec<u8>,
        leds: Vec<(Led, bool)>,
    }

    impl SystemHost for Sink {
        fn sound_write(&mut self, value: u8) {
            self.sound.push(value);
        }

        fn led_update(&mut self, led: Led, on: bool) {
            self.leds.push((led, on));
        }
    }

    fn bus() -> SlowDataBus<KeyMatrix, Sink> {
        SlowDataBus::new(KeyMatrix::new(0), Sink::default())
    }

    #[test]
    fn keyboard_pulls_pa7_low_without_a_key() {
        let mut bus = bus();
        bus.write_port_a(0xFF, 0x7F);
        assert_eq!(bus.value(), 0x7F);

        bus.keyboard_mut().press(0x70); // row 7, column 0
        bus.write_port_a(0x70, 0x7F);
        assert_eq!(bus.value(), 0xF0);
    }

    #[test]
    fn autoscan_leaves_pa7_alone() {
        let mut bus = bus();
        bus.write_port_b(0x0B, 0xFF); // IC32 bit 3 set
        bus.write_port_a(0x12, 0x7F);
        assert_eq!(bus.value(), 0x92);
    }

    #[test]
    fn undriven_pins_float_high() {
        let mut bus = bus();
        bus.write_port_b(0x0B, 0xFF);
        bus.write_port_a(0x00, 0x0F);
        assert_eq!(bus.driven(), 0xF0);
    }

    #[test]
    fn sound_strobes_on_enable_edge_only() {
        let mut bus = bus();
        bus.write_port_b(0x08, 0xFF); // disable
        bus.write_port_b(0x00, 0xFF); // enable: strobe
        bus.write_port_b(0x00, 0xFF); // already enabled
        assert_eq!(bus.host().sound.len(), 1);
    }

    #[test]
    fn fire_buttons_clear_pb4_pb5() {
        let mut bus = bus();
        assert_eq!(bus.read_port_b(), 0xFF);
        bus.set_fire_button(0, true);
        assert_eq!(bus.read_port_b(), 0xEF);
        bus.set_fire_button(1, true);
        assert_eq!(bus.read_port_b(), 0xCF);
        bus.set_fire_button(2, true); // no such button
        assert_eq!(bus.read_port_b(), 0xCF);
    }

    #[test]
    fn every_latch_write_reports_both_leds() {
        let mut bus = bus();
        bus.write_port_b(0x0E, 0xFF);
        assert_eq!(
            bus.host().leds,
            vec![(Led::CapsLock, false), (Led::ShiftLock, true)]
        );
    }
}
