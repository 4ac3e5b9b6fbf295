//! BBC Micro System VIA.
//!
//! The Model B's System VIA is a 6522 at &FE40-&FE4F wired to the slow
//! data bus, the IC32 latch and a handful of machine signals:
//!
//! | Pin     | Connection                                   |
//! |---------|----------------------------------------------|
//! | PA0-PA7 | Slow data bus (keyboard, sound, speech)      |
//! | PB0-PB2 | IC32 bit address                             |
//! | PB3     | IC32 data                                    |
//! | PB4-PB5 | Joystick fire buttons (active low)           |
//! | PB6-PB7 | Speech processor status                      |
//! | CA1     | Vertical sync                                |
//! | CA2     | Keyboard interrupt                           |
//! | CB1     | ADC end of conversion                        |
//! | CB2     | Light pen strobe                             |
//!
//! [`SystemVia`] owns the chip and the bus. Every access goes through it,
//! and after each one the keyboard interrupt line is re-evaluated.

mod bus;
pub mod config;
mod host;
mod keyboard;
pub mod latch;

pub use bus::SlowDataBus;
pub use config::{ConfigError, SystemViaConfig};
pub use host::SystemHost;
pub use keyboard::{KeyMatrix, KeyboardScanner};
pub use latch::{Ic32, Led};

use emu_core::{Bus, InterruptLines, Observable, Tickable, Value};
use mos_via_6522::Via6522;

/// The System VIA and everything wired to it.
#[derive(Debug)]
pub struct SystemVia<K, H> {
    via: Via6522,
    bus: SlowDataBus<K, H>,
}

impl<H: SystemHost> SystemVia<KeyMatrix, H> {
    /// A Model B System VIA with the reference keyboard, its links set from
    /// the configuration.
    pub fn bbc_b(config: &SystemViaConfig, host: H) -> Result<Self, ConfigError> {
        Self::new(config, KeyMatrix::new(config.keyboard_links), host)
    }
}

impl<K: KeyboardScanner, H: SystemHost> SystemVia<K, H> {
    /// Build and reset a System VIA.
    pub fn new(config: &SystemViaConfig, keyboard: K, host: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut system_via = Self {
            via: Via6522::new(config.irq_source),
            bus: SlowDataBus::new(keyboard, host),
        };
        system_via.reset();
        Ok(system_via)
    }

    /// Machine reset. Safe to repeat.
    pub fn reset(&mut self) {
        self.via.reset();
        self.bus.reset();
        self.settle();
    }

    /// Processor read. Only the low four address bits are decoded.
    pub fn read(&mut self, address: u16) -> u8 {
        let value = self.via.read(&mut self.bus, address as u8);
        self.settle();
        value
    }

    /// Processor write. Only the low four address bits are decoded.
    pub fn write(&mut self, address: u16, value: u8) {
        self.via.write(&mut self.bus, address as u8, value);
        self.settle();
    }

    /// Run the chip for `cycles` cycles.
    pub fn advance(&mut self, cycles: u32) {
        if cycles == 0 {
            return;
        }
        self.via.advance(&mut self.bus, cycles);
        self.settle();
    }

    /// Vertical sync.
    pub fn set_ca1(&mut self, level: bool) {
        self.via.set_ca1(&mut self.bus, level);
        self.settle();
    }

    /// ADC end of conversion.
    pub fn set_cb1(&mut self, level: bool) {
        self.via.set_cb1(&mut self.bus, level);
        self.settle();
    }

    /// Light pen strobe.
    pub fn set_cb2(&mut self, level: bool) {
        self.via.set_cb2(&mut self.bus, level);
        self.settle();
    }

    /// Re-evaluate the keyboard interrupt after the key matrix changed.
    pub fn key_update(&mut self) {
        self.settle();
    }

    /// Press or release joystick fire button 0 or 1.
    pub fn set_fire_button(&mut self, button: usize, pressed: bool) {
        self.bus.set_fire_button(button, pressed);
    }

    #[must_use]
    pub fn irq(&self) -> bool {
        self.via.irq()
    }

    /// The configured source bit while interrupting, else 0.
    #[must_use]
    pub fn irq_bits(&self) -> u8 {
        self.via.irq_bits()
    }

    /// Drive this chip's bit of the machine interrupt lines.
    pub fn update_irq_lines(&self, lines: &mut InterruptLines) {
        lines.update(self.via.irq_source(), self.via.irq());
    }

    /// Screen size code from IC32 bits 4 and 5.
    #[must_use]
    pub fn screen_size(&self) -> u8 {
        self.bus.screen_size()
    }

    /// Hardware scroll wrap length for the current screen size.
    #[must_use]
    pub fn wrap_length(&self) -> u16 {
        latch::wrap_length(self.bus.screen_size())
    }

    /// Whether a keyboard LED is lit.
    #[must_use]
    pub fn led(&self, led: Led) -> bool {
        self.bus.ic32().led(led)
    }

    #[must_use]
    pub fn ic32(&self) -> Ic32 {
        self.bus.ic32()
    }

    /// Slow data bus value as last resolved.
    #[must_use]
    pub fn bus_value(&self) -> u8 {
        self.bus.value()
    }

    /// Get the 6522.
    #[must_use]
    pub fn via(&self) -> &Via6522 {
        &self.via
    }

    #[must_use]
    pub fn keyboard(&self) -> &K {
        self.bus.keyboard()
    }

    /// Mutable keyboard access. Call [`key_update`](Self::key_update)
    /// afterwards so the interrupt line follows.
    pub fn keyboard_mut(&mut self) -> &mut K {
        self.bus.keyboard_mut()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        self.bus.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.bus.host_mut()
    }

    /// Tear down, handing back the keyboard and host.
    pub fn into_parts(self) -> (K, H) {
        self.bus.into_parts()
    }

    /// Drive CA2 from the keyboard.
    fn settle(&mut self) {
        let level = self.bus.keyboard_interrupt();
        self.via.set_ca2(level);
    }
}

impl<K: KeyboardScanner, H: SystemHost> Bus for SystemVia<K, H> {
    fn read(&mut self, address: u16) -> u8 {
        SystemVia::read(self, address)
    }

    fn write(&mut self, address: u16, value: u8) {
        SystemVia::write(self, address, value);
    }
}

impl<K: KeyboardScanner, H: SystemHost> Tickable for SystemVia<K, H> {
    fn advance(&mut self, cycles: u32) {
        SystemVia::advance(self, cycles);
    }
}

impl<K: KeyboardScanner, H: SystemHost> Observable for SystemVia<K, H> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("via.") {
            return self.via.query(rest);
        }
        let ic32 = self.bus.ic32();
        let value = match path {
            "ic32" => ic32.value().into(),
            "sdb" => self.bus.value().into(),
            "sdb_out" => self.bus.driven().into(),
            "screen_size" => self.bus.screen_size().into(),
            "wrap_length" => self.wrap_length().into(),
            "keyboard.autoscan" => ic32.keyboard_autoscan().into(),
            "keyboard.interrupt" => self.bus.keyboard_interrupt().into(),
            "sound.enabled" => ic32.sound_enabled().into(),
            "led.caps_lock" => ic32.led(Led::CapsLock).into(),
            "led.shift_lock" => ic32.led(Led::ShiftLock).into(),
            "fire0" => self.bus.fire_button(0).into(),
            "fire1" => self.bus.fire_button(1).into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "ic32",
            "sdb",
            "sdb_out",
            "screen_size",
            "wrap_length",
            "keyboard.autoscan",
            "keyboard.interrupt",
            "sound.enabled",
            "led.caps_lock",
            "led.shift_lock",
            "fire0",
            "fire1",
            "via.ora",
            "via.orb",
            "via.ira",
            "via.irb",
            "via.ddra",
            "via.ddrb",
            "via.acr",
            "via.pcr",
            "via.ifr",
            "via.ier",
            "via.irq",
            "via.t1.latch",
            "via.t1.counter",
            "via.t1.reported",
            "via.t1.pb7",
            "via.t2.latch",
            "via.t2.counter",
            "via.t2.reported",
            "via.sr",
            "via.sr.remaining",
            "via.sr.mode",
            "via.ca1",
            "via.ca2",
            "via.cb1",
            "via.cb2",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mos_via_6522::interrupts::{ANY, CA2, T1};

    fn beeb() -> SystemVia<KeyMatrix, ()> {
        SystemVia::bbc_b(&SystemViaConfig::default(), ()).unwrap()
    }

    #[test]
    fn rejects_bad_irq_source() {
        let config = SystemViaConfig {
            irq_source: 0x00,
            ..SystemViaConfig::default()
        };
        let err = SystemVia::bbc_b(&config, ()).unwrap_err();
        assert_eq!(err, ConfigError::InvalidIrqSource(0x00));
    }

    #[test]
    fn keypress_raises_ca2_in_autoscan() {
        let mut sv = beeb();
        sv.write(0x0C, 0x04); // CA2 positive edge
        sv.write(0x0E, ANY | CA2);
        sv.write(0x02, 0x0F);
        sv.write(0x00, 0x0B); // IC32 bit 3: auto-scan

        sv.keyboard_mut().press(0x41);
        assert!(!sv.irq());
        sv.key_update();
        assert!(sv.irq());
        assert!(sv.via().ca2());
    }

    #[test]
    fn os_style_key_test() {
        let mut sv = beeb();
        sv.write(0x03, 0x7F); // PA0-PA6 out, PA7 in
        sv.write(0x02, 0x0F);
        sv.write(0x00, 0x03); // auto-scan off

        sv.keyboard_mut().press(0x62);
        sv.write(0x0F, 0x62);
        assert_eq!(sv.read(0x0F) & 0x80, 0x80);
        sv.write(0x0F, 0x63);
        assert_eq!(sv.read(0x0F) & 0x80, 0x00);
    }

    #[test]
    fn address_decodes_low_nibble_only() {
        let mut sv = beeb();
        sv.write(0xFE4E, ANY | T1);
        assert_eq!(sv.read(0xFE5E), ANY | T1);
    }

    #[test]
    fn irq_lines_follow_chip() {
        let config = SystemViaConfig {
            irq_source: 0x04,
            ..SystemViaConfig::default()
        };
        let mut sv = SystemVia::bbc_b(&config, ()).unwrap();
        let mut lines = InterruptLines::new();
        sv.write(0x0E, ANY | T1);
        sv.write(0x04, 1);
        sv.write(0x05, 0);
        sv.advance(3);
        sv.update_irq_lines(&mut lines);
        assert_eq!(lines.bits(), 0x04);
        assert_eq!(sv.irq_bits(), 0x04);

        let _ = sv.read(0x04);
        sv.update_irq_lines(&mut lines);
        assert!(!lines.any());
    }

    #[test]
    fn observable_paths_all_resolve() {
        let sv = beeb();
        for path in sv.query_paths() {
            assert!(sv.query(path).is_some(), "{path}");
        }
        assert_eq!(sv.query("wrap_length"), Some(Value::U16(0x4000)));
    }

    #[test]
    fn via_paths_mirror_the_chip() {
        let sv = beeb();
        let mirrored: Vec<&str> = sv
            .query_paths()
            .iter()
            .filter_map(|path| path.strip_prefix("via."))
            .collect();
        assert_eq!(mirrored, sv.via().query_paths());
    }

    #[test]
    fn trait_access_matches_inherent() {
        fn poke(bus: &mut impl Bus) {
            bus.write(0x0E, 0xFF);
        }
        let mut sv = beeb();
        poke(&mut sv);
        assert_eq!(Bus::read(&mut sv, 0x0E), 0xFF);
        Tickable::advance(&mut sv, 0);
        Tickable::tick(&mut sv);
        assert_eq!(sv.query("via.t1.counter"), Some(Value::I32(-1)));
    }
}
