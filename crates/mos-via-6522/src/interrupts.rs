//! Interrupt flag (IFR) and interrupt enable (IER) registers.
//!
//! Both registers share one bit layout:
//!
//! | Bit | Source |
//! |-----|--------|
//! | 7   | IFR: any enabled flag set (read-only). IER: set/clear on write |
//! | 6   | Timer 1 |
//! | 5   | Timer 2 |
//! | 4   | CB1 |
//! | 3   | CB2 |
//! | 2   | Shift register |
//! | 1   | CA1 |
//! | 0   | CA2 |
//!
//! Bit 7 is never stored. The IRQ output is asserted iff some stored flag
//! is also enabled.

/// CA2 active edge.
pub const CA2: u8 = 0x01;
/// CA1 active edge.
pub const CA1: u8 = 0x02;
/// Shift register completed 8 shifts.
pub const SR: u8 = 0x04;
/// CB2 active edge.
pub const CB2: u8 = 0x08;
/// CB1 active edge.
pub const CB1: u8 = 0x10;
/// Timer 2 expired.
pub const T2: u8 = 0x20;
/// Timer 1 expired.
pub const T1: u8 = 0x40;
/// IFR: composite "any enabled interrupt" bit. IER: set/clear select.
pub const ANY: u8 = 0x80;

const SOURCES: u8 = !ANY;

/// IFR/IER pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interrupts {
    flags: u8,
    enabled: u8,
}

impl Interrupts {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            flags: 0,
            enabled: 0,
        }
    }

    /// Raise the given source flags. Bit 7 is ignored.
    pub fn set_flag(&mut self, bits: u8) {
        self.flags |= bits & SOURCES;
    }

    /// Clear the given source flags. Bit 7 is ignored.
    pub fn clear_flag(&mut self, bits: u8) {
        self.flags &= !(bits & SOURCES);
    }

    /// True if every flag in `bits` is set.
    #[must_use]
    pub const fn has_flag(&self, bits: u8) -> bool {
        self.flags & bits == bits
    }

    /// Processor write to IFR: each 1 bit clears that flag.
    pub fn write_flags(&mut self, value: u8) {
        self.clear_flag(value);
    }

    /// Processor write to IER.
    ///
    /// With bit 7 set, every other 1 bit enables that source; with bit 7
    /// clear, every other 1 bit disables it. 0 bits are left alone.
    pub fn write_enable(&mut self, value: u8) {
        let bits = value & SOURCES;
        if value & ANY != 0 {
            self.enabled |= bits;
        } else {
            self.enabled &= !bits;
        }
    }

    /// True if any flag is set whose source is enabled. This is the IRQ
    /// output of the chip.
    #[must_use]
    pub const fn composite(&self) -> bool {
        self.flags & self.enabled & SOURCES != 0
    }

    /// IFR as seen by the processor: bit 7 synthesised from `composite()`.
    #[must_use]
    pub const fn read_flags(&self) -> u8 {
        if self.composite() {
            self.flags | ANY
        } else {
            self.flags
        }
    }

    /// IER as seen by the processor: bit 7 always reads 1.
    #[must_use]
    pub const fn read_enable(&self) -> u8 {
        self.enabled | ANY
    }

    /// Stored flags, bits 0-6.
    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.flags
    }

    /// Stored enables, bits 0-6.
    #[must_use]
    pub const fn enabled(&self) -> u8 {
        self.enabled
    }
}
