//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports with four control lines, two
//! 16-bit timers, a serial shift register, and an interrupt controller.
//! What the ports are wired to is machine-specific and supplied through
//! [`ViaPorts`]; everything else lives here.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                         |
//! |-----|------|-------------------------------------|
//! | $0  | ORB  | Port B data (handshake on access)   |
//! | $1  | ORA  | Port A data (handshake on access)   |
//! | $2  | DDRB | Port B data direction (1 = output)  |
//! | $3  | DDRA | Port A data direction (1 = output)  |
//! | $4  | T1CL | Timer 1 counter low (read clears T1 IRQ) |
//! | $5  | T1CH | Timer 1 counter high (write starts T1) |
//! | $6  | T1LL | Timer 1 latch low                   |
//! | $7  | T1LH | Timer 1 latch high                  |
//! | $8  | T2CL | Timer 2 counter low (read clears T2 IRQ) |
//! | $9  | T2CH | Timer 2 counter high (write starts T2) |
//! | $A  | SR   | Shift register                      |
//! | $B  | ACR  | Auxiliary control register           |
//! | $C  | PCR  | Peripheral control register          |
//! | $D  | IFR  | Interrupt flag register              |
//! | $E  | IER  | Interrupt enable register            |
//! | $F  | ORA  | Port A data (no handshake)           |
//!
//! # Timer timing
//!
//! Loading a timer with N makes its expiry visible N + 2 cycles after the
//! write to the high counter byte: the counter passes through 0 and 0xFFFF
//! before the flag is raised. In continuous mode timer 1 reloads from its
//! latch and expires every N + 2 cycles. Counters are kept as signed
//! values so that a batch of cycles can overshoot zero and the expiry still
//! be detected.

mod control;
pub mod interrupts;
mod ports;

pub use control::{Cx2Mode, ShiftClock, ShiftMode};
pub use interrupts::Interrupts;
pub use ports::ViaPorts;

use control::{
    ACR_PA_LATCH, ACR_PB_LATCH, ACR_T1_CONTINUOUS, ACR_T1_PB7, ACR_T2_PULSE_COUNT,
    ca1_rising_edge, cb1_rising_edge,
};
use emu_core::{Observable, Value};
use interrupts::{CA1, CA2, CB1, CB2, SR, T1, T2};

/// Value read from a register index outside the map.
pub const IDLE_VALUE: u8 = 0xFE;

/// Interrupt source bit used by [`Via6522::default`].
pub const DEFAULT_IRQ_SOURCE: u8 = 0x01;

/// A counter below this value has expired.
const EXPIRED_BELOW: i64 = -1;

/// Cycles between the counter reaching zero and the reload in
/// continuous mode.
const RELOAD_OVERHEAD: i64 = 2;

const REGISTER_NAMES: [&str; 16] = [
    "ORB", "ORA", "DDRB", "DDRA", "T1C-L", "T1C-H", "T1L-L", "T1L-H", "T2C-L", "T2C-H", "SR",
    "ACR", "PCR", "IFR", "IER", "ORA-nh",
];

/// MOS 6522 Versatile Interface Adapter.
#[derive(Debug, Clone)]
pub struct Via6522 {
    /// Port A output register.
    ora: u8,
    /// Port B output register.
    orb: u8,
    /// Port A input latch (ACR bit 0).
    ira: u8,
    /// Port B input latch (ACR bit 1).
    irb: u8,
    /// Port A data direction register (1 = output).
    ddra: u8,
    /// Port B data direction register (1 = output).
    ddrb: u8,

    /// Timer 1 latch.
    t1_latch: u16,
    /// Timer 1 live counter. Goes briefly negative around expiry.
    t1_counter: i32,
    /// Expiry already reported since the last load.
    t1_reported: bool,
    /// PB7 output driven by timer 1 (ACR bit 7).
    pb7: bool,

    /// Timer 2 latch. Only the low byte is a real latch; the high byte is
    /// taken from the T2C-H write.
    t2_latch: u16,
    /// Timer 2 live counter.
    t2_counter: i32,
    /// Expiry already reported since the last load.
    t2_reported: bool,

    /// Shift register.
    sr: u8,
    /// Shift clock edges left in the current operation.
    sr_remaining: u8,
    /// Cycles until the next shift in the timer-2-rate modes.
    sr_divider: i32,

    /// Auxiliary control register.
    acr: u8,
    /// Peripheral control register.
    pcr: u8,

    /// IFR and IER.
    interrupts: Interrupts,

    ca1: bool,
    ca2: bool,
    cb1: bool,
    cb2: bool,
    /// CA2 is in the low half of a pulse-mode strobe.
    ca2_pulse: bool,
    /// CB2 is in the low half of a pulse-mode strobe.
    cb2_pulse: bool,

    /// This chip's bit in the machine-wide interrupt mask.
    irq_source: u8,
}

impl Via6522 {
    /// Create a VIA in its reset state. `irq_source` is the bit this chip
    /// owns in the machine's interrupt mask.
    #[must_use]
    pub fn new(irq_source: u8) -> Self {
        Self {
            ora: 0,
            orb: 0,
            ira: 0,
            irb: 0,
            ddra: 0,
            ddrb: 0,
            t1_latch: 0,
            t1_counter: 0,
            t1_reported: true,
            pb7: false,
            t2_latch: 0,
            t2_counter: 0,
            t2_reported: true,
            sr: 0,
            sr_remaining: 0,
            sr_divider: 0,
            acr: 0,
            pcr: 0,
            interrupts: Interrupts::new(),
            ca1: false,
            ca2: false,
            cb1: false,
            cb2: false,
            ca2_pulse: false,
            cb2_pulse: false,
            irq_source,
        }
    }

    /// Return every register, timer and line to its power-on state.
    ///
    /// Both timers are left expired and already reported, so nothing
    /// interrupts until software loads a timer.
    pub fn reset(&mut self) {
        log::debug!("VIA (source {:#04x}) reset", self.irq_source);
        *self = Self::new(self.irq_source);
    }

    /// IRQ output level.
    #[must_use]
    pub fn irq(&self) -> bool {
        self.interrupts.composite()
    }

    /// This chip's bit in the machine-wide interrupt mask.
    #[must_use]
    pub fn irq_source(&self) -> u8 {
        self.irq_source
    }

    /// `irq_source()` while the IRQ output is asserted, else 0.
    #[must_use]
    pub fn irq_bits(&self) -> u8 {
        if self.irq() { self.irq_source } else { 0 }
    }

    /// Read a VIA register.
    pub fn read<P: ViaPorts>(&mut self, ports: &mut P, reg: u8) -> u8 {
        let reg = reg & 0x0F;
        let value = match reg {
            0x00 => {
                self.clear_port_b_flags();
                self.read_port_b(ports)
            }
            0x01 => {
                self.port_a_handshake();
                self.read_port_a(ports)
            }
            0x02 => self.ddrb,
            0x03 => self.ddra,
            0x04 => {
                self.interrupts.clear_flag(T1);
                self.t1_counter as u8
            }
            0x05 => ((self.t1_counter as u16) >> 8) as u8,
            0x06 => self.t1_latch as u8,
            0x07 => (self.t1_latch >> 8) as u8,
            0x08 => {
                self.interrupts.clear_flag(T2);
                self.t2_counter as u8
            }
            0x09 => ((self.t2_counter as u16) >> 8) as u8,
            0x0A => {
                let value = self.sr;
                self.start_shift();
                value
            }
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => self.interrupts.read_flags(),
            0x0E => self.interrupts.read_enable(),
            0x0F => self.read_port_a(ports),
            _ => IDLE_VALUE,
        };
        log::trace!("VIA read {} -> {value:#04x}", REGISTER_NAMES[reg as usize]);
        value
    }

    /// Write a VIA register.
    pub fn write<P: ViaPorts>(&mut self, ports: &mut P, reg: u8, value: u8) {
        let reg = reg & 0x0F;
        log::trace!("VIA write {value:#04x} -> {}", REGISTER_NAMES[reg as usize]);
        match reg {
            0x00 => {
                self.clear_port_b_flags();
                self.orb = value;
                ports.write_port_b(self.orb, self.ddrb);
                let mode = Cx2Mode::cb2(self.pcr);
                if mode.strobes_on_access() {
                    self.drive_cb2(ports, false);
                    self.cb2_pulse = mode == Cx2Mode::Pulse;
                }
            }
            0x01 => {
                self.port_a_handshake();
                self.ora = value;
                ports.write_port_a(self.ora, self.ddra);
            }
            0x02 => {
                self.ddrb = value;
                ports.write_port_b(self.orb, self.ddrb);
            }
            0x03 => {
                self.ddra = value;
                ports.write_port_a(self.ora, self.ddra);
            }
            0x04 | 0x06 => {
                self.t1_latch = (self.t1_latch & 0xFF00) | u16::from(value);
            }
            0x05 => {
                // Load the counter from the latch and start timer 1
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.t1_counter = i32::from(self.t1_latch);
                self.t1_reported = false;
                self.interrupts.clear_flag(T1);
                if self.acr & ACR_T1_PB7 != 0 {
                    self.pb7 = false;
                }
            }
            0x07 => {
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.interrupts.clear_flag(T1);
            }
            0x08 => {
                self.t2_latch = (self.t2_latch & 0xFF00) | u16::from(value);
            }
            0x09 => {
                self.t2_latch = (self.t2_latch & 0x00FF) | (u16::from(value) << 8);
                self.t2_counter = i32::from(self.t2_latch);
                self.t2_reported = false;
                self.interrupts.clear_flag(T2);
            }
            0x0A => {
                self.sr = value;
                self.start_shift();
            }
            0x0B => self.acr = value,
            0x0C => {
                self.pcr = value;
                self.apply_output_modes(ports);
            }
            0x0D => self.interrupts.write_flags(value),
            0x0E => self.interrupts.write_enable(value),
            0x0F => {
                self.ora = value;
                ports.write_port_a(self.ora, self.ddra);
            }
            _ => {}
        }
    }

    /// Advance the VIA by `cycles` φ2 cycles.
    ///
    /// Any number of cycles may elapse in one call: a timer that passes its
    /// expiry point reports it once, however far past it the batch ends.
    pub fn advance<P: ViaPorts>(&mut self, ports: &mut P, cycles: u32) {
        if cycles == 0 {
            return;
        }
        self.end_pulses(ports);

        let elapsed = i64::from(cycles);
        self.advance_timer1(ports, elapsed);
        if self.acr & ACR_T2_PULSE_COUNT == 0 {
            self.advance_timer2(elapsed);
        }
        self.advance_shift(ports, elapsed);
    }

    /// Count one pulse on PB6. Only has an effect while timer 2 is in
    /// pulse-counting mode (ACR bit 5).
    pub fn count_pb6_pulse(&mut self) {
        if self.acr & ACR_T2_PULSE_COUNT == 0 {
            return;
        }
        self.t2_counter -= 1;
        if self.t2_counter == 0 && !self.t2_reported {
            self.interrupts.set_flag(T2);
            self.t2_reported = true;
        }
        if self.t2_counter < 0 {
            self.t2_counter += 0x1_0000;
        }
    }

    /// Set the CA1 input line.
    ///
    /// On the active edge (PCR bit 0: 1 = rising) the CA1 flag is set, port
    /// A is latched if ACR bit 0 is set, and CA2 returns high in handshake
    /// mode.
    pub fn set_ca1<P: ViaPorts>(&mut self, ports: &mut P, level: bool) {
        if level == self.ca1 {
            return;
        }
        if level == ca1_rising_edge(self.pcr) {
            if self.acr & ACR_PA_LATCH != 0 {
                self.ira = ports.read_port_a();
            }
            self.interrupts.set_flag(CA1);
            if Cx2Mode::ca2(self.pcr) == Cx2Mode::Handshake {
                self.ca2 = true;
            }
        }
        self.ca1 = level;
    }

    /// Set the CA2 line. Ignored while CA2 is an output, so the level the
    /// chip drives stays put.
    pub fn set_ca2(&mut self, level: bool) {
        let mode = Cx2Mode::ca2(self.pcr);
        if mode.is_output() || level == self.ca2 {
            return;
        }
        if level == mode.rising_edge() {
            self.interrupts.set_flag(CA2);
        }
        self.ca2 = level;
    }

    /// Set the CB1 input line.
    ///
    /// Active edge per PCR bit 4. Rising edges also clock the shift
    /// register when it is on the external clock.
    pub fn set_cb1<P: ViaPorts>(&mut self, ports: &mut P, level: bool) {
        if level == self.cb1 {
            return;
        }
        if level == cb1_rising_edge(self.pcr) {
            if self.acr & ACR_PB_LATCH != 0 {
                self.irb = ports.read_port_b();
            }
            self.interrupts.set_flag(CB1);
            if Cx2Mode::cb2(self.pcr) == Cx2Mode::Handshake {
                self.drive_cb2(ports, true);
            }
        }
        if level
            && ShiftMode::from_acr(self.acr).clock() == ShiftClock::External
            && self.sr_remaining > 0
        {
            self.shift_bit(ports);
        }
        self.cb1 = level;
    }

    /// Set the CB2 line.
    ///
    /// A rising edge always reaches [`ViaPorts::cb2_rising`], whatever the
    /// PCR says; the interrupt flag follows the usual input-mode rules.
    pub fn set_cb2<P: ViaPorts>(&mut self, ports: &mut P, level: bool) {
        if level == self.cb2 {
            return;
        }
        if level {
            ports.cb2_rising();
        }
        let mode = Cx2Mode::cb2(self.pcr);
        if !mode.is_output() && level == mode.rising_edge() {
            self.interrupts.set_flag(CB2);
        }
        self.cb2 = level;
    }

    /// Port A pins as driven by the chip (output bits only).
    #[must_use]
    pub fn port_a_output(&self) -> u8 {
        self.ora & self.ddra
    }

    /// Port B pins as driven by the chip, with PB7 taken from timer 1 when
    /// ACR bit 7 is set.
    #[must_use]
    pub fn port_b_output(&self) -> u8 {
        let out = self.orb & self.ddrb;
        self.with_pb7(out)
    }

    /// Get the interrupt flag and enable registers.
    #[must_use]
    pub fn interrupts(&self) -> Interrupts {
        self.interrupts
    }

    /// Get the ACR value.
    #[must_use]
    pub fn acr(&self) -> u8 {
        self.acr
    }

    /// Get the PCR value.
    #[must_use]
    pub fn pcr(&self) -> u8 {
        self.pcr
    }

    /// Timer 1 counter as the processor would read it.
    #[must_use]
    pub fn timer1_counter(&self) -> u16 {
        self.t1_counter as u16
    }

    /// Timer 2 counter as the processor would read it.
    #[must_use]
    pub fn timer2_counter(&self) -> u16 {
        self.t2_counter as u16
    }

    /// Get the shift register contents.
    #[must_use]
    pub fn shift_register(&self) -> u8 {
        self.sr
    }

    /// Get the CA2 level, driven or sampled.
    #[must_use]
    pub fn ca2(&self) -> bool {
        self.ca2
    }

    /// Get the CB2 level, driven or sampled.
    #[must_use]
    pub fn cb2(&self) -> bool {
        self.cb2
    }

    // --- Internal helpers ---

    fn read_port_a<P: ViaPorts>(&mut self, ports: &mut P) -> u8 {
        // The pins are sampled even when latching, so the machine sees the
        // access.
        let pins = ports.read_port_a();
        let input = if self.acr & ACR_PA_LATCH != 0 {
            self.ira
        } else {
            pins
        };
        (self.ora & self.ddra) | (input & !self.ddra)
    }

    fn read_port_b<P: ViaPorts>(&mut self, ports: &mut P) -> u8 {
        let input = if self.acr & ACR_PB_LATCH != 0 {
            self.irb
        } else {
            ports.read_port_b()
        };
        let value = (self.orb & self.ddrb) | (input & !self.ddrb);
        self.with_pb7(value)
    }

    fn with_pb7(&self, value: u8) -> u8 {
        if self.acr & ACR_T1_PB7 == 0 {
            return value;
        }
        (value & 0x7F) | if self.pb7 { 0x80 } else { 0 }
    }

    /// ORA access: clear CA1 (and CA2 unless independent), strobe CA2.
    fn port_a_handshake(&mut self) {
        let mode = Cx2Mode::ca2(self.pcr);
        let bits = if mode.is_independent() { CA1 } else { CA1 | CA2 };
        self.interrupts.clear_flag(bits);
        if mode.strobes_on_access() {
            self.ca2 = false;
            self.ca2_pulse = mode == Cx2Mode::Pulse;
        }
    }

    /// ORB access: clear CB1 (and CB2 unless independent).
    fn clear_port_b_flags(&mut self) {
        let bits = if Cx2Mode::cb2(self.pcr).is_independent() {
            CB1
        } else {
            CB1 | CB2
        };
        self.interrupts.clear_flag(bits);
    }

    /// Drive CB2 from inside the chip.
    fn drive_cb2<P: ViaPorts>(&mut self, ports: &mut P, level: bool) {
        if level && !self.cb2 {
            ports.cb2_rising();
        }
        self.cb2 = level;
    }

    /// PCR write: fixed-level outputs take effect at once, strobed outputs
    /// idle high.
    fn apply_output_modes<P: ViaPorts>(&mut self, ports: &mut P) {
        match Cx2Mode::ca2(self.pcr) {
            Cx2Mode::Low => self.ca2 = false,
            Cx2Mode::High | Cx2Mode::Handshake | Cx2Mode::Pulse => self.ca2 = true,
            _ => {}
        }
        self.ca2_pulse = false;

        match Cx2Mode::cb2(self.pcr) {
            Cx2Mode::Low => self.drive_cb2(ports, false),
            Cx2Mode::High | Cx2Mode::Handshake | Cx2Mode::Pulse => self.drive_cb2(ports, true),
            _ => {}
        }
        self.cb2_pulse = false;
    }

    fn end_pulses<P: ViaPorts>(&mut self, ports: &mut P) {
        if self.ca2_pulse {
            self.ca2_pulse = false;
            self.ca2 = true;
        }
        if self.cb2_pulse {
            self.cb2_pulse = false;
            self.drive_cb2(ports, true);
        }
    }

    fn advance_timer1<P: ViaPorts>(&mut self, ports: &mut P, elapsed: i64) {
        let mut counter = i64::from(self.t1_counter) - elapsed;
        if counter >= EXPIRED_BELOW {
            self.t1_counter = counter as i32;
            return;
        }

        // Reload as many whole periods as the batch overshot
        let period = i64::from(self.t1_latch) + RELOAD_OVERHEAD;
        let overshoot = EXPIRED_BELOW - counter;
        let periods = (overshoot + period - 1) / period;
        counter += periods * period;
        self.t1_counter = counter as i32;

        let continuous = self.acr & ACR_T1_CONTINUOUS != 0;
        if !self.t1_reported {
            // One-shot mode reports only the first expiry of a load
            let expiries = if continuous { periods } else { 1 };
            self.interrupts.set_flag(T1);
            if self.acr & ACR_T1_PB7 != 0 && expiries % 2 == 1 {
                self.pb7 = !self.pb7;
            }
            for _ in 0..expiries {
                ports.timer1_expired();
            }
        }
        if !continuous {
            self.t1_reported = true;
        }
    }

    fn advance_timer2(&mut self, elapsed: i64) {
        let counter = i64::from(self.t2_counter) - elapsed;
        if counter >= EXPIRED_BELOW {
            self.t2_counter = counter as i32;
            return;
        }
        if !self.t2_reported {
            self.interrupts.set_flag(T2);
            self.t2_reported = true;
        }
        // Keeps counting down from 0xFFFF
        self.t2_counter = counter.rem_euclid(0x1_0000) as i32;
    }

    /// SR access: clear the flag and start a new 8-bit shift.
    fn start_shift(&mut self) {
        self.interrupts.clear_flag(SR);
        if ShiftMode::from_acr(self.acr) == ShiftMode::Disabled {
            self.sr_remaining = 0;
        } else {
            self.sr_remaining = 8;
            self.sr_divider = self.shift_period();
        }
    }

    fn shift_period(&self) -> i32 {
        i32::from(self.t2_latch & 0x00FF) + 2
    }

    fn advance_shift<P: ViaPorts>(&mut self, ports: &mut P, elapsed: i64) {
        if self.sr_remaining == 0 {
            return;
        }
        let mode = ShiftMode::from_acr(self.acr);
        let shifts = match mode.clock() {
            ShiftClock::Phi2 => elapsed.min(i64::from(self.sr_remaining)),
            ShiftClock::Timer2 => {
                let period = i64::from(self.shift_period());
                let divider = i64::from(self.sr_divider) - elapsed;
                if divider > 0 {
                    self.sr_divider = divider as i32;
                    0
                } else {
                    let shifts = 1 + (-divider) / period;
                    self.sr_divider = (period - (-divider) % period) as i32;
                    shifts
                }
            }
            ShiftClock::External | ShiftClock::None => 0,
        };

        // A recirculating register repeats every 8 shifts
        let shifts = if mode.is_free_running() && shifts > 16 {
            8 + shifts % 8
        } else {
            shifts
        };
        for _ in 0..shifts {
            if self.sr_remaining == 0 {
                break;
            }
            self.shift_bit(ports);
        }
    }

    fn shift_bit<P: ViaPorts>(&mut self, ports: &mut P) {
        debug_assert!(self.sr_remaining > 0);
        let mode = ShiftMode::from_acr(self.acr);
        if mode.is_output() {
            let out = self.sr & 0x80 != 0;
            self.sr = self.sr.rotate_left(1);
            self.drive_cb2(ports, out);
        } else {
            self.sr = (self.sr << 1) | u8::from(self.cb2);
        }

        self.sr_remaining -= 1;
        if self.sr_remaining == 0 {
            if mode.is_free_running() {
                self.sr_remaining = 8;
            } else {
                self.interrupts.set_flag(SR);
            }
        }
    }
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new(DEFAULT_IRQ_SOURCE)
    }
}

impl Observable for Via6522 {
    fn query(&self, path: &str) -> Option<Value> {
        let value = match path {
            "ora" => self.ora.into(),
            "orb" => self.orb.into(),
            "ira" => self.ira.into(),
            "irb" => self.irb.into(),
            "ddra" => self.ddra.into(),
            "ddrb" => self.ddrb.into(),
            "acr" => self.acr.into(),
            "pcr" => self.pcr.into(),
            "ifr" => self.interrupts.read_flags().into(),
            "ier" => self.interrupts.read_enable().into(),
            "irq" => self.irq().into(),
            "t1.latch" => self.t1_latch.into(),
            "t1.counter" => self.t1_counter.into(),
            "t1.reported" => self.t1_reported.into(),
            "t1.pb7" => self.pb7.into(),
            "t2.latch" => self.t2_latch.into(),
            "t2.counter" => self.t2_counter.into(),
            "t2.reported" => self.t2_reported.into(),
            "sr" => self.sr.into(),
            "sr.remaining" => self.sr_remaining.into(),
            "sr.mode" => ShiftMode::from_acr(self.acr).name().into(),
            "ca1" => self.ca1.into(),
            "ca2" => self.ca2.into(),
            "cb1" => self.cb1.into(),
            "cb2" => self.cb2.into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "ora",
            "orb",
            "ira",
            "irb",
            "ddra",
            "ddrb",
            "acr",
            "pcr",
            "ifr",
            "ier",
            "irq",
            "t1.latch",
            "t1.counter",
            "t1.reported",
            "t1.pb7",
            "t2.latch",
            "t2.counter",
            "t2.reported",
            "sr",
            "sr.remaining",
            "sr.mode",
            "ca1",
            "ca2",
            "cb1",
            "cb2",
        ]
    }
}
