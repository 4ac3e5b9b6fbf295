//! The machine side of the chip's ports.

/// Machine-specific wiring of a 6522.
///
/// The chip calls back into this on every port access and on the two
/// machine hooks. The implementation is passed in explicitly on every call
/// that can reach it, so the machine owns both the chip and its wiring
/// without either referring back to the other.
pub trait ViaPorts {
    /// Sample the port A pins.
    fn read_port_a(&mut self) -> u8;

    /// Sample the port B pins.
    fn read_port_b(&mut self) -> u8;

    /// ORA or DDRA changed. `value` is the output register; `ddr` marks
    /// which of its bits are actually driven.
    fn write_port_a(&mut self, value: u8, ddr: u8);

    /// ORB or DDRB changed.
    fn write_port_b(&mut self, value: u8, ddr: u8);

    /// CB2 went from low to high, whoever drove it.
    fn cb2_rising(&mut self) {}

    /// Timer 1 expired and raised its interrupt flag.
    fn timer1_expired(&mut self) {}
}
