//! Memory-mapped device interface.

/// A device the processor reaches through memory-mapped addresses.
///
/// The machine's address decoder picks the device; the device sees the full
/// 16-bit address and decodes its own register select lines from it.
pub trait Bus {
    /// Read a byte from the given address. Reads may have side effects
    /// (clearing interrupt flags, strobing handshake lines).
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}
