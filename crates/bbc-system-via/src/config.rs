//! System VIA configuration.

use std::fmt;

/// Interrupt source bit the System VIA owns on the Model B.
pub const SYSTEM_VIA_IRQ: u8 = 0x01;

/// Configuration for constructing a System VIA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemViaConfig {
    /// Bit in the machine-wide interrupt mask. Must be exactly one bit.
    pub irq_source: u8,
    /// Keyboard link (DIP switch) settings, read through keyboard row 0.
    /// Bit 7 is the link on column 2, bit 0 the link on column 9.
    pub keyboard_links: u8,
}

impl SystemViaConfig {
    /// Check the configuration before it is used to build a chip.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.irq_source.count_ones() != 1 {
            return Err(ConfigError::InvalidIrqSource(self.irq_source));
        }
        Ok(())
    }
}

impl Default for SystemViaConfig {
    fn default() -> Self {
        Self {
            irq_source: SYSTEM_VIA_IRQ,
            keyboard_links: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The interrupt source id must select a single bit.
    InvalidIrqSource(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIrqSource(bits) => write!(
                f,
                "invalid interrupt source {bits:#04x}: expected exactly one bit set"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
