//! Machine-wide interrupt request lines.

/// Wired-OR of the IRQ outputs of every interrupt source in a machine.
///
/// Each source owns one bit (its source id). The processor sees an
/// interrupt while any bit is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptLines(u8);

impl InterruptLines {
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Drive the line(s) owned by `source` to `level`.
    pub fn update(&mut self, source: u8, level: bool) {
        if level {
            self.0 |= source;
        } else {
            self.0 &= !source;
        }
    }

    /// Bitmask of sources currently asserting.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if `source` is asserting.
    #[must_use]
    pub const fn is_asserted(self, source: u8) -> bool {
        self.0 & source != 0
    }

    /// True if any source is asserting.
    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }
}
