//! Decoding of the PCR (control lines) and ACR (timers, shift register).

/// CA2/CB2 operating mode, PCR bits 3-1 (CA2) or 7-5 (CB2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cx2Mode {
    /// Input, interrupt on falling edge; cleared by port access.
    InputNegative,
    /// Input, interrupt on falling edge; port access leaves the flag alone.
    IndependentNegative,
    /// Input, interrupt on rising edge; cleared by port access.
    InputPositive,
    /// Input, interrupt on rising edge; port access leaves the flag alone.
    IndependentPositive,
    /// Output, low on port access, high on the next Cx1 active edge.
    Handshake,
    /// Output, low for one cycle after port access.
    Pulse,
    /// Output, held low.
    Low,
    /// Output, held high.
    High,
}

impl Cx2Mode {
    #[must_use]
    pub const fn ca2(pcr: u8) -> Self {
        Self::from_bits(pcr >> 1)
    }

    #[must_use]
    pub const fn cb2(pcr: u8) -> Self {
        Self::from_bits(pcr >> 5)
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::InputNegative,
            1 => Self::IndependentNegative,
            2 => Self::InputPositive,
            3 => Self::IndependentPositive,
            4 => Self::Handshake,
            5 => Self::Pulse,
            6 => Self::Low,
            _ => Self::High,
        }
    }

    /// The chip drives the line.
    #[must_use]
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Handshake | Self::Pulse | Self::Low | Self::High)
    }

    /// Port access does not clear the Cx2 flag.
    #[must_use]
    pub const fn is_independent(self) -> bool {
        matches!(self, Self::IndependentNegative | Self::IndependentPositive)
    }

    /// Input mode triggers on the rising edge.
    #[must_use]
    pub const fn rising_edge(self) -> bool {
        matches!(self, Self::InputPositive | Self::IndependentPositive)
    }

    /// Port access pulls the line low.
    #[must_use]
    pub const fn strobes_on_access(self) -> bool {
        matches!(self, Self::Handshake | Self::Pulse)
    }
}

/// CA1 triggers on the rising edge (PCR bit 0).
#[must_use]
pub const fn ca1_rising_edge(pcr: u8) -> bool {
    pcr & 0x01 != 0
}

/// CB1 triggers on the rising edge (PCR bit 4).
#[must_use]
pub const fn cb1_rising_edge(pcr: u8) -> bool {
    pcr & 0x10 != 0
}

/// ACR bit 0: latch port A inputs on CA1 active edge.
pub const ACR_PA_LATCH: u8 = 0x01;
/// ACR bit 1: latch port B inputs on CB1 active edge.
pub const ACR_PB_LATCH: u8 = 0x02;
/// ACR bit 5: timer 2 counts PB6 pulses instead of cycles.
pub const ACR_T2_PULSE_COUNT: u8 = 0x20;
/// ACR bit 6: timer 1 continuous (free-run) mode.
pub const ACR_T1_CONTINUOUS: u8 = 0x40;
/// ACR bit 7: timer 1 drives PB7.
pub const ACR_T1_PB7: u8 = 0x80;

/// Shift register mode, ACR bits 4-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftMode {
    Disabled,
    InT2,
    InPhi2,
    InCb1,
    OutFreeT2,
    OutT2,
    OutPhi2,
    OutCb1,
}

/// Where the shift clock comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftClock {
    /// No shifting.
    None,
    /// One bit every (T2 latch low + 2) cycles.
    Timer2,
    /// One bit per cycle.
    Phi2,
    /// One bit per CB1 rising edge.
    External,
}

impl ShiftMode {
    #[must_use]
    pub const fn from_acr(acr: u8) -> Self {
        match (acr >> 2) & 0x07 {
            0 => Self::Disabled,
            1 => Self::InT2,
            2 => Self::InPhi2,
            3 => Self::InCb1,
            4 => Self::OutFreeT2,
            5 => Self::OutT2,
            6 => Self::OutPhi2,
            _ => Self::OutCb1,
        }
    }

    #[must_use]
    pub const fn clock(self) -> ShiftClock {
        match self {
            Self::Disabled => ShiftClock::None,
            Self::InT2 | Self::OutFreeT2 | Self::OutT2 => ShiftClock::Timer2,
            Self::InPhi2 | Self::OutPhi2 => ShiftClock::Phi2,
            Self::InCb1 | Self::OutCb1 => ShiftClock::External,
        }
    }

    /// Short name for logs and state dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::InT2 => "in-t2",
            Self::InPhi2 => "in-phi2",
            Self::InCb1 => "in-cb1",
            Self::OutFreeT2 => "out-free-t2",
            Self::OutT2 => "out-t2",
            Self::OutPhi2 => "out-phi2",
            Self::OutCb1 => "out-cb1",
        }
    }

    /// Data leaves on CB2 rather than arriving from it.
    #[must_use]
    pub const fn is_output(self) -> bool {
        matches!(
            self,
            Self::OutFreeT2 | Self::OutT2 | Self::OutPhi2 | Self::OutCb1
        )
    }

    /// Recirculates forever without raising the SR interrupt.
    #[must_use]
    pub const fn is_free_running(self) -> bool {
        matches!(self, Self::OutFreeT2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcr_fields_decode_independently() {
        // CB2 high output, CB1 rising, CA2 independent falling, CA1 falling
        let pcr = 0b1111_0010;
        assert_eq!(Cx2Mode::cb2(pcr), Cx2Mode::High);
        assert!(cb1_rising_edge(pcr));
        assert_eq!(Cx2Mode::ca2(pcr), Cx2Mode::IndependentNegative);
        assert!(!ca1_rising_edge(pcr));
    }

    #[test]
    fn shift_modes_from_acr() {
        assert_eq!(ShiftMode::from_acr(0x00), ShiftMode::Disabled);
        assert_eq!(ShiftMode::from_acr(0x08), ShiftMode::InPhi2);
        assert_eq!(ShiftMode::from_acr(0x10).clock(), ShiftClock::Timer2);
        assert!(ShiftMode::from_acr(0x10).is_free_running());
        assert!(ShiftMode::from_acr(0x1C).is_output());
        assert_eq!(ShiftMode::from_acr(0x1C).clock(), ShiftClock::External);
        // Timer bits don't leak into the shift field
        assert_eq!(ShiftMode::from_acr(0xE3), ShiftMode::Disabled);
    }
}
