//! DS1302 register map and trickle charge control register encoding.

/// Number of battery-backed RAM bytes.
pub const RAM_SIZE: u8 = 31;

// RAM read and write command addresses are interleaved, so logical byte `n`
// lives at RAM_START + n * 2.
pub(crate) const RAM_END: u8 = 0xFD;

pub(crate) const CLOCK_HALT_BIT: u8 = 0x80;
pub(crate) const WRITE_PROTECT_BIT: u8 = 0x80;
pub(crate) const HOUR_12_BIT: u8 = 0x80;
pub(crate) const HOUR_PM_BIT: u8 = 0x20;

/// Register (write) command addresses. Read commands are formed by or-ing
/// [`READ_FLAG`](crate::threewire::READ_FLAG) into the command byte.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    SECONDS,
    MINUTES,
    HOURS,
    DATE,
    MONTH,
    DAY,
    YEAR,
    WP,
    TCR,
    CLKBURST,
    RAMSTART,
    RAMBURST,
}

impl Register {
    pub fn addr(self) -> u8 {
        match self {
            Self::SECONDS => 0x80,
            Self::MINUTES => 0x82,
            Self::HOURS => 0x84,
            Self::DATE => 0x86,
            Self::MONTH => 0x88,
            Self::DAY => 0x8A,
            Self::YEAR => 0x8C,
            Self::WP => 0x8E,
            Self::TCR => 0x90,
            Self::CLKBURST => 0xBE,
            Self::RAMSTART => 0xC0,
            Self::RAMBURST => 0xFE,
        }
    }
}

/// Physical command address of logical RAM byte `logical`, or `None` when
/// the index falls outside the 31-byte region.
pub(crate) fn ram_address(logical: u8) -> Option<u8> {
    let physical = Register::RAMSTART.addr() as u16 + logical as u16 * 2;
    if physical <= RAM_END as u16 {
        Some(physical as u8)
    } else {
        None
    }
}

const RESISTOR_MASK: u8 = 0b0000_0011;
const DIODES_MASK: u8 = 0b0000_1100;
const STATUS_MASK: u8 = 0b1111_0000;

/// Canonical "charger off" value: status disabled, diodes disabled,
/// resistor disabled.
pub const TCR_DISABLED: u8 = 0b0101_1100;

/// Charge path resistor, bits 0-1 of the trickle charge register.
/// The maximum charge current is (Vcc - diode drop) / R.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcrResistor {
    Disabled,
    Ohm2k,
    Ohm4k,
    Ohm8k,
}

impl TcrResistor {
    pub fn bits(self) -> u8 {
        match self {
            Self::Disabled => 0b00,
            Self::Ohm2k => 0b01,
            Self::Ohm4k => 0b10,
            Self::Ohm8k => 0b11,
        }
    }

    pub fn from_bits(byte: u8) -> Self {
        match byte & RESISTOR_MASK {
            0b01 => Self::Ohm2k,
            0b10 => Self::Ohm4k,
            0b11 => Self::Ohm8k,
            _ => Self::Disabled,
        }
    }
}

/// Diode count, bits 2-3. One diode drops 0.7 V, two drop 1.4 V.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcrDiodes {
    None,
    One,
    Two,
    Disabled,
}

impl TcrDiodes {
    pub fn bits(self) -> u8 {
        match self {
            Self::None => 0b0000,
            Self::One => 0b0100,
            Self::Two => 0b1000,
            Self::Disabled => 0b1100,
        }
    }

    pub fn from_bits(byte: u8) -> Self {
        match byte & DIODES_MASK {
            0b0100 => Self::One,
            0b1000 => Self::Two,
            0b1100 => Self::Disabled,
            _ => Self::None,
        }
    }
}

/// Charger status, bits 4-7. Only the exact pattern 1010 enables charging;
/// every other pattern reads back as disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TcrStatus {
    Enabled,
    Disabled,
}

impl TcrStatus {
    pub fn bits(self) -> u8 {
        match self {
            Self::Enabled => 0b1010_0000,
            Self::Disabled => 0b0101_0000,
        }
    }

    pub fn from_bits(byte: u8) -> Option<Self> {
        match byte & STATUS_MASK {
            0b1010_0000 => Some(Self::Enabled),
            0b0101_0000 => Some(Self::Disabled),
            _ => None,
        }
    }
}

/// Decoded trickle charge control register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrickleCharger {
    pub status: TcrStatus,
    pub diodes: TcrDiodes,
    pub resistor: TcrResistor,
}

impl TrickleCharger {
    pub fn pack(&self) -> u8 {
        self.status.bits() | self.diodes.bits() | self.resistor.bits()
    }

    /// Splits a register byte into its three sub-fields. `None` when the
    /// status bits hold neither valid pattern.
    pub fn unpack(setting: u8) -> Option<Self> {
        Some(TrickleCharger {
            status: TcrStatus::from_bits(setting)?,
            diodes: TcrDiodes::from_bits(setting),
            resistor: TcrResistor::from_bits(setting),
        })
    }

    /// True only for settings the chip will actually charge with.
    pub fn is_charging(&self) -> bool {
        self.status == TcrStatus::Enabled
            && matches!(self.diodes, TcrDiodes::One | TcrDiodes::Two)
            && self.resistor != TcrResistor::Disabled
    }

    /// A setting with any sub-field in a disabled or invalid state collapses
    /// to [`TCR_DISABLED`]. There is no partial-field correction.
    pub fn normalize(setting: u8) -> u8 {
        match Self::unpack(setting) {
            Some(tc) if tc.is_charging() => setting,
            _ => TCR_DISABLED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_mapping_is_interleaved_and_bounded() {
        let mut previous = 0;
        for logical in 0..RAM_SIZE {
            let physical = ram_address(logical).unwrap();
            assert_eq!(physical as u16, logical as u16 * 2 + 0xC0);
            assert!(physical <= RAM_END);
            if logical > 0 {
                assert!(physical > previous);
            }
            previous = physical;
        }
        assert_eq!(ram_address(RAM_SIZE), None);
        assert_eq!(ram_address(0xFF), None);
    }

    #[test]
    fn valid_charge_setting_passes_through() {
        let setting = TrickleCharger {
            status: TcrStatus::Enabled,
            diodes: TcrDiodes::One,
            resistor: TcrResistor::Ohm2k,
        }
        .pack();
        assert_eq!(setting, 0xA5);
        assert_eq!(TrickleCharger::normalize(setting), 0xA5);
    }

    #[test]
    fn disabled_or_no_diodes_forces_canonical_disabled() {
        // Diode sub-field disabled or none wins over any resistor/status.
        for status in [0xA0, 0x50, 0x00, 0xF0] {
            for resistor in 0..=3 {
                assert_eq!(TrickleCharger::normalize(status | 0b1100 | resistor), TCR_DISABLED);
                assert_eq!(TrickleCharger::normalize(status | 0b0000 | resistor), TCR_DISABLED);
            }
        }
    }

    #[test]
    fn disabled_resistor_forces_canonical_disabled() {
        assert_eq!(TrickleCharger::normalize(0xA4), TCR_DISABLED);
    }

    #[test]
    fn bad_status_pattern_forces_canonical_disabled() {
        for status in (0u8..=0xF0).step_by(0x10) {
            if status == 0xA0 {
                continue;
            }
            assert_eq!(TrickleCharger::normalize(status | 0x05), TCR_DISABLED);
        }
    }

    #[test]
    fn pack_unpack_round_trip() {
        let tc = TrickleCharger {
            status: TcrStatus::Enabled,
            diodes: TcrDiodes::Two,
            resistor: TcrResistor::Ohm8k,
        };
        assert_eq!(TrickleCharger::unpack(tc.pack()), Some(tc));
        assert_eq!(TrickleCharger::unpack(TCR_DISABLED).map(|t| t.is_charging()), Some(false));
    }
}
