//! DS1302 real time clock-calendar platform agnostic driver
//!
//! # About
//!
//! The DS1302 trickle-charge timekeeping chip contains a real-time clock/calendar
//! and 31 bytes of static RAM. It communicates with a microprocessor via a simple
//! serial interface. The real-time clock/calendar provides seconds, minutes, hours,
//! day, date, month, and year information. The end of the month date is
//! automatically adjusted for months with fewer than 31 days, including corrections
//! for leap year.
//!
//! Datasheet: [DS1302](https://datasheets.maximintegrated.com/en/ds/DS1302.pdf)
//!
//! ## Driver features:
//! - Reading/setting clock and calendar data in one burst
//! - Clock-halt and write-protect control
//! - Programmable Trickle Charger configuration
//! - 31 x 8 Battery-Backed General-Purpose RAM operations
//! - Formatting a read timestamp with PHP-style date patterns
//!
//! The driver is generic over a [`ThreeWire`] bus so it runs against any
//! transport that can frame the chip's transactions. Enable the `rp2040` or
//! `rp2350` feature for a ready-made bit-banged bus over SIO pins
//! (`threewire::SoftThreeWire`).
//!
//! The chip stores 24-hour time only through this driver; hours registers
//! written elsewhere in 12-hour mode are still decoded correctly on read.

#![no_std]
#![allow(non_camel_case_types)]

#[cfg(all(feature = "rp2040", feature = "rp2350"))]
compile_error!("You must not enable both the `rp2040` and `rp2350` Cargo features.");

mod datetime;
mod registers;
pub mod threewire;

pub use crate::datetime::{day_in_year, days_in_month, hour12, is_leap_year, DateTime};
pub use crate::registers::{
    Register, TcrDiodes, TcrResistor, TcrStatus, TrickleCharger, RAM_SIZE, TCR_DISABLED,
};
pub use crate::threewire::{ThreeWire, READ_FLAG};

use crate::datetime::{bcd_to_decimal, bcd_to_hour24, decimal_to_bcd, dow_to_chip};
use crate::registers::{ram_address, CLOCK_HALT_BIT, WRITE_PROTECT_BIT};

/// DS1302 driver over a 3-wire bus `W`.
///
/// Holds no state besides the bus: every operation reads from or writes to
/// the chip directly, and bus errors propagate out of every call as
/// `W::Error`.
pub struct Ds1302<W> {
    wire: W,
}

impl<W> Ds1302<W>
where
    W: ThreeWire,
{
    /// Wraps an exclusive handle to the bus. No transaction is issued here.
    pub fn new(wire: W) -> Self {
        Ds1302 { wire }
    }

    /// Releases the bus.
    pub fn free(self) -> W {
        self.wire
    }

    fn get_reg(&mut self, reg: u8) -> Result<u8, W::Error> {
        self.wire.begin_transmission(reg | READ_FLAG)?;
        let value = self.wire.read()?;
        self.wire.end_transmission()?;
        Ok(value)
    }

    fn set_reg(&mut self, reg: u8, value: u8) -> Result<(), W::Error> {
        self.wire.begin_transmission(reg)?;
        self.wire.write(value)?;
        self.wire.end_transmission()
    }

    /// Whether the write-protect bit is set. While set, the chip ignores
    /// every register write except one clearing this bit.
    pub fn is_write_protected(&mut self) -> Result<bool, W::Error> {
        let wp = self.get_reg(Register::WP.addr())?;
        Ok(wp & WRITE_PROTECT_BIT != 0)
    }

    /// Sets or clears the write-protect bit, leaving the rest of the
    /// register untouched.
    pub fn set_write_protected(&mut self, protect: bool) -> Result<(), W::Error> {
        let mut wp = self.get_reg(Register::WP.addr())?;
        if protect {
            wp |= WRITE_PROTECT_BIT;
        } else {
            wp &= !WRITE_PROTECT_BIT;
        }
        self.set_reg(Register::WP.addr(), wp)
    }

    /// Whether the oscillator is running (clock-halt bit clear).
    pub fn is_running(&mut self) -> Result<bool, W::Error> {
        let seconds = self.get_reg(Register::SECONDS.addr())?;
        Ok(seconds & CLOCK_HALT_BIT == 0)
    }

    /// Starts or halts the oscillator without touching the seconds value.
    pub fn set_running(&mut self, run: bool) -> Result<(), W::Error> {
        let mut seconds = self.get_reg(Register::SECONDS.addr())?;
        if run {
            seconds &= !CLOCK_HALT_BIT;
        } else {
            seconds |= CLOCK_HALT_BIT;
        }
        self.set_reg(Register::SECONDS.addr(), seconds)
    }

    /// Reads the full time/date burst and decodes it.
    pub fn get_datetime(&mut self) -> Result<DateTime, W::Error> {
        self.wire
            .begin_transmission(Register::CLKBURST.addr() | READ_FLAG)?;
        let second = bcd_to_decimal(self.wire.read()? & !CLOCK_HALT_BIT);
        let minute = bcd_to_decimal(self.wire.read()?);
        let hour = bcd_to_hour24(self.wire.read()?);
        let day = bcd_to_decimal(self.wire.read()?);
        let month = bcd_to_decimal(self.wire.read()?);
        let day_of_week = bcd_to_decimal(self.wire.read()?);
        let year = 2000 + bcd_to_decimal(self.wire.read()?) as u16;
        self.wire.read()?; // trailing write-protect byte
        self.wire.end_transmission()?;

        Ok(DateTime::new(
            year,
            month,
            day,
            hour,
            minute,
            second,
            day_of_week,
        ))
    }

    /// Writes the full time/date burst, 24-hour mode.
    ///
    /// A `day_of_week` of 0 (Sunday-first convention) is translated to the
    /// chip's Monday-indexed 7. The burst covers the write-protect register
    /// too; the chip ignores the whole write while protected.
    pub fn set_datetime(&mut self, dt: &DateTime) -> Result<(), W::Error> {
        self.wire.begin_transmission(Register::CLKBURST.addr())?;
        self.wire.write(decimal_to_bcd(dt.second))?;
        self.wire.write(decimal_to_bcd(dt.minute))?;
        self.wire.write(decimal_to_bcd(dt.hour))?;
        self.wire.write(decimal_to_bcd(dt.day))?;
        self.wire.write(decimal_to_bcd(dt.month))?;
        self.wire.write(decimal_to_bcd(dow_to_chip(dt.day_of_week)))?;
        let year = if dt.year < 2000 { 0 } else { dt.year - 2000 };
        self.wire.write(decimal_to_bcd(year as u8))?;
        self.wire.write(0)?;
        self.wire.end_transmission()
    }

    /// Whether the clock is running and the decoded fields fall inside
    /// calendar range. A dead or absent chip fails this.
    pub fn is_datetime_valid(&mut self) -> Result<bool, W::Error> {
        Ok(self.is_running()? && self.get_datetime()?.is_valid())
    }

    /// Raw trickle charge control register.
    pub fn trickle_charge_settings(&mut self) -> Result<u8, W::Error> {
        self.get_reg(Register::TCR.addr())
    }

    /// Writes a trickle charge setting, normalizing any byte with a
    /// disabled or invalid sub-field to [`TCR_DISABLED`] first.
    pub fn set_trickle_charge_settings(&mut self, setting: u8) -> Result<(), W::Error> {
        self.set_reg(Register::TCR.addr(), TrickleCharger::normalize(setting))
    }

    /// Enables trickle charging through the given diode/resistor path.
    /// The maximum charge current is (Vcc - diode drop) / R.
    pub fn enable_trickle_charge(
        &mut self,
        diodes: TcrDiodes,
        resistor: TcrResistor,
    ) -> Result<(), W::Error> {
        let tc = TrickleCharger {
            status: TcrStatus::Enabled,
            diodes,
            resistor,
        };
        self.set_trickle_charge_settings(tc.pack())
    }

    /// Disables trickle charging.
    pub fn disable_trickle_charge(&mut self) -> Result<(), W::Error> {
        self.set_reg(Register::TCR.addr(), TCR_DISABLED)
    }

    /// Whether the charger register holds a setting the chip charges with.
    pub fn is_trickle_charging(&mut self) -> Result<bool, W::Error> {
        let setting = self.trickle_charge_settings()?;
        Ok(TrickleCharger::unpack(setting).is_some_and(|tc| tc.is_charging()))
    }

    /// Reads one RAM byte by its logical address 0..=30. Out-of-range
    /// addresses read as 0 without touching the bus.
    pub fn get_memory(&mut self, address: u8) -> Result<u8, W::Error> {
        match ram_address(address) {
            Some(reg) => self.get_reg(reg),
            None => Ok(0),
        }
    }

    /// Writes one RAM byte by its logical address 0..=30. Out-of-range
    /// addresses are silently ignored.
    pub fn set_memory(&mut self, address: u8, value: u8) -> Result<(), W::Error> {
        match ram_address(address) {
            Some(reg) => self.set_reg(reg, value),
            None => Ok(()),
        }
    }

    /// Fills `buf` from RAM in one burst, starting at logical address 0.
    /// At most [`RAM_SIZE`] bytes transfer; returns how many did.
    pub fn read_memory(&mut self, buf: &mut [u8]) -> Result<usize, W::Error> {
        let count = buf.len().min(RAM_SIZE as usize);
        self.wire
            .begin_transmission(Register::RAMBURST.addr() | READ_FLAG)?;
        for slot in buf[..count].iter_mut() {
            *slot = self.wire.read()?;
        }
        self.wire.end_transmission()?;
        Ok(count)
    }

    /// Writes `buf` to RAM in one burst, starting at logical address 0.
    /// At most [`RAM_SIZE`] bytes transfer; returns how many did.
    pub fn write_memory(&mut self, buf: &[u8]) -> Result<usize, W::Error> {
        let count = buf.len().min(RAM_SIZE as usize);
        self.wire.begin_transmission(Register::RAMBURST.addr())?;
        for byte in &buf[..count] {
            self.wire.write(*byte)?;
        }
        self.wire.end_transmission()?;
        Ok(count)
    }
}
