//! Date/time value object, calendar arithmetic and pattern formatting.
//!
//! The chip stores a two-digit year, so all calendar math is relative to
//! 2000-01-01 and only has to hold up until 2099. The leap year test is the
//! chip's own `year % 4 == 0` shortcut, which misclassifies century years
//! outside that window (2100 counts as leap). It is kept on purpose so the
//! driver agrees with what the hardware does to the end-of-month rollover.

use core::fmt::{self, Write};

use crate::registers::{HOUR_12_BIT, HOUR_PM_BIT};

static DAYS_IN_MONTH_TABLE: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

// Seconds between the Unix epoch and the chip epoch 2000-01-01.
const CHIP_EPOCH_OFFSET: u32 = 946_681_200;

/// One decoded time/date register burst.
///
/// `day_of_week` uses the chip's convention, 1 = Monday through 7 = Sunday.
/// `unixtime` is derived from the other fields at construction; fields are
/// only meaningful after a successful register read, no range validation
/// happens on the way in (see [`DateTime::is_valid`]).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub day_of_week: u8,
    pub unixtime: u32,
}

impl DateTime {
    /// Builds a timestamp with the epoch seconds derived from the fields.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        day_of_week: u8,
    ) -> Self {
        let unixtime = time_to_seconds(date_to_days(year, month, day), hour, minute, second)
            .wrapping_add(CHIP_EPOCH_OFFSET);
        DateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            day_of_week,
            unixtime,
        }
    }

    /// Whether every field sits inside its calendar range. A device that
    /// never answered yields garbage fields, which this catches.
    pub fn is_valid(&self) -> bool {
        self.month >= 1
            && self.month <= 12
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Renders the timestamp following `pattern`.
    ///
    /// Each recognized token is replaced by the matching field, any other
    /// character is copied through literally:
    ///
    /// | token | meaning |
    /// |-------|---------|
    /// | `d` / `j` | day of month, zero-padded / bare |
    /// | `l` / `D` | weekday name, full / 3 letters |
    /// | `N` / `w` | weekday number 1-7 (Monday first) / 0-6 (Sunday first) |
    /// | `z` | day of the year |
    /// | `S` | English ordinal suffix of the day |
    /// | `m` / `n` | month, zero-padded / bare |
    /// | `F` / `M` | month name, full / 3 letters |
    /// | `t` | days in the month |
    /// | `Y` / `y` | year, four / two digits |
    /// | `L` | leap year flag, 0 or 1 |
    /// | `H` / `G` | 24-hour hour, zero-padded / bare |
    /// | `h` / `g` | 12-hour hour, zero-padded / bare |
    /// | `A` / `a` | AM/PM, upper / lower case |
    /// | `i` | minutes, zero-padded |
    /// | `s` | seconds, zero-padded |
    /// | `U` | Unix epoch seconds |
    ///
    /// The sink bounds the output: a fixed-capacity writer such as
    /// `heapless::String<N>` reports `fmt::Error` once full, and `N` must
    /// cover the worst-case expansion of the pattern (the longest single
    /// substitution is a full month or weekday name, 9 characters).
    pub fn format<W: Write>(&self, pattern: &str, out: &mut W) -> fmt::Result {
        for token in pattern.chars() {
            match token {
                // Day
                'd' => write!(out, "{:02}", self.day)?,
                'j' => write!(out, "{}", self.day)?,
                'l' => out.write_str(day_of_week_name(self.day_of_week))?,
                'D' => out.write_str(&day_of_week_name(self.day_of_week)[..3])?,
                'N' => write!(out, "{}", self.day_of_week)?,
                'w' => write!(out, "{}", (self.day_of_week + 7) % 7)?,
                'z' => write!(out, "{}", day_in_year(self.year, self.month, self.day))?,
                'S' => out.write_str(day_suffix(self.day))?,
                // Month
                'm' => write!(out, "{:02}", self.month)?,
                'n' => write!(out, "{}", self.month)?,
                'F' => out.write_str(month_name(self.month))?,
                'M' => out.write_str(&month_name(self.month)[..3])?,
                't' => write!(out, "{}", days_in_month(self.year, self.month))?,
                // Year
                'Y' => write!(out, "{}", self.year)?,
                'y' => write!(out, "{:02}", self.year.saturating_sub(2000))?,
                'L' => write!(out, "{}", is_leap_year(self.year) as u8)?,
                // Hour
                'H' => write!(out, "{:02}", self.hour)?,
                'G' => write!(out, "{}", self.hour)?,
                'h' => write!(out, "{:02}", hour12(self.hour))?,
                'g' => write!(out, "{}", hour12(self.hour))?,
                'A' => out.write_str(am_pm(self.hour, true))?,
                'a' => out.write_str(am_pm(self.hour, false))?,
                // Minute, second
                'i' => write!(out, "{:02}", self.minute)?,
                's' => write!(out, "{:02}", self.second)?,
                // Misc
                'U' => write!(out, "{}", self.unixtime)?,
                other => out.write_char(other)?,
            }
        }
        Ok(())
    }
}

/// The chip's leap test. Not a full Gregorian rule, see the module docs.
pub fn is_leap_year(year: u16) -> bool {
    year % 4 == 0
}

/// Length of `month` in `year`, February adjusted for leap years.
/// Months outside 1-12 count as 0 days.
pub fn days_in_month(year: u16, month: u8) -> u8 {
    let mut days = match month {
        1..=12 => DAYS_IN_MONTH_TABLE[(month - 1) as usize],
        _ => 0,
    };
    if month == 2 && is_leap_year(year) {
        days += 1;
    }
    days
}

/// 12-hour clock value for a 24-hour `hour`, midnight reading as 12.
pub fn hour12(hour24: u8) -> u8 {
    if hour24 == 0 {
        return 12;
    }
    if hour24 > 12 {
        return hour24 - 12;
    }
    hour24
}

/// Days since the chip epoch 2000-01-01 (that day counts as 0).
///
/// Arithmetic wraps instead of panicking: garbage register contents (day 0,
/// month 0) are legal inputs here and only get rejected later by
/// [`DateTime::is_valid`].
pub(crate) fn date_to_days(year: u16, month: u8, day: u8) -> u16 {
    let year = year.saturating_sub(2000);
    let mut days = day as u16;
    for m in 1..month.min(13) {
        days += DAYS_IN_MONTH_TABLE[(m - 1) as usize] as u16;
    }
    if month == 2 && is_leap_year(year) {
        days += 1;
    }
    days.wrapping_add(365 * year)
        .wrapping_add((year + 3) / 4)
        .wrapping_sub(1)
}

/// Zero-based day of the year.
pub fn day_in_year(year: u16, month: u8, day: u8) -> u16 {
    date_to_days(year, month, day).wrapping_sub(date_to_days(year, 1, 1))
}

fn time_to_seconds(days: u16, hours: u8, minutes: u8, seconds: u8) -> u32 {
    (days as u32)
        .wrapping_mul(24)
        .wrapping_add(hours as u32)
        .wrapping_mul(60)
        .wrapping_add(minutes as u32)
        .wrapping_mul(60)
        .wrapping_add(seconds as u32)
}

fn day_of_week_name(day_of_week: u8) -> &'static str {
    match day_of_week {
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        6 => "Saturday",
        7 => "Sunday",
        _ => "Unknown",
    }
}

fn month_name(month: u8) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

fn day_suffix(day: u8) -> &'static str {
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

fn am_pm(hour: u8, uppercase: bool) -> &'static str {
    match (hour < 12, uppercase) {
        (true, true) => "AM",
        (true, false) => "am",
        (false, true) => "PM",
        (false, false) => "pm",
    }
}

// Swap format from bcd to decimal
pub(crate) fn bcd_to_decimal(bcd: u8) -> u8 {
    ((bcd & 0xF0) >> 4) * 10 + (bcd & 0x0F)
}

// Swap format from decimal to bcd
pub(crate) fn decimal_to_bcd(decimal: u8) -> u8 {
    ((decimal / 10) << 4) + (decimal % 10)
}

/// Hours register to 24-hour value. Bit 7 flags 12-hour mode with the PM
/// bit at bit 5; in 24-hour mode the whole byte is plain BCD.
pub(crate) fn bcd_to_hour24(byte: u8) -> u8 {
    if byte & HOUR_12_BIT != 0 {
        let hour = bcd_to_decimal(byte & !(HOUR_12_BIT | HOUR_PM_BIT));
        if byte & HOUR_PM_BIT != 0 {
            hour + 12
        } else {
            hour
        }
    } else {
        bcd_to_decimal(byte)
    }
}

/// Caller day-of-week 0 (Sunday) to the chip's Monday-indexed 1-7.
pub(crate) fn dow_to_chip(day_of_week: u8) -> u8 {
    if day_of_week == 0 {
        7
    } else {
        day_of_week
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::String;

    #[test]
    fn bcd_round_trip() {
        assert_eq!(bcd_to_decimal(0x59), 59);
        assert_eq!(decimal_to_bcd(59), 0x59);
        assert_eq!(decimal_to_bcd(7), 0x07);
        assert_eq!(bcd_to_decimal(0x30), 30);
    }

    #[test]
    fn hour_register_decoding() {
        assert_eq!(bcd_to_hour24(0x23), 23);
        // 12-hour mode: flag bit set, 11 PM
        assert_eq!(bcd_to_hour24(0x80 | 0x20 | 0x11), 23);
        assert_eq!(bcd_to_hour24(0x80 | 0x09), 9);
    }

    #[test]
    fn twelve_hour_clock() {
        assert_eq!(hour12(0), 12);
        assert_eq!(hour12(13), 1);
        assert_eq!(hour12(9), 9);
        assert_eq!(hour12(12), 12);
    }

    #[test]
    fn february_follows_the_simplified_leap_rule() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        // Century years are not excluded by the chip's rule.
        assert_eq!(days_in_month(2100, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn day_of_year_is_a_difference_of_day_counts() {
        assert_eq!(day_in_year(2024, 1, 1), 0);
        assert_eq!(day_in_year(2023, 2, 1), 31);
        assert_eq!(day_in_year(2023, 12, 31), 364);
    }

    #[test]
    fn epoch_seconds_at_chip_epoch() {
        let dt = DateTime::new(2000, 1, 1, 0, 0, 0, 6);
        assert_eq!(dt.unixtime, 946_681_200);
        let later = DateTime::new(2000, 1, 2, 0, 0, 1, 7);
        assert_eq!(later.unixtime, 946_681_200 + 86_400 + 1);
    }

    #[test]
    fn numeric_pattern() {
        let dt = DateTime::new(2024, 3, 5, 7, 9, 2, 2);
        let mut out: String<32> = String::new();
        dt.format("Y-m-d H:i:s", &mut out).unwrap();
        assert_eq!(out.as_str(), "2024-03-05 07:09:02");
    }

    #[test]
    fn name_tokens_and_literals() {
        // Tuesday 2024-03-05, 07:09:02
        let dt = DateTime::new(2024, 3, 5, 7, 9, 2, 2);
        let mut out: String<64> = String::new();
        dt.format("l jS F y, g a (D M)", &mut out).unwrap();
        assert_eq!(out.as_str(), "Tuesday 5th March 24, 7 am (Tue Mar)");
    }

    #[test]
    fn weekday_and_misc_tokens() {
        let dt = DateTime::new(2024, 3, 5, 19, 9, 2, 7);
        let mut out: String<48> = String::new();
        dt.format("N w z L t A U", &mut out).unwrap();
        let mut expected: String<48> = String::new();
        write!(expected, "7 0 63 1 31 PM {}", dt.unixtime).unwrap();
        assert_eq!(out.as_str(), expected.as_str());
    }

    #[test]
    fn full_sink_fails_instead_of_overflowing() {
        let dt = DateTime::new(2024, 3, 5, 7, 9, 2, 2);
        let mut out: String<4> = String::new();
        assert!(dt.format("Y-m-d", &mut out).is_err());
    }

    #[test]
    fn day_of_week_translation() {
        assert_eq!(dow_to_chip(0), 7);
        assert_eq!(dow_to_chip(1), 1);
        assert_eq!(dow_to_chip(7), 7);
    }
}
