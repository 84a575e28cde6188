//! ODF date/time values
//!
//! Metadata parts (`dc:date`, `meta:creation-date`) carry ISO 8601 values in
//! one of two shapes:
//! - `YYYY-MM-DD`
//! - `YYYY-MM-DDThh:mm:ss[.fraction][Z|±hh:mm]`

use crate::core::error::{OdfError, OdfResult};
use std::fmt;

/// A calendar date with an optional time of day and time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OdfDateTime {
    /// Year (can be negative for BCE dates)
    pub year: i32,
    /// Month (1-12)
    pub month: u8,
    /// Day (1-31)
    pub day: u8,
    /// Hour (0-23)
    pub hour: u8,
    /// Minute (0-59)
    pub minute: u8,
    /// Second (0-59)
    pub second: u8,
    /// Nanoseconds (0-999999999)
    pub nanosecond: u32,
    /// Whether time components are present
    pub has_time: bool,
    /// Whether a timezone is present
    pub has_timezone: bool,
    /// Timezone sign: -1 (west), 0 (UTC), +1 (east)
    pub tz_sign: i8,
    /// Timezone hour offset (0-23)
    pub tz_hour: u8,
    /// Timezone minute offset (0-59)
    pub tz_minute: u8,
}

/// Byte cursor over a date string
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8, after: &str) -> OdfResult<()> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(OdfError::BadValue(format!(
                "Invalid date string, expected '{}' after {}",
                byte as char, after
            )))
        }
    }

    /// A run of ASCII digits of at least `min` characters
    fn digits(&mut self, min: usize, what: &str) -> OdfResult<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.pos - start < min {
            return Err(OdfError::BadValue(format!("Invalid {} in date string", what)));
        }
        // Digits are ASCII
        std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| OdfError::BadValue("Invalid UTF-8 in date string".to_string()))
    }

    /// A two-digit field within `0..=max`
    fn field(&mut self, max: u8, what: &str) -> OdfResult<u8> {
        let digits = self.digits(2, what)?;
        let value: u8 = digits
            .parse()
            .map_err(|_| OdfError::BadValue(format!("Invalid {} value", what)))?;
        if digits.len() != 2 || value > max {
            return Err(OdfError::BadValue(format!("{} is out of range", capitalize(what))));
        }
        Ok(value)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn days_in_month(year: i32, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 31,
    }
}

impl OdfDateTime {
    /// Create a date without a time component
    pub fn from_date(year: i32, month: u8, day: u8) -> OdfResult<Self> {
        let dt = Self {
            year,
            month,
            day,
            ..Default::default()
        };
        dt.validate()?;
        Ok(dt)
    }

    /// Parse an ODF date/time string
    ///
    /// # Example
    ///
    /// ```rust
    /// use odfxml::utils::datetime::OdfDateTime;
    ///
    /// let dt = OdfDateTime::parse("2009-06-22T16:22:33").unwrap();
    /// assert_eq!(dt.year, 2009);
    /// assert_eq!(dt.hour, 16);
    /// ```
    pub fn parse(s: &str) -> OdfResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(OdfError::BadValue("Empty date/time string".to_string()));
        }

        let mut dt = Self::default();
        let mut cursor = Cursor::new(s);

        let negative = cursor.eat(b'-');
        let year: i32 = cursor
            .digits(4, "year")?
            .parse()
            .map_err(|_| OdfError::BadValue("Invalid year value".to_string()))?;
        dt.year = if negative { -year } else { year };
        cursor.expect(b'-', "year")?;
        dt.month = cursor.field(12, "month")?;
        cursor.expect(b'-', "month")?;
        dt.day = cursor.field(31, "day")?;

        if cursor.eat(b'T') {
            dt.has_time = true;
            dt.hour = cursor.field(23, "hour")?;
            cursor.expect(b':', "hour")?;
            dt.minute = cursor.field(59, "minute")?;
            cursor.expect(b':', "minute")?;
            dt.second = cursor.field(59, "second")?;

            if cursor.eat(b'.') {
                let fraction = cursor.digits(1, "fractional second")?;
                // Normalize to nanoseconds, dropping digits past the ninth
                let mut nanos = 0u32;
                for (i, digit) in fraction.bytes().take(9).enumerate() {
                    nanos += u32::from(digit - b'0') * 10u32.pow(8 - i as u32);
                }
                dt.nanosecond = nanos;
            }

            match cursor.peek() {
                Some(b'Z') => {
                    cursor.pos += 1;
                    dt.has_timezone = true;
                }
                Some(sign @ (b'+' | b'-')) => {
                    cursor.pos += 1;
                    dt.has_timezone = true;
                    dt.tz_sign = if sign == b'+' { 1 } else { -1 };
                    dt.tz_hour = cursor.field(23, "timezone hour")?;
                    cursor.expect(b':', "timezone hour")?;
                    dt.tz_minute = cursor.field(59, "timezone minute")?;
                }
                _ => {}
            }
        }

        if !cursor.at_end() {
            return Err(OdfError::BadValue(
                "Invalid date string, extra characters at end".to_string(),
            ));
        }

        dt.validate()?;
        Ok(dt)
    }

    /// Format as `YYYY-MM-DD` or `YYYY-MM-DDThh:mm:ss[.fraction][Z|±hh:mm]`
    pub fn format(&self) -> String {
        let mut result = if self.year < 0 {
            format!(
                "-{:04}-{:02}-{:02}",
                self.year.unsigned_abs(),
                self.month,
                self.day
            )
        } else {
            format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
        };
        if !self.has_time {
            return result;
        }

        result.push_str(&format!(
            "T{:02}:{:02}:{:02}",
            self.hour, self.minute, self.second
        ));
        if self.nanosecond > 0 {
            let fraction = format!("{:09}", self.nanosecond);
            result.push('.');
            result.push_str(fraction.trim_end_matches('0'));
        }
        if self.has_timezone {
            match self.tz_sign {
                0 => result.push('Z'),
                sign => result.push_str(&format!(
                    "{}{:02}:{:02}",
                    if sign > 0 { '+' } else { '-' },
                    self.tz_hour,
                    self.tz_minute
                )),
            }
        }
        result
    }

    /// Check every field is within range
    pub fn validate(&self) -> OdfResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(OdfError::BadValue(format!("Month {} is out of range", self.month)));
        }
        if self.day < 1 || self.day > days_in_month(self.year, self.month) {
            return Err(OdfError::BadValue(format!(
                "Day {} is out of range for {:04}-{:02}",
                self.day, self.year, self.month
            )));
        }
        if self.hour > 23 || self.minute > 59 || self.second > 59 {
            return Err(OdfError::BadValue("Time is out of range".to_string()));
        }
        if self.nanosecond >= 1_000_000_000 {
            return Err(OdfError::BadValue(
                "Fractional second is out of range".to_string(),
            ));
        }
        if self.tz_hour > 23 || self.tz_minute > 59 {
            return Err(OdfError::BadValue("Timezone is out of range".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for OdfDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl std::str::FromStr for OdfDateTime {
    type Err = OdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
