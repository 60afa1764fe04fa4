use chrono::prelude::*;
use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use tracing::trace;

use crate::config::ParseConfig;
use crate::endian::Endian;
use crate::mseed_error::MSeedError;

/// Size in bytes of an encoded BTime.
pub const BTIME_SIZE: usize = 10;

/// The SEED BTIME timestamp, 10 bytes:
/// ```text
/// 0  year         u16
/// 2  day of year  u16
/// 4  hour         u8
/// 5  minute       u8
/// 6  second       u8
/// 7  unused, alignment
/// 8  .0001 second u16
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTime {
    pub year: i16,
    pub day_of_year: i16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub tenth_milli: i16,
}

impl BTime {
    pub fn new(
        year: i16,
        day_of_year: i16,
        hour: u8,
        minute: u8,
        second: u8,
        tenth_milli: i16,
    ) -> BTime {
        BTime {
            year,
            day_of_year,
            hour,
            minute,
            second,
            tenth_milli,
        }
    }

    /// Reads a BTime at `offset` using the given byte order.
    pub fn from_bytes(buf: &[u8], offset: usize, endian: Endian) -> Result<BTime, MSeedError> {
        if buf.len() < offset + BTIME_SIZE {
            return Err(MSeedError::InsufficientBytes(buf.len(), offset + BTIME_SIZE));
        }
        Ok(BTime {
            year: endian.read_i16(buf, offset)?,
            day_of_year: endian.read_i16(buf, offset + 2)?,
            hour: buf[offset + 4],
            minute: buf[offset + 5],
            second: buf[offset + 6],
            tenth_milli: endian.read_i16(buf, offset + 8)?,
        })
    }

    /// Reads a BTime, deciding the byte order of the header it is in.
    ///
    /// The bytes are read big endian first, the SEED default. If the year is not
    /// plausible they are read again little endian. The returned order applies to
    /// every other multi-byte field of the same header.
    pub fn from_bytes_inferring(
        buf: &[u8],
        offset: usize,
        config: &ParseConfig,
    ) -> Result<(BTime, Endian), MSeedError> {
        let btime = BTime::from_bytes(buf, offset, Endian::Big)?;
        if config.is_plausible_year(btime.year) {
            return Ok((btime, Endian::Big));
        }
        let swapped = BTime::from_bytes(buf, offset, Endian::Little)?;
        trace!(
            big_endian_year = btime.year,
            little_endian_year = swapped.year,
            "implausible year, header is little endian"
        );
        Ok((swapped, Endian::Little))
    }

    /// Encodes an instant. Precision below a tenth of a millisecond is dropped.
    pub fn from_datetime(dt: &DateTime<Utc>) -> BTime {
        // leap seconds show up as nanosecond >= 1_000_000_000
        let nanos = dt.nanosecond() % 1_000_000_000;
        BTime {
            year: dt.year() as i16,
            day_of_year: dt.ordinal() as i16,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            tenth_milli: (nanos / 100_000) as i16,
        }
    }

    /// Converts to a UTC instant, rounding the tenths of milliseconds to the
    /// nearest millisecond. Overflow of the fractional part, or a leap second,
    /// rolls into the following minute, day or year.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, MSeedError> {
        let date = NaiveDate::from_yo_opt(self.year as i32, self.day_of_year as u32)
            .ok_or_else(|| self.invalid("year and day of year"))?;
        // allow a leap second by carrying it into the fractional part
        let (second, carry) = if self.second == 60 { (59, 1000) } else { (self.second, 0) };
        let naive = date
            .and_hms_opt(self.hour as u32, self.minute as u32, second as u32)
            .ok_or_else(|| self.invalid("hour, minute, second"))?;
        let millis = (self.tenth_milli as f64 / 10.0).round() as i64 + carry;
        Ok(Utc.from_utc_datetime(&naive) + Duration::milliseconds(millis))
    }

    pub fn write_to<W: Write>(&self, buf: &mut W, endian: Endian) -> Result<(), MSeedError> {
        endian.write_i16(buf, self.year)?;
        endian.write_i16(buf, self.day_of_year)?;
        buf.write_all(&[self.hour, self.minute, self.second, 0])?;
        endian.write_i16(buf, self.tenth_milli)?;
        Ok(())
    }

    fn invalid(&self, what: &str) -> MSeedError {
        MSeedError::malformed(0, format!("invalid {} in start time {}", what, self))
    }
}

impl fmt::Display for BTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // 2016,265,13:48:00.0084
        write!(
            f,
            "{},{:03},{:02}:{:02}:{:02}.{:04}",
            self.year, self.day_of_year, self.hour, self.minute, self.second, self.tenth_milli
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tenth_millis_9999_rolls_over_year() -> Result<(), MSeedError> {
        let btime = BTime::new(1999, 365, 23, 59, 59, 9999);
        let dt = btime.to_datetime()?;
        assert_eq!(dt, Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
        Ok(())
    }

    #[test]
    fn day_of_year_in_leap_year() -> Result<(), MSeedError> {
        let dt = BTime::new(2016, 265, 13, 48, 0, 84).to_datetime()?;
        let expected = Utc.with_ymd_and_hms(2016, 9, 21, 13, 48, 0).unwrap()
            + Duration::milliseconds(8);
        assert_eq!(dt, expected);
        let dt = BTime::new(2016, 366, 0, 0, 0, 0).to_datetime()?;
        assert_eq!(dt, Utc.with_ymd_and_hms(2016, 12, 31, 0, 0, 0).unwrap());
        Ok(())
    }

    #[test]
    fn invalid_dates() {
        assert!(BTime::new(2015, 366, 0, 0, 0, 0).to_datetime().is_err());
        assert!(BTime::new(2015, 0, 0, 0, 0, 0).to_datetime().is_err());
        assert!(BTime::new(2015, 10, 24, 0, 0, 0).to_datetime().is_err());
        assert!(matches!(
            BTime::new(2015, 10, 0, 61, 0, 0).to_datetime(),
            Err(MSeedError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn leap_second() -> Result<(), MSeedError> {
        let dt = BTime::new(2016, 366, 23, 59, 60, 0).to_datetime()?;
        assert_eq!(dt, Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());
        Ok(())
    }

    #[test]
    fn infer_little_endian() -> Result<(), MSeedError> {
        let btime = BTime::new(2016, 265, 13, 48, 0, 84);
        let config = ParseConfig::default();
        for endian in [Endian::Big, Endian::Little] {
            let mut out = Vec::new();
            btime.write_to(&mut out, endian)?;
            assert_eq!(out.len(), BTIME_SIZE);
            let (read, found) = BTime::from_bytes_inferring(&out, 0, &config)?;
            assert_eq!(read, btime);
            assert_eq!(found, endian);
        }
        Ok(())
    }

    #[test]
    fn display() {
        assert_eq!(
            "2016,265,13:48:00.0084",
            BTime::new(2016, 265, 13, 48, 0, 84).to_string()
        );
    }

    proptest! {
        #[test]
        fn round_trip(
            year in 1960i16..=2055,
            day in 1i16..=365,
            hour in 0u8..24,
            minute in 0u8..60,
            second in 0u8..60,
            tenth_milli in 0i16..9995,
        ) {
            let btime = BTime::new(year, day, hour, minute, second, tenth_milli);
            let mut out = Vec::new();
            btime.write_to(&mut out, Endian::Big).unwrap();
            let (decoded, _) = BTime::from_bytes_inferring(&out, 0, &ParseConfig::default()).unwrap();
            prop_assert_eq!(decoded, btime);
            let again = BTime::from_datetime(&decoded.to_datetime().unwrap());
            prop_assert_eq!(again.year, year);
            prop_assert_eq!(again.day_of_year, day);
            prop_assert_eq!(again.hour, hour);
            prop_assert_eq!(again.minute, minute);
            prop_assert_eq!(again.second, second);
            let rounded = ((tenth_milli as f64 / 10.0).round() as i16) * 10;
            prop_assert_eq!(again.tenth_milli, rounded);
        }
    }
}
