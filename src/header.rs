use chrono::prelude::*;
use chrono::Utc;
use std::fmt;
use std::io::Write;
use tracing::warn;

use crate::blockette::Blockette;
use crate::btime::BTime;
use crate::channel::ChannelId;
use crate::config::{ParseConfig, DEFAULT_RECORD_SIZE};
use crate::data_encoding::DataEncoding;
use crate::endian::Endian;
use crate::mseed_error::MSeedError;
use crate::time_range::sample_offset;

/// Size in bytes of the fixed header. This does not include blockettes or data.
pub const FIXED_HEADER_SIZE: usize = 48;

/// Offset of the start time BTime within the fixed header.
pub const START_TIME_OFFSET: usize = 20;

/// Sample rate used when the factor and multiplier multiply to zero, as in log
/// records. Not a physical rate.
pub const SENTINEL_SAMPLE_RATE: f64 = 10000.0;

/// The fixed section of a miniseed2 data record header plus the fields pulled
/// from its blockettes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataHeader {
    pub seq: String,
    pub type_code: u8,
    pub continuation_code: u8,
    pub station_code: String,
    pub location_code: String,
    pub channel_code: String,
    pub network_code: String,
    pub start_btime: BTime,
    pub num_samples: u32,
    pub sample_rate_factor: i16,
    pub sample_rate_multiplier: i16,
    pub activity_flags: u8,
    pub io_clock_flags: u8,
    pub data_quality_flags: u8,
    pub num_blockettes: u8,
    pub time_correction: i32,
    pub data_offset: u16,
    pub blockette_offset: u16,
    pub blockettes: Vec<Blockette>,
    /// Byte order of the header fields, as inferred from the start time.
    pub header_endian: Endian,
    /// Byte order of the data payload, from blockette 1000.
    pub data_endian: Endian,
    pub encoding: DataEncoding,
    pub record_size: usize,
    pub sample_rate: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DataHeader {
    /// Record type code for data of unknown quality.
    pub const D_TYPECODE: u8 = b'D';

    /// Creates a header for a new record with a blockette 1000 describing
    /// `encoding` in big endian word order and a 4096 byte record.
    pub fn new(
        channel: &ChannelId,
        start: DateTime<Utc>,
        encoding: DataEncoding,
        sample_rate_factor: i16,
        sample_rate_multiplier: i16,
        num_samples: u32,
    ) -> DataHeader {
        let b1000 = Blockette::FormatDescriptor {
            encoding,
            word_order: Endian::Big.word_order(),
            record_length_exp: DEFAULT_RECORD_SIZE.trailing_zeros() as u8,
        };
        // data starts at the next 64 byte boundary after the blockettes
        let data_offset = (FIXED_HEADER_SIZE + b1000.byte_len()).div_ceil(64) * 64;
        let sample_rate = calc_sample_rate(sample_rate_factor, sample_rate_multiplier);
        let mut header = DataHeader {
            seq: String::from("000001"),
            type_code: DataHeader::D_TYPECODE,
            continuation_code: b' ',
            station_code: channel.station.clone(),
            location_code: channel.location.clone(),
            channel_code: channel.channel.clone(),
            network_code: channel.network.clone(),
            start_btime: BTime::from_datetime(&start),
            num_samples,
            sample_rate_factor,
            sample_rate_multiplier,
            activity_flags: 0,
            io_clock_flags: 0,
            data_quality_flags: 0,
            num_blockettes: 1,
            time_correction: 0,
            data_offset: data_offset as u16,
            blockette_offset: FIXED_HEADER_SIZE as u16,
            blockettes: vec![b1000],
            header_endian: Endian::Big,
            data_endian: Endian::Big,
            encoding,
            record_size: DEFAULT_RECORD_SIZE,
            sample_rate,
            start,
            end: start,
        };
        header.end = header.time_of_sample(num_samples as i64 - 1);
        header
    }

    /// Reads a miniseed2 header from the start of `buffer`, with default config.
    pub fn from_bytes(buffer: &[u8]) -> Result<DataHeader, MSeedError> {
        DataHeader::from_bytes_with_config(buffer, &ParseConfig::default())
    }

    /// Reads a miniseed2 header from the start of `buffer`.
    ///
    /// The byte order of the header is decided once, from the start time, and
    /// used for every multi-byte field after it, including the blockettes.
    pub fn from_bytes_with_config(
        buffer: &[u8],
        config: &ParseConfig,
    ) -> Result<DataHeader, MSeedError> {
        if buffer.len() < FIXED_HEADER_SIZE {
            return Err(MSeedError::InsufficientBytes(buffer.len(), FIXED_HEADER_SIZE));
        }
        let (start_btime, endian) = BTime::from_bytes_inferring(buffer, START_TIME_OFFSET, config)?;
        let raw_num_samples = endian.read_i16(buffer, 30)?;
        if raw_num_samples < 0 {
            return Err(MSeedError::malformed(
                30,
                format!("negative number of samples: {}", raw_num_samples),
            ));
        }
        let sample_rate_factor = endian.read_i16(buffer, 32)?;
        let sample_rate_multiplier = endian.read_i16(buffer, 34)?;
        let data_offset = endian.read_u16(buffer, 44)?;
        let blockette_offset = endian.read_u16(buffer, 46)?;
        let start = start_btime.to_datetime().map_err(|_| {
            MSeedError::malformed(START_TIME_OFFSET, format!("invalid start time {}", start_btime))
        })?;

        let mut header = DataHeader {
            seq: make_string(&buffer[0..6]),
            type_code: buffer[6],
            continuation_code: buffer[7],
            station_code: make_string(&buffer[8..13]),
            location_code: make_string(&buffer[13..15]),
            channel_code: make_string(&buffer[15..18]),
            network_code: make_string(&buffer[18..20]),
            start_btime,
            num_samples: raw_num_samples as u32,
            sample_rate_factor,
            sample_rate_multiplier,
            activity_flags: buffer[36],
            io_clock_flags: buffer[37],
            data_quality_flags: buffer[38],
            num_blockettes: buffer[39],
            time_correction: endian.read_i32(buffer, 40)?,
            data_offset,
            blockette_offset,
            blockettes: Vec::new(),
            header_endian: endian,
            data_endian: Endian::Big,
            encoding: DataEncoding::ASCII,
            record_size: config.default_record_size,
            sample_rate: calc_sample_rate(sample_rate_factor, sample_rate_multiplier),
            start,
            end: start,
        };
        header.read_blockettes(buffer)?;
        if header.record_size < FIXED_HEADER_SIZE {
            return Err(MSeedError::malformed(
                0,
                format!("record size {} smaller than fixed header", header.record_size),
            ));
        }
        if header.data_offset as usize > header.record_size {
            return Err(MSeedError::malformed(
                44,
                format!(
                    "data offset {} past end of {} byte record",
                    header.data_offset, header.record_size
                ),
            ));
        }
        header.end = header.time_of_sample(header.num_samples as i64 - 1);
        Ok(header)
    }

    fn read_blockettes(&mut self, buffer: &[u8]) -> Result<(), MSeedError> {
        let endian = self.header_endian;
        let mut offset = self.blockette_offset as usize;
        // furthest blockette end seen, and where that blockette starts
        let mut extent = (0, 0);
        for _ in 0..self.num_blockettes {
            if offset < FIXED_HEADER_SIZE || offset + 4 > buffer.len() {
                return Err(MSeedError::malformed(
                    offset,
                    "blockette offset outside of record",
                ));
            }
            let mut next = endian.read_u16(buffer, offset + 2)? as usize;
            if next == 0 {
                // last blockette
                next = self.data_offset as usize;
            }
            if next == 0 {
                warn!(offset, "zero length blockette, no data offset");
                next = offset;
            }
            if next < offset {
                return Err(MSeedError::malformed(
                    offset + 2,
                    format!("next blockette offset {} before current {}", next, offset),
                ));
            }
            let blockette = Blockette::from_bytes(buffer, offset, next - offset, endian)?;
            match &blockette {
                Blockette::FormatDescriptor {
                    encoding,
                    word_order,
                    record_length_exp,
                } => {
                    if *record_length_exp >= 31 {
                        return Err(MSeedError::malformed(
                            offset + 6,
                            format!("record length exponent too large: {}", record_length_exp),
                        ));
                    }
                    self.record_size = 1 << record_length_exp;
                    self.encoding = *encoding;
                    self.data_endian = Endian::from_word_order(*word_order);
                }
                Blockette::SampleRate { sample_rate, .. } => {
                    if *sample_rate > 0.0 {
                        self.sample_rate = *sample_rate as f64;
                    }
                }
                _ => {}
            }
            self.blockettes.push(blockette);
            if next > extent.1 {
                extent = (offset, next);
            }
            offset = next;
        }
        // record size is only known once the whole chain is read
        if extent.1 > self.record_size {
            return Err(MSeedError::malformed(
                extent.0,
                format!(
                    "blockette ends at byte {} past end of {} byte record",
                    extent.1, self.record_size
                ),
            ));
        }
        Ok(())
    }

    /// Writes the fixed header and the blockette chain, padded with zeros up to
    /// the data offset. Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, buf: &mut W, endian: Endian) -> Result<usize, MSeedError> {
        let mut out = Vec::with_capacity(self.data_offset as usize);
        write_padded(&mut out, &self.seq, 6, b'0');
        out.write_all(&[self.type_code, self.continuation_code])?;
        write_padded(&mut out, &self.station_code, 5, b' ');
        write_padded(&mut out, &self.location_code, 2, b' ');
        write_padded(&mut out, &self.channel_code, 3, b' ');
        write_padded(&mut out, &self.network_code, 2, b' ');
        self.start_btime.write_to(&mut out, endian)?;
        endian.write_i16(&mut out, self.num_samples as i16)?;
        endian.write_i16(&mut out, self.sample_rate_factor)?;
        endian.write_i16(&mut out, self.sample_rate_multiplier)?;
        out.write_all(&[
            self.activity_flags,
            self.io_clock_flags,
            self.data_quality_flags,
            self.blockettes.len() as u8,
        ])?;
        endian.write_i32(&mut out, self.time_correction)?;
        endian.write_u16(&mut out, self.data_offset)?;
        let first = if self.blockettes.is_empty() { 0 } else { FIXED_HEADER_SIZE as u16 };
        endian.write_u16(&mut out, first)?;
        for (i, b) in self.blockettes.iter().enumerate() {
            let next = if i + 1 == self.blockettes.len() {
                0
            } else {
                (out.len() + b.byte_len()) as u16
            };
            b.write_to(&mut out, next, endian)?;
        }
        if out.len() < self.data_offset as usize {
            out.resize(self.data_offset as usize, 0);
        }
        buf.write_all(&out)?;
        Ok(out.len())
    }

    /// Time of the i-th sample, zero based, so time_of_sample(0) is the start
    /// and time_of_sample(num_samples-1) is the end.
    pub fn time_of_sample(&self, i: i64) -> DateTime<Utc> {
        self.start + sample_offset(i, self.sample_rate)
    }

    pub fn channel_id(&self) -> ChannelId {
        ChannelId::new(
            &self.network_code,
            &self.station_code,
            &self.location_code,
            &self.channel_code,
        )
    }

    /// Network, station, location and channel codes separated by `sep`.
    pub fn codes(&self, sep: &str) -> String {
        self.channel_id().codes(sep)
    }

    /// The microsecond correction from blockette 1001, if present.
    pub fn microsecond(&self) -> Option<i8> {
        self.blockettes.iter().find_map(|b| match b {
            Blockette::DataExtension { microsecond, .. } => Some(*microsecond),
            _ => None,
        })
    }

    /// Start time as ISO8601 string
    pub fn get_start_as_iso(&self) -> String {
        self.start.format("%Y-%m-%dT%H:%M:%S%.4fZ").to_string()
    }
}

impl fmt::Display for DataHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // CO_JSC_00_HHZ, 000001, D, 512 bytes (header: big endian)
        //              start time: 2016,265,13:48:00.0084
        //       number of samples: 99
        //        sample rate (Hz): 40
        //          num blockettes: 2
        //         time correction: 0
        //     data payload offset: 64
        //        payload encoding: STEIM-2 integer compression (val: 11)
        writeln!(
            f,
            "{}, {}, {}, {} bytes (header: {})",
            self.codes("_"),
            self.seq,
            self.type_code as char,
            self.record_size,
            self.header_endian
        )?;
        writeln!(f, "             start time: {}", self.start_btime)?;
        writeln!(f, "      number of samples: {}", self.num_samples)?;
        writeln!(f, "       sample rate (Hz): {}", self.sample_rate)?;
        writeln!(f, "         num blockettes: {}", self.num_blockettes)?;
        writeln!(f, "        time correction: {}", self.time_correction)?;
        writeln!(f, "    data payload offset: {}", self.data_offset)?;
        write!(
            f,
            "       payload encoding: {} (val: {}, {})",
            self.encoding,
            self.encoding.value(),
            self.data_endian
        )
    }
}

/// Sample rate in hertz from the header factor and multiplier. A positive value
/// multiplies by its magnitude, a negative one divides by it.
pub fn calc_sample_rate(factor: i16, multiplier: i16) -> f64 {
    if factor as i32 * multiplier as i32 == 0 {
        return SENTINEL_SAMPLE_RATE;
    }
    let factor = factor as f64;
    let multiplier = multiplier as f64;
    factor.abs().powf(factor.signum()) * multiplier.abs().powf(multiplier.signum())
}

/// ASCII field with control characters dropped and padding trimmed.
fn make_string(bytes: &[u8]) -> String {
    let s: String = bytes
        .iter()
        .filter(|&&b| b > 31)
        .map(|&b| b as char)
        .collect();
    s.trim().to_string()
}

fn write_padded(out: &mut Vec<u8>, s: &str, width: usize, pad: u8) {
    let mut field: Vec<u8> = s.bytes().take(width).collect();
    field.resize(width, pad);
    out.extend_from_slice(&field);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockette::B1000_TYPE;

    fn jsc_header_bytes() -> Vec<u8> {
        // 00000000  30 30 30 30 30 31 44 20  4a 53 43 20 20 30 30 48  |000001D JSC  00H|
        // 00000010  48 5a 43 4f 07 e0 01 09  0d 30 00 00 00 54 00 63  |HZCO.....0...T.c|
        // 00000020  00 28 00 01 00 00 00 01  00 00 00 00 00 40 00 30  |.(...........@.0|
        // 00000030  03 e8 00 00 0b 01 09 00                           |........|
        let mut buf = vec![
            0x30, 0x30, 0x30, 0x30, 0x30, 0x31, 0x44, 0x20, 0x4a, 0x53, 0x43, 0x20, 0x20, 0x30,
            0x30, 0x48, 0x48, 0x5a, 0x43, 0x4f, 0x07, 0xe0, 0x01, 0x09, 0x0d, 0x30, 0x00, 0x00,
            0x00, 0x54, 0x00, 0x63, 0x00, 0x28, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x40, 0x00, 0x30, 0x03, 0xe8, 0x00, 0x00, 0x0b, 0x01, 0x09, 0x00,
        ];
        buf.resize(512, 0);
        buf
    }

    #[test]
    fn read_jsc_header() -> Result<(), MSeedError> {
        let head = DataHeader::from_bytes(&jsc_header_bytes())?;
        assert_eq!(head.seq, "000001");
        assert_eq!(head.type_code, b'D');
        assert_eq!(head.station_code, "JSC");
        assert_eq!(head.network_code, "CO");
        assert_eq!(head.location_code, "00");
        assert_eq!(head.channel_code, "HHZ");
        assert_eq!(head.start_btime, BTime::new(2016, 265, 13, 48, 0, 84));
        assert_eq!(head.num_samples, 99);
        assert_eq!(head.sample_rate, 40.0);
        assert_eq!(head.codes("."), "CO.JSC.00.HHZ");
        assert_eq!(head.header_endian, Endian::Big);
        assert_eq!(head.record_size, 512);
        assert_eq!(head.encoding, DataEncoding::STEIM2);
        assert_eq!(head.data_endian, Endian::Big);
        assert_eq!(head.data_offset, 64);
        assert_eq!(head.blockettes.len(), 1);
        assert_eq!(head.blockettes[0].blockette_type(), B1000_TYPE);
        assert_eq!(
            head.start,
            Utc.with_ymd_and_hms(2016, 9, 21, 13, 48, 0).unwrap() + chrono::Duration::milliseconds(8)
        );
        // 98 samples at 40 sps after the start
        assert_eq!(head.end, head.start + chrono::Duration::milliseconds(2450));
        print!("{}", head);
        Ok(())
    }

    #[test]
    fn header_round_trip_both_orders() -> Result<(), MSeedError> {
        let head = DataHeader::from_bytes(&jsc_header_bytes())?;
        let mut big = Vec::new();
        head.write_to(&mut big, Endian::Big)?;
        assert_eq!(&big[..], &jsc_header_bytes()[0..64]);
        let mut little = Vec::new();
        head.write_to(&mut little, Endian::Little)?;
        big.resize(512, 0);
        little.resize(512, 0);
        let from_big = DataHeader::from_bytes(&big)?;
        let mut from_little = DataHeader::from_bytes(&little)?;
        assert_eq!(from_little.header_endian, Endian::Little);
        from_little.header_endian = Endian::Big;
        assert_eq!(from_big, head);
        assert_eq!(from_little, head);
        Ok(())
    }

    #[test]
    fn sample_rate_factors() {
        assert_eq!(40.0, calc_sample_rate(40, 1));
        assert_eq!(0.1, calc_sample_rate(-10, 1));
        assert_eq!(0.1, calc_sample_rate(1, -10));
        assert!((calc_sample_rate(-5, -100) - 0.002).abs() < 1e-12);
        assert_eq!(5.0, calc_sample_rate(-2, 10));
        assert_eq!(SENTINEL_SAMPLE_RATE, calc_sample_rate(0, 1));
        assert_eq!(SENTINEL_SAMPLE_RATE, calc_sample_rate(40, 0));
    }

    #[test]
    fn too_short() {
        assert!(matches!(
            DataHeader::from_bytes(&jsc_header_bytes()[0..40]),
            Err(MSeedError::InsufficientBytes(40, FIXED_HEADER_SIZE))
        ));
    }

    #[test]
    fn bad_day_of_year() {
        let mut buf = jsc_header_bytes();
        // day 367
        buf[22] = 0x01;
        buf[23] = 0x6f;
        assert!(matches!(
            DataHeader::from_bytes(&buf),
            Err(MSeedError::MalformedHeader { offset: START_TIME_OFFSET, .. })
        ));
    }

    #[test]
    fn blockette_offset_outside_record() {
        let mut buf = jsc_header_bytes();
        buf.truncate(50);
        assert!(matches!(
            DataHeader::from_bytes(&buf),
            Err(MSeedError::MalformedHeader { offset: 48, .. })
        ));
    }

    #[test]
    fn blockette_chain_past_record_end() {
        // two back to back 256 byte records, the chain of the first runs into the second
        let mut first = jsc_header_bytes();
        first.truncate(256);
        first[39] = 2;
        first[50] = 0x01;
        first[51] = 0x40;
        first[54] = 8;
        let mut buf = first.clone();
        buf.extend_from_slice(&first);
        buf[320..328].copy_from_slice(&[0x03, 0xe9, 0x01, 0x48, 0x00, 0x05, 0x00, 0x01]);
        assert!(matches!(
            DataHeader::from_bytes(&buf),
            Err(MSeedError::MalformedHeader { offset: 320, .. })
        ));
        assert!(matches!(
            crate::parse_data_records(&buf),
            Err(MSeedError::Record { offset: 0, .. })
        ));
    }

    #[test]
    fn no_blockette_1000_uses_default_record_size() -> Result<(), MSeedError> {
        let mut buf = jsc_header_bytes();
        buf[39] = 0;
        buf[46] = 0;
        buf[47] = 0;
        let head = DataHeader::from_bytes(&buf)?;
        assert_eq!(head.record_size, DEFAULT_RECORD_SIZE);
        assert!(head.blockettes.is_empty());
        Ok(())
    }

    #[test]
    fn log_record_sentinel_rate() -> Result<(), MSeedError> {
        let mut buf = jsc_header_bytes();
        buf[32] = 0;
        buf[33] = 0;
        let head = DataHeader::from_bytes(&buf)?;
        assert_eq!(head.sample_rate, SENTINEL_SAMPLE_RATE);
        Ok(())
    }

    #[test]
    fn new_header_writes_readable_bytes() -> Result<(), MSeedError> {
        let start = Utc.with_ymd_and_hms(2020, 2, 29, 12, 0, 0).unwrap();
        let head = DataHeader::new(
            &ChannelId::new("XX", "ABC", "", "BHZ"),
            start,
            DataEncoding::INT32,
            20,
            1,
            100,
        );
        let mut out = Vec::new();
        let len = head.write_to(&mut out, Endian::Big)?;
        assert_eq!(len, 64);
        out.resize(DEFAULT_RECORD_SIZE, 0);
        let read = DataHeader::from_bytes(&out)?;
        assert_eq!(read, head);
        assert_eq!(read.location_code, "");
        assert_eq!(read.end, start + chrono::Duration::milliseconds(4950));
        Ok(())
    }
}
