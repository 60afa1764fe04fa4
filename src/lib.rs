//! A library for reading miniseed2 data records and assembling them into
//! seismograms.
//!
//! See the SEED manual at <https://www.fdsn.org/pdf/SEEDManual_V2.4.pdf>
//! for the record layout. Uncompressed data decodes with [`PrimitiveCodec`],
//! compressed encodings like Steim1 and Steim2 need a [`Decompressor`]
//! supplied by the caller.

mod blockette;
mod btime;
mod channel;
mod codec;
mod config;
mod data_encoding;
mod endian;
mod fdsn_source_identifier;
mod header;
mod merge;
mod mseed_error;
mod record;
mod samples;
mod segment;
mod seismogram;
mod time_range;

use std::io::Read;
use tracing::{debug, trace};

pub use self::blockette::Blockette;
pub use self::btime::{BTime, BTIME_SIZE};
pub use self::channel::{by_channel, ChannelId};
pub use self::codec::{Decompressor, PrimitiveCodec};
pub use self::config::ParseConfig;
pub use self::data_encoding::DataEncoding;
pub use self::endian::Endian;
pub use self::fdsn_source_identifier::FdsnSourceIdentifier;
pub use self::header::{calc_sample_rate, DataHeader, FIXED_HEADER_SIZE, SENTINEL_SAMPLE_RATE};
pub use self::merge::{
    are_contiguous, are_contiguous_with_tolerance, is_contiguous_after, merge, merge_segments,
    seismogram_per_channel, segment_per_channel,
};
pub use self::mseed_error::MSeedError;
pub use self::record::DataRecord;
pub use self::samples::Samples;
pub use self::segment::{SeismogramSegment, DEFAULT_Y_UNIT};
pub use self::seismogram::Seismogram;
pub use self::time_range::TimeRange;

/// Parse back to back miniseed2 records, with default config.
pub fn parse_data_records(buffer: &[u8]) -> Result<Vec<DataRecord>, MSeedError> {
    parse_data_records_with_config(buffer, &ParseConfig::default())
}

/// Parse back to back miniseed2 records. Each record's length comes from its
/// blockette 1000, or the configured default. Stops at the first record that
/// fails, the error carries its byte offset.
pub fn parse_data_records_with_config(
    buffer: &[u8],
    config: &ParseConfig,
) -> Result<Vec<DataRecord>, MSeedError> {
    let mut records = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let rec = DataRecord::from_bytes_with_config(&buffer[offset..], config)
            .map_err(|e| e.in_record(offset))?;
        trace!(
            offset,
            record_size = rec.header.record_size,
            channel = %rec.codes("."),
            "parsed record"
        );
        offset += rec.header.record_size;
        records.push(rec);
    }
    debug!(records = records.len(), bytes = buffer.len(), "parsed miniseed2");
    Ok(records)
}

/// Read miniseed2 records from a reader, the whole input is read into memory
/// first.
///
/// #Example
///
/// ```
/// use mseed2::MSeedError;
/// # fn main() -> Result<(), MSeedError> {
/// # use chrono::{DateTime, Utc};
/// # use mseed2::{ChannelId, DataRecord, Samples};
/// # let start = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
/// # let rec = DataRecord::from_samples(&ChannelId::new("XX", "ABC", "00", "HHZ"), start, 100, 1, Samples::Int32(vec![1, 2, 3]))?;
/// # let mut bytes = Vec::new();
/// # rec.write_to(&mut bytes)?;
/// # let my_mseed2_file = std::io::Cursor::new(bytes);
/// let mut buf_reader = std::io::BufReader::new(my_mseed2_file);
/// let records = mseed2::read_mseed2(&mut buf_reader)?;
/// assert_eq!(records.len(), 1);
/// # Ok(())
/// # }
/// ```
///
pub fn read_mseed2<R: Read>(reader: &mut R) -> Result<Vec<DataRecord>, MSeedError> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    parse_data_records(&buffer)
}
