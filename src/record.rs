use chrono::prelude::*;
use chrono::Utc;
use std::fmt;
use std::io::Write;
use std::sync::OnceLock;

use crate::blockette::Blockette;
use crate::channel::ChannelId;
use crate::codec::{Decompressor, PrimitiveCodec};
use crate::config::ParseConfig;
use crate::header::DataHeader;
use crate::mseed_error::MSeedError;
use crate::samples::Samples;

/// Smallest record size written by [`DataRecord::from_samples`].
pub const MIN_RECORD_SIZE: usize = 256;

/// A miniseed2 data record, header plus the undecoded data payload.
///
/// The payload is decoded at most once, the first call to
/// [`DataRecord::decompress`] stores the samples and later calls return them.
#[derive(Debug, Clone)]
pub struct DataRecord {
    pub header: DataHeader,
    data: Vec<u8>,
    decoded: OnceLock<Samples>,
}

impl DataRecord {
    pub fn new(header: DataHeader, data: Vec<u8>) -> DataRecord {
        DataRecord {
            header,
            data,
            decoded: OnceLock::new(),
        }
    }

    /// Reads a single record from the start of `buffer`, with default config.
    pub fn from_bytes(buffer: &[u8]) -> Result<DataRecord, MSeedError> {
        DataRecord::from_bytes_with_config(buffer, &ParseConfig::default())
    }

    /// Reads a single record from the start of `buffer`. The payload is
    /// everything from the data offset to the end of the record.
    pub fn from_bytes_with_config(
        buffer: &[u8],
        config: &ParseConfig,
    ) -> Result<DataRecord, MSeedError> {
        let header = DataHeader::from_bytes_with_config(buffer, config)?;
        if buffer.len() < header.record_size {
            return Err(MSeedError::InsufficientBytes(buffer.len(), header.record_size));
        }
        let data = buffer[header.data_offset as usize..header.record_size].to_vec();
        Ok(DataRecord::new(header, data))
    }

    /// Create an uncompressed, big endian record holding the samples. The record
    /// size is the smallest power of two, at least 256, that fits them.
    ///
    /// ```
    /// # use mseed2::MSeedError;
    /// # fn main() -> Result<(), MSeedError> {
    /// use chrono::{DateTime, Utc};
    /// use mseed2::{ChannelId, DataRecord, Samples};
    /// let start = "2014-11-28T12:00:09Z".parse::<DateTime<Utc>>().unwrap();
    /// let channel = ChannelId::new("CO", "BIRD", "00", "HHZ");
    /// let record = DataRecord::from_samples(&channel, start, 10, 1, Samples::Int32(vec![0, 1, -1, 5]))?;
    /// assert_eq!(record.header.record_size, 256);
    /// assert_eq!(record.decompress_primitive()?.len(), 4);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_samples(
        channel: &ChannelId,
        start: DateTime<Utc>,
        sample_rate_factor: i16,
        sample_rate_multiplier: i16,
        samples: Samples,
    ) -> Result<DataRecord, MSeedError> {
        if samples.len() > i16::MAX as usize {
            return Err(MSeedError::malformed(
                30,
                format!("too many samples for one record: {}", samples.len()),
            ));
        }
        let mut header = DataHeader::new(
            channel,
            start,
            samples.encoding(),
            sample_rate_factor,
            sample_rate_multiplier,
            samples.len() as u32,
        );
        let needed = header.data_offset as usize + samples.byte_len();
        let record_size = needed.next_power_of_two().max(MIN_RECORD_SIZE);
        header.record_size = record_size;
        for b in header.blockettes.iter_mut() {
            if let Blockette::FormatDescriptor {
                record_length_exp, ..
            } = b
            {
                *record_length_exp = record_size.trailing_zeros() as u8;
            }
        }
        let mut data = Vec::with_capacity(record_size - header.data_offset as usize);
        samples.write_to(&mut data, header.data_endian)?;
        data.resize(record_size - header.data_offset as usize, 0);
        Ok(DataRecord::new(header, data))
    }

    /// The raw payload bytes, from the data offset to the end of the record.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decodes the payload with `codec`, or returns the already decoded samples.
    /// The codec must produce exactly the header's number of samples.
    pub fn decompress(&self, codec: &dyn Decompressor) -> Result<&Samples, MSeedError> {
        if let Some(samples) = self.decoded.get() {
            return Ok(samples);
        }
        let samples = codec.decompress(
            &self.header.encoding,
            &self.data,
            self.header.num_samples as usize,
            self.header.data_endian,
        )?;
        if samples.len() != self.header.num_samples as usize {
            return Err(MSeedError::InsufficientLength {
                requested: self.header.num_samples as usize,
                available: samples.len(),
            });
        }
        // if another thread got here first its result is kept and ours dropped
        Ok(self.decoded.get_or_init(|| samples))
    }

    /// Decodes with [`PrimitiveCodec`], uncompressed data only.
    pub fn decompress_primitive(&self) -> Result<&Samples, MSeedError> {
        self.decompress(&PrimitiveCodec)
    }

    pub fn is_decompressed(&self) -> bool {
        self.decoded.get().is_some()
    }

    pub fn channel_id(&self) -> ChannelId {
        self.header.channel_id()
    }

    /// Network, station, location and channel codes separated by `sep`.
    pub fn codes(&self, sep: &str) -> String {
        self.header.codes(sep)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.header.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.header.end
    }

    pub fn sample_rate(&self) -> f64 {
        self.header.sample_rate
    }

    pub fn num_samples(&self) -> usize {
        self.header.num_samples as usize
    }

    /// Writes the whole record, header in its original byte order, padded to the
    /// record size. Returns the number of bytes written.
    pub fn write_to<W: Write>(&self, buf: &mut W) -> Result<usize, MSeedError> {
        let mut out = Vec::with_capacity(self.header.record_size);
        self.header.write_to(&mut out, self.header.header_endian)?;
        out.write_all(&self.data)?;
        out.resize(self.header.record_size, 0);
        buf.write_all(&out)?;
        Ok(out.len())
    }
}

impl fmt::Display for DataRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.codes("."),
            self.header.get_start_as_iso(),
            self.header.encoding
        )
    }
}
