use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::channel::ChannelId;
use crate::codec::Decompressor;
use crate::fdsn_source_identifier::FdsnSourceIdentifier;
use crate::mseed_error::MSeedError;
use crate::record::DataRecord;
use crate::samples::Samples;
use crate::time_range::{as_seconds, sample_offset, TimeRange};

/// Unit used when nothing else is known about the samples.
pub const DEFAULT_Y_UNIT: &str = "count";

#[derive(Debug, Clone)]
enum SegmentData {
    Decoded(Samples),
    Encoded {
        records: Vec<DataRecord>,
        codec: Arc<dyn Decompressor>,
        flat: OnceLock<Samples>,
    },
}

/// An uninterrupted run of evenly spaced samples from one channel.
///
/// Built either from samples already in memory or from a run of contiguous
/// records, in which case nothing is decoded until [`SeismogramSegment::y`] is
/// first called.
#[derive(Debug, Clone)]
pub struct SeismogramSegment {
    data: SegmentData,
    sample_rate: f64,
    start: DateTime<Utc>,
    channel: ChannelId,
    y_unit: String,
}

impl SeismogramSegment {
    pub fn new(
        samples: Samples,
        sample_rate: f64,
        start: DateTime<Utc>,
        channel: ChannelId,
    ) -> Result<SeismogramSegment, MSeedError> {
        check_rate(sample_rate)?;
        Ok(SeismogramSegment {
            data: SegmentData::Decoded(samples),
            sample_rate,
            start,
            channel,
            y_unit: String::from(DEFAULT_Y_UNIT),
        })
    }

    /// A segment over records assumed to be contiguous and in time order. The
    /// rate, start and channel come from the first record.
    pub fn from_records(
        records: Vec<DataRecord>,
        codec: Arc<dyn Decompressor>,
    ) -> Result<SeismogramSegment, MSeedError> {
        let first = records.first().ok_or(MSeedError::EmptySeismogram)?;
        let sample_rate = first.sample_rate();
        check_rate(sample_rate)?;
        let start = first.start();
        let channel = first.channel_id();
        Ok(SeismogramSegment {
            data: SegmentData::Encoded {
                records,
                codec,
                flat: OnceLock::new(),
            },
            sample_rate,
            start,
            channel,
            y_unit: String::from(DEFAULT_Y_UNIT),
        })
    }

    pub fn with_y_unit(mut self, y_unit: &str) -> SeismogramSegment {
        self.y_unit = y_unit.to_string();
        self
    }

    /// The samples, decoding and joining the records on first use.
    pub fn y(&self) -> Result<&Samples, MSeedError> {
        match &self.data {
            SegmentData::Decoded(samples) => Ok(samples),
            SegmentData::Encoded {
                records,
                codec,
                flat,
            } => {
                if let Some(samples) = flat.get() {
                    return Ok(samples);
                }
                let parts = records
                    .iter()
                    .map(|r| r.decompress(codec.as_ref()))
                    .collect::<Result<Vec<&Samples>, MSeedError>>()
                    .map_err(|e| e.in_channel(self.channel.key()))?;
                let samples = Samples::concat(parts).unwrap_or(Samples::Int32(Vec::new()));
                Ok(flat.get_or_init(|| samples))
            }
        }
    }

    /// Replaces the records with their decoded samples.
    pub fn flatten(&mut self) -> Result<(), MSeedError> {
        if let SegmentData::Encoded { .. } = self.data {
            let samples = self.y()?.clone();
            self.data = SegmentData::Decoded(samples);
        }
        Ok(())
    }

    /// True while the samples are still held only as undecoded records.
    pub fn is_encoded(&self) -> bool {
        match &self.data {
            SegmentData::Decoded(_) => false,
            SegmentData::Encoded { flat, .. } => flat.get().is_none(),
        }
    }

    /// Number of samples. For records this is the sum of the header counts, so
    /// nothing is decoded.
    pub fn num_points(&self) -> usize {
        match &self.data {
            SegmentData::Decoded(samples) => samples.len(),
            SegmentData::Encoded { records, .. } => records.iter().map(|r| r.num_samples()).sum(),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Time of the last sample, the start for an empty segment.
    pub fn end(&self) -> DateTime<Utc> {
        match self.num_points() {
            0 => self.start,
            n => self.time_of_sample(n as i64 - 1),
        }
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start(), self.end())
    }

    /// Time of the i-th sample, negative i counts back from the end so -1 is
    /// the last sample.
    pub fn time_of_sample(&self, i: i64) -> DateTime<Utc> {
        let idx = if i >= 0 { i } else { self.num_points() as i64 + i };
        self.start + sample_offset(idx, self.sample_rate)
    }

    /// Index of the sample nearest to `t`, None if `t` is before the start or
    /// more than one sample period past the end.
    pub fn index_of_time(&self, t: DateTime<Utc>) -> Option<usize> {
        if t < self.start || t > self.end() + sample_offset(1, self.sample_rate) {
            return None;
        }
        Some((as_seconds(t - self.start) * self.sample_rate).round() as usize)
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel
    }

    pub fn y_unit(&self) -> &str {
        &self.y_unit
    }

    pub fn codes(&self, sep: &str) -> String {
        self.channel.codes(sep)
    }

    pub fn source_id(&self) -> Result<FdsnSourceIdentifier, MSeedError> {
        self.channel.source_id()
    }

    /// Same channel, rate and unit with different samples and start.
    pub fn clone_with_new_data(&self, y: Samples, start: DateTime<Utc>) -> SeismogramSegment {
        SeismogramSegment {
            data: SegmentData::Decoded(y),
            sample_rate: self.sample_rate,
            start,
            channel: self.channel.clone(),
            y_unit: self.y_unit.clone(),
        }
    }

    /// The samples covering the window, None if the window misses the segment.
    /// A window edge between two samples widens out to the sample beyond it.
    pub fn cut(&self, window: &TimeRange) -> Result<Option<SeismogramSegment>, MSeedError> {
        let end = self.end();
        if window.end < self.start || window.start > end {
            return Ok(None);
        }
        let n = self.num_points();
        let s_index = if window.start > self.start {
            floor_index(window.start - self.start, self.sample_rate).min(n)
        } else {
            0
        };
        let e_index = if window.end < end {
            n.saturating_sub(floor_index(end - window.end, self.sample_rate))
        } else {
            n
        };
        self.slice_indices(s_index, e_index)
    }

    /// The samples at or after `start` and strictly before `end`. Unlike
    /// [`SeismogramSegment::cut`] adjacent windows never share a sample.
    pub fn split(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<SeismogramSegment>, MSeedError> {
        let n = self.num_points();
        let s_index = ceil_index(start - self.start, self.sample_rate).min(n);
        let e_index = ceil_index(end - self.start, self.sample_rate).min(n);
        self.slice_indices(s_index, e_index)
    }

    fn slice_indices(
        &self,
        s_index: usize,
        e_index: usize,
    ) -> Result<Option<SeismogramSegment>, MSeedError> {
        if s_index >= e_index {
            return Ok(None);
        }
        let cut_y = self.y()?.slice(s_index, e_index)?;
        Ok(Some(self.clone_with_new_data(
            cut_y,
            self.time_of_sample(s_index as i64),
        )))
    }

    /// Min and max over the samples, widening the accumulator.
    pub fn find_min_max(
        &self,
        accumulator: Option<(f64, f64)>,
    ) -> Result<Option<(f64, f64)>, MSeedError> {
        Ok(self.y()?.find_min_max(accumulator))
    }
}

impl fmt::Display for SeismogramSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} sps {} pts",
            self.channel.key(),
            self.time_range(),
            self.sample_rate,
            self.num_points()
        )
    }
}

fn check_rate(sample_rate: f64) -> Result<(), MSeedError> {
    if sample_rate > 0.0 && sample_rate.is_finite() {
        Ok(())
    } else {
        Err(MSeedError::InvalidSampleRate(sample_rate))
    }
}

/// Whole samples elapsed in `d`. Sample times are rounded to the nanosecond,
/// so half a nanosecond of slack keeps a time on a sample from landing before it.
fn floor_index(d: Duration, sample_rate: f64) -> usize {
    let offset = (nanos(d) + 0.5) * sample_rate / 1.0e9;
    if offset <= 0.0 {
        0
    } else {
        offset.floor() as usize
    }
}

/// Index of the first sample at or after `d` from the start.
fn ceil_index(d: Duration, sample_rate: f64) -> usize {
    let offset = (nanos(d) - 0.5) * sample_rate / 1.0e9;
    if offset <= 0.0 {
        0
    } else {
        offset.ceil() as usize
    }
}

fn nanos(d: Duration) -> f64 {
    match d.num_nanoseconds() {
        Some(n) => n as f64,
        None => as_seconds(d) * 1.0e9,
    }
}
