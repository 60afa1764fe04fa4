use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::channel::by_channel;
use crate::codec::Decompressor;
use crate::config::{ParseConfig, DEFAULT_GAP_TOLERANCE};
use crate::mseed_error::MSeedError;
use crate::record::DataRecord;
use crate::seismogram::Seismogram;
use crate::segment::SeismogramSegment;

/// True if `next_start` is after `prev_end` by less than `tolerance` sample
/// periods of the earlier data. Overlaps and equal times are never contiguous.
pub fn is_contiguous_after(
    prev_end: DateTime<Utc>,
    prev_rate: f64,
    next_start: DateTime<Utc>,
    tolerance: f64,
) -> bool {
    let slack = Duration::nanoseconds((tolerance * 1.0e9 / prev_rate).round() as i64);
    prev_end < next_start && prev_end + slack > next_start
}

/// True if `b` continues `a` without a gap, using the default tolerance of
/// 1.5 sample periods.
pub fn are_contiguous(a: &DataRecord, b: &DataRecord) -> bool {
    are_contiguous_with_tolerance(a, b, DEFAULT_GAP_TOLERANCE)
}

pub fn are_contiguous_with_tolerance(a: &DataRecord, b: &DataRecord, tolerance: f64) -> bool {
    is_contiguous_after(a.end(), a.sample_rate(), b.start(), tolerance)
}

/// Joins records of one channel into segments, splitting wherever there is a
/// gap or overlap. Records are sorted by start time first, records with equal
/// start keep their input order. Samples are not decoded here.
pub fn merge_segments(
    mut records: Vec<DataRecord>,
    codec: Arc<dyn Decompressor>,
    config: &ParseConfig,
) -> Result<Vec<SeismogramSegment>, MSeedError> {
    records.sort_by_key(|r| r.start());
    let mut segments = Vec::new();
    let mut run: Vec<DataRecord> = Vec::new();
    for rec in records {
        if let Some(prev) = run.last() {
            if !are_contiguous_with_tolerance(prev, &rec, config.gap_tolerance) {
                debug!(
                    channel = %prev.codes("."),
                    prev_end = %prev.end(),
                    next_start = %rec.start(),
                    "gap or overlap, starting new segment"
                );
                segments.push(SeismogramSegment::from_records(
                    std::mem::take(&mut run),
                    Arc::clone(&codec),
                )?);
            }
        }
        run.push(rec);
    }
    if !run.is_empty() {
        segments.push(SeismogramSegment::from_records(run, codec)?);
    }
    Ok(segments)
}

/// All records, assumed to be one channel, as a single seismogram.
pub fn merge(
    records: Vec<DataRecord>,
    codec: Arc<dyn Decompressor>,
    config: &ParseConfig,
) -> Result<Seismogram, MSeedError> {
    if records.is_empty() {
        return Err(MSeedError::EmptySeismogram);
    }
    Seismogram::new(merge_segments(records, codec, config)?)
}

/// Groups records by channel and merges each group into a seismogram.
///
/// ```
/// # use mseed2::MSeedError;
/// # fn main() -> Result<(), MSeedError> {
/// use std::sync::Arc;
/// use chrono::{DateTime, Duration, Utc};
/// use mseed2::{seismogram_per_channel, ChannelId, DataRecord, ParseConfig, PrimitiveCodec, Samples};
/// let start = "2020-02-02T02:02:00Z".parse::<DateTime<Utc>>().unwrap();
/// let z = ChannelId::new("XX", "ABC", "00", "HHZ");
/// let records = vec![
///     DataRecord::from_samples(&z, start, 1, 1, Samples::Int32(vec![1, 2]))?,
///     DataRecord::from_samples(&z, start + Duration::seconds(2), 1, 1, Samples::Int32(vec![3]))?,
/// ];
/// let by_chan = seismogram_per_channel(records, Arc::new(PrimitiveCodec), &ParseConfig::default())?;
/// assert_eq!(by_chan["XX.ABC.00.HHZ"].y()?.len(), 3);
/// # Ok(())
/// # }
/// ```
pub fn seismogram_per_channel(
    records: Vec<DataRecord>,
    codec: Arc<dyn Decompressor>,
    config: &ParseConfig,
) -> Result<BTreeMap<String, Seismogram>, MSeedError> {
    let mut out = BTreeMap::new();
    for (key, recs) in by_channel(records) {
        let seis = merge(recs, Arc::clone(&codec), config).map_err(|e| e.in_channel(key.as_str()))?;
        debug!(channel = %key, segments = seis.segments().len(), "merged channel");
        out.insert(key, seis);
    }
    Ok(out)
}

/// Every segment of every channel, channels in key order.
pub fn segment_per_channel(
    records: Vec<DataRecord>,
    codec: Arc<dyn Decompressor>,
    config: &ParseConfig,
) -> Result<Vec<SeismogramSegment>, MSeedError> {
    let mut out = Vec::new();
    for (key, recs) in by_channel(records) {
        let segments =
            merge_segments(recs, Arc::clone(&codec), config).map_err(|e| e.in_channel(key))?;
        out.extend(segments);
    }
    Ok(out)
}
