use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::channel::ChannelId;
use crate::config::DEFAULT_GAP_TOLERANCE;
use crate::fdsn_source_identifier::FdsnSourceIdentifier;
use crate::merge::is_contiguous_after;
use crate::mseed_error::MSeedError;
use crate::samples::Samples;
use crate::segment::SeismogramSegment;
use crate::time_range::TimeRange;

/// All the data for one channel, one or more segments possibly with gaps
/// between them. Every segment has the same channel, sample rate and unit.
#[derive(Debug, Clone)]
pub struct Seismogram {
    segments: Vec<SeismogramSegment>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Seismogram {
    pub fn new(segments: Vec<SeismogramSegment>) -> Result<Seismogram, MSeedError> {
        let first = segments.first().ok_or(MSeedError::EmptySeismogram)?;
        for s in &segments[1..] {
            check_similar(first, s)?;
        }
        Ok(Seismogram::from_similar(segments))
    }

    pub fn from_segment(segment: SeismogramSegment) -> Seismogram {
        Seismogram::from_similar(vec![segment])
    }

    // segments must be non-empty and already checked
    fn from_similar(segments: Vec<SeismogramSegment>) -> Seismogram {
        let start = segments.iter().map(|s| s.start()).min().unwrap_or_default();
        let end = segments.iter().map(|s| s.end()).max().unwrap_or_default();
        Seismogram {
            segments,
            start,
            end,
        }
    }

    pub fn append_segment(&mut self, segment: SeismogramSegment) -> Result<(), MSeedError> {
        check_similar(&self.segments[0], &segment)?;
        self.start = self.start.min(segment.start());
        self.end = self.end.max(segment.end());
        self.segments.push(segment);
        Ok(())
    }

    /// Appends all the segments of `other`, nothing is appended if any of them
    /// does not match.
    pub fn append(&mut self, other: Seismogram) -> Result<(), MSeedError> {
        for s in &other.segments {
            check_similar(&self.segments[0], s)?;
        }
        for s in other.segments {
            self.append_segment(s)?;
        }
        Ok(())
    }

    pub fn segments(&self) -> &[SeismogramSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<SeismogramSegment> {
        self.segments
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    pub fn sample_rate(&self) -> f64 {
        self.segments[0].sample_rate()
    }

    pub fn y_unit(&self) -> &str {
        self.segments[0].y_unit()
    }

    pub fn channel_id(&self) -> &ChannelId {
        self.segments[0].channel_id()
    }

    pub fn codes(&self, sep: &str) -> String {
        self.segments[0].codes(sep)
    }

    pub fn source_id(&self) -> Result<FdsnSourceIdentifier, MSeedError> {
        self.segments[0].source_id()
    }

    pub fn num_points(&self) -> usize {
        self.segments.iter().map(|s| s.num_points()).sum()
    }

    /// Keeps whole segments that overlap the window, without cutting them.
    pub fn trim(&self, window: &TimeRange) -> Option<Seismogram> {
        let kept: Vec<SeismogramSegment> = self
            .segments
            .iter()
            .filter(|s| s.end() >= window.start && s.start() <= window.end)
            .cloned()
            .collect();
        if kept.is_empty() {
            None
        } else {
            Some(Seismogram::from_similar(kept))
        }
    }

    /// New seismogram with just the samples inside the window.
    pub fn cut(&self, window: &TimeRange) -> Result<Option<Seismogram>, MSeedError> {
        let trimmed = match self.trim(window) {
            Some(t) => t,
            None => return Ok(None),
        };
        let mut cut = Vec::new();
        for s in &trimmed.segments {
            if let Some(c) = s.cut(window)? {
                cut.push(c);
            }
        }
        if cut.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Seismogram::from_similar(cut)))
        }
    }

    /// Splits the segments at every multiple of `duration` after the start. Each
    /// sample lands in exactly one window.
    pub fn break_into(&mut self, duration: Duration) -> Result<(), MSeedError> {
        if duration <= Duration::zero() {
            return Err(MSeedError::InvalidDuration(duration.to_string()));
        }
        let mut out = Vec::new();
        let mut window_start = self.start;
        while window_start <= self.end {
            let window_end = window_start + duration;
            for s in &self.segments {
                if let Some(c) = s.split(window_start, window_end)? {
                    out.push(c);
                }
            }
            window_start += duration;
        }
        if !out.is_empty() {
            *self = Seismogram::from_similar(out);
        }
        Ok(())
    }

    /// True if there is one segment or each segment continues on from the one
    /// before it in time, within 1.5 sample periods.
    pub fn is_contiguous(&self) -> bool {
        self.is_contiguous_with_tolerance(DEFAULT_GAP_TOLERANCE)
    }

    /// As [`Seismogram::is_contiguous`], allowing `tolerance` sample periods
    /// between segments.
    pub fn is_contiguous_with_tolerance(&self, tolerance: f64) -> bool {
        self.chronological().windows(2).all(|pair| {
            is_contiguous_after(
                pair[0].end(),
                pair[0].sample_rate(),
                pair[1].start(),
                tolerance,
            )
        })
    }

    /// The samples of all segments joined in time order, only if contiguous.
    pub fn merge(&self) -> Result<Samples, MSeedError> {
        if !self.is_contiguous() {
            return Err(MSeedError::NonContiguous(self.codes(".")));
        }
        let parts = self
            .chronological()
            .into_iter()
            .map(|s| s.y())
            .collect::<Result<Vec<&Samples>, MSeedError>>()?;
        Samples::concat(parts).ok_or(MSeedError::EmptySeismogram)
    }

    /// Same as [`Seismogram::merge`].
    pub fn y(&self) -> Result<Samples, MSeedError> {
        self.merge()
    }

    /// A single segment seismogram with the channel and rate of this one,
    /// starting at this start.
    pub fn clone_with_new_data(&self, y: Samples) -> Result<Seismogram, MSeedError> {
        if y.is_empty() {
            return Err(MSeedError::EmptySeismogram);
        }
        let first = &self.chronological()[0];
        Ok(Seismogram::from_segment(
            first.clone_with_new_data(y, self.start),
        ))
    }

    pub fn find_min_max(&self) -> Result<Option<(f64, f64)>, MSeedError> {
        let mut acc = None;
        for s in &self.segments {
            acc = s.find_min_max(acc)?;
        }
        Ok(acc)
    }

    /// Mean over every sample of every segment.
    pub fn mean(&self) -> Result<Option<f64>, MSeedError> {
        let n = self.num_points();
        if n == 0 {
            return Ok(None);
        }
        let mut sum = 0.0;
        for s in &self.segments {
            sum += s.y()?.sum();
        }
        Ok(Some(sum / n as f64))
    }

    fn chronological(&self) -> Vec<&SeismogramSegment> {
        let mut sorted: Vec<&SeismogramSegment> = self.segments.iter().collect();
        sorted.sort_by_key(|s| s.start());
        sorted
    }
}

impl fmt::Display for Seismogram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} segments",
            self.codes("."),
            self.time_range(),
            self.segments.len()
        )
    }
}

fn check_similar(f: &SeismogramSegment, s: &SeismogramSegment) -> Result<(), MSeedError> {
    if f.channel_id() != s.channel_id() {
        return Err(MSeedError::ChannelMismatch(format!(
            "{} != {}",
            s.channel_id(),
            f.channel_id()
        )));
    }
    if f.y_unit() != s.y_unit() {
        return Err(MSeedError::ChannelMismatch(format!(
            "yUnit {} != {}",
            s.y_unit(),
            f.y_unit()
        )));
    }
    if f.sample_rate() != s.sample_rate() {
        return Err(MSeedError::ChannelMismatch(format!(
            "sample rate {} != {}",
            s.sample_rate(),
            f.sample_rate()
        )));
    }
    Ok(())
}
