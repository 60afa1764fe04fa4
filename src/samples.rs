use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;
use std::io::Write;

use crate::data_encoding::DataEncoding;
use crate::endian::Endian;
use crate::mseed_error::MSeedError;

/// Decoded timeseries values. 16 bit integer data is widened to `Int32`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Samples {
    Int32(Vec<i32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Samples::Int32(v) => v.len(),
            Samples::Float32(v) => v.len(),
            Samples::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at index i as a f64, negative i counts back from the end.
    pub fn value_at(&self, i: i64) -> Option<f64> {
        let idx = if i >= 0 { i } else { self.len() as i64 + i };
        if idx < 0 {
            return None;
        }
        let idx = idx as usize;
        match self {
            Samples::Int32(v) => v.get(idx).map(|&x| x as f64),
            Samples::Float32(v) => v.get(idx).map(|&x| x as f64),
            Samples::Float64(v) => v.get(idx).copied(),
        }
    }

    /// Copy of the values from `start` up to, not including, `end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<Samples, MSeedError> {
        if start > end || end > self.len() {
            return Err(MSeedError::InsufficientLength {
                requested: end.max(start),
                available: self.len(),
            });
        }
        Ok(match self {
            Samples::Int32(v) => Samples::Int32(v[start..end].to_vec()),
            Samples::Float32(v) => Samples::Float32(v[start..end].to_vec()),
            Samples::Float64(v) => Samples::Float64(v[start..end].to_vec()),
        })
    }

    /// Appends the values of other, converted to the type of self.
    pub fn append(&mut self, other: &Samples) {
        match (self, other) {
            (Samples::Int32(a), Samples::Int32(b)) => a.extend_from_slice(b),
            (Samples::Float32(a), Samples::Float32(b)) => a.extend_from_slice(b),
            (Samples::Float64(a), Samples::Float64(b)) => a.extend_from_slice(b),
            (Samples::Int32(a), b) => a.extend(b.to_f64().into_iter().map(|x| x.round() as i32)),
            (Samples::Float32(a), b) => a.extend(b.to_f64().into_iter().map(|x| x as f32)),
            (Samples::Float64(a), b) => a.extend(b.to_f64()),
        }
    }

    /// Concatenates in order, the result has the type of the first part.
    /// None if there are no parts.
    pub fn concat<'a, I>(parts: I) -> Option<Samples>
    where
        I: IntoIterator<Item = &'a Samples>,
    {
        let mut iter = parts.into_iter();
        let mut out = iter.next()?.clone();
        for s in iter {
            out.append(s);
        }
        Some(out)
    }

    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Samples::Int32(v) => v.iter().map(|&x| x as f64).collect(),
            Samples::Float32(v) => v.iter().map(|&x| x as f64).collect(),
            Samples::Float64(v) => v.clone(),
        }
    }

    /// Min and max values, widening the optional accumulator, for use across the
    /// segments of gappy data.
    pub fn find_min_max(&self, accumulator: Option<(f64, f64)>) -> Option<(f64, f64)> {
        self.to_f64().into_iter().fold(accumulator, |acc, v| match acc {
            Some((min, max)) => Some((min.min(v), max.max(v))),
            None => Some((v, v)),
        })
    }

    pub fn sum(&self) -> f64 {
        match self {
            Samples::Int32(v) => v.iter().map(|&x| x as f64).sum(),
            Samples::Float32(v) => v.iter().map(|&x| x as f64).sum(),
            Samples::Float64(v) => v.iter().sum(),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.sum() / self.len() as f64)
        }
    }

    /// The uncompressed encoding matching this type.
    pub fn encoding(&self) -> DataEncoding {
        match self {
            Samples::Int32(_) => DataEncoding::INT32,
            Samples::Float32(_) => DataEncoding::FLOAT32,
            Samples::Float64(_) => DataEncoding::FLOAT64,
        }
    }

    pub fn byte_len(&self) -> usize {
        match self {
            Samples::Int32(v) => 4 * v.len(),
            Samples::Float32(v) => 4 * v.len(),
            Samples::Float64(v) => 8 * v.len(),
        }
    }

    /// Writes the values uncompressed in the given byte order.
    pub fn write_to<W: Write>(&self, buf: &mut W, endian: Endian) -> Result<(), MSeedError> {
        match self {
            Samples::Int32(v) => {
                for &el in v {
                    endian.write_i32(buf, el)?;
                }
            }
            Samples::Float32(v) => {
                for &el in v {
                    endian.write_f32(buf, el)?;
                }
            }
            Samples::Float64(v) => {
                for &el in v {
                    endian.write_f64(buf, el)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Samples {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Samples::Int32(v) => write!(f, "Int32, {} samples", v.len()),
            Samples::Float32(v) => write!(f, "Float32, {} samples", v.len()),
            Samples::Float64(v) => write!(f, "Float64, {} samples", v.len()),
        }
    }
}
