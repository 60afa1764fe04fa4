use std::fmt;

use crate::data_encoding::DataEncoding;
use crate::endian::Endian;
use crate::mseed_error::MSeedError;
use crate::samples::Samples;

/// Turns the payload bytes of a record into sample values.
///
/// Implementations must be pure, the same input always decodes to the same
/// samples, as results are cached per record and may be discarded if two
/// threads race to decode the same record.
pub trait Decompressor: fmt::Debug + Send + Sync {
    /// Decode `num_samples` values of `encoding` from `payload`.
    ///
    /// Encodings the implementation does not handle must return
    /// [`MSeedError::UnknownEncoding`].
    fn decompress(
        &self,
        encoding: &DataEncoding,
        payload: &[u8],
        num_samples: usize,
        endian: Endian,
    ) -> Result<Samples, MSeedError>;
}

/// Decodes the uncompressed primitive encodings, 16 and 32 bit integers and 32
/// and 64 bit floats. Compressed encodings such as Steim1 and Steim2 need a
/// caller supplied [`Decompressor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveCodec;

impl Decompressor for PrimitiveCodec {
    fn decompress(
        &self,
        encoding: &DataEncoding,
        payload: &[u8],
        num_samples: usize,
        endian: Endian,
    ) -> Result<Samples, MSeedError> {
        // records with no samples, like detections, often have encoding 0 which
        // would otherwise fail
        if num_samples == 0 {
            return Ok(Samples::Int32(Vec::new()));
        }
        match encoding {
            DataEncoding::INT16 | DataEncoding::DWWSSN => {
                check_length(payload, num_samples, 2)?;
                let out = (0..num_samples)
                    .map(|i| endian.read_i16(payload, 2 * i).map(i32::from))
                    .collect::<Result<Vec<i32>, MSeedError>>()?;
                Ok(Samples::Int32(out))
            }
            DataEncoding::INT32 => {
                check_length(payload, num_samples, 4)?;
                let out = (0..num_samples)
                    .map(|i| endian.read_i32(payload, 4 * i))
                    .collect::<Result<Vec<i32>, MSeedError>>()?;
                Ok(Samples::Int32(out))
            }
            DataEncoding::FLOAT32 => {
                check_length(payload, num_samples, 4)?;
                let out = (0..num_samples)
                    .map(|i| endian.read_f32(payload, 4 * i))
                    .collect::<Result<Vec<f32>, MSeedError>>()?;
                Ok(Samples::Float32(out))
            }
            DataEncoding::FLOAT64 => {
                check_length(payload, num_samples, 8)?;
                let out = (0..num_samples)
                    .map(|i| endian.read_f64(payload, 8 * i))
                    .collect::<Result<Vec<f64>, MSeedError>>()?;
                Ok(Samples::Float64(out))
            }
            _ => Err(MSeedError::UnknownEncoding(encoding.value())),
        }
    }
}

fn check_length(payload: &[u8], num_samples: usize, width: usize) -> Result<(), MSeedError> {
    let available = payload.len() / width;
    if available < num_samples {
        return Err(MSeedError::InsufficientLength {
            requested: num_samples,
            available,
        });
    }
    Ok(())
}
