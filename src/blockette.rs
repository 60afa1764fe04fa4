use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::data_encoding::DataEncoding;
use crate::endian::Endian;
use crate::mseed_error::MSeedError;

pub const B100_TYPE: u16 = 100;
pub const B1000_TYPE: u16 = 1000;
pub const B1001_TYPE: u16 = 1001;

/// Size in bytes of the known blockettes, including the 4 byte type/next prefix.
pub const B100_SIZE: usize = 12;
pub const B1000_SIZE: usize = 8;
pub const B1001_SIZE: usize = 8;

/// A blockette from the chain following the fixed header.
///
/// Blockettes 100, 1000 and 1001 are decoded, anything else is kept as the raw
/// bytes of its declared length, starting with its type code.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Blockette {
    /// Blockette 100, actual sample rate.
    SampleRate { sample_rate: f32, flags: u8 },
    /// Blockette 1000, data only SEED.
    FormatDescriptor {
        encoding: DataEncoding,
        word_order: u8,
        record_length_exp: u8,
    },
    /// Blockette 1001, data extension.
    DataExtension {
        timing_quality: u8,
        microsecond: i8,
        frame_count: u8,
    },
    Other { blockette_type: u16, body: Vec<u8> },
}

impl Blockette {
    /// Parses the blockette at `offset` in a record.
    ///
    /// `length` is the declared length from the chain, which may be zero for a
    /// malformed last blockette. Known types are decoded from their fixed layout
    /// as long as the record has the bytes.
    pub fn from_bytes(
        buf: &[u8],
        offset: usize,
        length: usize,
        endian: Endian,
    ) -> Result<Blockette, MSeedError> {
        let blockette_type = endian.read_u16(buf, offset)?;
        let blockette = match blockette_type {
            B100_TYPE => {
                check_size(buf, offset, B100_SIZE, blockette_type)?;
                Blockette::SampleRate {
                    sample_rate: endian.read_f32(buf, offset + 4)?,
                    flags: buf[offset + 8],
                }
            }
            B1000_TYPE => {
                check_size(buf, offset, B1000_SIZE, blockette_type)?;
                Blockette::FormatDescriptor {
                    encoding: DataEncoding::from_int(buf[offset + 4]),
                    word_order: buf[offset + 5],
                    record_length_exp: buf[offset + 6],
                }
            }
            B1001_TYPE => {
                check_size(buf, offset, B1001_SIZE, blockette_type)?;
                Blockette::DataExtension {
                    timing_quality: buf[offset + 4],
                    microsecond: buf[offset + 5] as i8,
                    frame_count: buf[offset + 7],
                }
            }
            _ => {
                let end = offset + length;
                let body = buf
                    .get(offset..end)
                    .ok_or_else(|| {
                        MSeedError::malformed(
                            offset,
                            format!("blockette {} extends past end of record", blockette_type),
                        )
                    })?
                    .to_vec();
                Blockette::Other {
                    blockette_type,
                    body,
                }
            }
        };
        Ok(blockette)
    }

    pub fn blockette_type(&self) -> u16 {
        match self {
            Blockette::SampleRate { .. } => B100_TYPE,
            Blockette::FormatDescriptor { .. } => B1000_TYPE,
            Blockette::DataExtension { .. } => B1001_TYPE,
            Blockette::Other { blockette_type, .. } => *blockette_type,
        }
    }

    /// Size in bytes when written.
    pub fn byte_len(&self) -> usize {
        match self {
            Blockette::SampleRate { .. } => B100_SIZE,
            Blockette::FormatDescriptor { .. } => B1000_SIZE,
            Blockette::DataExtension { .. } => B1001_SIZE,
            Blockette::Other { body, .. } => body.len().max(4),
        }
    }

    /// Writes the blockette with `next` as the offset of the following one,
    /// zero for the last.
    pub fn write_to<W: Write>(&self, buf: &mut W, next: u16, endian: Endian) -> Result<(), MSeedError> {
        endian.write_u16(buf, self.blockette_type())?;
        endian.write_u16(buf, next)?;
        match self {
            Blockette::SampleRate { sample_rate, flags } => {
                endian.write_f32(buf, *sample_rate)?;
                buf.write_all(&[*flags, 0, 0, 0])?;
            }
            Blockette::FormatDescriptor {
                encoding,
                word_order,
                record_length_exp,
            } => {
                buf.write_all(&[encoding.value(), *word_order, *record_length_exp, 0])?;
            }
            Blockette::DataExtension {
                timing_quality,
                microsecond,
                frame_count,
            } => {
                buf.write_all(&[*timing_quality, *microsecond as u8, 0, *frame_count])?;
            }
            Blockette::Other { body, .. } => {
                if body.len() > 4 {
                    buf.write_all(&body[4..])?;
                }
            }
        }
        Ok(())
    }
}

fn check_size(buf: &[u8], offset: usize, size: usize, blockette_type: u16) -> Result<(), MSeedError> {
    if buf.len() < offset + size {
        return Err(MSeedError::malformed(
            offset,
            format!("blockette {} needs {} bytes", blockette_type, size),
        ));
    }
    Ok(())
}
