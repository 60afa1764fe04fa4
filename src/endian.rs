use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

use crate::mseed_error::MSeedError;

/// Byte order of a header or of the sample payload.
///
/// Header byte order is inferred from the start time, payload byte order comes
/// from the word order field of blockette 1000.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl Endian {
    /// Word order field of blockette 1000, 0 is little endian, anything else big.
    pub fn from_word_order(word_order: u8) -> Endian {
        if word_order == 0 {
            Endian::Little
        } else {
            Endian::Big
        }
    }

    pub fn word_order(&self) -> u8 {
        match self {
            Endian::Little => 0,
            Endian::Big => 1,
        }
    }

    pub fn swapped(&self) -> Endian {
        match self {
            Endian::Big => Endian::Little,
            Endian::Little => Endian::Big,
        }
    }

    pub fn read_u16(&self, buf: &[u8], offset: usize) -> Result<u16, MSeedError> {
        let b = field(buf, offset, 2)?;
        Ok(match self {
            Endian::Big => BigEndian::read_u16(b),
            Endian::Little => LittleEndian::read_u16(b),
        })
    }

    pub fn read_i16(&self, buf: &[u8], offset: usize) -> Result<i16, MSeedError> {
        let b = field(buf, offset, 2)?;
        Ok(match self {
            Endian::Big => BigEndian::read_i16(b),
            Endian::Little => LittleEndian::read_i16(b),
        })
    }

    pub fn read_i32(&self, buf: &[u8], offset: usize) -> Result<i32, MSeedError> {
        let b = field(buf, offset, 4)?;
        Ok(match self {
            Endian::Big => BigEndian::read_i32(b),
            Endian::Little => LittleEndian::read_i32(b),
        })
    }

    pub fn read_f32(&self, buf: &[u8], offset: usize) -> Result<f32, MSeedError> {
        let b = field(buf, offset, 4)?;
        Ok(match self {
            Endian::Big => BigEndian::read_f32(b),
            Endian::Little => LittleEndian::read_f32(b),
        })
    }

    pub fn read_f64(&self, buf: &[u8], offset: usize) -> Result<f64, MSeedError> {
        let b = field(buf, offset, 8)?;
        Ok(match self {
            Endian::Big => BigEndian::read_f64(b),
            Endian::Little => LittleEndian::read_f64(b),
        })
    }

    pub fn write_u16<W: Write>(&self, w: &mut W, v: u16) -> Result<(), MSeedError> {
        match self {
            Endian::Big => w.write_u16::<BigEndian>(v)?,
            Endian::Little => w.write_u16::<LittleEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_i16<W: Write>(&self, w: &mut W, v: i16) -> Result<(), MSeedError> {
        match self {
            Endian::Big => w.write_i16::<BigEndian>(v)?,
            Endian::Little => w.write_i16::<LittleEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_i32<W: Write>(&self, w: &mut W, v: i32) -> Result<(), MSeedError> {
        match self {
            Endian::Big => w.write_i32::<BigEndian>(v)?,
            Endian::Little => w.write_i32::<LittleEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_f32<W: Write>(&self, w: &mut W, v: f32) -> Result<(), MSeedError> {
        match self {
            Endian::Big => w.write_f32::<BigEndian>(v)?,
            Endian::Little => w.write_f32::<LittleEndian>(v)?,
        }
        Ok(())
    }

    pub fn write_f64<W: Write>(&self, w: &mut W, v: f64) -> Result<(), MSeedError> {
        match self {
            Endian::Big => w.write_f64::<BigEndian>(v)?,
            Endian::Little => w.write_f64::<LittleEndian>(v)?,
        }
        Ok(())
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endian::Big => write!(f, "big endian"),
            Endian::Little => write!(f, "little endian"),
        }
    }
}

/// slice of `len` bytes at `offset`, or an error if the buffer is too short
fn field(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], MSeedError> {
    buf.get(offset..offset + len)
        .ok_or(MSeedError::InsufficientBytes(buf.len(), offset + len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_both_orders() -> Result<(), MSeedError> {
        let buf: [u8; 4] = [0x07, 0xe0, 0x01, 0x09];
        assert_eq!(2016, Endian::Big.read_i16(&buf, 0)?);
        assert_eq!(0xe007, Endian::Little.read_u16(&buf, 0)?);
        assert_eq!(0x0109, Endian::Big.read_u16(&buf, 2)?);
        Ok(())
    }

    #[test]
    fn read_past_end() {
        let buf: [u8; 3] = [0, 0, 0];
        assert!(matches!(
            Endian::Big.read_i32(&buf, 0),
            Err(MSeedError::InsufficientBytes(3, 4))
        ));
    }

    #[test]
    fn write_then_read() -> Result<(), MSeedError> {
        let mut out = Vec::new();
        Endian::Little.write_i32(&mut out, -42)?;
        Endian::Little.write_f64(&mut out, 1.5)?;
        assert_eq!(-42, Endian::Little.read_i32(&out, 0)?);
        assert_eq!(1.5, Endian::Little.read_f64(&out, 4)?);
        Ok(())
    }

    #[test]
    fn word_order() {
        assert_eq!(Endian::Little, Endian::from_word_order(0));
        assert_eq!(Endian::Big, Endian::from_word_order(1));
        assert_eq!(Endian::Little, Endian::Big.swapped());
    }
}
