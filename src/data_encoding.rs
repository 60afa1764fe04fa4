use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Formatter;

/// Data encoding codes from blockette 1000, SEED Reference Manual v2.4 appendix.
/// ```text
/// 0   ASCII text
/// 1   16-bit integer
/// 2   24-bit integer
/// 3   32-bit integer
/// 4   IEEE 32-bit float
/// 5   IEEE 64-bit float
/// 10  Steim-1 integer compression
/// 11  Steim-2 integer compression
/// 16  CDSN 16-bit gain ranged
/// 30  SRO gain ranged
/// 32  DWWSSN 16-bit integer
/// ```
/// Byte order for all of these comes from the word order field in blockette 1000.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEncoding {
    ASCII,
    INT16,
    INT24,
    INT32,
    FLOAT32,
    FLOAT64,
    STEIM1,
    STEIM2,
    CDSN,
    SRO,
    DWWSSN,
    UNKNOWN(u8),
}

impl DataEncoding {
    /// Creates a DataEncoding based on the input integer
    pub fn from_int(val: u8) -> DataEncoding {
        match val {
            0 => DataEncoding::ASCII,
            1 => DataEncoding::INT16,
            2 => DataEncoding::INT24,
            3 => DataEncoding::INT32,
            4 => DataEncoding::FLOAT32,
            5 => DataEncoding::FLOAT64,
            10 => DataEncoding::STEIM1,
            11 => DataEncoding::STEIM2,
            16 => DataEncoding::CDSN,
            30 => DataEncoding::SRO,
            32 => DataEncoding::DWWSSN,
            _ => DataEncoding::UNKNOWN(val),
        }
    }
    /// The integer value, as a u8, of the encoding
    pub fn value(&self) -> u8 {
        match &self {
            DataEncoding::ASCII => 0,
            DataEncoding::INT16 => 1,
            DataEncoding::INT24 => 2,
            DataEncoding::INT32 => 3,
            DataEncoding::FLOAT32 => 4,
            DataEncoding::FLOAT64 => 5,
            DataEncoding::STEIM1 => 10,
            DataEncoding::STEIM2 => 11,
            DataEncoding::CDSN => 16,
            DataEncoding::SRO => 30,
            DataEncoding::DWWSSN => 32,
            DataEncoding::UNKNOWN(val) => *val,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataEncoding::FLOAT32 | DataEncoding::FLOAT64)
    }
}

impl fmt::Display for DataEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DataEncoding::ASCII => write!(f, "ASCII text"),
            DataEncoding::INT16 => write!(f, "16-bit integer"),
            DataEncoding::INT24 => write!(f, "24-bit integer"),
            DataEncoding::INT32 => write!(f, "32-bit integer"),
            DataEncoding::FLOAT32 => write!(f, "32-bit float (IEEE single)"),
            DataEncoding::FLOAT64 => write!(f, "64-bit float (IEEE double)"),
            DataEncoding::STEIM1 => write!(f, "STEIM-1 integer compression"),
            DataEncoding::STEIM2 => write!(f, "STEIM-2 integer compression"),
            DataEncoding::CDSN => write!(f, "CDSN 16-bit gain ranged"),
            DataEncoding::SRO => write!(f, "SRO gain ranged"),
            DataEncoding::DWWSSN => write!(f, "DWWSSN 16-bit integer"),
            DataEncoding::UNKNOWN(val) => write!(f, "Unknown encoding: {}", val),
        }
    }
}
