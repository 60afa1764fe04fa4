use thiserror::Error;

#[derive(Error, Debug)]
pub enum MSeedError {
    #[error("IO Error")]
    IOError(#[from] std::io::Error),
    #[error("Insufficient bytes, {0} < needed size {1}")]
    InsufficientBytes(usize, usize),
    #[error("cannot parse config")]
    JsonError(#[from] serde_json::Error),
    #[error("Malformed header at byte {offset}: {reason}")]
    MalformedHeader { offset: usize, reason: String },
    #[error("cannot parse {1} in FDSN source identifier `{0}`")]
    IdentifierParse(String, String),
    #[error("Unknown data encoding: `{0}`")]
    UnknownEncoding(u8),
    #[error("Data is not contiguous: {0}")]
    NonContiguous(String),
    #[error("Asked for {requested} samples but only {available} available")]
    InsufficientLength { requested: usize, available: usize },
    #[error("Sample rate must be positive number: {0}")]
    InvalidSampleRate(f64),
    #[error("Segments not from same channel: {0}")]
    ChannelMismatch(String),
    #[error("Seismogram must have at least one segment")]
    EmptySeismogram,
    #[error("Duration must be positive: {0}")]
    InvalidDuration(String),
    #[error("record at byte offset {offset}")]
    Record {
        offset: usize,
        #[source]
        source: Box<MSeedError>,
    },
    #[error("channel `{key}`")]
    Channel {
        key: String,
        #[source]
        source: Box<MSeedError>,
    },
}

impl MSeedError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> MSeedError {
        MSeedError::MalformedHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Attach the byte offset of the record that failed to decode.
    pub fn in_record(self, offset: usize) -> MSeedError {
        MSeedError::Record {
            offset,
            source: Box::new(self),
        }
    }

    /// Attach the channel key of the data that failed to decode.
    pub fn in_channel(self, key: impl Into<String>) -> MSeedError {
        MSeedError::Channel {
            key: key.into(),
            source: Box::new(self),
        }
    }

    /// The underlying error with any record or channel context stripped.
    pub fn root(&self) -> &MSeedError {
        match self {
            MSeedError::Record { source, .. } => source.root(),
            MSeedError::Channel { source, .. } => source.root(),
            _ => self,
        }
    }
}
