use crate::MSeedError;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

lazy_static! {
    static ref PARSE_FDSN_REGEX: Regex = Regex::new(
        r"(?x)^
            FDSN:                      # prefix
            (?P<net>[A-Z0-9]{1,8})_    # network, 1-8 chars
            (?P<sta>[-A-Z0-9]{1,8})_   # station, 1-8 chars with dash
            (?P<loc>[-A-Z0-9]{0,8})_   # location, 0-8 chars with dash
            (?P<band>[A-Z0-9]*)_       # band, optional, usually single char
            (?P<source>[A-Z0-9]+)_     # source, one or more, usually single char
            (?P<subsource>[A-Z0-9]*)$  # subsource, optional, usually single char
"
    )
    .unwrap();
    static ref SEPARATED_CHANNEL_REGEX: Regex =
        Regex::new(r"^(?P<band>[A-Z0-9]*)_(?P<source>[A-Z0-9]+)_(?P<subsource>[A-Z0-9]*)$").unwrap();
}

pub const PREFIX: &str = "FDSN:";

/// An FDSN Source Identifier string parsed into its component parts
/// See the specification at <http://docs.fdsn.org/projects/source-identifiers/en/v1.0/index.html>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FdsnSourceIdentifier {
    pub network: String,
    pub station: String,
    pub location: String,
    pub band: String,
    pub source: String,
    pub subsource: String,
}

impl FdsnSourceIdentifier {
    pub fn parse(id: &str) -> Result<FdsnSourceIdentifier, MSeedError> {
        let sid = match PARSE_FDSN_REGEX.captures(id) {
            Some(captures) => FdsnSourceIdentifier {
                network: capture_named(&captures, "net", id)?,
                station: capture_named(&captures, "sta", id)?,
                location: capture_named(&captures, "loc", id)?,
                band: capture_named(&captures, "band", id)?,
                source: capture_named(&captures, "source", id)?,
                subsource: capture_named(&captures, "subsource", id)?,
            },
            None => {
                return Err(MSeedError::IdentifierParse(
                    id.to_string(),
                    String::from("all"),
                ))
            }
        };
        Ok(sid)
    }

    /// Builds the identifier from miniseed2 style codes. A three character
    /// channel code splits into band, source and subsource, longer codes must
    /// already be separated as `B_S_SS`.
    pub fn from_nslc(
        network: &str,
        station: &str,
        location: &str,
        channel: &str,
    ) -> Result<FdsnSourceIdentifier, MSeedError> {
        let (band, source, subsource) = if channel.len() == 3 && channel.is_ascii() {
            (&channel[0..1], &channel[1..2], &channel[2..3])
        } else {
            match SEPARATED_CHANNEL_REGEX.captures(channel) {
                Some(c) => (
                    c.name("band").map_or("", |m| m.as_str()),
                    c.name("source").map_or("", |m| m.as_str()),
                    c.name("subsource").map_or("", |m| m.as_str()),
                ),
                None => {
                    return Err(MSeedError::IdentifierParse(
                        channel.to_string(),
                        String::from("channel"),
                    ))
                }
            }
        };
        // round trip through the parser so the pieces get validated
        FdsnSourceIdentifier::parse(&format!(
            "{}{}_{}_{}_{}_{}_{}",
            PREFIX, network, station, location, band, source, subsource
        ))
    }

    /// The band, source and subsource joined back into a channel code, without
    /// separators when each is a single character.
    pub fn channel_code(&self) -> String {
        if self.band.len() == 1 && self.source.len() == 1 && self.subsource.len() == 1 {
            format!("{}{}{}", self.band, self.source, self.subsource)
        } else {
            format!("{}_{}_{}", self.band, self.source, self.subsource)
        }
    }

    pub fn create_fake_channel() -> FdsnSourceIdentifier {
        FdsnSourceIdentifier {
            network: String::from("XX"),
            station: String::from("STA"),
            location: String::from("00"),
            band: String::from("B"),
            source: String::from("H"),
            subsource: String::from("Z"),
        }
    }
}

impl fmt::Display for FdsnSourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}_{}_{}_{}_{}_{}",
            PREFIX,
            self.network,
            self.station,
            self.location,
            self.band,
            self.source,
            self.subsource
        )
    }
}

fn capture_named(captures: &Captures, name: &str, id: &str) -> Result<String, MSeedError> {
    match captures.name(name) {
        Some(s) => Ok(s.as_str().to_string()),
        None => Err(MSeedError::IdentifierParse(
            id.to_string(),
            name.to_string(),
        )),
    }
}

impl Serialize for FdsnSourceIdentifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct SourceIdentifierVisitor;

impl<'de> Visitor<'de> for SourceIdentifierVisitor {
    type Value = FdsnSourceIdentifier;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an FDSN source identifier string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        FdsnSourceIdentifier::parse(value).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for FdsnSourceIdentifier {
    fn deserialize<D>(deserializer: D) -> Result<FdsnSourceIdentifier, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(SourceIdentifierVisitor)
    }
}
