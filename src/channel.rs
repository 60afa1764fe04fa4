use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::fdsn_source_identifier::FdsnSourceIdentifier;
use crate::mseed_error::MSeedError;
use crate::record::DataRecord;

/// Network, station, location and channel codes of a miniseed2 record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChannelId {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
}

impl ChannelId {
    pub fn new(network: &str, station: &str, location: &str, channel: &str) -> ChannelId {
        ChannelId {
            network: network.to_string(),
            station: station.to_string(),
            location: location.to_string(),
            channel: channel.to_string(),
        }
    }

    /// The four codes joined by `sep`, an empty location stays empty.
    pub fn codes(&self, sep: &str) -> String {
        format!(
            "{}{sep}{}{sep}{}{sep}{}",
            self.network,
            self.station,
            self.location,
            self.channel,
            sep = sep
        )
    }

    /// Key used to group records, `NET.STA.LOC.CHAN`.
    pub fn key(&self) -> String {
        self.codes(".")
    }

    pub fn source_id(&self) -> Result<FdsnSourceIdentifier, MSeedError> {
        FdsnSourceIdentifier::from_nslc(&self.network, &self.station, &self.location, &self.channel)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Splits records by channel key. Within each channel the input order is kept.
pub fn by_channel(records: Vec<DataRecord>) -> BTreeMap<String, Vec<DataRecord>> {
    let mut out: BTreeMap<String, Vec<DataRecord>> = BTreeMap::new();
    for rec in records {
        out.entry(rec.channel_id().key()).or_default().push(rec);
    }
    debug!(channels = out.len(), "grouped records by channel");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Samples;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn codes() {
        let c = ChannelId::new("CO", "JSC", "", "HHZ");
        assert_eq!("CO.JSC..HHZ", c.key());
        assert_eq!("CO_JSC__HHZ", c.codes("_"));
        assert_eq!("CO.JSC..HHZ", c.to_string());
    }

    #[test]
    fn group_keeps_order() -> Result<(), MSeedError> {
        let t = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
        let z = ChannelId::new("CO", "JSC", "00", "HHZ");
        let n = ChannelId::new("CO", "JSC", "00", "HHN");
        let mut records = Vec::new();
        for i in 0..3 {
            let start = t + Duration::seconds(10 * (3 - i));
            records.push(DataRecord::from_samples(&z, start, 1, 1, Samples::Int32(vec![i as i32]))?);
            records.push(DataRecord::from_samples(&n, start, 1, 1, Samples::Int32(vec![i as i32]))?);
        }
        let grouped = by_channel(records);
        let keys: Vec<&String> = grouped.keys().collect();
        assert_eq!(keys, vec!["CO.JSC.00.HHN", "CO.JSC.00.HHZ"]);
        let z_starts: Vec<_> = grouped["CO.JSC.00.HHZ"].iter().map(|r| r.start()).collect();
        assert_eq!(
            z_starts,
            vec![t + Duration::seconds(30), t + Duration::seconds(20), t + Duration::seconds(10)]
        );
        assert!(by_channel(Vec::new()).is_empty());
        Ok(())
    }
}
