use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use mseed2::{
    parse_data_records, parse_data_records_with_config, seismogram_per_channel, ChannelId,
    DataEncoding, DataRecord, Decompressor, Endian, MSeedError, ParseConfig, PrimitiveCodec,
    Samples, TimeRange,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 50).unwrap()
}

fn codec() -> Arc<dyn Decompressor> {
    Arc::new(PrimitiveCodec)
}

fn write_all(records: &[DataRecord]) -> Result<Vec<u8>, MSeedError> {
    let mut out = Vec::new();
    for r in records {
        r.write_to(&mut out)?;
    }
    Ok(out)
}

/// Two channels at 1 sps, interleaved. HHZ has a gap after its second record.
fn interleaved() -> Result<Vec<DataRecord>, MSeedError> {
    let z = ChannelId::new("IU", "ANMO", "00", "BHZ");
    let n = ChannelId::new("IU", "ANMO", "00", "BHN");
    Ok(vec![
        DataRecord::from_samples(&z, t0(), 1, 1, Samples::Int32((0..10).collect()))?,
        DataRecord::from_samples(&n, t0(), 1, 1, Samples::Float32(vec![0.5; 10]))?,
        DataRecord::from_samples(&z, t0() + Duration::seconds(10), 1, 1, Samples::Int32((10..20).collect()))?,
        DataRecord::from_samples(&n, t0() + Duration::seconds(10), 1, 1, Samples::Float32(vec![1.5; 10]))?,
        DataRecord::from_samples(&z, t0() + Duration::seconds(60), 1, 1, Samples::Int32((60..70).collect()))?,
    ])
}

#[test]
fn parse_group_merge() -> Result<(), MSeedError> {
    let bytes = write_all(&interleaved()?)?;
    let records = parse_data_records(&bytes)?;
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].header.record_size, 256);

    let by_channel = seismogram_per_channel(records, codec(), &ParseConfig::default())?;
    let keys: Vec<&str> = by_channel.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["IU.ANMO.00.BHN", "IU.ANMO.00.BHZ"]);

    let north = &by_channel["IU.ANMO.00.BHN"];
    assert_eq!(north.segments().len(), 1);
    assert_eq!(north.mean()?, Some(1.0));
    // crosses into March 1 2024, a leap year
    assert_eq!(north.end(), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 9).unwrap());

    let vert = &by_channel["IU.ANMO.00.BHZ"];
    assert_eq!(vert.segments().len(), 2);
    assert_eq!(vert.segments()[0].num_points(), 20);
    assert!(matches!(vert.y(), Err(MSeedError::NonContiguous(_))));
    assert_eq!(vert.source_id()?.to_string(), "FDSN:IU_ANMO_00_B_H_Z");
    Ok(())
}

#[test]
fn cut_across_gap() -> Result<(), MSeedError> {
    let bytes = write_all(&interleaved()?)?;
    let by_channel = seismogram_per_channel(parse_data_records(&bytes)?, codec(), &ParseConfig::default())?;
    let vert = &by_channel["IU.ANMO.00.BHZ"];
    let window = TimeRange::new(t0() + Duration::seconds(15), t0() + Duration::seconds(62));
    let cut = vert.cut(&window)?.expect("window overlaps data");
    assert_eq!(cut.segments().len(), 2);
    assert_eq!(cut.segments()[0].y()?, &Samples::Int32((15..20).collect()));
    assert_eq!(cut.segments()[1].y()?, &Samples::Int32(vec![60, 61, 62]));
    let in_gap = TimeRange::from_duration(t0() + Duration::seconds(30), Duration::seconds(10));
    assert!(vert.cut(&in_gap)?.is_none());
    Ok(())
}

#[test]
fn little_endian_headers() -> Result<(), MSeedError> {
    let channel = ChannelId::new("XX", "LE", "", "HHZ");
    let mut big = DataRecord::from_samples(&channel, t0(), 100, 1, Samples::Int32(vec![7, -7, 7]))?;
    let big_bytes = write_all(std::slice::from_ref(&big))?;
    big.header.header_endian = Endian::Little;
    let little_bytes = write_all(std::slice::from_ref(&big))?;
    assert_ne!(big_bytes, little_bytes);

    let from_big = parse_data_records(&big_bytes)?;
    let from_little = parse_data_records(&little_bytes)?;
    assert_eq!(from_big[0].header.header_endian, Endian::Big);
    assert_eq!(from_little[0].header.header_endian, Endian::Little);
    assert_eq!(from_big[0].start(), from_little[0].start());
    assert_eq!(from_big[0].sample_rate(), 100.0);
    assert_eq!(from_big[0].header.blockettes, from_little[0].header.blockettes);
    assert_eq!(
        from_little[0].decompress_primitive()?,
        &Samples::Int32(vec![7, -7, 7])
    );
    Ok(())
}

#[test]
fn bad_record_reports_offset() -> Result<(), MSeedError> {
    let mut bytes = write_all(&interleaved()?[0..2])?;
    bytes.extend_from_slice(&[0u8; 64]);
    match parse_data_records(&bytes) {
        Err(MSeedError::Record { offset, source }) => {
            assert_eq!(offset, 512);
            assert!(matches!(*source, MSeedError::MalformedHeader { .. }));
        }
        other => panic!("expected record error, got {:?}", other.map(|r| r.len())),
    }
    Ok(())
}

#[test]
fn compressed_needs_codec() -> Result<(), MSeedError> {
    let channel = ChannelId::new("XX", "ABC", "00", "HHZ");
    let mut rec = DataRecord::from_samples(&channel, t0(), 1, 1, Samples::Int32(vec![1, 2, 3]))?;
    rec.header.encoding = DataEncoding::STEIM1;
    let by_channel = seismogram_per_channel(vec![rec], codec(), &ParseConfig::default())?;
    let err = by_channel["XX.ABC.00.HHZ"].y().unwrap_err();
    assert!(matches!(err.root(), MSeedError::UnknownEncoding(10)));
    Ok(())
}

#[test]
fn config_tolerance() -> Result<(), MSeedError> {
    let config = ParseConfig::from_json_str(r#"{"gap_tolerance": 3.0}"#)?;
    let channel = ChannelId::new("XX", "ABC", "00", "HHZ");
    let records = vec![
        DataRecord::from_samples(&channel, t0(), 1, 1, Samples::Int32(vec![1; 5]))?,
        // one missing sample
        DataRecord::from_samples(&channel, t0() + Duration::seconds(6), 1, 1, Samples::Int32(vec![1; 5]))?,
    ];
    let bytes = write_all(&records)?;
    let parsed = parse_data_records_with_config(&bytes, &config)?;
    let strict = seismogram_per_channel(parsed.clone(), codec(), &ParseConfig::default())?;
    assert_eq!(strict["XX.ABC.00.HHZ"].segments().len(), 2);
    let loose = seismogram_per_channel(parsed, codec(), &config)?;
    assert_eq!(loose["XX.ABC.00.HHZ"].segments().len(), 1);
    Ok(())
}
