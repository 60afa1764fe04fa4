use mseed2::MSeedError;
use std::io::Write;

#[test]
fn lib_test() -> Result<(), MSeedError> {
    use chrono::{DateTime, Duration, Utc};
    use mseed2::{ChannelId, DataRecord, ParseConfig, PrimitiveCodec, Samples};
    use std::sync::Arc;
    let start = "2014-11-28T12:00:09Z".parse::<DateTime<Utc>>().unwrap();
    let channel = ChannelId::new("CO", "BIRD", "00", "HHZ");
    let first = DataRecord::from_samples(
        &channel,
        start,
        10,
        1,
        Samples::Int32(vec![0, 1, -1, 5, 3, -5, 10, -1, 1, 0]),
    )?;
    let second = DataRecord::from_samples(
        &channel,
        start + Duration::seconds(1),
        10,
        1,
        Samples::Int32(vec![2, 4, 6]),
    )?;

    let path = std::env::temp_dir().join("mseed2_lib_test.ms");
    let outfile = std::fs::File::create(&path)?;
    let mut buf_writer = std::io::BufWriter::new(outfile);
    first.write_to(&mut buf_writer)?;
    second.write_to(&mut buf_writer)?;
    buf_writer.flush()?;

    println!("Record: \n{}", first);

    let my_mseed2_file = std::fs::File::open(&path)?;
    let mut buf_reader = std::io::BufReader::new(my_mseed2_file);
    let records = mseed2::read_mseed2(&mut buf_reader)?;
    assert_eq!(records.len(), 2);
    print!("Read back in: \n{}\n", records[0]);

    let by_channel =
        mseed2::seismogram_per_channel(records, Arc::new(PrimitiveCodec), &ParseConfig::default())?;
    let seis = &by_channel["CO.BIRD.00.HHZ"];
    assert!(seis.is_contiguous());
    assert_eq!(seis.num_points(), 13);
    assert_eq!(seis.end(), start + Duration::milliseconds(1200));
    std::fs::remove_file(&path)?;
    Ok(())
}
