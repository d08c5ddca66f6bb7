#[cfg(feature = "serde")]
/// Reads observations from `filepath`, a JSON array of
/// `{"date": <unix seconds>, "close": <price>, ...}` objects.
pub fn get_data_from_file(filepath: std::path::PathBuf) -> crate::errors::Result<Vec<crate::engine::Observation>> {
    use crate::errors::Error;
    use std::{fs::File, io::BufReader};

    let file = File::open(filepath)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(Error::from)
}

/// Generates a random ID.
pub fn random_id() -> u32 {
    rand::random()
}

#[cfg(all(test, feature = "serde"))]
#[test]
fn read_observations_from_file() {
    let path = std::env::temp_dir().join(format!("swing-rs-{}.json", random_id()));
    std::fs::write(&path, r#"[{"date": 1515151515, "close": 0.5}, {"timestamp": 1515153315, "close": 0.6, "volume": 12.0}]"#)
        .unwrap();

    let data = get_data_from_file(path.clone()).unwrap();
    std::fs::remove_file(path).unwrap();

    assert_eq!(data.len(), 2);
    assert_eq!(data[0].close(), 0.5);
    assert_eq!(data[1].volume(), Some(12.0));
    assert_eq!((data[1].timestamp() - data[0].timestamp()).num_minutes(), 30);
}
