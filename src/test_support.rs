//! Fixture builders shared by unit tests

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Gzip a byte slice
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Newline-delimited JSON for the given records
pub fn ndjson(records: &[Value]) -> String {
    records
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A vehicle-like record
pub fn vehicle(id: usize) -> Value {
    json!({
        "registration": format!("AB{id:02}CDE"),
        "make": "FORD",
        "firstUsedDate": "2015-03-01",
        "motTests": [
            {"testResult": "PASSED", "odometerValue": 1000 + id},
        ],
    })
}

/// Write a zip archive with stored (uncompressed) entries
pub fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in entries {
        writer.start_file(name.as_str(), options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

/// Entries `bulk-light-vehicle_<date>_<i>.json.gz`, one record each, plus
/// `delta` siblings that must never be selected
pub fn bulk_entries(count: usize, deltas: usize) -> Vec<(String, Vec<u8>)> {
    let mut entries = Vec::new();
    for i in 0..count {
        let data = gzip(ndjson(&[vehicle(i)]).as_bytes());
        entries.push((format!("bulk-light-vehicle_20240101_{i:03}.json.gz"), data));
    }
    for i in 0..deltas {
        let data = gzip(ndjson(&[vehicle(900 + i)]).as_bytes());
        entries.push((format!("delta-light-vehicle_20240102_{i:03}.json.gz"), data));
    }
    entries
}

pub const BULK_GLOB: &str = "bulk-light-vehicle_*_*.json.gz";
