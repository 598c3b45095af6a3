//! Tests for the archive module

use super::pattern::regex_source;
use super::*;
use crate::error::{Error, ErrorKind};
use crate::test_support::{bulk_entries, gzip, write_zip, BULK_GLOB};
use tempfile::tempdir;
use test_case::test_case;

// ============================================================================
// Pattern Tests
// ============================================================================

#[test_case("*.json.gz", "a.json.gz" => true ; "star suffix")]
#[test_case("*.json.gz", "a.json" => false ; "star suffix mismatch")]
#[test_case("*.json.gz", "dir/a.json.gz" => true ; "star crosses slash")]
#[test_case("bulk-light-vehicle_*_*.json.gz", "bulk-light-vehicle_20240101_001.json.gz" => true ; "bulk record")]
#[test_case("bulk-light-vehicle_*_*.json.gz", "delta-light-vehicle_20240101_001.json.gz" => false ; "delta record")]
#[test_case("file?.gz", "file1.gz" => true ; "question mark")]
#[test_case("file?.gz", "file10.gz" => false ; "question mark single char")]
#[test_case("part[0-2].gz", "part1.gz" => true ; "class range")]
#[test_case("part[0-2].gz", "part3.gz" => false ; "class range mismatch")]
#[test_case("part[!0-2].gz", "part3.gz" => true ; "negated class")]
#[test_case("part[!0-2].gz", "part0.gz" => false ; "negated class mismatch")]
#[test_case("a[.gz", "a[.gz" => true ; "unclosed bracket is literal")]
#[test_case("a+b(1).gz", "a+b(1).gz" => true ; "regex metacharacters are literal")]
#[test_case("*.GZ", "a.gz" => false ; "case sensitive")]
#[test_case("x[--a]y", "x-y" => true ; "class range starting at hyphen")]
#[test_case("x[--a]y", "x.y" => true ; "class range from hyphen covers dot")]
#[test_case("x[--a]y", "xby" => false ; "class range from hyphen upper bound")]
#[test_case("x[a-c-e]y", "x-y" => true ; "hyphen after range is literal")]
#[test_case("x[a-c-e]y", "xby" => true ; "range before literal hyphen")]
#[test_case("x[a-c-e]y", "xdy" => false ; "literal hyphen is not a range")]
#[test_case("x[-a]y", "x-y" => true ; "leading hyphen is literal")]
#[test_case("x[a-]y", "x-y" => true ; "trailing hyphen is literal")]
#[test_case("x[a--]y", "x-y" => false ; "reversed range to hyphen is empty")]
#[test_case("x[a--]y", "xay" => false ; "reversed range drops endpoints")]
#[test_case("x[z-a]y", "xmy" => false ; "reversed range matches nothing")]
#[test_case("x[!z-a]y", "xmy" => true ; "negated empty class matches any char")]
#[test_case("x[a&&b]y", "x&y" => true ; "ampersands are literal")]
#[test_case("x[^a]y", "x^y" => true ; "caret is literal")]
fn test_pattern_matches(glob: &str, name: &str) -> bool {
    MemberPattern::new(glob).unwrap().matches(name)
}

#[test]
fn test_pattern_regex_is_anchored() {
    assert_eq!(regex_source("*.gz"), r"^(?s:.*\.gz)$");
    assert_eq!(regex_source("[!ab]"), "^(?s:[^ab])$");
}

#[test]
fn test_pattern_class_escapes_set_operators() {
    assert_eq!(regex_source("[--a]"), r"^(?s:[\--a])$");
    assert_eq!(regex_source("[a-c-e]"), r"^(?s:[a-c\-e])$");
    assert_eq!(regex_source("[a--]"), r"^(?s:[^\x{0}-\x{10FFFF}])$");
    assert_eq!(regex_source("[a~~b]"), r"^(?s:[a\~\~b])$");
}

#[test]
fn test_pattern_filter_preserves_order() {
    let pattern = MemberPattern::new("*.gz").unwrap();
    let names = vec![
        "c.gz".to_string(),
        "readme.txt".to_string(),
        "a.gz".to_string(),
        "b.gz".to_string(),
    ];

    assert_eq!(pattern.filter(&names), vec!["c.gz", "a.gz", "b.gz"]);
    assert_eq!(pattern.to_string(), "*.gz");
}

// ============================================================================
// Batch Plan Tests
// ============================================================================

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("m{i}")).collect()
}

#[test_case(25, 10 => (3, 1) ; "twenty five by ten")]
#[test_case(23, 10 => (3, 1) ; "twenty three by ten")]
#[test_case(100, 10 => (10, 2) ; "ten batches")]
#[test_case(9, 10 => (1, 1) ; "single short batch")]
#[test_case(10, 1 => (10, 2) ; "batch size one")]
#[test_case(1000, 1 => (1000, 4) ; "thousand batches")]
fn test_batch_plan_counts(n: usize, batch_size: usize) -> (usize, usize) {
    let plan = BatchPlan::new(names(n), batch_size).unwrap();
    (plan.len(), plan.width())
}

#[test]
fn test_batch_plan_preserves_order_and_sizes() {
    let plan = BatchPlan::new(names(23), 10).unwrap();
    let sizes: Vec<usize> = plan.batches().iter().map(|b| b.members.len()).collect();
    assert_eq!(sizes, vec![10, 10, 3]);

    let flattened: Vec<String> = plan
        .clone()
        .into_iter()
        .flat_map(|batch| batch.members)
        .collect();
    assert_eq!(flattened, names(23));

    let indices: Vec<usize> = plan.batches().iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn test_batch_plan_file_names_sort_in_order() {
    let plan = BatchPlan::new(names(100), 10).unwrap();
    let files: Vec<String> = (0..plan.len())
        .map(|i| plan.file_name(i, "bulk", "parquet"))
        .collect();

    assert_eq!(files[0], "bulk_00.parquet");
    assert_eq!(files[9], "bulk_09.parquet");

    let mut sorted = files.clone();
    sorted.sort();
    assert_eq!(sorted, files);
}

#[test]
fn test_batch_plan_zero_size_rejected() {
    let err = BatchPlan::new(names(3), 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_batch_plan_empty() {
    let plan = BatchPlan::new(Vec::new(), 10).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_index_width() {
    assert_eq!(index_width(1), 1);
    assert_eq!(index_width(9), 1);
    assert_eq!(index_width(10), 2);
    assert_eq!(index_width(101), 3);
}

// ============================================================================
// Reader Tests
// ============================================================================

#[test]
fn test_reader_lists_members_in_archive_order() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bulk.zip");
    let entries = vec![
        ("z.json.gz".to_string(), gzip(b"{}")),
        ("a.json.gz".to_string(), gzip(b"{}")),
        ("m.txt".to_string(), b"notes".to_vec()),
    ];
    write_zip(&zip_path, &entries);

    let mut reader = ArchiveReader::open(&zip_path).unwrap();
    assert_eq!(reader.len(), 3);
    assert_eq!(
        reader.member_names().unwrap(),
        vec!["z.json.gz", "a.json.gz", "m.txt"]
    );
}

#[test]
fn test_reader_matching_members_excludes_deltas() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bulk.zip");
    write_zip(&zip_path, &bulk_entries(4, 2));

    let mut reader = ArchiveReader::open(&zip_path).unwrap();
    let pattern = MemberPattern::new(BULK_GLOB).unwrap();
    let matching = reader.matching_members(&pattern).unwrap();

    assert_eq!(matching.len(), 4);
    assert!(matching.iter().all(|name| name.starts_with("bulk-")));
}

#[test]
fn test_reader_extracts_selected_members() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bulk.zip");
    let entries = vec![
        ("one.gz".to_string(), b"first".to_vec()),
        ("nested/two.gz".to_string(), b"second".to_vec()),
        ("three.gz".to_string(), b"third".to_vec()),
    ];
    write_zip(&zip_path, &entries);
    let out = dir.path().join("out");

    let mut reader = ArchiveReader::open(&zip_path).unwrap();
    let extracted = reader
        .extract_members(&["nested/two.gz".to_string(), "one.gz".to_string()], &out)
        .unwrap();

    assert_eq!(extracted, vec![out.join("nested/two.gz"), out.join("one.gz")]);
    assert_eq!(std::fs::read(&extracted[0]).unwrap(), b"second");
    assert_eq!(std::fs::read(&extracted[1]).unwrap(), b"first");
    assert!(!out.join("three.gz").exists());
}

#[test]
fn test_reader_rejects_escaping_member() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("evil.zip");
    write_zip(&zip_path, &[("../evil.gz".to_string(), b"x".to_vec())]);
    let out = dir.path().join("out");

    let mut reader = ArchiveReader::open(&zip_path).unwrap();
    let err = reader
        .extract_members(&["../evil.gz".to_string()], &out)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidArchive { .. }));
    assert!(!dir.path().join("evil.gz").exists());
}

#[test]
fn test_reader_missing_member() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("bulk.zip");
    write_zip(&zip_path, &[("a.gz".to_string(), b"x".to_vec())]);

    let mut reader = ArchiveReader::open(&zip_path).unwrap();
    let err = reader
        .extract_members(&["missing.gz".to_string()], dir.path())
        .unwrap_err();
    assert!(matches!(err, Error::Zip(_)));
}

#[test]
fn test_reader_rejects_non_zip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not.zip");
    std::fs::write(&path, b"definitely not a zip").unwrap();

    let err = ArchiveReader::open(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArchiveContent);
}

#[test]
fn test_reader_missing_file() {
    let dir = tempdir().unwrap();
    let err = ArchiveReader::open(dir.path().join("absent.zip")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Filesystem);
}
