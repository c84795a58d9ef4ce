use pretty_assertions::assert_eq;
use skullmod::binary::BinaryWriter;
use skullmod::gfs::{
    ALIGNED, FIXED_HEADER_SIZE, FILE_IDENTIFIER, GfsExtractOptions, GfsReader, PaddingRule,
    decode, entry_bytes,
};
use skullmod::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::tempdir;

fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (path, data) in files {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, data).unwrap();
    }
}

fn sample_payload() -> Vec<u8> {
    (0..512u32).map(|i| (i % 256) as u8).collect()
}

/// Hand-assemble a container with arbitrary entry paths
fn raw_container(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let header_len: u64 = FIXED_HEADER_SIZE
        + entries
            .iter()
            .map(|(path, _)| 20 + path.len() as u64)
            .sum::<u64>();

    let mut w = BinaryWriter::new(Vec::new());
    w.write_u32(header_len as u32).unwrap();
    w.write_length_prefixed_ascii(FILE_IDENTIFIER).unwrap();
    w.write_length_prefixed_ascii("1.1").unwrap();
    w.write_u64(entries.len() as u64).unwrap();
    for (path, data) in entries {
        w.write_length_prefixed_ascii(path).unwrap();
        w.write_u64(data.len() as u64).unwrap();
        w.write_u32(1).unwrap();
    }
    for (_, data) in entries {
        w.write_bytes(data).unwrap();
    }
    w.into_inner()
}

#[test]
fn test_single_file_exact_bytes() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("a.txt", b"abc")]);
    let gfs = dir.path().join("out.gfs");

    let layout = GfsOperations::create(&src, &gfs, false).unwrap();
    assert_eq!(layout.header_length, 76);
    assert_eq!(layout.total_size, 79);

    let bytes = fs::read(&gfs).unwrap();
    let mut expected = Vec::new();
    expected.extend_from_slice(&76u32.to_be_bytes());
    expected.extend_from_slice(&20u64.to_be_bytes());
    expected.extend_from_slice(b"Reverge Package File");
    expected.extend_from_slice(&3u64.to_be_bytes());
    expected.extend_from_slice(b"1.1");
    expected.extend_from_slice(&1u64.to_be_bytes());
    expected.extend_from_slice(&5u64.to_be_bytes());
    expected.extend_from_slice(b"a.txt");
    expected.extend_from_slice(&3u64.to_be_bytes());
    expected.extend_from_slice(&1u32.to_be_bytes());
    expected.extend_from_slice(b"abc");
    assert_eq!(bytes, expected);

    let metadata = decode(&bytes).unwrap();
    assert_eq!(metadata.entries.len(), 1);
    assert_eq!(metadata.entries[0].offset, 76);
    assert_eq!(entry_bytes(&bytes, &metadata.entries[0]).unwrap(), b"abc");
}

#[test]
fn test_single_file_aligned_layout() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("a.txt", b"abc")]);
    let gfs = dir.path().join("out.gfs");

    GfsOperations::create(&src, &gfs, true).unwrap();

    let bytes = fs::read(&gfs).unwrap();
    assert_eq!(bytes.len(), 8192);
    assert!(bytes[76..4096].iter().all(|&b| b == 0));
    assert_eq!(&bytes[4096..4099], b"abc");
    assert!(bytes[4099..].iter().all(|&b| b == 0));

    let entries = GfsOperations::list_detailed(&gfs).unwrap();
    assert_eq!(entries[0].offset, 4096);
    assert_eq!(entries[0].alignment, ALIGNED);
}

#[test]
fn test_round_trip_nested_unaligned() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let payload = sample_payload();
    write_tree(
        &src,
        &[
            ("a.txt", b"abc"),
            ("dir/b.bin", payload.as_slice()),
            ("dir/sub/c.dat", b""),
        ],
    );
    let gfs = dir.path().join("nested.gfs");
    GfsOperations::create(&src, &gfs, false).unwrap();

    let entries = GfsOperations::list_detailed(&gfs).unwrap();
    let summary: Vec<(&str, u64, u64)> = entries
        .iter()
        .map(|e| (e.path.as_str(), e.offset, e.length))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("a.txt", 138, 3),
            ("dir/b.bin", 141, 512),
            ("dir/sub/c.dat", 653, 0),
        ]
    );

    let out = dir.path().join("unpacked");
    GfsOperations::extract(&gfs, &out).unwrap();
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"abc");
    assert_eq!(fs::read(out.join("dir").join("b.bin")).unwrap(), payload);
    assert_eq!(fs::read(out.join("dir").join("sub").join("c.dat")).unwrap(), b"");
}

#[test]
fn test_round_trip_aligned_respects_alignment() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    let payload = sample_payload();
    write_tree(
        &src,
        &[("x/one.bin", payload.as_slice()), ("x/two.bin", b"2"), ("three", b"33")],
    );
    let gfs = dir.path().join("aligned.gfs");
    GfsOperations::create(&src, &gfs, true).unwrap();

    let bytes = fs::read(&gfs).unwrap();
    let metadata = decode(&bytes).unwrap();
    for entry in &metadata.entries {
        assert_eq!(entry.offset % u64::from(ALIGNED), 0, "{}", entry.path);
    }
    assert_eq!(bytes.len() % ALIGNED as usize, 0);

    let report = GfsOperations::verify(&gfs).unwrap();
    assert!(report.is_ok(), "{report:?}");

    let out = dir.path().join("unpacked");
    GfsOperations::extract(&gfs, &out).unwrap();
    assert_eq!(fs::read(out.join("x").join("one.bin")).unwrap(), payload);
    assert_eq!(fs::read(out.join("x").join("two.bin")).unwrap(), b"2");
    assert_eq!(fs::read(out.join("three")).unwrap(), b"33");
}

#[test]
fn test_empty_directory() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("empty");
    fs::create_dir_all(&src).unwrap();
    let gfs = dir.path().join("empty.gfs");

    let layout = GfsOperations::create(&src, &gfs, false).unwrap();
    assert_eq!(layout.header_length as u64, FIXED_HEADER_SIZE);
    assert!(GfsOperations::list(&gfs).unwrap().is_empty());

    let out = dir.path().join("out");
    GfsOperations::extract(&gfs, &out).unwrap();
    assert!(out.is_dir());
}

#[test]
fn test_truncated_header_rejected() {
    let bytes = raw_container(&[("a.txt", b"abc"), ("b.txt", b"de")]);
    let metadata = decode(&bytes).unwrap();
    let data_offset = metadata.header.data_offset as usize;

    for cut in 0..data_offset {
        assert!(decode(&bytes[..cut]).is_err(), "cut at {cut} accepted");
    }
}

#[test]
fn test_reader_over_memory() {
    let bytes = raw_container(&[("a.txt", b"abc"), ("b.txt", b"de")]);
    let len = bytes.len() as u64;
    let mut reader = GfsReader::new(Cursor::new(bytes), len);

    let entry = reader.find_entry("b.txt").unwrap();
    assert_eq!(reader.read_entry(&entry).unwrap(), b"de");
    assert!(matches!(
        reader.find_entry("missing"),
        Err(Error::EntryNotFound(_))
    ));
    assert_eq!(reader.output_dir(), None);
}

#[test]
fn test_unsafe_entry_rejected_before_writing() {
    let dir = tempdir().unwrap();
    let gfs = dir.path().join("evil.gfs");
    fs::write(
        &gfs,
        raw_container(&[("good.txt", b"fine"), ("../evil.txt", b"gotcha")]),
    )
    .unwrap();

    let out = dir.path().join("out");
    let err = GfsOperations::extract(&gfs, &out).unwrap_err();
    assert!(matches!(err, Error::UnsafeEntryPath(ref p) if p == "../evil.txt"));
    assert!(!out.exists());
    assert!(!dir.path().join("evil.txt").exists());
}

#[test]
fn test_payload_past_end_rejected_before_writing() {
    let dir = tempdir().unwrap();
    let mut bytes = raw_container(&[("a.txt", b"abc"), ("b.txt", b"defg")]);
    bytes.truncate(bytes.len() - 2);
    let gfs = dir.path().join("short.gfs");
    fs::write(&gfs, bytes).unwrap();

    let out = dir.path().join("out");
    assert!(matches!(
        GfsOperations::extract(&gfs, &out),
        Err(Error::TruncatedInput { .. })
    ));
    assert!(!out.exists());
}

#[test]
fn test_destination_conflict_and_overwrite() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("a.txt", b"abc")]);

    let as_dir = dir.path().join("taken");
    fs::create_dir_all(&as_dir).unwrap();
    assert!(matches!(
        GfsOperations::create(&src, &as_dir, false),
        Err(Error::DestinationConflict { .. })
    ));

    let gfs = dir.path().join("out.gfs");
    fs::write(&gfs, b"stale contents that are longer than the new container").unwrap();
    GfsOperations::create(&src, &gfs, false).unwrap();
    assert_eq!(fs::read(&gfs).unwrap().len(), 79);
    assert_eq!(GfsOperations::read_file_bytes(&gfs, "a.txt").unwrap(), b"abc");
}

#[test]
fn test_create_rejects_missing_source() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        GfsOperations::create(dir.path().join("nope"), dir.path().join("x.gfs"), false),
        Err(Error::NotADirectory { .. })
    ));
}

#[test]
fn test_non_ascii_path_rejected() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("caf\u{e9}.txt", b"x")]);

    assert!(matches!(
        GfsOperations::create(&src, dir.path().join("x.gfs"), false),
        Err(Error::InvalidEncoding { .. })
    ));
}

#[test]
fn test_extract_subset_and_filter() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(
        &src,
        &[
            ("levels/stage.lvl", b"stage"),
            ("levels/stage2.lvl", b"stage2"),
            ("sprites/hero.spr", b"hero"),
        ],
    );
    let gfs = dir.path().join("game.gfs");
    GfsOperations::create(&src, &gfs, false).unwrap();

    let picked = dir.path().join("picked");
    let written =
        GfsOperations::extract_files(&gfs, &picked, &["sprites/hero.spr", "nope"], &|_| {})
            .unwrap();
    assert_eq!(written, 1);
    assert!(picked.join("sprites").join("hero.spr").exists());
    assert!(!picked.join("levels").exists());

    assert!(matches!(
        GfsOperations::extract_files(&gfs, &picked, &["nope"], &|_| {}),
        Err(Error::EntryNotFound(_))
    ));

    let filtered = dir.path().join("filtered");
    let options = GfsExtractOptions::new().with_filter(Some("*.lvl".to_string()));
    let written =
        GfsOperations::extract_with_options(&gfs, &filtered, &options, &|_| {}).unwrap();
    assert_eq!(written, 2);
    assert!(!filtered.join("sprites").exists());
}

#[test]
fn test_extract_without_overwrite_keeps_existing() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("a.txt", b"abc"), ("b.txt", b"def")]);
    let gfs = dir.path().join("c.gfs");
    GfsOperations::create(&src, &gfs, false).unwrap();

    let out = dir.path().join("out");
    write_tree(&out, &[("a.txt", b"mine")]);

    let options = GfsExtractOptions::new().with_overwrite(false);
    let written = GfsOperations::extract_with_options(&gfs, &out, &options, &|_| {}).unwrap();
    assert_eq!(written, 1);
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"mine");
    assert_eq!(fs::read(out.join("b.txt")).unwrap(), b"def");
}

#[test]
fn test_extract_to_default_dir() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("a.txt", b"abc")]);
    let gfs = GfsOperations::default_container_path(&src);
    assert_eq!(gfs, dir.path().join("src.gfs"));
    GfsOperations::create(&src, &gfs, false).unwrap();
    fs::remove_dir_all(&src).unwrap();

    let out = GfsOperations::extract_to_default_dir(&gfs).unwrap();
    assert_eq!(out, dir.path().join("src"));
    assert_eq!(fs::read(out.join("a.txt")).unwrap(), b"abc");
}

#[test]
fn test_inspect() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("small", b"1"), ("big", sample_payload().as_slice())]);
    let gfs = dir.path().join("i.gfs");
    GfsOperations::create(&src, &gfs, true).unwrap();

    let info = GfsOperations::inspect(&gfs).unwrap();
    assert_eq!(info.header.entry_count, 2);
    assert_eq!(info.total_payload, 513);
    assert_eq!(info.alignments, vec![ALIGNED]);
    assert_eq!(info.largest[0].path, "big");
    assert_eq!(info.container_len, 3 * 4096);
    assert_eq!(info.output_dir, dir.path().join("i"));
}

#[test]
fn test_verify_flags_legacy_padding() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("x.bin", b"0123456789")]);
    let gfs = dir.path().join("legacy.gfs");

    let options = GfsWriteOptions::new()
        .with_aligned(true)
        .with_padding_rule(PaddingRule::Legacy);
    let layout = GfsOperations::create_with_options(&src, &gfs, &options).unwrap();
    assert_eq!(layout.entries[0].offset, 152);
    assert_eq!(layout.total_size, 324);

    let report = GfsOperations::verify(&gfs).unwrap();
    assert!(!report.is_ok());
    assert_eq!(report.out_of_bounds, vec!["x.bin".to_string()]);
    assert_eq!(report.trailing_bytes, 0);
    assert!(report.dirty_padding.is_empty(), "{report:?}");
}

#[test]
fn test_verify_reports_truncated_payload_once() {
    let dir = tempdir().unwrap();
    let mut bytes = raw_container(&[("a.txt", b"abc"), ("b.txt", b"defg")]);
    bytes.truncate(bytes.len() - 2);
    let gfs = dir.path().join("cut.gfs");
    fs::write(&gfs, bytes).unwrap();

    let report = GfsOperations::verify(&gfs).unwrap();
    assert_eq!(report.out_of_bounds, vec!["b.txt".to_string()]);
    assert_eq!(report.trailing_bytes, 0);
    assert!(report.dirty_padding.is_empty(), "{report:?}");
}

#[test]
fn test_verify_flags_trailing_garbage() {
    let dir = tempdir().unwrap();
    let mut bytes = raw_container(&[("a.txt", b"abc")]);
    bytes.extend_from_slice(b"junk");
    let gfs = dir.path().join("t.gfs");
    fs::write(&gfs, bytes).unwrap();

    let report = GfsOperations::verify(&gfs).unwrap();
    assert_eq!(report.trailing_bytes, 4);
    assert!(!report.is_ok());
}

#[test]
fn test_keep_walk_order_still_round_trips() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src");
    write_tree(&src, &[("z.txt", b"z"), ("m/a.txt", b"a"), ("b.txt", b"bb")]);
    let gfs = dir.path().join("w.gfs");

    let options = GfsWriteOptions::new().with_sort_entries(false);
    GfsOperations::create_with_options(&src, &gfs, &options).unwrap();

    let mut listed = GfsOperations::list(&gfs).unwrap();
    listed.sort();
    assert_eq!(listed, vec!["b.txt", "m/a.txt", "z.txt"]);
    assert_eq!(GfsOperations::read_file_bytes(&gfs, "m/a.txt").unwrap(), b"a");
}
