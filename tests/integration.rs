use std::path::PathBuf;

use cmpress::archive::Archiver;
use cmpress::config::Config;
use cmpress::extract;

fn files_of(entries: &[(&str, &[u8])]) -> Vec<(PathBuf, Vec<u8>)> {
    entries.iter().map(|(name, data)| (PathBuf::from(name), data.to_vec())).collect()
}

fn round_trip(entries: &[(&str, &[u8])]) {
    let cfg = Config::default();
    let files = files_of(entries);
    let archiver = Archiver::new(&cfg);
    let bytes = archiver.build(&files).unwrap();
    let parsed = extract::parse(&bytes, std::path::Path::new("<test>")).unwrap();
    for (i, (name, data)) in entries.iter().enumerate() {
        assert_eq!(&parsed.files[i], data, "mismatch restoring {}", name);
    }
}

#[test]
fn empty_file_round_trips() {
    round_trip(&[("empty.bin", b"")]);
}

#[test]
fn short_text_round_trips() {
    round_trip(&[("hello.txt", b"Hello, world!\n\n\n")]);
}

#[test]
fn one_megabyte_of_zeros_round_trips() {
    let zeros = vec![0u8; 1 << 20];
    round_trip(&[("zeros.bin", &zeros)]);
}

#[test]
fn four_kib_of_pseudorandom_bytes_round_trips() {
    let mut data = vec![0u8; 4096];
    let mut state: u32 = 0x2545F491;
    for b in data.iter_mut() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        *b = (state & 0xFF) as u8;
    }
    round_trip(&[("random.bin", &data)]);
}

#[test]
fn x86_call_fragment_round_trips() {
    let mut data = vec![0xE8u8, 0x10, 0x00, 0x00, 0x00];
    data.extend(std::iter::repeat(0x90u8).take(59));
    round_trip(&[("fragment.bin", &data)]);
}

#[test]
fn two_files_with_a_shared_name_prefix_round_trip_independently() {
    round_trip(&[
        ("aaabbb.txt", b"first file contents, some repeated words words words"),
        ("aaaccc.txt", b"second file contents, other repeated words words words"),
    ]);
}

#[test]
fn verify_mode_reports_success_on_clean_input() {
    let cfg = Config::default();
    let files = files_of(&[("repeat.txt", b"abcabcabcabcabcabcabcabcabcabcabc")]);
    extract::verify(&cfg, &files).unwrap();
}

#[test]
fn corrupt_archive_is_rejected_with_bad_magic() {
    let data = vec![0u8; 32];
    let err = extract::parse(&data, std::path::Path::new("bogus.mcm")).unwrap_err();
    assert!(matches!(err, cmpress::error::CmpressError::BadMagic { .. }));
}

#[test]
fn filesystem_round_trip_via_tempdir() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("source.txt");
    std::fs::write(&input_path, b"data written through the filesystem, not just in memory").unwrap();

    let archive_path = dir.path().join("source.mcm");
    let mut cfg = Config::default();
    cfg.inputs = vec![input_path.clone()];
    cfg.output = Some(archive_path.clone());
    Archiver::new(&cfg).create_archive().unwrap();
    assert!(archive_path.exists());

    let out_dir = dir.path().join("out");
    std::fs::create_dir(&out_dir).unwrap();
    let data = std::fs::read(&archive_path).unwrap();
    let extractor = extract::Extractor::new(true);
    extractor.extract_to_disk(&data, &archive_path, Some(&out_dir)).unwrap();

    let restored = std::fs::read(out_dir.join("source.txt")).unwrap();
    assert_eq!(restored, std::fs::read(&input_path).unwrap());
}
