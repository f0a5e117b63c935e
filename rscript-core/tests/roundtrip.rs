use pretty_assertions::assert_eq;

use rscript_core::batch::{run_dump, run_pack, sidecar_path, DumpConfig, PackConfig};
use rscript_core::format::{parse_sidecar, write_sidecar, ScriptContainer};
use rscript_core::{reflow, scan_string_pool, Strategy};
use rscript_nls::{Decoder, Encoding};

// こんにちは / ABC / テスト as Shift-JIS runs, back to back.
const POOL: &[u8] = &[
    0x82, 0xb1, 0x82, 0xf1, 0x82, 0xc9, 0x82, 0xbf, 0x82, 0xcd, 0x00, // こんにちは
    0x41, 0x42, 0x43, 0x00, // ABC
    0x83, 0x65, 0x83, 0x58, 0x83, 0x67, 0x00, // テスト
];

/// Header, two leading bytecode segments, the string pool, and a trailing
/// control region that a correct pack run must not disturb.
fn synthetic_container(pool: &[u8]) -> Vec<u8> {
    let bytecode1 = [0xCCu8; 10];
    let bytecode2 = [0xDDu8; 6];
    let trailing = [0xABu8; 8];
    let file_size = 28 + bytecode1.len() + bytecode2.len() + pool.len() + trailing.len();

    let mut buf = Vec::with_capacity(file_size);
    for field in [
        file_size as u32,
        28,
        bytecode1.len() as u32,
        bytecode2.len() as u32,
        pool.len() as u32,
        trailing.len() as u32,
        0,
    ] {
        buf.extend_from_slice(&field.to_le_bytes());
    }
    buf.extend_from_slice(&bytecode1);
    buf.extend_from_slice(&bytecode2);
    buf.extend_from_slice(pool);
    buf.extend_from_slice(&trailing);
    buf
}

#[test]
fn dump_then_pack_unedited_is_byte_identical() {
    let orig = synthetic_container(POOL);
    let container = ScriptContainer::parse(orig.clone()).unwrap();
    let codec = Decoder::new(Encoding::ShiftJis);

    let entries = scan_string_pool(&container, &codec);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].address, 44);

    let translations = parse_sidecar(&write_sidecar(&entries)).unwrap();
    for strategy in [Strategy::ForwardBleed, Strategy::TruncateAndCarry] {
        let patched = reflow(&orig, &translations, strategy, &codec).unwrap();
        assert_eq!(patched, orig, "round trip broke under {:?}", strategy);
    }
}

#[test]
fn edited_text_stays_inside_the_pool_and_trailing_region_survives() {
    let orig = synthetic_container(POOL);
    let codec = Decoder::new(Encoding::ShiftJis);
    let container = ScriptContainer::parse(orig.clone()).unwrap();
    let entries = scan_string_pool(&container, &codec);

    let mut sidecar = write_sidecar(&entries);
    // shorten the middle line: "ABC" -> "A"
    sidecar = sidecar.replace(">[0x00000037]ABC", ">[0x00000037]A");
    let translations = parse_sidecar(&sidecar).unwrap();

    let patched = reflow(&orig, &translations, Strategy::TruncateAndCarry, &codec).unwrap();
    assert_eq!(patched.len(), orig.len());
    // the edited slot is the text, its terminator, then zero fill
    let base = 44 + 11;
    assert_eq!(&patched[base..base + 4], b"A\0\0\0");
    // everything outside the edited slot is untouched
    assert_eq!(&patched[..base], &orig[..base]);
    assert_eq!(&patched[base + 4..], &orig[base + 4..]);
}

#[test]
fn batch_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scene01.gsc");
    let orig = synthetic_container(POOL);
    std::fs::write(&input, &orig).unwrap();

    let dumped = run_dump(&DumpConfig {
        inputs: vec![input.clone()],
        encoding: Encoding::ShiftJis,
    });
    assert_eq!(dumped, 1);
    assert!(sidecar_path(&input).exists());

    let out_dir = dir.path().join("new");
    let packed = run_pack(&PackConfig {
        inputs: vec![input.clone()],
        encoding: Encoding::ShiftJis,
        strategy: Strategy::TruncateAndCarry,
        out_dir: out_dir.clone(),
    });
    assert_eq!(packed, 1);
    assert_eq!(std::fs::read(out_dir.join("scene01.gsc")).unwrap(), orig);
}

#[test]
fn malformed_container_produces_no_sidecar_and_no_panic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.gsc");
    std::fs::write(&input, [0u8; 20]).unwrap();

    let dumped = run_dump(&DumpConfig {
        inputs: vec![input.clone()],
        encoding: Encoding::ShiftJis,
    });
    assert_eq!(dumped, 0);
    assert!(!sidecar_path(&input).exists());
}

#[test]
fn pack_skips_inputs_without_a_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("scene02.gsc");
    std::fs::write(&input, synthetic_container(POOL)).unwrap();

    let packed = run_pack(&PackConfig {
        inputs: vec![input],
        encoding: Encoding::Gbk,
        strategy: Strategy::default(),
        out_dir: dir.path().join("new"),
    });
    assert_eq!(packed, 0);
    assert!(!dir.path().join("new").exists());
}

#[test]
fn one_bad_file_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.gsc");
    std::fs::write(&broken, [0u8; 20]).unwrap();
    let good = dir.path().join("good.gsc");
    std::fs::write(&good, synthetic_container(POOL)).unwrap();

    let dumped = run_dump(&DumpConfig {
        inputs: vec![broken, good.clone()],
        encoding: Encoding::ShiftJis,
    });
    assert_eq!(dumped, 1);
    assert!(sidecar_path(&good).exists());
}
