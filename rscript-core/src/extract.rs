//! String pool extraction.

use std::fmt::Write as _;

use rscript_nls::Decoder;

use crate::format::ScriptContainer;

/// One NUL-terminated run from the string pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEntry {
    /// Absolute offset of the first character byte.
    pub address: u32,
    /// Decoded text (escape-rendered when the run does not decode cleanly).
    pub text: String,
    /// Length of the original encoded form, terminator included.
    pub byte_len: usize,
}

/// Scan the string pool for NUL-terminated runs, in address order.
///
/// The terminator search may run past the pool window: a final run whose
/// NUL lands beyond it still yields an entry, matching the engine's own
/// reader. A run with no terminator at all ends the scan; that is
/// end-of-pool, not an error.
///
/// Runs that do not decode cleanly are escape-rendered rather than
/// dropped, so every byte range produces exactly one entry and the
/// address sequence stays aligned for the pack phase.
pub fn scan_string_pool(container: &ScriptContainer, decoder: &Decoder) -> Vec<StringEntry> {
    let bytes = container.bytes();
    let pool_size = container.header().string_pool_size as usize;
    let post_offset = container.post_offset();

    let mut entries = Vec::new();
    let mut pos = 0usize;
    while pos < pool_size {
        let start = post_offset + pos;
        let Some(len) = bytes[start..].iter().position(|&b| b == 0) else {
            break;
        };
        let raw = &bytes[start..start + len];
        let (text, had_errors) = decoder.decode_checked(raw);
        let text = if had_errors {
            escape_bytes(raw)
        } else {
            text.into_owned()
        };
        entries.push(StringEntry {
            address: start as u32,
            text,
            byte_len: len + 1,
        });
        pos += len + 1;
    }
    entries
}

/// Lossy fallback rendering for a run the legacy codec rejects: printable
/// ASCII stays as-is, everything else becomes a `\xNN` escape.
fn escape_bytes(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    for &b in raw {
        if (0x20..0x7f).contains(&b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "\\x{:02x}", b);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rscript_nls::{Decoder, Encoding};

    use super::*;
    use crate::format::{write_sidecar, HEADER_SIZE};

    fn container_with_pool(pool: &[u8]) -> ScriptContainer {
        let mut buf = Vec::new();
        for field in [
            (HEADER_SIZE + pool.len()) as u32,
            HEADER_SIZE as u32,
            0,
            0,
            pool.len() as u32,
            0,
            0,
        ] {
            buf.extend_from_slice(&field.to_le_bytes());
        }
        buf.extend_from_slice(pool);
        ScriptContainer::parse(buf).unwrap()
    }

    #[test]
    fn splits_runs_on_nul() {
        let container = container_with_pool(b"ABC\0DE\0");
        let entries = scan_string_pool(&container, &Decoder::new(Encoding::ShiftJis));
        assert_eq!(
            entries,
            vec![
                StringEntry { address: 28, text: "ABC".into(), byte_len: 4 },
                StringEntry { address: 32, text: "DE".into(), byte_len: 3 },
            ]
        );
    }

    #[test]
    fn dump_line_matches_the_documented_format() {
        // header (1000, 28, 100, 50, 40, 0, 0) puts the pool at 178
        let mut buf = Vec::new();
        for field in [1000u32, 28, 100, 50, 40, 0, 0] {
            buf.extend_from_slice(&field.to_le_bytes());
        }
        buf.resize(178, 0);
        buf.extend_from_slice(b"ABC\0");
        buf.resize(1000, 0);
        let container = ScriptContainer::parse(buf).unwrap();
        let entries = scan_string_pool(&container, &Decoder::new(Encoding::ShiftJis));
        assert_eq!(entries[0].address, 178);
        let sidecar = write_sidecar(&entries[..1]);
        assert!(sidecar.starts_with("[0x000000b2]ABC\n"));
    }

    #[test]
    fn run_without_terminator_ends_the_scan() {
        let container = container_with_pool(b"ABC\0tail");
        let entries = scan_string_pool(&container, &Decoder::new(Encoding::ShiftJis));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "ABC");
    }

    #[test]
    fn undecodable_run_is_escaped_not_dropped() {
        // 0x82 is a Shift-JIS lead byte with no trail byte before the NUL.
        let container = container_with_pool(b"ok\0\x82\0end\0");
        let entries = scan_string_pool(&container, &Decoder::new(Encoding::ShiftJis));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].text, "\\x82");
        assert_eq!(entries[2].address, container.post_offset() as u32 + 5);
    }

    #[test]
    fn decodes_shift_jis_text() {
        let mut pool = Vec::new();
        pool.extend_from_slice(&[0x82, 0xb1, 0x82, 0xf1, 0x82, 0xc9, 0x82, 0xbf, 0x82, 0xcd]);
        pool.push(0);
        let container = container_with_pool(&pool);
        let entries = scan_string_pool(&container, &Decoder::new(Encoding::ShiftJis));
        assert_eq!(entries[0].text, "こんにちは");
        assert_eq!(entries[0].byte_len, 11);
    }
}
