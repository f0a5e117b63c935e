//! The translator sidecar: a UTF-8 text file paired with each container.
//!
//! Per extracted string the sidecar carries an informational line and an
//! editable line, both tagged with the string's absolute address:
//!
//! ```text
//! [0x000000b2]こんにちは
//! >[0x000000b2]こんにちは
//! ```
//!
//! Translators edit only the `>`-marked lines. Pack reads the editable
//! lines back in file order; the informational lines exist purely as
//! reference and are never consumed.

use thiserror::Error;

use crate::extract::StringEntry;

/// Marker prefix of an editable line.
const EDIT_MARKER: char = '>';

/// Token denoting an embedded engine newline; stripped before re-encoding.
const NEWLINE_TOKEN: &str = "^n";

#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("editable line {line}: malformed address tag")]
    BadAddressTag { line: usize },
    #[error("sidecar contains no editable lines")]
    Empty,
    #[error("line {line}: addresses not strictly increasing ({prev:#010x} then {addr:#010x})")]
    NonMonotonic { line: usize, prev: u32, addr: u32 },
}

/// One editable sidecar line: the slot's start address and its (possibly
/// edited) text, `^n` tokens already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub address: u32,
    pub text: String,
}

/// Render the sidecar for a dumped entry list.
pub fn write_sidecar(entries: &[StringEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("[0x{:08x}]{}\n", entry.address, entry.text));
        out.push_str(&format!(">[0x{:08x}]{}\n\n", entry.address, entry.text));
    }
    out
}

/// Parse the editable lines of a sidecar, in file order.
///
/// The resulting list is validated before anything else happens to the
/// container: it must be non-empty and addresses must be strictly
/// increasing, otherwise the sidecar no longer matches the slot layout it
/// was dumped from and packing it would misalign every following slot.
pub fn parse_sidecar(text: &str) -> Result<Vec<Translation>, SidecarError> {
    let mut out: Vec<Translation> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let Some(rest) = line.strip_prefix(EDIT_MARKER) else {
            continue;
        };
        let line_no = idx + 1;
        let (hex, body) = rest
            .strip_prefix("[0x")
            .and_then(|r| r.split_once(']'))
            .ok_or(SidecarError::BadAddressTag { line: line_no })?;
        let address = u32::from_str_radix(hex, 16)
            .map_err(|_| SidecarError::BadAddressTag { line: line_no })?;
        if let Some(prev) = out.last() {
            if address <= prev.address {
                return Err(SidecarError::NonMonotonic {
                    line: line_no,
                    prev: prev.address,
                    addr: address,
                });
            }
        }
        out.push(Translation {
            address,
            text: body.replace(NEWLINE_TOKEN, ""),
        });
    }
    if out.is_empty() {
        return Err(SidecarError::Empty);
    }
    Ok(out)
}
