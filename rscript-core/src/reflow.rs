//! The slot reflow engine: re-insertion of translated text into the fixed
//! byte layout of a script container.
//!
//! Each translated line must land at the exact address its original
//! occupied, because the surrounding bytecode references those addresses
//! and is never rewritten. The byte span available to line k (its "slot")
//! runs from `addr[k]` to `addr[k+1]`; the last line's slot is unbounded.
//! When a translation encodes longer than its slot, one of two
//! reconciliation strategies decides where the excess goes.

use std::str::FromStr;

use log::info;
use rscript_nls::Decoder;
use thiserror::Error;

use crate::format::Translation;

/// How an oversized translation is reconciled with its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Let the line overwrite the start of the next slot and shift that
    /// slot's boundary forward. Never truncates; the squeeze cascades.
    ForwardBleed,
    /// Keep slot boundaries fixed: cut the line to fit and prepend the
    /// cut tail to the next line's text.
    #[default]
    TruncateAndCarry,
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "bleed" | "forward-bleed" => Ok(Strategy::ForwardBleed),
            "2" | "carry" | "truncate-and-carry" => Ok(Strategy::TruncateAndCarry),
            _ => Err(anyhow::anyhow!("unknown pack strategy: {}", s)),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReflowError {
    #[error("no translations to place")]
    Empty,
    #[error("slot addresses not strictly increasing: {prev:#010x} then {addr:#010x}")]
    NonMonotonicAddress { prev: u32, addr: u32 },
    #[error("slot address {addr:#010x} out of bounds (buffer is {len:#x} bytes)")]
    AddressOutOfBounds { addr: u32, len: usize },
}

/// Re-insert translated lines into a copy of the original container.
///
/// Pure with respect to the input: the original bytes are never touched,
/// the patched buffer is returned. Slot boundaries come from the
/// translation addresses alone and are validated (non-empty, strictly
/// increasing, in bounds) before the first write; a violation means the
/// sidecar no longer matches the container it was dumped from.
pub fn reflow(
    orig: &[u8],
    translations: &[Translation],
    strategy: Strategy,
    encoder: &Decoder,
) -> Result<Vec<u8>, ReflowError> {
    if translations.is_empty() {
        return Err(ReflowError::Empty);
    }
    let mut boundaries = Vec::with_capacity(translations.len());
    for t in translations {
        if let Some(&prev) = boundaries.last() {
            if t.address <= prev {
                return Err(ReflowError::NonMonotonicAddress {
                    prev,
                    addr: t.address,
                });
            }
        }
        if t.address as usize >= orig.len() {
            return Err(ReflowError::AddressOutOfBounds {
                addr: t.address,
                len: orig.len(),
            });
        }
        boundaries.push(t.address);
    }

    let mut buf = orig.to_vec();
    match strategy {
        Strategy::ForwardBleed => bleed_forward(&mut buf, &mut boundaries, translations, encoder),
        Strategy::TruncateAndCarry => truncate_and_carry(&mut buf, &boundaries, translations, encoder),
    }
    Ok(buf)
}

/// Packtype 1: text is never cut. An overflowing line consumes the head
/// of the next slot and that slot's boundary moves up to the end of the
/// written bytes, so the shortfall cascades forward until some later slot
/// has room. An odd shortfall gets one leading padding space first, which
/// keeps the following double-byte text evenly aligned.
fn bleed_forward(
    buf: &mut Vec<u8>,
    boundaries: &mut [u32],
    translations: &[Translation],
    encoder: &Decoder,
) {
    let last = translations.len() - 1;
    for (k, t) in translations.iter().enumerate() {
        let mut encoded = encoder.encode_owned(&t.text);
        let start = boundaries[k] as usize;
        if k == last {
            write_terminal(buf, start, &encoded);
            break;
        }
        let next = boundaries[k + 1] as usize;
        let slack = next as i64 - start as i64 - encoded.len() as i64;
        if slack > 0 {
            write_at(buf, start, &encoded);
            zero_fill(buf, start + encoded.len(), next);
            continue;
        }
        info!(
            "slot {:#010x} overflows by {} byte(s), bleeding forward: {}",
            boundaries[k],
            -slack,
            t.text
        );
        if (-slack) % 2 == 1 {
            encoded.insert(0, b' ');
        }
        write_at(buf, start, &encoded);
        boundaries[k + 1] = boundaries[k] + encoded.len() as u32;
        debug_assert!(boundaries[k] <= boundaries[k + 1]);
    }
}

/// Packtype 2: slot boundaries never move. A line that does not fit is
/// cut one character at a time until it leaves positive slack, and the
/// cut tail is prepended to the next line's text before that line is
/// encoded and fitted. Strictly increasing boundaries guarantee the loop
/// terminates: the empty string always fits.
fn truncate_and_carry(
    buf: &mut Vec<u8>,
    boundaries: &[u32],
    translations: &[Translation],
    encoder: &Decoder,
) {
    let last = translations.len() - 1;
    let mut carry = String::new();
    for (k, t) in translations.iter().enumerate() {
        let text = format!("{}{}", carry, t.text);
        carry = String::new();
        let start = boundaries[k] as usize;
        if k == last {
            let encoded = encoder.encode_owned(&text);
            write_terminal(buf, start, &encoded);
            break;
        }
        let next = boundaries[k + 1] as usize;

        let char_starts: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let mut split = text.len();
        let mut cut = 0usize;
        let mut encoded = encoder.encode_owned(&text);
        while next as i64 - start as i64 - encoded.len() as i64 <= 0 {
            cut += 1;
            split = char_starts[char_starts.len() - cut];
            encoded = encoder.encode_owned(&text[..split]);
        }
        if cut > 0 {
            carry = text[split..].to_string();
            info!(
                "slot {:#010x} truncated: {:?} -> {:?} (carrying {:?})",
                boundaries[k],
                text,
                &text[..split],
                carry
            );
        }
        write_at(buf, start, &encoded);
        zero_fill(buf, start + encoded.len(), next);
    }
}

/// Terminal slot: no boundary to negotiate, write the line and terminate
/// it. Overflow past the end of the buffer grows it; whatever followed
/// the pool is the operator's to verify.
fn write_terminal(buf: &mut Vec<u8>, start: usize, encoded: &[u8]) {
    write_at(buf, start, encoded);
    write_at(buf, start + encoded.len(), &[0]);
}

fn write_at(buf: &mut Vec<u8>, start: usize, data: &[u8]) {
    let end = start + data.len();
    if end > buf.len() {
        buf.resize(end, 0);
    }
    buf[start..end].copy_from_slice(data);
}

fn zero_fill(buf: &mut Vec<u8>, start: usize, end: usize) {
    if end > buf.len() {
        buf.resize(end, 0);
    }
    buf[start..end].fill(0);
}
