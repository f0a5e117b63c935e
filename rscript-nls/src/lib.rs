//! Text encoding support for RScript game assets.
//!
//! Script containers store text in a legacy byte encoding chosen per game
//! release (Japanese originals use Shift-JIS, localized Chinese builds use
//! GBK). Everything here is a thin layer over `encoding_rs` that keeps the
//! selected encoding as a value, so tools can take it on the command line.

use std::borrow::Cow;
use std::str::FromStr;

use encoding_rs::{Encoding as RsEncoding, GBK, SHIFT_JIS, UTF_8};

/// Byte encodings the engine's text assets are known to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Japanese source scripts.
    #[default]
    ShiftJis,
    /// Simplified Chinese localized text.
    Gbk,
    Utf8,
}

impl Encoding {
    #[inline]
    pub fn as_encoding_rs(self) -> &'static RsEncoding {
        match self {
            Encoding::ShiftJis => SHIFT_JIS,
            Encoding::Gbk => GBK,
            Encoding::Utf8 => UTF_8,
        }
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sjis" | "shift-jis" | "shift_jis" => Ok(Encoding::ShiftJis),
            "gbk" => Ok(Encoding::Gbk),
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            _ => Err(anyhow::anyhow!("unknown NLS encoding: {}", s)),
        }
    }
}

pub trait TextDecoder {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str>;

    /// Decode a C-style string: stop at the first NUL (0x00).
    fn decode_cstr<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.decode(&bytes[..end])
    }
}

/// En/decoder bound to one selected encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    enc: Encoding,
}

impl Decoder {
    #[inline]
    pub fn new(enc: Encoding) -> Self {
        Self { enc }
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.enc
    }

    /// Decode and report whether any byte sequence failed to map.
    ///
    /// The returned text is always usable (bad sequences come back as
    /// U+FFFD); the flag lets callers switch to their own fallback
    /// rendering instead.
    pub fn decode_checked<'a>(&self, bytes: &'a [u8]) -> (Cow<'a, str>, bool) {
        match self.enc {
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(s) => (Cow::Borrowed(s), false),
                Err(_) => (String::from_utf8_lossy(bytes), true),
            },
            Encoding::ShiftJis | Encoding::Gbk => {
                let (cow, had_errors) = self
                    .enc
                    .as_encoding_rs()
                    .decode_without_bom_handling(bytes);
                (cow, had_errors)
            }
        }
    }

    /// Best-effort encode; unrepresentable characters are replaced.
    pub fn encode<'a>(&self, s: &'a str) -> Cow<'a, [u8]> {
        let (cow, _, _) = self.enc.as_encoding_rs().encode(s);
        cow
    }

    /// Same as [`Decoder::encode`], but always returns an owned buffer.
    pub fn encode_owned(&self, s: &str) -> Vec<u8> {
        self.encode(s).into_owned()
    }
}

impl TextDecoder for Decoder {
    fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        self.decode_checked(bytes).0
    }
}
