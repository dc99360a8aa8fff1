//! Encoding detection for dumped strings.

use serde::{Deserialize, Serialize};

/// Candidate encoding for byte strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "Windows-1252")]
    Windows1252,
    #[serde(rename = "ISO-8859-1")]
    Iso88591,
    #[serde(rename = "ASCII")]
    Ascii,
}

/// Windows-1252 code points for 0x80..=0x9F; `None` marks unassigned bytes.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

fn cp1252_char(byte: u8) -> Option<char> {
    match byte {
        0x80..=0x9F => CP1252_HIGH[usize::from(byte - 0x80)],
        _ => Some(char::from(byte)),
    }
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Windows1252 => "Windows-1252",
            Encoding::Iso88591 => "ISO-8859-1",
            Encoding::Ascii => "ASCII",
        }
    }

    /// Whether `bytes` is a valid string in this encoding.
    pub fn accepts(self, bytes: &[u8]) -> bool {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).is_ok(),
            Encoding::Windows1252 => bytes.iter().all(|&b| cp1252_char(b).is_some()),
            Encoding::Iso88591 => true,
            Encoding::Ascii => bytes.is_ascii(),
        }
    }

    /// Decodes `bytes`, replacing anything invalid with U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 | Encoding::Ascii => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Windows1252 => bytes
                .iter()
                .map(|&b| cp1252_char(b).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
            Encoding::Iso88591 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

/// Ordered list of candidate encodings; the first one that accepts a
/// string wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingPolicy {
    candidates: Vec<Encoding>,
}

impl Default for EncodingPolicy {
    fn default() -> Self {
        Self {
            candidates: vec![
                Encoding::Utf8,
                Encoding::Windows1252,
                Encoding::Iso88591,
                Encoding::Ascii,
            ],
        }
    }
}

impl EncodingPolicy {
    pub fn new(candidates: Vec<Encoding>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Encoding] {
        &self.candidates
    }

    pub fn detect(&self, bytes: &[u8]) -> Option<Encoding> {
        self.candidates.iter().copied().find(|enc| enc.accepts(bytes))
    }

    /// Encoding to report next to a string's length. Plain ASCII strings
    /// report none.
    pub fn suffix(&self, bytes: &[u8]) -> Option<Encoding> {
        if bytes.is_ascii() {
            return None;
        }
        self.detect(bytes).filter(|enc| *enc != Encoding::Ascii)
    }

    /// Text of a string as it should appear in a dump.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self.detect(bytes) {
            Some(enc) => enc.decode(bytes),
            None => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}
