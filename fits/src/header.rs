//! FITS primary-header reading
//!
//! Parses the keyword records of a FITS header into a logical key/value map.
//! Only the header is touched: the data unit is never read, decoded, or
//! validated. Malformed cards are skipped rather than treated as fatal, so a
//! partially broken header still yields whatever keywords could be parsed.
//!
//! FITS layout recap:
//! - the file is a sequence of 2880-byte blocks
//! - a header block holds 36 records ("cards") of 80 bytes each
//! - a card is `KEYWORD = value / comment`, terminated by the `END` card

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// FITS files are organized in fixed-size blocks.
pub const BLOCK_SIZE: usize = 2880;
/// Each header record (card) occupies a fixed 80 bytes.
pub const CARD_SIZE: usize = 80;
/// Number of cards in one header block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// A parsed header value.
#[derive(Debug, Clone, PartialEq)]
pub enum FitsValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl FitsValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FitsValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FitsValue::Integer(i) => Some(*i),
            FitsValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Numeric view of the value. Integers widen to `f64`, which matters for
    /// headers that write exposure durations without a decimal point.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FitsValue::Float(f) => Some(*f),
            FitsValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FitsValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Human-readable type label, used when reporting type mismatches.
    pub fn type_name(&self) -> &'static str {
        match self {
            FitsValue::String(_) => "string",
            FitsValue::Integer(_) => "integer",
            FitsValue::Float(_) => "float",
            FitsValue::Boolean(_) => "boolean",
        }
    }
}

/// Failure of a single keyword lookup.
///
/// A missing keyword and a keyword holding a value of the wrong type are
/// distinct conditions; callers that only care about "usable or not" can
/// treat both the same while still reporting the original cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeywordError {
    /// The keyword is not present in the header.
    Missing { keyword: String },
    /// The keyword is present but its value has an unexpected type.
    WrongType {
        keyword: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl fmt::Display for KeywordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordError::Missing { keyword } => {
                write!(f, "keyword {} is missing", keyword)
            }
            KeywordError::WrongType {
                keyword,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "keyword {} has type {}, expected {}",
                    keyword, actual, expected
                )
            }
        }
    }
}

impl std::error::Error for KeywordError {}

/// Header reading errors.
#[derive(Debug)]
pub enum FitsError {
    Io(std::io::Error),
    /// The first card is neither `SIMPLE` nor `XTENSION`.
    NotFits(String),
    /// The file ended before an `END` card was seen.
    UnterminatedHeader,
}

impl fmt::Display for FitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitsError::Io(e) => write!(f, "IO error: {}", e),
            FitsError::NotFits(lead) => {
                write!(f, "not a FITS header (leading keyword {:?})", lead)
            }
            FitsError::UnterminatedHeader => {
                write!(f, "header ended without an END card")
            }
        }
    }
}

impl std::error::Error for FitsError {}

impl From<std::io::Error> for FitsError {
    fn from(e: std::io::Error) -> Self {
        FitsError::Io(e)
    }
}

/// Logical view of a FITS header: keyword/value pairs in insertion order,
/// with COMMENT and HISTORY text collected separately.
///
/// Keyword lookup is case-insensitive; keywords are stored uppercased.
#[derive(Debug, Clone, Default)]
pub struct FitsHeader {
    values: HashMap<String, FitsValue>,
    order: Vec<String>,
    comments: Vec<String>,
}

impl FitsHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keyword/value pairs (COMMENT/HISTORY excluded).
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.values.contains_key(&keyword.to_ascii_uppercase())
    }

    pub fn get(&self, keyword: &str) -> Option<&FitsValue> {
        self.values.get(&keyword.to_ascii_uppercase())
    }

    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        self.get(keyword).and_then(|v| v.as_str())
    }

    pub fn get_int(&self, keyword: &str) -> Option<i64> {
        self.get(keyword).and_then(|v| v.as_i64())
    }

    pub fn get_float(&self, keyword: &str) -> Option<f64> {
        self.get(keyword).and_then(|v| v.as_f64())
    }

    /// String value of `keyword`, distinguishing a missing keyword from a
    /// present-but-non-string one.
    pub fn str_value(&self, keyword: &str) -> Result<&str, KeywordError> {
        match self.get(keyword) {
            None => Err(KeywordError::Missing {
                keyword: keyword.to_ascii_uppercase(),
            }),
            Some(value) => value.as_str().ok_or_else(|| KeywordError::WrongType {
                keyword: keyword.to_ascii_uppercase(),
                expected: "string",
                actual: value.type_name(),
            }),
        }
    }

    /// Numeric value of `keyword` (integers widen), distinguishing a missing
    /// keyword from a present-but-non-numeric one.
    pub fn float_value(&self, keyword: &str) -> Result<f64, KeywordError> {
        match self.get(keyword) {
            None => Err(KeywordError::Missing {
                keyword: keyword.to_ascii_uppercase(),
            }),
            Some(value) => value.as_f64().ok_or_else(|| KeywordError::WrongType {
                keyword: keyword.to_ascii_uppercase(),
                expected: "float",
                actual: value.type_name(),
            }),
        }
    }

    pub fn set_string(&mut self, keyword: &str, value: &str) {
        self.insert(keyword, FitsValue::String(value.to_string()));
    }

    pub fn set_int(&mut self, keyword: &str, value: i64) {
        self.insert(keyword, FitsValue::Integer(value));
    }

    pub fn set_float(&mut self, keyword: &str, value: f64) {
        self.insert(keyword, FitsValue::Float(value));
    }

    pub fn set_bool(&mut self, keyword: &str, value: bool) {
        self.insert(keyword, FitsValue::Boolean(value));
    }

    /// Keywords in the order they were read or set.
    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// COMMENT and HISTORY record text, in file order.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    fn insert(&mut self, keyword: &str, value: FitsValue) {
        let keyword = keyword.to_ascii_uppercase();
        if !self.values.contains_key(&keyword) {
            self.order.push(keyword.clone());
        }
        self.values.insert(keyword, value);
    }
}

/// Read the primary header of the FITS file at `path`.
pub fn read_header(path: &Path) -> Result<FitsHeader, FitsError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_header_from(&mut reader)
}

/// Read a FITS header from any byte source.
///
/// Reading stops at the `END` card; the source is left positioned at the end
/// of the header block containing it. The first card must carry a `SIMPLE`
/// or `XTENSION` keyword, which is the only structural check performed.
pub fn read_header_from<R: Read>(reader: &mut R) -> Result<FitsHeader, FitsError> {
    let mut header = FitsHeader::new();
    let mut block = [0u8; BLOCK_SIZE];

    read_block(reader, &mut block)?;
    let lead = card_keyword(&block[..CARD_SIZE]);
    if lead != "SIMPLE" && lead != "XTENSION" {
        return Err(FitsError::NotFits(lead.to_string()));
    }

    loop {
        if scan_block(&block, &mut header) {
            return Ok(header);
        }
        read_block(reader, &mut block)?;
    }
}

fn read_block<R: Read>(reader: &mut R, block: &mut [u8; BLOCK_SIZE]) -> Result<(), FitsError> {
    reader.read_exact(block).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            FitsError::UnterminatedHeader
        } else {
            FitsError::Io(e)
        }
    })
}

/// Parse one block of cards into `header`. Returns true once the `END` card
/// has been seen; cards after it in the same block are padding.
fn scan_block(block: &[u8; BLOCK_SIZE], header: &mut FitsHeader) -> bool {
    for card in block.chunks_exact(CARD_SIZE) {
        let keyword = card_keyword(card);
        if keyword == "END" {
            return true;
        }
        if keyword.is_empty() {
            continue;
        }
        if keyword == "COMMENT" || keyword == "HISTORY" {
            let text = String::from_utf8_lossy(&card[8..]);
            header.comments.push(text.trim().to_string());
            continue;
        }
        // A value card has "= " in columns 9-10. Anything else is commentary
        // in keyword position; skip it but leave a trace for debugging.
        if card[8] == b'=' && card[9] == b' ' {
            let raw = String::from_utf8_lossy(&card[10..]);
            header.insert(keyword, parse_card_value(raw.trim()));
        } else {
            tracing::debug!("skipping header card without value indicator: {}", keyword);
        }
    }
    false
}

/// Keyword field of a card: bytes 0..8, left-justified, space-padded.
fn card_keyword(card: &[u8]) -> &str {
    std::str::from_utf8(&card[..8])
        .map(str::trim_end)
        .unwrap_or("")
}

/// Parse the value portion of a card (everything after "= ").
///
/// Anything that fails to parse as a quoted string, logical, integer, or
/// real number is kept verbatim as a string value; header reading never
/// fails on an odd value.
fn parse_card_value(text: &str) -> FitsValue {
    // Quoted string: runs to the closing quote, '' escapes a quote.
    // The inline-comment separator only applies outside quotes.
    if let Some(rest) = text.strip_prefix('\'') {
        return FitsValue::String(parse_quoted(rest));
    }

    let value = match text.find('/') {
        Some(idx) => text[..idx].trim(),
        None => text,
    };

    match value {
        "T" => return FitsValue::Boolean(true),
        "F" => return FitsValue::Boolean(false),
        _ => {}
    }

    if let Ok(i) = value.parse::<i64>() {
        return FitsValue::Integer(i);
    }

    // FITS permits Fortran-style 'D' exponents in real values.
    if let Ok(f) = value.replace(['D', 'd'], "e").parse::<f64>() {
        return FitsValue::Float(f);
    }

    FitsValue::String(value.to_string())
}

fn parse_quoted(rest: &str) -> String {
    let mut out = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                out.push('\'');
            } else {
                break;
            }
        } else {
            out.push(c);
        }
    }
    // Trailing blanks in a FITS string are not significant; leading ones are.
    out.truncate(out.trim_end().len());
    out
}
