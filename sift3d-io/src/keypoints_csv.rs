//! Keypoint coordinate file support
//!
//! Each line of a coordinate file is one keypoint. Fields are separated by
//! commas and the first three are x, y and z; further fields are ignored.
//!
//! Parsing is deliberately lenient: a field that is missing or does not start
//! with a number reads as `0.0`, so `"1.5,2.5"` gives `(1.5, 2.5, 0.0)`
//! and `"abc,2.5,3.0"` gives `(0.0, 2.5, 3.0)`. Malformed rows never fail a
//! load.

use serde::{Deserialize, Serialize};
use sift3d_core::{Error, Keypoint, KeypointStore, Point3d, Result, DEFAULT_SCALE};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek};
use std::path::Path;
use tracing::debug;

/// Field separator of coordinate files
pub const FIELD_DELIMITER: char = ',';

/// How lines containing only whitespace are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankLines {
    /// Every line is a record; a blank line becomes a keypoint at the origin
    #[default]
    Count,
    /// Blank lines are not records
    Skip,
}

/// Options for reading coordinate files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeypointCsvOptions {
    pub blank_lines: BlankLines,
}

impl KeypointCsvOptions {
    /// Options that ignore blank lines
    pub fn skip_blank_lines() -> Self {
        Self {
            blank_lines: BlankLines::Skip,
        }
    }

    fn is_record(&self, line: &[u8]) -> bool {
        match self.blank_lines {
            BlankLines::Count => true,
            BlankLines::Skip => !line.iter().all(u8::is_ascii_whitespace),
        }
    }
}

/// Coordinate file reader
pub struct KeypointCsvReader;

impl KeypointCsvReader {
    /// Read keypoints with default options
    pub fn read_keypoints<P: AsRef<Path>>(path: P) -> Result<KeypointStore> {
        Self::read_keypoints_with_options(path, &KeypointCsvOptions::default())
    }

    /// Read keypoints with specific options.
    ///
    /// The file is read twice: once to size the store, then again to fill it.
    pub fn read_keypoints_with_options<P: AsRef<Path>>(
        path: P,
        options: &KeypointCsvOptions,
    ) -> Result<KeypointStore> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut line = Vec::new();

        let mut count = 0usize;
        while next_line(&mut reader, &mut line)? {
            if options.is_record(&line) {
                count += 1;
            }
        }

        let mut store = KeypointStore::new();
        store.resize(count)?;

        reader.rewind()?;

        let mut slot = 0usize;
        while next_line(&mut reader, &mut line)? {
            if !options.is_record(&line) {
                continue;
            }
            let key = store.as_mut_slice().get_mut(slot).ok_or_else(|| {
                Error::InvalidData(format!(
                    "{} grew while being read (expected {} records)",
                    path.display(),
                    count
                ))
            })?;
            populate_keypoint(key, &String::from_utf8_lossy(&line));
            slot += 1;
        }

        if slot != count {
            return Err(Error::InvalidData(format!(
                "{} shrank while being read (expected {} records, found {})",
                path.display(),
                count,
                slot
            )));
        }

        debug!("Loaded {} keypoints from {}", count, path.display());
        Ok(store)
    }

    /// Parse the coordinates of a single record
    pub fn parse_coordinates(line: &str) -> Point3d {
        let record = line.trim_end_matches(|c| c == '\n' || c == '\r');
        let mut coords = [0.0f64; 3];
        // Empty fields are skipped, so "1,,3" is (1, 3, 0)
        let fields = record.split(FIELD_DELIMITER).filter(|f| !f.is_empty());
        for (value, field) in coords.iter_mut().zip(fields) {
            *value = parse_leading_f64(field);
        }
        Point3d::new(coords[0], coords[1], coords[2])
    }
}

fn next_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    Ok(reader.read_until(b'\n', buf)? > 0)
}

fn populate_keypoint(key: &mut Keypoint, line: &str) {
    *key = Keypoint::default();
    key.position = KeypointCsvReader::parse_coordinates(line);
    key.octave = 0;
    key.scale = DEFAULT_SCALE;
    key.set_identity_frame();
}

/// Parse the longest numeric prefix of `text` after leading whitespace, the
/// way C's `strtod` does.
///
/// Accepts an optional sign followed by a decimal number with optional
/// fraction and exponent, a hexadecimal number (`0x1.8p3`), `inf`,
/// `infinity` or `nan` (case-insensitive). Text without such a prefix yields
/// `0.0`. The result does not depend on the process locale.
pub fn parse_leading_f64(text: &str) -> f64 {
    let s = text.trim_start();
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let magnitude = parse_special(body)
        .or_else(|| parse_hex(body))
        .or_else(|| parse_decimal(body));
    match magnitude {
        Some(value) if negative => -value,
        Some(value) => value,
        None => 0.0,
    }
}

fn has_prefix_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn parse_special(body: &str) -> Option<f64> {
    if has_prefix_ignore_case(body, "inf") {
        Some(f64::INFINITY)
    } else if has_prefix_ignore_case(body, "nan") {
        Some(f64::NAN)
    } else {
        None
    }
}

/// Index of the first byte at or after `from` that fails `pred`
fn scan(bytes: &[u8], from: usize, pred: impl Fn(u8) -> bool) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|b| !pred(*b))
        .map_or(bytes.len(), |n| from + n)
}

/// Optional sign and decimal digits at `from`; returns the end index and
/// the value when at least one digit is present.
fn parse_exponent(bytes: &[u8], from: usize) -> Option<(usize, i32)> {
    let (negative, digits_from) = match bytes.get(from) {
        Some(b'-') => (true, from + 1),
        Some(b'+') => (false, from + 1),
        _ => (false, from),
    };
    let end = scan(bytes, digits_from, |b| b.is_ascii_digit());
    if end == digits_from {
        return None;
    }
    let magnitude = bytes[digits_from..end].iter().fold(0i32, |acc, b| {
        acc.saturating_mul(10).saturating_add(i32::from(b - b'0'))
    });
    Some((end, if negative { -magnitude } else { magnitude }))
}

fn parse_hex(body: &str) -> Option<f64> {
    if !has_prefix_ignore_case(body, "0x") {
        return None;
    }
    let bytes = body.as_bytes();
    let mut mantissa = 0.0f64;
    let mut exponent = 0i32;
    let mut digits = 0usize;

    let mut end = 2;
    while let Some(d) = bytes.get(end).and_then(|b| char::from(*b).to_digit(16)) {
        mantissa = mantissa * 16.0 + f64::from(d);
        digits += 1;
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while let Some(d) = bytes.get(end).and_then(|b| char::from(*b).to_digit(16)) {
            mantissa = mantissa * 16.0 + f64::from(d);
            exponent = exponent.saturating_sub(4);
            digits += 1;
            end += 1;
        }
    }
    // "0x" without digits is the number 0 followed by junk
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'p' | b'P')) {
        if let Some((_, binary)) = parse_exponent(bytes, end + 1) {
            exponent = exponent.saturating_add(binary);
        }
    }
    Some(mantissa * 2f64.powi(exponent))
}

fn parse_decimal(body: &str) -> Option<f64> {
    let bytes = body.as_bytes();
    let int_end = scan(bytes, 0, |b| b.is_ascii_digit());
    let mut mantissa_digits = int_end;
    let mut end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = scan(bytes, end + 1, |b| b.is_ascii_digit());
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        if let Some((exp_end, _)) = parse_exponent(bytes, end + 1) {
            end = exp_end;
        }
    }

    body[..end].parse::<f64>().ok()
}
