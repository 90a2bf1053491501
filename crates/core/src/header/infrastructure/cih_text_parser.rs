use std::collections::BTreeMap;
use std::path::Path;

use crate::header::domain::cih_record::{CihRecord, CihValue};
use crate::shared::error::RecordingResult;

const KEY_VALUE_SEPARATOR: &str = " : ";

/// Reads a `.cih` text header.
pub fn parse_cih_file(path: &Path) -> RecordingResult<CihRecord> {
    let bytes = std::fs::read(path)?;
    parse_cih_text(path, &String::from_utf8_lossy(&bytes))
}

/// Parses `Key : Value` lines up to the first blank line.
///
/// Lines that do not split into exactly one key and one value (section
/// banners, comments) are skipped.
pub fn parse_cih_text(path: &Path, text: &str) -> RecordingResult<CihRecord> {
    let mut fields = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            break;
        }
        let parts: Vec<&str> = line.split(KEY_VALUE_SEPARATOR).collect();
        if let [key, value] = parts.as_slice() {
            fields.insert(key.to_string(), CihValue::coerce(value));
        }
    }
    CihRecord::from_fields(path, fields)
}
