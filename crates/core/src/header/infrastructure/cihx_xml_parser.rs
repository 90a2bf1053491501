use std::collections::BTreeMap;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::header::domain::cih_record::{CihRecord, CihValue};
use crate::shared::constants::*;
use crate::shared::error::{RecordingError, RecordingResult};

const ROOT_OPEN: &str = "<cih>";
const ROOT_CLOSE: &str = "</cih>";

#[derive(Clone, Copy)]
enum FieldType {
    Int,
    Float,
    Text,
}

/// Header key, XML path below the `cih` root, and the type the text
/// encoding would produce for it.
const FIELD_PATHS: &[(&str, &[&str], FieldType)] = &[
    (KEY_DATE, &["fileInfo", "date"], FieldType::Text),
    (KEY_CAMERA_TYPE, &["deviceInfo", "deviceName"], FieldType::Text),
    (KEY_RECORD_RATE, &["recordInfo", "recordRate"], FieldType::Float),
    (KEY_SHUTTER_SPEED, &["recordInfo", "shutterSpeed"], FieldType::Float),
    (KEY_TOTAL_FRAME, &["frameInfo", "totalFrame"], FieldType::Int),
    (KEY_ORIGINAL_TOTAL_FRAME, &["frameInfo", "recordedFrame"], FieldType::Int),
    (KEY_IMAGE_WIDTH, &["imageDataInfo", "resolution", "width"], FieldType::Int),
    (KEY_IMAGE_HEIGHT, &["imageDataInfo", "resolution", "height"], FieldType::Int),
    (KEY_FILE_FORMAT, &["imageFileInfo", "fileFormat"], FieldType::Text),
    (KEY_EFFECTIVE_BIT_DEPTH, &["imageDataInfo", "effectiveBit", "depth"], FieldType::Int),
    (KEY_EFFECTIVE_BIT_SIDE, &["imageDataInfo", "effectiveBit", "side"], FieldType::Text),
    (KEY_COLOR_TYPE, &["imageDataInfo", "colorInfo", "type"], FieldType::Text),
    (KEY_COLOR_BIT, &["imageDataInfo", "colorInfo", "bit"], FieldType::Int),
    (KEY_COMMENT_TEXT, &["basicInfo", "comment"], FieldType::Text),
];

/// Reads a `.cihx` header.
pub fn parse_cihx_file(path: &Path) -> RecordingResult<CihRecord> {
    let bytes = std::fs::read(path)?;
    parse_cihx_text(path, &String::from_utf8_lossy(&bytes))
}

/// Parses the `<cih>` fragment embedded in `text`.
pub fn parse_cihx_text(path: &Path, text: &str) -> RecordingResult<CihRecord> {
    let fragment = extract_root_fragment(path, text)?;
    let doc = Document::parse(&fragment)
        .map_err(|e| RecordingError::malformed(path, format!("invalid XML: {e}")))?;
    let root = doc.root_element();

    let mut fields = BTreeMap::new();
    for (key, xml_path, field_type) in FIELD_PATHS {
        let Some(raw) = find_text(root, xml_path) else {
            continue;
        };
        fields.insert(key.to_string(), typed_value(path, key, raw, *field_type)?);
    }
    fields
        .entry(KEY_COMMENT_TEXT.to_string())
        .or_insert_with(|| CihValue::Text(String::new()));

    CihRecord::from_fields(path, fields)
}

/// Cuts the span from the first line opening the root to the last line
/// closing it. Anything outside the tags on those lines is dropped.
fn extract_root_fragment(path: &Path, text: &str) -> RecordingResult<String> {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|l| l.contains(ROOT_OPEN));
    let last = lines.iter().rposition(|l| l.contains(ROOT_CLOSE));
    let (first, last) = match (first, last) {
        (Some(first), Some(last)) if first <= last => (first, last),
        (None, _) => {
            return Err(RecordingError::malformed(path, "opening <cih> tag not found"));
        }
        _ => {
            return Err(RecordingError::malformed(path, "closing </cih> tag not found"));
        }
    };

    let mut span: Vec<&str> = lines[first..=last].to_vec();
    if let Some(start) = span[0].find(ROOT_OPEN) {
        span[0] = &span[0][start..];
    }
    let tail = span.len() - 1;
    if let Some(end) = span[tail].rfind(ROOT_CLOSE) {
        span[tail] = &span[tail][..end + ROOT_CLOSE.len()];
    }
    Ok(span.join("\n"))
}

fn find_text<'a, 'input>(root: Node<'a, 'input>, xml_path: &[&str]) -> Option<&'a str> {
    let mut node = root;
    for name in xml_path {
        node = node
            .children()
            .find(|child| child.is_element() && child.has_tag_name(*name))?;
    }
    Some(node.text().unwrap_or("").trim())
}

fn typed_value(path: &Path, key: &str, raw: &str, field_type: FieldType) -> RecordingResult<CihValue> {
    let invalid = || RecordingError::malformed(path, format!("'{key}' has non-numeric value '{raw}'"));
    match field_type {
        FieldType::Text => Ok(CihValue::Text(raw.to_string())),
        FieldType::Int => raw.parse().map(CihValue::Int).map_err(|_| invalid()),
        FieldType::Float => match raw.parse() {
            Ok(v) => Ok(CihValue::Float(v)),
            // Shutter speed may still be written as a fraction.
            Err(_) if raw.contains('/') => Ok(CihValue::Text(raw.to_string())),
            Err(_) => Err(invalid()),
        },
    }
}
