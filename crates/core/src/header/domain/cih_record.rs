use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::shared::constants::*;
use crate::shared::error::{RecordingError, RecordingResult};

/// A raw header value after opportunistic typing.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CihValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CihValue {
    /// Three-tier coercion: a value containing `.` becomes a float, anything
    /// else an integer, and either falls back to text when parsing fails.
    pub fn coerce(raw: &str) -> Self {
        if raw.contains('.') {
            raw.parse::<f64>()
                .map(CihValue::Float)
                .unwrap_or_else(|_| CihValue::Text(raw.to_string()))
        } else {
            raw.parse::<i64>()
                .map(CihValue::Int)
                .unwrap_or_else(|_| CihValue::Text(raw.to_string()))
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CihValue::Int(v) => Some(*v as f64),
            CihValue::Float(v) => Some(*v),
            CihValue::Text(s) => parse_decimal_or_fraction(s),
        }
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            CihValue::Int(v) => u64::try_from(*v).ok(),
            CihValue::Float(v) if v.fract() == 0.0 && *v >= 0.0 => Some(*v as u64),
            CihValue::Float(_) => None,
            CihValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for CihValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CihValue::Int(v) => write!(f, "{v}"),
            CihValue::Float(v) => write!(f, "{v}"),
            CihValue::Text(s) => f.write_str(s),
        }
    }
}

/// Accepts `0.00005` as well as the `1/20000` form cameras write for
/// shutter speed.
fn parse_decimal_or_fraction(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    s.parse().ok()
}

/// Sidecar metadata of a Photron recording.
///
/// Built from either header encoding; the typed fields are identical for
/// a `.cih` and a `.cihx` describing the same recording. Every raw entry
/// stays available through [`CihRecord::get`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CihRecord {
    pub date: String,
    pub camera_type: String,
    pub record_rate: f64,
    pub shutter_speed: f64,
    pub total_frame: usize,
    pub original_total_frame: Option<usize>,
    pub image_width: u32,
    pub image_height: u32,
    pub file_format: String,
    pub effective_bit_depth: u32,
    pub effective_bit_side: Option<String>,
    pub color_bit: u32,
    pub comment: String,
    #[serde(skip)]
    fields: BTreeMap<String, CihValue>,
}

impl CihRecord {
    /// Validates mandatory keys and extracts typed fields.
    ///
    /// A missing key is a [`RecordingError::MissingMetadataField`]; a key
    /// whose value cannot be read as the expected type is a
    /// [`RecordingError::MalformedHeader`].
    pub fn from_fields(path: &Path, fields: BTreeMap<String, CihValue>) -> RecordingResult<Self> {
        if let Some(missing) = MANDATORY_HEADER_KEYS
            .iter()
            .find(|key| !fields.contains_key(**key))
        {
            return Err(RecordingError::MissingMetadataField(missing.to_string()));
        }

        let reader = FieldReader {
            path,
            fields: &fields,
        };
        Ok(Self {
            date: reader.text(KEY_DATE)?,
            camera_type: reader.text(KEY_CAMERA_TYPE)?,
            record_rate: reader.float(KEY_RECORD_RATE)?,
            shutter_speed: reader.float(KEY_SHUTTER_SPEED)?,
            total_frame: reader.count(KEY_TOTAL_FRAME)?,
            original_total_frame: reader.optional_count(KEY_ORIGINAL_TOTAL_FRAME)?,
            image_width: reader.dimension(KEY_IMAGE_WIDTH)?,
            image_height: reader.dimension(KEY_IMAGE_HEIGHT)?,
            file_format: reader.text(KEY_FILE_FORMAT)?,
            effective_bit_depth: reader.small_int(KEY_EFFECTIVE_BIT_DEPTH)?,
            effective_bit_side: fields.get(KEY_EFFECTIVE_BIT_SIDE).map(|v| v.to_string()),
            color_bit: reader.small_int(KEY_COLOR_BIT)?,
            comment: reader.text(KEY_COMMENT_TEXT)?,
            fields,
        })
    }

    pub fn get(&self, key: &str) -> Option<&CihValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, CihValue> {
        &self.fields
    }

    /// Lowercased `File Format`, used as the extension of frame files.
    pub fn file_extension(&self) -> String {
        self.file_format.trim().to_lowercase()
    }

    /// Whether the typed fields match, ignoring raw entries that only one
    /// encoding carries.
    pub fn same_recording(&self, other: &CihRecord) -> bool {
        self.date == other.date
            && self.camera_type == other.camera_type
            && self.record_rate == other.record_rate
            && self.shutter_speed == other.shutter_speed
            && self.total_frame == other.total_frame
            && self.image_width == other.image_width
            && self.image_height == other.image_height
            && self.file_format == other.file_format
            && self.effective_bit_depth == other.effective_bit_depth
            && self.color_bit == other.color_bit
            && self.comment == other.comment
    }
}

struct FieldReader<'a> {
    path: &'a Path,
    fields: &'a BTreeMap<String, CihValue>,
}

impl FieldReader<'_> {
    fn value(&self, key: &str) -> RecordingResult<&CihValue> {
        self.fields
            .get(key)
            .ok_or_else(|| RecordingError::MissingMetadataField(key.to_string()))
    }

    fn invalid(&self, key: &str, value: &CihValue, expected: &str) -> RecordingError {
        RecordingError::malformed(
            self.path,
            format!("'{key}' has value '{value}', expected {expected}"),
        )
    }

    fn text(&self, key: &str) -> RecordingResult<String> {
        Ok(self.value(key)?.to_string())
    }

    fn float(&self, key: &str) -> RecordingResult<f64> {
        let value = self.value(key)?;
        value
            .as_f64()
            .ok_or_else(|| self.invalid(key, value, "a number"))
    }

    fn count(&self, key: &str) -> RecordingResult<usize> {
        let value = self.value(key)?;
        value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| self.invalid(key, value, "a non-negative integer"))
    }

    fn optional_count(&self, key: &str) -> RecordingResult<Option<usize>> {
        if self.fields.contains_key(key) {
            self.count(key).map(Some)
        } else {
            Ok(None)
        }
    }

    fn small_int(&self, key: &str) -> RecordingResult<u32> {
        let value = self.value(key)?;
        value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| self.invalid(key, value, "an integer"))
    }

    fn dimension(&self, key: &str) -> RecordingResult<u32> {
        let value = self.value(key)?;
        match self.small_int(key)? {
            0 => Err(self.invalid(key, value, "a positive integer")),
            v => Ok(v),
        }
    }
}
