use std::path::Path;

use crate::header::domain::cih_record::CihRecord;
use crate::header::infrastructure::cih_text_parser::parse_cih_file;
use crate::header::infrastructure::cihx_xml_parser::parse_cihx_file;
use crate::shared::error::{RecordingError, RecordingResult};

/// Parses a Photron header, choosing the encoding by extension.
pub fn parse_header(path: &Path) -> RecordingResult<CihRecord> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let record = match extension.as_deref() {
        Some("cih") => parse_cih_file(path)?,
        Some("cihx") => parse_cihx_file(path)?,
        _ => return Err(RecordingError::UnsupportedHeaderFormat(path.to_path_buf())),
    };

    log::debug!(
        "Parsed header {}: {} frames of {}x{}, {} ({}-bit)",
        path.display(),
        record.total_frame,
        record.image_width,
        record.image_height,
        record.file_format,
        record.color_bit
    );
    Ok(record)
}
