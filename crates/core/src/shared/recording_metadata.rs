use std::path::PathBuf;

use serde::Serialize;

use crate::header::domain::cih_record::CihRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Maps a header `Color Bit` value: 8 is 8-bit, anything else 16-bit.
    pub fn from_color_bit(color_bit: u32) -> Self {
        if color_bit == 8 {
            BitDepth::Eight
        } else {
            BitDepth::Sixteen
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }
}

/// Frame-access strategy chosen once when a recording is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FormatKind {
    MemoryMappedContainer,
    ImageSequence,
    MultiPageImage,
    VideoContainer,
}

/// Normalized description of an open recording.
///
/// Every strategy fills the same fields; `header` is only present when the
/// recording was opened through a `.cih`/`.cihx` file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordingMetadata {
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub format_kind: FormatKind,
    pub frame_rate: Option<f64>,
    pub source_path: PathBuf,
    pub header: Option<CihRecord>,
}

impl RecordingMetadata {
    /// Geometry and format fields only, without the source path, rate or
    /// header details.
    pub fn geometry(&self) -> (usize, u32, u32, BitDepth, FormatKind) {
        (
            self.frame_count,
            self.width,
            self.height,
            self.bit_depth,
            self.format_kind,
        )
    }
}
