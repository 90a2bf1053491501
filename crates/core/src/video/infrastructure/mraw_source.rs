use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::header::domain::cih_record::CihRecord;
use crate::shared::constants::KEY_COLOR_TYPE;
use crate::shared::error::{RecordingError, RecordingResult};
use crate::shared::frame::Frame;
use crate::shared::recording_metadata::BitDepth;
use crate::video::domain::frame_source::FrameSource;

/// Sample packing of a raw monochrome recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelPacking {
    Bits8,
    /// Two pixels in three bytes, most significant bits first.
    Bits12,
    /// Little-endian 16-bit samples.
    Bits16,
}

impl PixelPacking {
    pub fn from_color_bit(color_bit: u32) -> Option<Self> {
        match color_bit {
            8 => Some(PixelPacking::Bits8),
            12 => Some(PixelPacking::Bits12),
            16 => Some(PixelPacking::Bits16),
            _ => None,
        }
    }

    /// Bytes per frame, `None` if the size does not fit in `usize`.
    fn frame_bytes(self, pixels: usize) -> Option<usize> {
        match self {
            PixelPacking::Bits8 => Some(pixels),
            PixelPacking::Bits12 => pixels.checked_mul(3).map(|b| b / 2),
            PixelPacking::Bits16 => pixels.checked_mul(2),
        }
    }

    pub fn bit_depth(self) -> BitDepth {
        match self {
            PixelPacking::Bits8 => BitDepth::Eight,
            PixelPacking::Bits12 | PixelPacking::Bits16 => BitDepth::Sixteen,
        }
    }
}

/// Memory-mapped `.mraw` frame store described by a `.cih`/`.cihx` header.
///
/// The mapping lives as long as the source and is unmapped on drop.
pub struct MrawSource {
    path: PathBuf,
    mmap: Mmap,
    width: u32,
    height: u32,
    frame_count: usize,
    frame_bytes: usize,
    packing: PixelPacking,
}

impl MrawSource {
    pub fn open(path: &Path, header: &CihRecord) -> RecordingResult<Self> {
        let packing = PixelPacking::from_color_bit(header.color_bit).ok_or_else(|| {
            RecordingError::probe_failed(
                path,
                format!("unsupported color bit {} for raw data", header.color_bit),
            )
        })?;
        warn_on_unusual_header(path, header, packing);

        let width = header.image_width;
        let height = header.image_height;
        let frame_count = header.total_frame;
        let too_large = || {
            RecordingError::probe_failed(
                path,
                format!("{frame_count} frames of {width}x{height} exceed the addressable size"),
            )
        };
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;
        if packing == PixelPacking::Bits12 && pixels % 2 != 0 {
            return Err(RecordingError::probe_failed(
                path,
                "12-bit packed frames need an even pixel count",
            ));
        }

        let file = File::open(path)?;
        // Safety: the mapping is read-only and the file is not modified by
        // this process while the source is alive.
        let mmap = unsafe { Mmap::map(&file)? };

        let frame_bytes = packing.frame_bytes(pixels).ok_or_else(too_large)?;
        let required = frame_bytes.checked_mul(frame_count).ok_or_else(too_large)?;
        if mmap.len() < required {
            return Err(RecordingError::probe_failed(
                path,
                format!(
                    "file holds {} bytes, header requires {required} for {frame_count} frames",
                    mmap.len()
                ),
            ));
        }

        log::debug!(
            "Mapped {} ({frame_count} frames of {width}x{height}, {packing:?})",
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            width,
            height,
            frame_count,
            frame_bytes,
            packing,
        })
    }

    pub fn packing(&self) -> PixelPacking {
        self.packing
    }
}

fn warn_on_unusual_header(path: &Path, header: &CihRecord, packing: PixelPacking) {
    if packing == PixelPacking::Bits12 {
        log::warn!(
            "{}: 12-bit packed data is unpacked on every frame read",
            path.display()
        );
    }
    if header
        .effective_bit_side
        .as_deref()
        .is_some_and(|side| side.eq_ignore_ascii_case("higher"))
    {
        log::warn!(
            "{}: effective bits are stored on the higher side; values are not shifted",
            path.display()
        );
    }
    if let Some(color_type) = header.get(KEY_COLOR_TYPE) {
        if !color_type.to_string().eq_ignore_ascii_case("mono") {
            log::warn!(
                "{}: color type '{color_type}' is read as monochrome",
                path.display()
            );
        }
    }
}

fn unpack_12bit(bytes: &[u8]) -> Vec<u16> {
    let mut pixels = Vec::with_capacity(bytes.len() / 3 * 2);
    for chunk in bytes.chunks_exact(3) {
        let (b0, b1, b2) = (u16::from(chunk[0]), u16::from(chunk[1]), u16::from(chunk[2]));
        pixels.push((b0 << 4) | (b1 >> 4));
        pixels.push(((b1 & 0x0F) << 8) | b2);
    }
    pixels
}

impl FrameSource for MrawSource {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_frame(&mut self, index: usize) -> RecordingResult<Frame> {
        let bytes = index
            .checked_mul(self.frame_bytes)
            .and_then(|start| self.mmap.get(start..start.checked_add(self.frame_bytes)?))
            .ok_or_else(|| {
                RecordingError::probe_failed(
                    &self.path,
                    format!("frame {index} lies beyond the end of the mapping"),
                )
            })?;

        let frame = match self.packing {
            PixelPacking::Bits8 => Frame::mono8(self.width, self.height, bytes.to_vec())?,
            PixelPacking::Bits16 => {
                let data = bytes
                    .chunks_exact(2)
                    .map(|b| u16::from_le_bytes([b[0], b[1]]))
                    .collect();
                Frame::mono16(self.width, self.height, data)?
            }
            PixelPacking::Bits12 => Frame::mono16(self.width, self.height, unpack_12bit(bytes))?,
        };
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::domain::cih_record::tests::mandatory_fields;
    use crate::header::domain::cih_record::CihValue;
    use crate::shared::constants::*;
    use rstest::rstest;

    fn header(width: i64, height: i64, frames: i64, color_bit: i64) -> CihRecord {
        let mut fields = mandatory_fields();
        fields.insert(KEY_IMAGE_WIDTH.into(), CihValue::Int(width));
        fields.insert(KEY_IMAGE_HEIGHT.into(), CihValue::Int(height));
        fields.insert(KEY_TOTAL_FRAME.into(), CihValue::Int(frames));
        fields.insert(KEY_COLOR_BIT.into(), CihValue::Int(color_bit));
        CihRecord::from_fields(Path::new("rec.cih"), fields).unwrap()
    }

    #[test]
    fn test_reads_16bit_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        let samples: Vec<u16> = (0..12).map(|v| v * 1000).collect();
        let bytes: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
        std::fs::write(&path, bytes).unwrap();

        let mut source = MrawSource::open(&path, &header(3, 2, 2, 16)).unwrap();
        assert_eq!(source.frame_count(), 2);
        assert_eq!(source.packing().bit_depth(), BitDepth::Sixteen);
        let frame = source.read_frame(1).unwrap();
        assert_eq!(frame, Frame::mono16(3, 2, samples[6..].to_vec()).unwrap());
    }

    #[test]
    fn test_reads_8bit_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        std::fs::write(&path, (0u8..8).collect::<Vec<_>>()).unwrap();

        let mut source = MrawSource::open(&path, &header(2, 2, 2, 8)).unwrap();
        let frame = source.read_frame(0).unwrap();
        assert_eq!(frame, Frame::mono8(2, 2, vec![0, 1, 2, 3]).unwrap());
    }

    #[test]
    fn test_reads_12bit_packed_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        // 0xABC and 0x123 packed into three bytes, twice.
        std::fs::write(&path, [0xAB, 0xC1, 0x23, 0xAB, 0xC1, 0x23]).unwrap();

        let mut source = MrawSource::open(&path, &header(2, 2, 1, 12)).unwrap();
        let frame = source.read_frame(0).unwrap();
        assert_eq!(
            frame,
            Frame::mono16(2, 2, vec![0xABC, 0x123, 0xABC, 0x123]).unwrap()
        );
    }

    #[test]
    fn test_short_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        std::fs::write(&path, [0u8; 7]).unwrap();
        let err = MrawSource::open(&path, &header(2, 2, 2, 8)).err().unwrap();
        assert!(matches!(err, RecordingError::ProbeFailed { .. }));
    }

    #[test]
    fn test_file_longer_than_required_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        std::fs::write(&path, [0u8; 10]).unwrap();
        let source = MrawSource::open(&path, &header(2, 2, 2, 8)).unwrap();
        assert_eq!(source.frame_count(), 2);
    }

    #[rstest]
    #[case::wraps_to_zero(1024, 1024, 1 << 43)]
    #[case::near_max(1024, 1024, 9_000_000_000_000_000_000)]
    fn test_huge_frame_count_is_rejected(#[case] width: i64, #[case] height: i64, #[case] frames: i64) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        std::fs::write(&path, [0u8; 16]).unwrap();
        let err = MrawSource::open(&path, &header(width, height, frames, 16))
            .err()
            .unwrap();
        assert!(matches!(err, RecordingError::ProbeFailed { .. }));
    }

    #[test]
    fn test_read_past_mapping_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        std::fs::write(&path, (0u8..8).collect::<Vec<_>>()).unwrap();
        let mut source = MrawSource::open(&path, &header(2, 2, 2, 8)).unwrap();
        assert!(matches!(
            source.read_frame(usize::MAX),
            Err(RecordingError::ProbeFailed { .. })
        ));
    }

    #[test]
    fn test_unsupported_color_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.mraw");
        std::fs::write(&path, [0u8; 16]).unwrap();
        let err = MrawSource::open(&path, &header(2, 2, 1, 24)).err().unwrap();
        assert!(matches!(err, RecordingError::ProbeFailed { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MrawSource::open(Path::new("/nonexistent/rec.mraw"), &header(2, 2, 1, 8))
            .err()
            .unwrap();
        assert!(matches!(err, RecordingError::Io(_)));
    }

    #[test]
    fn test_unpack_12bit() {
        assert_eq!(unpack_12bit(&[0xFF, 0xF0, 0x01]), vec![0xFFF, 0x001]);
    }
}
