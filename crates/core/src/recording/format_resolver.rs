use std::path::Path;

use crate::header::domain::cih_record::CihRecord;
use crate::header::infrastructure::header_parser::parse_header;
use crate::recording::frame_accessor::FrameBackend;
use crate::shared::constants::{
    HEADER_EXTENSIONS, IMAGE_EXTENSIONS, MRAW_FILE_FORMAT, VIDEO_EXTENSIONS,
};
use crate::shared::error::{RecordingError, RecordingResult};
use crate::shared::recording_metadata::{BitDepth, FormatKind, RecordingMetadata};
use crate::video::domain::frame_source::FrameSource;
use crate::video::infrastructure::ffmpeg_video_source::FfmpegVideoSource;
use crate::video::infrastructure::image_decoding::probe_still_image;
use crate::video::infrastructure::image_sequence_source::ImageSequenceSource;
use crate::video::infrastructure::mraw_source::MrawSource;
use crate::video::infrastructure::multi_page_source::MultiPageSource;

/// Metadata and the frame backend chosen for an input path.
pub struct ResolvedRecording {
    pub metadata: RecordingMetadata,
    pub backend: FrameBackend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputClass {
    Header,
    StillImage,
    Video,
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn classify(extension: &str) -> Option<InputClass> {
    if HEADER_EXTENSIONS.contains(&extension) {
        Some(InputClass::Header)
    } else if IMAGE_EXTENSIONS.contains(&extension) {
        Some(InputClass::StillImage)
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        Some(InputClass::Video)
    } else {
        None
    }
}

/// Picks the frame-access strategy for `path` and reads its metadata.
///
/// Header files (`.cih`/`.cihx`) describe a raw container, an image
/// sequence or a video next to them; still images are either a multi-page
/// container or one member of a sequence; videos are probed with ffmpeg.
pub fn resolve(path: &Path) -> RecordingResult<ResolvedRecording> {
    let extension = lowercase_extension(path);
    let class = classify(&extension).ok_or_else(|| RecordingError::UnsupportedFormat {
        path: path.to_path_buf(),
        extension: extension.clone(),
    })?;

    let resolved = match class {
        InputClass::Header => resolve_header(path)?,
        InputClass::StillImage => resolve_still_image(path)?,
        InputClass::Video => resolve_video(path)?,
    };

    log::debug!(
        "Resolved {} as {:?}: {} frames of {}x{} ({}-bit)",
        path.display(),
        resolved.metadata.format_kind,
        resolved.metadata.frame_count,
        resolved.metadata.width,
        resolved.metadata.height,
        resolved.metadata.bit_depth.bits()
    );
    Ok(resolved)
}

fn resolve_header(path: &Path) -> RecordingResult<ResolvedRecording> {
    let header = parse_header(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let data_extension = header.file_extension();

    let (format_kind, backend) = if data_extension == MRAW_FILE_FORMAT {
        let data_path = dir.join(format!("{stem}.{MRAW_FILE_FORMAT}"));
        let source = MrawSource::open(&data_path, &header)?;
        (
            FormatKind::MemoryMappedContainer,
            FrameBackend::MemoryMapped(source),
        )
    } else if IMAGE_EXTENSIONS.contains(&data_extension.as_str()) {
        let source =
            ImageSequenceSource::from_header_pattern(dir, &stem, &data_extension, header.total_frame);
        (FormatKind::ImageSequence, FrameBackend::ImageSequence(source))
    } else if VIDEO_EXTENSIONS.contains(&data_extension.as_str()) {
        let data_path = dir.join(format!("{stem}.{data_extension}"));
        let source = FfmpegVideoSource::deferred(&data_path, header.total_frame);
        (FormatKind::VideoContainer, FrameBackend::Video(source))
    } else {
        return Err(RecordingError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: data_extension,
        });
    };

    Ok(ResolvedRecording {
        metadata: header_metadata(path, header, format_kind),
        backend,
    })
}

fn header_metadata(path: &Path, header: CihRecord, format_kind: FormatKind) -> RecordingMetadata {
    RecordingMetadata {
        frame_count: header.total_frame,
        width: header.image_width,
        height: header.image_height,
        bit_depth: BitDepth::from_color_bit(header.color_bit),
        format_kind,
        frame_rate: Some(header.record_rate),
        source_path: path.to_path_buf(),
        header: Some(header),
    }
}

fn resolve_still_image(path: &Path) -> RecordingResult<ResolvedRecording> {
    if let Some(source) = MultiPageSource::probe(path)? {
        let metadata = RecordingMetadata {
            frame_count: source.frame_count(),
            width: source.width(),
            height: source.height(),
            bit_depth: source.bit_depth(),
            format_kind: FormatKind::MultiPageImage,
            frame_rate: None,
            source_path: path.to_path_buf(),
            header: None,
        };
        ensure_geometry(path, &metadata)?;
        return Ok(ResolvedRecording {
            metadata,
            backend: FrameBackend::MultiPage(source),
        });
    }

    let probe = probe_still_image(path)?;
    let source = ImageSequenceSource::scan_directory(path)?;
    let metadata = RecordingMetadata {
        frame_count: source.frame_count(),
        width: probe.width,
        height: probe.height,
        bit_depth: probe.bit_depth,
        format_kind: FormatKind::ImageSequence,
        frame_rate: None,
        source_path: path.to_path_buf(),
        header: None,
    };
    ensure_geometry(path, &metadata)?;
    Ok(ResolvedRecording {
        metadata,
        backend: FrameBackend::ImageSequence(source),
    })
}

fn resolve_video(path: &Path) -> RecordingResult<ResolvedRecording> {
    let (source, probe) = FfmpegVideoSource::open(path)?;
    let metadata = RecordingMetadata {
        frame_count: probe.frame_count,
        width: probe.width,
        height: probe.height,
        bit_depth: BitDepth::Eight,
        format_kind: FormatKind::VideoContainer,
        frame_rate: (probe.frame_rate > 0.0).then_some(probe.frame_rate),
        source_path: path.to_path_buf(),
        header: None,
    };
    ensure_geometry(path, &metadata)?;
    Ok(ResolvedRecording {
        metadata,
        backend: FrameBackend::Video(source),
    })
}

fn ensure_geometry(path: &Path, metadata: &RecordingMetadata) -> RecordingResult<()> {
    if metadata.width == 0 || metadata.height == 0 {
        return Err(RecordingError::probe_failed(
            path,
            format!("invalid frame size {}x{}", metadata.width, metadata.height),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::header::infrastructure::cih_text_parser::tests::SAMPLE_CIH;
    use crate::video::infrastructure::ffmpeg_video_source::tests::create_test_video;
    use crate::video::infrastructure::image_decoding::tests::{write_gray16_png, write_rgb_png};
    use crate::video::infrastructure::multi_page_source::tests::write_gif;
    use rstest::rstest;
    use std::path::PathBuf;

    /// Text header for a recording with the given geometry and data format.
    pub(crate) fn cih_text(
        file_format: &str,
        width: u32,
        height: u32,
        total_frame: usize,
        color_bit: u32,
    ) -> String {
        SAMPLE_CIH
            .replace("Image Width : 1024", &format!("Image Width : {width}"))
            .replace("Image Height : 1024", &format!("Image Height : {height}"))
            .replace("Total Frame : 2500", &format!("Total Frame : {total_frame}"))
            .replace("Color Bit : 16", &format!("Color Bit : {color_bit}"))
            .replace("File Format : MRaw", &format!("File Format : {file_format}"))
    }

    fn write_header(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[rstest]
    #[case::header_text("cih", Some(InputClass::Header))]
    #[case::header_xml("cihx", Some(InputClass::Header))]
    #[case::png("png", Some(InputClass::StillImage))]
    #[case::tiff("tiff", Some(InputClass::StillImage))]
    #[case::jpeg("jpeg", Some(InputClass::StillImage))]
    #[case::mp4("mp4", Some(InputClass::Video))]
    #[case::ogv("ogv", Some(InputClass::Video))]
    #[case::raw("mraw", None)]
    #[case::text("txt", None)]
    #[case::empty("", None)]
    fn test_classify(#[case] extension: &str, #[case] expected: Option<InputClass>) {
        assert_eq!(classify(extension), expected);
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(lowercase_extension(Path::new("/data/REC.CIHX")), "cihx");
        assert_eq!(lowercase_extension(Path::new("/data/rec")), "");
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let err = resolve(Path::new("/data/notes.txt")).err().unwrap();
        assert!(matches!(
            err,
            RecordingError::UnsupportedFormat { ref extension, .. } if extension == "txt"
        ));
    }

    #[test]
    fn test_header_driven_png_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_header(dir.path(), "rec.cih", &cih_text("PNG", 1024, 1024, 2500, 16));

        let resolved = resolve(&path).unwrap();
        let metadata = &resolved.metadata;
        assert_eq!(metadata.frame_count, 2500);
        assert_eq!(metadata.width, 1024);
        assert_eq!(metadata.height, 1024);
        assert_eq!(metadata.bit_depth, BitDepth::Sixteen);
        assert_eq!(metadata.format_kind, FormatKind::ImageSequence);
        assert_eq!(metadata.frame_rate, Some(20000.0));
        assert!(metadata.header.is_some());

        let FrameBackend::ImageSequence(source) = &resolved.backend else {
            panic!("expected an image sequence backend");
        };
        assert_eq!(source.files()[0], dir.path().join("rec_0.png"));
        assert_eq!(source.files()[2499], dir.path().join("rec_2499.png"));
    }

    #[test]
    fn test_header_driven_mraw() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_header(dir.path(), "rec.cih", &cih_text("MRaw", 4, 2, 3, 8));
        std::fs::write(dir.path().join("rec.mraw"), [0u8; 24]).unwrap();

        let resolved = resolve(&path).unwrap();
        assert_eq!(resolved.metadata.format_kind, FormatKind::MemoryMappedContainer);
        assert_eq!(resolved.metadata.bit_depth, BitDepth::Eight);
        assert_eq!(resolved.backend.kind(), FormatKind::MemoryMappedContainer);
    }

    #[test]
    fn test_header_driven_mraw_missing_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_header(dir.path(), "rec.cih", &cih_text("MRaw", 4, 2, 3, 8));
        assert!(matches!(resolve(&path), Err(RecordingError::Io(_))));
    }

    #[test]
    fn test_header_driven_video_is_deferred() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_header(dir.path(), "rec.cih", &cih_text("AVI", 64, 48, 10, 8));

        let resolved = resolve(&path).unwrap();
        assert_eq!(resolved.metadata.format_kind, FormatKind::VideoContainer);
        assert_eq!(resolved.metadata.frame_count, 10);
        assert_eq!(resolved.metadata.bit_depth, BitDepth::Eight);
    }

    #[test]
    fn test_header_with_unknown_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_header(dir.path(), "rec.cih", &cih_text("RAWX", 4, 2, 3, 8));
        let err = resolve(&path).err().unwrap();
        assert!(matches!(
            err,
            RecordingError::UnsupportedFormat { ref extension, .. } if extension == "rawx"
        ));
    }

    #[test]
    fn test_header_missing_mandatory_field() {
        let dir = tempfile::tempdir().unwrap();
        let text = cih_text("PNG", 4, 2, 3, 8).replace("Camera Type : ", "Camera Kind : ");
        let path = write_header(dir.path(), "rec.cih", &text);
        let err = resolve(&path).err().unwrap();
        assert!(matches!(err, RecordingError::MissingMetadataField(ref key) if key == "Camera Type"));
    }

    #[test]
    fn test_png_sequence_without_header() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            write_rgb_png(&dir.path().join(format!("img_{i}.png")), 6, 4, [1, 2, 3]);
        }

        let resolved = resolve(&dir.path().join("img_0.png")).unwrap();
        assert_eq!(resolved.metadata.frame_count, 10);
        assert_eq!(resolved.metadata.width, 6);
        assert_eq!(resolved.metadata.height, 4);
        assert_eq!(resolved.metadata.bit_depth, BitDepth::Eight);
        assert_eq!(resolved.metadata.format_kind, FormatKind::ImageSequence);
        assert_eq!(resolved.metadata.frame_rate, None);
        assert!(resolved.metadata.header.is_none());
    }

    #[test]
    fn test_sixteen_bit_sequence_probe() {
        let dir = tempfile::tempdir().unwrap();
        write_gray16_png(&dir.path().join("f_0.png"), 3, 3, 1000);
        let resolved = resolve(&dir.path().join("f_0.png")).unwrap();
        assert_eq!(resolved.metadata.bit_depth, BitDepth::Sixteen);
        assert_eq!(resolved.metadata.frame_count, 1);
    }

    #[test]
    fn test_animated_gif_is_multi_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        write_gif(&path, &[0, 80, 160, 240], 6, 4);

        let resolved = resolve(&path).unwrap();
        assert_eq!(resolved.metadata.format_kind, FormatKind::MultiPageImage);
        assert_eq!(resolved.metadata.frame_count, 4);
        assert_eq!(resolved.metadata.width, 6);
        assert_eq!(resolved.metadata.height, 4);
        assert_eq!(resolved.backend.kind(), FormatKind::MultiPageImage);
    }

    #[test]
    fn test_missing_still_image_fails() {
        assert!(resolve(Path::new("/nonexistent/img_0.png")).is_err());
    }

    #[test]
    fn test_video_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        create_test_video(&path, 6, 64, 48, 25);

        let resolved = resolve(&path).unwrap();
        assert_eq!(resolved.metadata.format_kind, FormatKind::VideoContainer);
        assert_eq!(resolved.metadata.frame_count, 6);
        assert_eq!(resolved.metadata.width, 64);
        assert_eq!(resolved.metadata.height, 48);
        assert_eq!(resolved.metadata.bit_depth, BitDepth::Eight);
        let rate = resolved.metadata.frame_rate.unwrap();
        approx::assert_relative_eq!(rate, 25.0, epsilon = 0.01);
    }
}
