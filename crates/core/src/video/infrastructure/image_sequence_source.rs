use std::path::{Path, PathBuf};

use crate::shared::error::RecordingResult;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;
use crate::video::infrastructure::image_decoding::decode_image_file;

/// Serves a recording stored as one still image per frame.
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
}

impl ImageSequenceSource {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    /// Collects every file next to `member` that shares its extension
    /// (case-insensitive), ordered by the number at the end of the file stem.
    ///
    /// Files without a trailing number come after numbered ones, by name.
    pub fn scan_directory(member: &Path) -> RecordingResult<Self> {
        let extension = member
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let dir = match member.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let same_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if same_extension && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by_cached_key(|path| sequence_key(path));

        log::debug!(
            "Found {} '.{extension}' files in {}",
            files.len(),
            dir.display()
        );
        Ok(Self::new(files))
    }

    /// Frame files `<stem>_<index>.<extension>` named by a recording header.
    pub fn from_header_pattern(dir: &Path, stem: &str, extension: &str, frame_count: usize) -> Self {
        let files = (0..frame_count)
            .map(|index| dir.join(format!("{stem}_{index}.{extension}")))
            .collect();
        Self::new(files)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn sequence_key(path: &Path) -> (bool, u64, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    let number = digits_start.and_then(|start| stem[start..].parse::<u64>().ok());
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (number.is_none(), number.unwrap_or(0), name)
}

impl FrameSource for ImageSequenceSource {
    fn frame_count(&self) -> usize {
        self.files.len()
    }

    fn read_frame(&mut self, index: usize) -> RecordingResult<Frame> {
        decode_image_file(&self.files[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::infrastructure::image_decoding::tests::write_rgb_png;

    fn names(source: &ImageSequenceSource) -> Vec<String> {
        source
            .files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_scan_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for i in [10, 2, 0, 1] {
            write_rgb_png(&dir.path().join(format!("img_{i}.png")), 2, 2, [0, 0, 0]);
        }
        let source = ImageSequenceSource::scan_directory(&dir.path().join("img_0.png")).unwrap();
        assert_eq!(
            names(&source),
            vec!["img_0.png", "img_1.png", "img_2.png", "img_10.png"]
        );
        assert_eq!(source.frame_count(), 4);
    }

    #[test]
    fn test_scan_matches_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        write_rgb_png(&dir.path().join("a_0.png"), 2, 2, [0, 0, 0]);
        std::fs::copy(dir.path().join("a_0.png"), dir.path().join("a_1.PNG")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a_2.png.bak"), "x").unwrap();
        let source = ImageSequenceSource::scan_directory(&dir.path().join("a_0.png")).unwrap();
        assert_eq!(names(&source), vec!["a_0.png", "a_1.PNG"]);
    }

    #[test]
    fn test_unnumbered_files_sort_last() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["cover.png", "f2.png", "f1.png"] {
            write_rgb_png(&dir.path().join(name), 2, 2, [0, 0, 0]);
        }
        let source = ImageSequenceSource::scan_directory(&dir.path().join("f1.png")).unwrap();
        assert_eq!(names(&source), vec!["f1.png", "f2.png", "cover.png"]);
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        assert!(ImageSequenceSource::scan_directory(Path::new("/nonexistent/dir/a.png")).is_err());
    }

    #[test]
    fn test_header_pattern_names() {
        let source = ImageSequenceSource::from_header_pattern(Path::new("/data"), "rec", "png", 3);
        assert_eq!(names(&source), vec!["rec_0.png", "rec_1.png", "rec_2.png"]);
        assert_eq!(source.files()[0], PathBuf::from("/data/rec_0.png"));
    }

    #[test]
    fn test_read_frame_decodes_indexed_file() {
        let dir = tempfile::tempdir().unwrap();
        write_rgb_png(&dir.path().join("s_0.png"), 3, 2, [10, 10, 10]);
        write_rgb_png(&dir.path().join("s_1.png"), 3, 2, [20, 20, 20]);
        let mut source = ImageSequenceSource::scan_directory(&dir.path().join("s_0.png")).unwrap();
        let Frame::Color8(rgb) = source.read_frame(1).unwrap() else {
            panic!("expected an 8-bit color frame");
        };
        assert_eq!(rgb[[0, 0, 0]], 20);
    }

    #[test]
    fn test_sequence_key() {
        assert_eq!(sequence_key(Path::new("img_0042.png")), (false, 42, "img_0042.png".into()));
        assert_eq!(sequence_key(Path::new("img.png")), (true, 0, "img.png".into()));
    }
}
