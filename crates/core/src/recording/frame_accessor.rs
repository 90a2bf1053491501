use std::path::Path;

use crate::recording::format_resolver::{resolve, ResolvedRecording};
use crate::shared::channel_selector::ChannelSelector;
use crate::shared::error::{RecordingError, RecordingResult};
use crate::shared::frame::Frame;
use crate::shared::recording_metadata::{FormatKind, RecordingMetadata};
use crate::video::domain::channel_reducer::reduce_channels;
use crate::video::domain::frame_source::FrameSource;
use crate::video::infrastructure::ffmpeg_video_source::FfmpegVideoSource;
use crate::video::infrastructure::image_sequence_source::ImageSequenceSource;
use crate::video::infrastructure::mraw_source::MrawSource;
use crate::video::infrastructure::multi_page_source::MultiPageSource;

/// Frame storage behind an open recording, one variant per strategy.
pub enum FrameBackend {
    MemoryMapped(MrawSource),
    ImageSequence(ImageSequenceSource),
    MultiPage(MultiPageSource),
    Video(FfmpegVideoSource),
}

impl FrameBackend {
    pub fn kind(&self) -> FormatKind {
        match self {
            FrameBackend::MemoryMapped(_) => FormatKind::MemoryMappedContainer,
            FrameBackend::ImageSequence(_) => FormatKind::ImageSequence,
            FrameBackend::MultiPage(_) => FormatKind::MultiPageImage,
            FrameBackend::Video(_) => FormatKind::VideoContainer,
        }
    }
}

/// An open recording: metadata resolved once, frames decoded on demand.
///
/// Frames are never cached. A memory-mapped recording keeps its mapping
/// until the handle is dropped.
pub struct Recording {
    metadata: RecordingMetadata,
    backend: FrameBackend,
}

impl Recording {
    pub fn open(path: &Path) -> RecordingResult<Self> {
        let ResolvedRecording { metadata, backend } = resolve(path)?;
        Ok(Self { metadata, backend })
    }

    pub fn metadata(&self) -> &RecordingMetadata {
        &self.metadata
    }

    pub fn frame_count(&self) -> usize {
        self.metadata.frame_count
    }

    fn check_index(&self, index: usize) -> RecordingResult<()> {
        if index >= self.metadata.frame_count {
            return Err(RecordingError::FrameIndexOutOfRange {
                index,
                frame_count: self.metadata.frame_count,
            });
        }
        Ok(())
    }

    /// Decodes frame `index` and reduces it to `channel`.
    ///
    /// Raw containers return stored samples as-is. Every other strategy
    /// reduces color frames to the selected channel and casts the result to
    /// the recording's bit depth.
    pub fn get_frame(&mut self, index: usize, channel: ChannelSelector) -> RecordingResult<Frame> {
        self.check_index(index)?;

        let decoded = match &mut self.backend {
            FrameBackend::MemoryMapped(source) => return source.read_frame(index),
            FrameBackend::ImageSequence(source) => source.read_frame(index)?,
            FrameBackend::MultiPage(source) => source.read_frame(index)?,
            FrameBackend::Video(source) => source.read_frame(index)?,
        };
        self.check_geometry(index, &decoded)?;

        let reduced = reduce_channels(decoded, channel)?;
        Ok(reduced.into_bit_depth(self.metadata.bit_depth))
    }

    /// Frames whose size differs from the recording's are a decode error.
    fn check_geometry(&self, index: usize, frame: &Frame) -> RecordingResult<()> {
        let (width, height) = (self.metadata.width as usize, self.metadata.height as usize);
        if frame.width() != width || frame.height() != height {
            return Err(RecordingError::probe_failed(
                &self.metadata.source_path,
                format!(
                    "frame {index} is {}x{}, recording is {width}x{height}",
                    frame.width(),
                    frame.height()
                ),
            ));
        }
        Ok(())
    }

    /// Like [`Recording::get_frame`] with the channel given as `R`, `G`,
    /// `B`, `Y` or `RAW`.
    pub fn get_frame_named(&mut self, index: usize, channel: &str) -> RecordingResult<Frame> {
        self.check_index(index)?;
        let channel: ChannelSelector = channel.parse()?;
        self.get_frame(index, channel)
    }
}
