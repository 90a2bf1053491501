use crate::shared::error::RecordingResult;
use crate::shared::frame::Frame;

/// Decodes frames of an opened recording by position.
///
/// Implementations handle I/O details (container, codec, memory map) while
/// the accessor works with the abstract [`Frame`] type. Indices are
/// validated by the caller before `read_frame` is reached.
pub trait FrameSource: Send {
    /// Number of frames the source serves.
    fn frame_count(&self) -> usize;

    /// Decodes frame `index` at the source's native channel layout.
    fn read_frame(&mut self, index: usize) -> RecordingResult<Frame>;
}
