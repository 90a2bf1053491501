use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, ImageFormat, ImageReader};
use tiff::decoder::{Decoder as TiffDecoder, DecodingResult};
use tiff::ColorType as TiffColorType;

use crate::shared::error::{RecordingError, RecordingResult};
use crate::shared::frame::Frame;
use crate::shared::recording_metadata::BitDepth;
use crate::video::domain::frame_source::FrameSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PageContainer {
    Gif,
    Apng,
    WebP,
    Tiff,
}

/// Serves the embedded frames of a single animated or multi-page image.
///
/// Animated containers (GIF, APNG, WebP) yield fully composited RGBA
/// frames; TIFF pages keep their stored layout and sample width.
pub struct MultiPageSource {
    path: PathBuf,
    container: PageContainer,
    frame_count: usize,
    width: u32,
    height: u32,
    bit_depth: BitDepth,
}

impl MultiPageSource {
    /// Returns `None` when the file is not a container holding more than one
    /// frame.
    pub fn probe(path: &Path) -> RecordingResult<Option<Self>> {
        let format = ImageReader::open(path)?.with_guessed_format()?.format();
        let container = match format {
            Some(ImageFormat::Gif) => PageContainer::Gif,
            Some(ImageFormat::Png) => PageContainer::Apng,
            Some(ImageFormat::WebP) => PageContainer::WebP,
            Some(ImageFormat::Tiff) => PageContainer::Tiff,
            _ => return Ok(None),
        };

        let probe = match container {
            PageContainer::Tiff => probe_tiff(path)?,
            _ => probe_animation(path, container)?,
        };
        let Some((frame_count, width, height, bit_depth)) = probe else {
            return Ok(None);
        };
        if frame_count < 2 {
            return Ok(None);
        }

        log::debug!(
            "{} holds {frame_count} embedded {container:?} frames",
            path.display()
        );
        Ok(Some(Self {
            path: path.to_path_buf(),
            container,
            frame_count,
            width,
            height,
            bit_depth,
        }))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    fn missing_frame(&self, index: usize) -> RecordingError {
        RecordingError::probe_failed(
            &self.path,
            format!("container ended before embedded frame {index}"),
        )
    }
}

type PageProbe = Option<(usize, u32, u32, BitDepth)>;

fn open_buffered(path: &Path) -> RecordingResult<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Decodes every frame of an animation to count them.
fn probe_animation(path: &Path, container: PageContainer) -> RecordingResult<PageProbe> {
    let mut frames = animation_frames(path, container)?;
    let Some(first) = frames.next().transpose()? else {
        return Ok(None);
    };
    let (width, height) = first.buffer().dimensions();
    let mut count = 1;
    for frame in frames {
        frame?;
        count += 1;
    }
    Ok(Some((count, width, height, BitDepth::Eight)))
}

/// A boxed frame iterator over an animated container. Still PNG and WebP
/// files yield nothing.
fn animation_frames(
    path: &Path,
    container: PageContainer,
) -> RecordingResult<Box<dyn Iterator<Item = image::ImageResult<image::Frame>>>> {
    let reader = open_buffered(path)?;
    let frames = match container {
        PageContainer::Gif => GifDecoder::new(reader)?.into_frames(),
        PageContainer::Apng => {
            let decoder = PngDecoder::new(reader)?;
            if !decoder.is_apng()? {
                return Ok(Box::new(std::iter::empty()));
            }
            decoder.apng()?.into_frames()
        }
        PageContainer::WebP => {
            let decoder = WebPDecoder::new(reader)?;
            if !decoder.has_animation() {
                return Ok(Box::new(std::iter::empty()));
            }
            decoder.into_frames()
        }
        PageContainer::Tiff => return Ok(Box::new(std::iter::empty())),
    };
    Ok(Box::new(frames))
}

fn probe_tiff(path: &Path) -> RecordingResult<PageProbe> {
    let mut decoder = TiffDecoder::new(open_buffered(path)?)?;
    let (width, height) = decoder.dimensions()?;
    let bit_depth = match decoder.colortype()? {
        TiffColorType::Gray(bits) | TiffColorType::RGB(bits) | TiffColorType::RGBA(bits)
            if bits > 8 =>
        {
            BitDepth::Sixteen
        }
        _ => BitDepth::Eight,
    };
    let mut count = 1;
    while decoder.more_images() {
        decoder.next_image()?;
        count += 1;
    }
    Ok(Some((count, width, height, bit_depth)))
}

fn read_tiff_page(path: &Path, index: usize) -> RecordingResult<Frame> {
    let mut decoder = TiffDecoder::new(open_buffered(path)?)?;
    for _ in 0..index {
        decoder.next_image()?;
    }
    let (width, height) = decoder.dimensions()?;
    let color = decoder.colortype()?;
    let frame = match (color, decoder.read_image()?) {
        (TiffColorType::Gray(8), DecodingResult::U8(data)) => Frame::mono8(width, height, data)?,
        (TiffColorType::Gray(16), DecodingResult::U16(data)) => Frame::mono16(width, height, data)?,
        (TiffColorType::RGB(8), DecodingResult::U8(data)) => Frame::color8(width, height, 3, data)?,
        (TiffColorType::RGBA(8), DecodingResult::U8(data)) => Frame::color8(width, height, 4, data)?,
        (TiffColorType::RGB(16), DecodingResult::U16(data)) => {
            Frame::color16(width, height, 3, data)?
        }
        (TiffColorType::RGBA(16), DecodingResult::U16(data)) => {
            Frame::color16(width, height, 4, data)?
        }
        (other, _) => {
            return Err(RecordingError::probe_failed(
                path,
                format!("unsupported TIFF page layout {other:?}"),
            ));
        }
    };
    Ok(frame)
}

impl FrameSource for MultiPageSource {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_frame(&mut self, index: usize) -> RecordingResult<Frame> {
        if self.container == PageContainer::Tiff {
            return read_tiff_page(&self.path, index);
        }
        let frame = animation_frames(&self.path, self.container)?
            .nth(index)
            .ok_or_else(|| self.missing_frame(index))??;
        let rgba = frame.into_buffer();
        let (width, height) = rgba.dimensions();
        Ok(Frame::color8(width, height, 4, rgba.into_raw())?)
    }
}
