use std::path::Path;

use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::shared::error::RecordingResult;
use crate::shared::frame::Frame;
use crate::shared::recording_metadata::BitDepth;

/// Dimensions and sample depth of a still image, read without decoding
/// pixel data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StillImageProbe {
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub format: Option<ImageFormat>,
}

pub fn probe_still_image(path: &Path) -> RecordingResult<StillImageProbe> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    let decoder = reader.into_decoder()?;
    let (width, height) = decoder.dimensions();
    Ok(StillImageProbe {
        width,
        height,
        bit_depth: bit_depth_of(decoder.color_type()),
        format,
    })
}

pub fn bit_depth_of(color: ColorType) -> BitDepth {
    let bits_per_channel = color.bits_per_pixel() / u16::from(color.channel_count());
    if bits_per_channel <= 8 {
        BitDepth::Eight
    } else {
        BitDepth::Sixteen
    }
}

/// Decodes a single image file.
pub fn decode_image_file(path: &Path) -> RecordingResult<Frame> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    frame_from_image(image)
}

/// Converts a decoded image into a [`Frame`] keeping its integer width.
///
/// Gray+alpha drops the alpha plane; float images are quantized to 16 bits.
pub fn frame_from_image(image: DynamicImage) -> RecordingResult<Frame> {
    let (width, height) = (image.width(), image.height());
    let frame = match image.color() {
        ColorType::L8 | ColorType::La8 => Frame::mono8(width, height, image.into_luma8().into_raw())?,
        ColorType::L16 | ColorType::La16 => {
            Frame::mono16(width, height, image.into_luma16().into_raw())?
        }
        ColorType::Rgb8 => Frame::color8(width, height, 3, image.into_rgb8().into_raw())?,
        ColorType::Rgba8 => Frame::color8(width, height, 4, image.into_rgba8().into_raw())?,
        ColorType::Rgb16 | ColorType::Rgb32F => {
            Frame::color16(width, height, 3, image.into_rgb16().into_raw())?
        }
        ColorType::Rgba16 | ColorType::Rgba32F => {
            Frame::color16(width, height, 4, image.into_rgba16().into_raw())?
        }
        _ => Frame::color8(width, height, 3, image.into_rgb8().into_raw())?,
    };
    Ok(frame)
}
