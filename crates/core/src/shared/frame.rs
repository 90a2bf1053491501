use ndarray::{Array2, Array3, ShapeError};

use crate::shared::recording_metadata::BitDepth;

/// A decoded frame as an ndarray in row-major order.
///
/// Monochrome frames are `(height, width)`; color frames are
/// `(height, width, channels)` with 3 (RGB) or 4 (RGBA) channels.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Mono8(Array2<u8>),
    Mono16(Array2<u16>),
    Color8(Array3<u8>),
    Color16(Array3<u16>),
}

/// Summary values over every element of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStatistics {
    pub min: u16,
    pub max: u16,
    pub mean: f64,
}

impl Frame {
    pub fn mono8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ShapeError> {
        Array2::from_shape_vec((height as usize, width as usize), data).map(Frame::Mono8)
    }

    pub fn mono16(width: u32, height: u32, data: Vec<u16>) -> Result<Self, ShapeError> {
        Array2::from_shape_vec((height as usize, width as usize), data).map(Frame::Mono16)
    }

    pub fn color8(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self, ShapeError> {
        Array3::from_shape_vec((height as usize, width as usize, channels), data).map(Frame::Color8)
    }

    pub fn color16(
        width: u32,
        height: u32,
        channels: usize,
        data: Vec<u16>,
    ) -> Result<Self, ShapeError> {
        Array3::from_shape_vec((height as usize, width as usize, channels), data)
            .map(Frame::Color16)
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Frame::Mono8(a) => a.shape(),
            Frame::Mono16(a) => a.shape(),
            Frame::Color8(a) => a.shape(),
            Frame::Color16(a) => a.shape(),
        }
    }

    pub fn height(&self) -> usize {
        self.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.shape()[1]
    }

    pub fn channels(&self) -> usize {
        self.shape().get(2).copied().unwrap_or(1)
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Frame::Color8(_) | Frame::Color16(_))
    }

    pub fn bit_depth(&self) -> BitDepth {
        match self {
            Frame::Mono8(_) | Frame::Color8(_) => BitDepth::Eight,
            Frame::Mono16(_) | Frame::Color16(_) => BitDepth::Sixteen,
        }
    }

    /// Casts the element type to `depth`. Narrowing saturates at 255.
    pub fn into_bit_depth(self, depth: BitDepth) -> Frame {
        match (self, depth) {
            (Frame::Mono8(a), BitDepth::Sixteen) => Frame::Mono16(a.mapv(u16::from)),
            (Frame::Color8(a), BitDepth::Sixteen) => Frame::Color16(a.mapv(u16::from)),
            (Frame::Mono16(a), BitDepth::Eight) => Frame::Mono8(a.mapv(saturate_u8)),
            (Frame::Color16(a), BitDepth::Eight) => Frame::Color8(a.mapv(saturate_u8)),
            (frame, _) => frame,
        }
    }

    pub fn statistics(&self) -> FrameStatistics {
        match self {
            Frame::Mono8(a) => summarize(a.iter().map(|&v| u16::from(v))),
            Frame::Color8(a) => summarize(a.iter().map(|&v| u16::from(v))),
            Frame::Mono16(a) => summarize(a.iter().copied()),
            Frame::Color16(a) => summarize(a.iter().copied()),
        }
    }
}

fn saturate_u8(v: u16) -> u8 {
    v.min(u16::from(u8::MAX)) as u8
}

fn summarize(values: impl Iterator<Item = u16>) -> FrameStatistics {
    let mut min = u16::MAX;
    let mut max = 0u16;
    let mut sum = 0f64;
    let mut count = 0usize;
    for v in values {
        min = min.min(v);
        max = max.max(v);
        sum += f64::from(v);
        count += 1;
    }
    if count == 0 {
        return FrameStatistics {
            min: 0,
            max: 0,
            mean: 0.0,
        };
    }
    FrameStatistics {
        min,
        max,
        mean: sum / count as f64,
    }
}
