use ndarray::{Array2, Array3, Axis};

use crate::shared::channel_selector::ChannelSelector;
use crate::shared::constants::LUMA_WEIGHTS;
use crate::shared::error::{RecordingError, RecordingResult};
use crate::shared::frame::Frame;

/// Reduces a decoded frame to the requested channel.
///
/// Monochrome frames and [`ChannelSelector::RawAllChannels`] pass through
/// unchanged. Luma uses the first three planes, so an alpha plane is
/// ignored.
pub fn reduce_channels(frame: Frame, channel: ChannelSelector) -> RecordingResult<Frame> {
    if !frame.is_color() || channel == ChannelSelector::RawAllChannels {
        return Ok(frame);
    }
    if frame.channels() < 3 {
        return Err(RecordingError::UnsupportedChannel(format!(
            "{channel} on a {}-channel frame",
            frame.channels()
        )));
    }

    let reduced = match (frame, channel.plane_index()) {
        (Frame::Color8(rgb), Some(plane)) => Frame::Mono8(rgb.index_axis(Axis(2), plane).to_owned()),
        (Frame::Color16(rgb), Some(plane)) => {
            Frame::Mono16(rgb.index_axis(Axis(2), plane).to_owned())
        }
        (Frame::Color8(rgb), None) => Frame::Mono8(luma(&rgb, |y| y as u8, f64::from(u8::MAX))),
        (Frame::Color16(rgb), None) => {
            Frame::Mono16(luma(&rgb, |y| y as u16, f64::from(u16::MAX)))
        }
        (mono, _) => mono,
    };
    Ok(reduced)
}

/// `Y = 0.299 R + 0.587 G + 0.114 B`, rounded half to even and kept at the
/// source's integer width.
fn luma<T>(rgb: &Array3<T>, cast: impl Fn(f64) -> T, max: f64) -> Array2<T>
where
    T: Copy + Into<f64>,
{
    let (height, width, _) = rgb.dim();
    Array2::from_shape_fn((height, width), |(y, x)| {
        let value: f64 = (0..3)
            .map(|c| {
                let component: f64 = rgb[[y, x, c]].into();
                component * LUMA_WEIGHTS[c]
            })
            .sum();
        cast(value.round_ties_even().clamp(0.0, max))
    })
}
