use std::path::{Path, PathBuf};

use ffmpeg_next::format::context::Input;
use ffmpeg_next::Rational;

use crate::shared::error::{RecordingError, RecordingResult};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

/// `avformat_seek_file` with no stream index takes microseconds.
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Stream properties read when a video is opened.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoProbe {
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
    pub frame_rate: f64,
}

/// Decodes individual video frames by index via ffmpeg-next.
///
/// Each read seeks to the nearest keyframe before the target, decodes
/// forward with a fresh decoder and converts the hit to RGB24.
pub struct FfmpegVideoSource {
    path: PathBuf,
    input_ctx: Option<Input>,
    video_stream_index: usize,
    frame_count: usize,
}

// Safety: FfmpegVideoSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegVideoSource {}

impl FfmpegVideoSource {
    /// Opens and probes a video file.
    pub fn open(path: &Path) -> RecordingResult<(Self, VideoProbe)> {
        let (mut ictx, video_stream_index) = open_input(path)?;
        let probe = probe_stream(path, &mut ictx, video_stream_index)?;
        let source = Self {
            path: path.to_path_buf(),
            input_ctx: Some(ictx),
            video_stream_index,
            frame_count: probe.frame_count,
        };
        Ok((source, probe))
    }

    /// A source whose frame count is already known from a recording header.
    /// The file is opened on the first read.
    pub fn deferred(path: &Path, frame_count: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            input_ctx: None,
            video_stream_index: 0,
            frame_count,
        }
    }

    fn input(&mut self) -> RecordingResult<&mut Input> {
        if self.input_ctx.is_none() {
            let (ictx, video_stream_index) = open_input(&self.path)?;
            self.video_stream_index = video_stream_index;
            self.input_ctx = Some(ictx);
        }
        self.input_ctx
            .as_mut()
            .ok_or_else(|| RecordingError::probe_failed(&self.path, "input not opened"))
    }

    fn missing_frame(&self, index: usize) -> RecordingError {
        RecordingError::probe_failed(
            &self.path,
            format!("could not locate frame {index} in the video stream"),
        )
    }
}

fn open_input(path: &Path) -> RecordingResult<(Input, usize)> {
    ffmpeg_next::init()?;
    let ictx = ffmpeg_next::format::input(&path)?;
    let video_stream_index = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| RecordingError::probe_failed(path, "no video stream found"))?
        .index();
    Ok((ictx, video_stream_index))
}

fn probe_stream(path: &Path, ictx: &mut Input, video_stream_index: usize) -> RecordingResult<VideoProbe> {
    let (width, height, declared_frames, estimated_frames, frame_rate) = {
        let stream = ictx
            .stream(video_stream_index)
            .ok_or_else(|| RecordingError::probe_failed(path, "no video stream found"))?;
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let frame_rate = stream_frame_rate(&stream);
        let estimated = if frame_rate > 0.0 && stream.duration() > 0 {
            let seconds = stream.duration() as f64 * rational_to_f64(stream.time_base());
            (seconds * frame_rate).round() as usize
        } else {
            0
        };
        (
            decoder.width(),
            decoder.height(),
            usize::try_from(stream.frames()).unwrap_or(0),
            estimated,
            frame_rate,
        )
    };

    let frame_count = if declared_frames > 0 {
        declared_frames
    } else if estimated_frames > 0 {
        estimated_frames
    } else {
        log::debug!(
            "{} declares no frame count, counting packets",
            path.display()
        );
        ictx.packets()
            .filter(|(stream, _)| stream.index() == video_stream_index)
            .count()
    };

    Ok(VideoProbe {
        width,
        height,
        frame_count,
        frame_rate,
    })
}

fn stream_frame_rate(stream: &ffmpeg_next::format::stream::Stream) -> f64 {
    let avg = stream.avg_frame_rate();
    if avg.denominator() != 0 && avg.numerator() != 0 {
        return rational_to_f64(avg);
    }
    let rate = stream.rate();
    if rate.denominator() != 0 {
        rational_to_f64(rate)
    } else {
        0.0
    }
}

fn rational_to_f64(r: Rational) -> f64 {
    if r.denominator() == 0 {
        0.0
    } else {
        f64::from(r.numerator()) / f64::from(r.denominator())
    }
}

/// Maps a decoded timestamp to a zero-based frame number.
fn timestamp_to_frame(ts: i64, start_time: i64, time_base: Rational, frame_rate: f64) -> usize {
    let seconds = (ts - start_time) as f64 * rational_to_f64(time_base);
    (seconds * frame_rate).round().max(0.0) as usize
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

impl FrameSource for FfmpegVideoSource {
    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn read_frame(&mut self, index: usize) -> RecordingResult<Frame> {
        let video_stream_index = {
            self.input()?;
            self.video_stream_index
        };
        let ictx = self.input()?;

        let (mut decoder, time_base, start_time, frame_rate) = {
            let stream = ictx
                .stream(video_stream_index)
                .ok_or(ffmpeg_next::Error::StreamNotFound)?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
            let start = stream.start_time();
            (
                codec_ctx.decoder().video()?,
                stream.time_base(),
                // AV_NOPTS_VALUE
                if start == i64::MIN { 0 } else { start },
                stream_frame_rate(&stream),
            )
        };

        let width = decoder.width();
        let height = decoder.height();
        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        // Without a frame rate timestamps cannot be mapped, so decode from
        // the start and count.
        let use_timestamps = frame_rate > 0.0;
        let seek_target = if use_timestamps {
            (index as f64 / frame_rate * AV_TIME_BASE) as i64
        } else {
            0
        };
        ictx.seek(seek_target, ..seek_target)?;

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        let mut counter = 0usize;
        let mut current_number = |decoded: &ffmpeg_next::util::frame::video::Video| {
            let number = match decoded.timestamp() {
                Some(ts) if use_timestamps => {
                    timestamp_to_frame(ts, start_time, time_base, frame_rate)
                }
                _ => counter,
            };
            counter += 1;
            number
        };

        let mut hit = None;
        'packets: for (stream, packet) in ictx.packets() {
            if stream.index() != video_stream_index {
                continue;
            }
            if decoder.send_packet(&packet).is_err() {
                continue;
            }
            while decoder.receive_frame(&mut decoded).is_ok() {
                if current_number(&decoded) >= index {
                    hit = Some(decoded.clone());
                    break 'packets;
                }
            }
        }

        if hit.is_none() {
            let _ = decoder.send_eof();
            while decoder.receive_frame(&mut decoded).is_ok() {
                if current_number(&decoded) >= index {
                    hit = Some(decoded.clone());
                    break;
                }
            }
        }

        let Some(target) = hit else {
            return Err(self.missing_frame(index));
        };
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&target, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Frame::color8(width, height, 3, pixels)?)
    }
}
