pub mod ffmpeg_video_source;
pub mod image_decoding;
pub mod image_sequence_source;
pub mod mraw_source;
pub mod multi_page_source;
