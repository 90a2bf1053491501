pub mod channel_reducer;
pub mod frame_source;
