pub mod channel_selector;
pub mod constants;
pub mod error;
pub mod frame;
pub mod recording_metadata;
