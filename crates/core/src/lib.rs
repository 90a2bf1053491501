pub mod header;
pub mod recording;
pub mod shared;
pub mod video;
