pub mod format_resolver;
pub mod frame_accessor;
