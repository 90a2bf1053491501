pub const HEADER_EXTENSIONS: &[&str] = &["cih", "cihx"];

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "tif", "tiff", "bmp", "jpg", "jpeg", "gif", "webp"];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "avi", "mkv", "mp4", "mov", "m4v", "wmv", "webm", "flv", "ogg", "ogv",
];

/// `File Format` value naming the raw memory-mapped container.
pub const MRAW_FILE_FORMAT: &str = "mraw";

/// Rec. 601 luma weights for R, G, B.
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

pub const KEY_DATE: &str = "Date";
pub const KEY_CAMERA_TYPE: &str = "Camera Type";
pub const KEY_RECORD_RATE: &str = "Record Rate(fps)";
pub const KEY_SHUTTER_SPEED: &str = "Shutter Speed(s)";
pub const KEY_TOTAL_FRAME: &str = "Total Frame";
pub const KEY_ORIGINAL_TOTAL_FRAME: &str = "Original Total Frame";
pub const KEY_IMAGE_WIDTH: &str = "Image Width";
pub const KEY_IMAGE_HEIGHT: &str = "Image Height";
pub const KEY_FILE_FORMAT: &str = "File Format";
pub const KEY_EFFECTIVE_BIT_DEPTH: &str = "EffectiveBit Depth";
pub const KEY_EFFECTIVE_BIT_SIDE: &str = "EffectiveBit Side";
pub const KEY_COLOR_BIT: &str = "Color Bit";
pub const KEY_COLOR_TYPE: &str = "Color Type";
pub const KEY_COMMENT_TEXT: &str = "Comment Text";

/// Header keys that must be present for a recording to open.
pub const MANDATORY_HEADER_KEYS: &[&str] = &[
    KEY_DATE,
    KEY_CAMERA_TYPE,
    KEY_RECORD_RATE,
    KEY_SHUTTER_SPEED,
    KEY_TOTAL_FRAME,
    KEY_IMAGE_WIDTH,
    KEY_IMAGE_HEIGHT,
    KEY_FILE_FORMAT,
    KEY_EFFECTIVE_BIT_DEPTH,
    KEY_COMMENT_TEXT,
    KEY_COLOR_BIT,
];
