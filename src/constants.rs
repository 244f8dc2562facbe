pub const DEFAULT_QUALITY: u8 = 90;
pub const MIN_QUALITY: u8 = 0;
pub const MAX_QUALITY: u8 = 100;

pub const DEFAULT_MIN_SIZE_KB: u64 = 100;
pub const BYTES_PER_KB: u64 = 1024;

pub const DEFAULT_JOBS: usize = 1;

pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;
pub const OXIPNG_PRESET: u8 = 4;

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub const PROGRESS_SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
pub const WRITE_PROBE_PREFIX: &str = ".dir-squeeze-probe";

pub const USER_AGENT: &str = concat!("dir-squeeze/", env!("CARGO_PKG_VERSION"));
pub const REMOTE_TIMEOUT_SECS: u64 = 120;

pub const TINYPNG_SHRINK_URL: &str = "https://api.tinify.com/shrink";
pub const TINYPNG_AUTH_USER: &str = "api";

pub const KRAKEN_UPLOAD_URL: &str = "https://api.kraken.io/v1/upload";

// Common output message prefixes
pub const SUCCESS_PREFIX: &str = "✅";
pub const SKIP_PREFIX: &str = "⏭️ ";
pub const COPY_PREFIX: &str = "📋";
pub const SUMMARY_PREFIX: &str = "📊";
