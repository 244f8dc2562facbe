//! Source image formats recognized by the directory walk.
//!
//! Matching is done on the suffix after the last `.`, case-insensitively.

use crate::constants::SUPPORTED_IMAGE_EXTENSIONS;
use crate::error::{Result, SqueezeError};
use image::ImageFormat;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    Jpeg,
    Png,
}

impl SupportedFormat {
    /// Format named by the suffix after the last `.` of the file name.
    ///
    /// Unlike [`Path::extension`], a dot file such as `.JPG` counts.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (_, suffix) = name.rsplit_once('.')?;
        suffix.parse().ok()
    }

    /// Maps a sniffed content format back onto the supported set.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(SupportedFormat::Jpeg),
            ImageFormat::Png => Some(SupportedFormat::Png),
            _ => None,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            SupportedFormat::Jpeg => "image/jpeg",
            SupportedFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupportedFormat::Jpeg => "JPEG",
            SupportedFormat::Png => "PNG",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SupportedFormat {
    type Err = SqueezeError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        if !SUPPORTED_IMAGE_EXTENSIONS.contains(&lower.as_str()) {
            return Err(SqueezeError::UnsupportedFormat(s.to_string()));
        }
        match lower.as_str() {
            "png" => Ok(SupportedFormat::Png),
            _ => Ok(SupportedFormat::Jpeg),
        }
    }
}

/// Check if a file path carries one of the supported image extensions
pub fn is_supported_image(path: &Path) -> bool {
    SupportedFormat::from_path(path).is_some()
}
