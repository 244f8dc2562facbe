//! Helpers shared by the backends and the batch report.

use crate::constants::{BYTES_PER_KB, PROGRESS_SPINNER_TEMPLATE};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a progress spinner with consistent styling.
///
/// Returns a hidden bar when `visible` is false so callers never branch.
pub fn create_progress_spinner(message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template(PROGRESS_SPINNER_TEMPLATE) {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 B")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Percentage saved, rounded to two decimals: `100 - optimized/original*100`.
///
/// Negative when the optimized file is larger.
pub fn savings_percent(original_size: u64, optimized_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let percent = 100.0 - (optimized_size as f64 / original_size as f64 * 100.0);
    (percent * 100.0).round() / 100.0
}

pub fn kb_to_bytes(kb: u64) -> u64 {
    kb.saturating_mul(BYTES_PER_KB)
}

pub fn bytes_to_kb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_KB as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1.0 MB");
    }

    #[test]
    fn test_savings_percent() {
        assert_eq!(savings_percent(1000, 800), 20.0);
        assert_eq!(savings_percent(1000, 1200), -20.0);
        assert_eq!(savings_percent(1000, 1000), 0.0);
        assert_eq!(savings_percent(0, 500), 0.0);
        assert_eq!(savings_percent(3, 2), 33.33);
        assert_eq!(savings_percent(3000, 1000), 66.67);
    }

    #[test]
    fn test_kb_conversions() {
        assert_eq!(kb_to_bytes(100), 102_400);
        assert_eq!(kb_to_bytes(u64::MAX), u64::MAX);
        assert_eq!(bytes_to_kb(1536), 1.5);
    }

    #[test]
    fn test_hidden_spinner() {
        let pb = create_progress_spinner("uploading", false);
        assert!(pb.is_hidden());
        pb.finish_and_clear();
    }
}
