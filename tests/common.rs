#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageEncoder, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Deterministic noise; compresses poorly, so a max-quality JPEG of it is large.
pub fn noise_image(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_f491;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        };
        Rgb([next(), next(), next()])
    })
}

/// Writes a quality-100 JPEG of at least `min_kb` kilobytes.
pub fn write_large_jpeg(path: &Path, min_kb: u64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut side = 256;
    loop {
        let img = noise_image(side, side);
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, 100)
            .write_image(img.as_raw(), side, side, image::ExtendedColorType::Rgb8)
            .unwrap();
        if bytes.len() as u64 >= min_kb * 1024 {
            fs::write(path, bytes).unwrap();
            return;
        }
        side *= 2;
    }
}

/// Writes a valid PNG padded with trailing zeros up to exactly `len` bytes.
pub fn write_padded_png(path: &Path, len: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    assert!(bytes.len() <= len);
    bytes.resize(len, 0);
    fs::write(path, bytes).unwrap();
}

/// `a/photo.JPG` (large JPEG) and `b/c/img.png` (10 KB) plus a text file.
pub fn create_scenario_tree(root: &Path) {
    write_large_jpeg(&root.join("a/photo.JPG"), 150);
    write_padded_png(&root.join("b/c/img.png"), 10 * 1024);
    fs::write(root.join("readme.txt"), b"not an image").unwrap();
}
