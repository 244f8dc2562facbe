use crate::constants::{
    DEFAULT_QUALITY, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, MAX_QUALITY, MIN_QUALITY,
    OXIPNG_PRESET, ZOPFLI_ITERATIONS,
};
use crate::error::{Result, SqueezeError};
use crate::formats::SupportedFormat;
use crate::processing::{CompressionBackend, NoImprovementPolicy, SourceImage};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use oxipng::{Deflaters, Options};
use std::num::NonZeroU8;

/// In-process re-encoder: JPEG through the `image` encoder at a quality
/// setting, PNG losslessly through oxipng. Never touches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalReencoder {
    quality: u8,
}

impl Default for LocalReencoder {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
        }
    }
}

impl LocalReencoder {
    pub fn new(quality: Option<u8>) -> Result<Self> {
        let quality = quality.unwrap_or(DEFAULT_QUALITY);
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(SqueezeError::InvalidQuality(quality));
        }
        Ok(Self { quality })
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    fn reencode_jpeg(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
        // the baseline encoder takes gray or RGB only
        let img = match img {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        };

        let mut out = Vec::with_capacity(bytes.len());
        // the encoder's lowest setting is 1
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality.max(1));
        img.write_with_encoder(encoder)?;
        Ok(out)
    }

    fn recompress_png(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut options = Options::from_preset(OXIPNG_PRESET);
        options.deflate = self.png_deflater();

        oxipng::optimize_from_memory(bytes, &options)
            .map_err(|e| SqueezeError::PngOptimization(e.to_string()))
    }

    fn png_deflater(&self) -> Deflaters {
        match NonZeroU8::new(ZOPFLI_ITERATIONS) {
            Some(iterations) if self.quality >= 90 => Deflaters::Zopfli { iterations },
            _ if self.quality >= 70 => Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            },
            _ => Deflaters::Libdeflater {
                compression: LIBDEFLATER_LOW_LEVEL,
            },
        }
    }
}

impl CompressionBackend for LocalReencoder {
    fn name(&self) -> &'static str {
        "local re-encode"
    }

    fn no_improvement_policy(&self) -> NoImprovementPolicy {
        NoImprovementPolicy::Skip
    }

    fn optimize_bytes(&self, source: &SourceImage) -> Result<Vec<u8>> {
        match source.format {
            SupportedFormat::Jpeg => self.reencode_jpeg(&source.bytes),
            SupportedFormat::Png => self.recompress_png(&source.bytes),
        }
    }
}
