use crate::error::{Result, SqueezeError};
use crate::exif::{read_exif, splice_exif, ExifBlock};
use crate::formats::SupportedFormat;
use crate::utils::{kb_to_bytes, savings_percent};
use crate::{verbose, warn};
use image::ImageReader;
use std::fmt;
use std::fs::{self, File, FileTimes};
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One discovered file paired with where its optimized copy goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingTask {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub min_size_bytes: u64,
}

impl ProcessingTask {
    pub fn new(source_path: PathBuf, destination_path: PathBuf, min_size_kb: u64) -> Self {
        Self {
            source_path,
            destination_path,
            min_size_bytes: kb_to_bytes(min_size_kb),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OutputExists,
    BelowMinimumSize,
    NoImprovement,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::OutputExists => "output exists",
            SkipReason::BelowMinimumSize => "below minimum size",
            SkipReason::NoImprovement => "no improvement",
        };
        write!(f, "{}", reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationOutcome {
    Skipped(SkipReason),
    /// `bytes_saved` is negative or zero when a remote backend fell back to
    /// copying the original.
    Saved { bytes_saved: i64, percent: f64 },
    Failed { cause: String },
}

impl OptimizationOutcome {
    /// Bytes that count toward run totals; only strictly positive savings do.
    pub fn counted_savings(&self) -> Option<u64> {
        match self {
            OptimizationOutcome::Saved { bytes_saved, .. } if *bytes_saved > 0 => {
                Some(*bytes_saved as u64)
            }
            _ => None,
        }
    }
}

/// What a backend does when its result is not smaller than the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoImprovementPolicy {
    /// Write nothing and report the file as skipped.
    Skip,
    /// Copy the source verbatim so the mirror is complete.
    CopySource,
}

/// A source file read into memory, validated and with its EXIF captured.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub format: SupportedFormat,
    pub dimensions: (u32, u32),
    pub exif: Option<ExifBlock>,
}

impl SourceImage {
    /// Reads and sniffs the file. Content decides the format, not the name.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;

        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let format = reader
            .format()
            .and_then(SupportedFormat::from_image_format)
            .ok_or_else(|| {
                SqueezeError::UnsupportedFormat(format!("{} is not a JPEG or PNG", path.display()))
            })?;
        let dimensions = reader.into_dimensions()?;

        let exif = match format {
            SupportedFormat::Jpeg => match read_exif(&bytes) {
                Ok(Some(exif)) => Some(exif),
                Ok(None) => {
                    warn!("No EXIF data in {}, continuing without it", path.display());
                    None
                }
                Err(e) => {
                    warn!("Unreadable EXIF in {}: {}", path.display(), e);
                    None
                }
            },
            SupportedFormat::Png => None,
        };

        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            format,
            dimensions,
            exif,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One interchangeable optimization strategy.
///
/// Implementors only provide the variant-specific step; the skip, accept
/// and fallback decisions are shared by [`CompressionBackend::optimize`].
pub trait CompressionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn no_improvement_policy(&self) -> NoImprovementPolicy;

    /// Produces the optimized encoding of `source`.
    fn optimize_bytes(&self, source: &SourceImage) -> Result<Vec<u8>>;

    /// Runs the full decision policy for one task.
    ///
    /// `Err` is reserved for fatal configuration errors; every per-file
    /// problem comes back as [`OptimizationOutcome::Failed`].
    fn optimize(&self, task: &ProcessingTask) -> Result<OptimizationOutcome> {
        if task.source_path == task.destination_path {
            return Err(SqueezeError::SamePath(task.source_path.clone()));
        }
        if task.destination_path.exists() {
            return Ok(OptimizationOutcome::Skipped(SkipReason::OutputExists));
        }

        Ok(optimize_file(self, task).unwrap_or_else(|e| OptimizationOutcome::Failed {
            cause: e.to_string(),
        }))
    }
}

fn optimize_file<B: CompressionBackend + ?Sized>(
    backend: &B,
    task: &ProcessingTask,
) -> Result<OptimizationOutcome> {
    let original_size = fs::metadata(&task.source_path)?.len();
    if original_size < task.min_size_bytes {
        return Ok(OptimizationOutcome::Skipped(SkipReason::BelowMinimumSize));
    }

    let source = SourceImage::load(&task.source_path)?;
    verbose!(
        "{} {}x{} {} via {}",
        source.format,
        source.dimensions.0,
        source.dimensions.1,
        task.source_path.display(),
        backend.name()
    );

    let optimized = backend.optimize_bytes(&source)?;
    let optimized = reattach_exif(&source, optimized);

    let original_size = source.len();
    let optimized_size = optimized.len() as u64;
    let bytes_saved = original_size as i64 - optimized_size as i64;
    let percent = savings_percent(original_size, optimized_size);

    if bytes_saved > 0 {
        write_atomically(&task.destination_path, &optimized)?;
        return Ok(OptimizationOutcome::Saved {
            bytes_saved,
            percent,
        });
    }

    match backend.no_improvement_policy() {
        NoImprovementPolicy::Skip => Ok(OptimizationOutcome::Skipped(SkipReason::NoImprovement)),
        NoImprovementPolicy::CopySource => {
            copy_preserving_metadata(&task.source_path, &task.destination_path)?;
            Ok(OptimizationOutcome::Saved {
                bytes_saved,
                percent,
            })
        }
    }
}

/// Puts the captured EXIF block back into a JPEG result that lost it.
fn reattach_exif(source: &SourceImage, optimized: Vec<u8>) -> Vec<u8> {
    match &source.exif {
        Some(exif) => splice_exif(&optimized, exif).unwrap_or(optimized),
        None => optimized,
    }
}

/// Writes `bytes` to `destination` through a temp file in the same directory.
///
/// The rename refuses to replace an existing file, so a destination is
/// written at most once and a failed write leaves nothing behind.
pub fn write_atomically(destination: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp = new_sibling_temp(destination)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(destination).map_err(|e| e.error)?;
    Ok(())
}

/// Copies `source` to `destination` byte for byte, keeping permissions and
/// access/modification times.
pub fn copy_preserving_metadata(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::metadata(source)?;
    let mut temp = new_sibling_temp(destination)?;

    io::copy(&mut File::open(source)?, temp.as_file_mut())?;
    temp.as_file().set_permissions(metadata.permissions())?;

    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    temp.as_file().set_times(times)?;

    temp.persist_noclobber(destination).map_err(|e| e.error)?;
    Ok(())
}

fn new_sibling_temp(destination: &Path) -> Result<NamedTempFile> {
    let parent = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(tempfile::Builder::new()
        .prefix(".dir-squeeze-")
        .suffix(".part")
        .tempfile_in(parent)?)
}
