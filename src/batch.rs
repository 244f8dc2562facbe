use crate::constants::{COPY_PREFIX, SKIP_PREFIX, SUCCESS_PREFIX, SUMMARY_PREFIX};
use crate::discovery::ImageDiscoverer;
use crate::error::Result;
use crate::output::OutputMapper;
use crate::processing::{CompressionBackend, OptimizationOutcome, ProcessingTask};
use crate::utils::{bytes_to_kb, format_file_size};
use crate::validation::resolve_roots;
use crate::{error, info, verbose};
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};

/// Everything the orchestrator needs besides the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source: String,
    pub destination: String,
    pub recursive: bool,
    pub min_size_kb: u64,
    pub jobs: usize,
}

/// Totals for one run. Only strictly positive savings move
/// `files_processed` and `total_bytes_saved`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub files_processed: u64,
    pub total_bytes_saved: u64,
    pub skipped: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

impl RunStatistics {
    pub fn record(&mut self, outcome: &OptimizationOutcome) {
        match outcome {
            OptimizationOutcome::Failed { .. } => self.failed += 1,
            OptimizationOutcome::Skipped(_) => self.skipped += 1,
            OptimizationOutcome::Saved { .. } => {
                if let Some(saved) = outcome.counted_savings() {
                    self.files_processed += 1;
                    self.total_bytes_saved += saved;
                }
            }
        }
    }

    pub fn merge(mut self, other: RunStatistics) -> RunStatistics {
        self.files_processed += other.files_processed;
        self.total_bytes_saved += other.total_bytes_saved;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self
    }

    pub fn total_kb_saved(&self) -> f64 {
        bytes_to_kb(self.total_bytes_saved)
    }

    /// The closing line, or `None` when nothing was saved.
    pub fn summary(&self) -> Option<String> {
        (self.total_bytes_saved > 0).then(|| {
            format!(
                "{} files processed in {:.2} s saving {:.2} KB",
                self.files_processed,
                self.elapsed.as_secs_f64(),
                self.total_kb_saved()
            )
        })
    }
}

/// Mirrors the source tree into the destination through `backend`.
///
/// Fails only on configuration errors; per-file problems are reported and
/// counted as they happen.
pub fn run<B>(config: &RunConfig, backend: &B) -> Result<RunStatistics>
where
    B: CompressionBackend + ?Sized,
{
    let start_time = Instant::now();

    let roots = resolve_roots(&config.source, &config.destination)?;
    verbose!("Source root: {}", roots.source.display());
    verbose!("Destination root: {}", roots.destination.display());
    verbose!("Backend: {}", backend.name());

    let discoverer =
        ImageDiscoverer::with_excluded(&roots.source, config.recursive, roots.nested_destination());
    let mapper = OutputMapper::new(&roots.source, &roots.destination);

    let mut stats = if config.jobs > 1 {
        verbose!("Using {} parallel workers", config.jobs);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()?;

        pool.install(|| {
            discoverer
                .par_bridge()
                .try_fold(
                    RunStatistics::default,
                    |mut stats, path| -> Result<RunStatistics> {
                        let outcome = process_file(&path, &mapper, config.min_size_kb, backend)?;
                        stats.record(&outcome);
                        Ok(stats)
                    },
                )
                .try_reduce(RunStatistics::default, |a, b| Ok(a.merge(b)))
        })?
    } else {
        let mut stats = RunStatistics::default();
        for path in discoverer {
            let outcome = process_file(&path, &mapper, config.min_size_kb, backend)?;
            stats.record(&outcome);
        }
        stats
    };

    stats.elapsed = start_time.elapsed();

    verbose!(
        "{} saved, {} skipped, {} failed",
        stats.files_processed,
        stats.skipped,
        stats.failed
    );
    if let Some(summary) = stats.summary() {
        info!("{} {}", SUMMARY_PREFIX, summary);
    }

    Ok(stats)
}

fn process_file<B>(
    source_path: &Path,
    mapper: &OutputMapper,
    min_size_kb: u64,
    backend: &B,
) -> Result<OptimizationOutcome>
where
    B: CompressionBackend + ?Sized,
{
    let destination_path = match mapper.map(source_path) {
        Ok(path) => path,
        Err(e) => {
            let outcome = OptimizationOutcome::Failed {
                cause: e.to_string(),
            };
            report(source_path, &outcome);
            return Ok(outcome);
        }
    };

    info!(
        "From {} to {}",
        source_path.display(),
        destination_path.display()
    );

    let task = ProcessingTask::new(source_path.to_path_buf(), destination_path, min_size_kb);
    let outcome = backend.optimize(&task)?;
    report(source_path, &outcome);
    Ok(outcome)
}

fn report(source_path: &Path, outcome: &OptimizationOutcome) {
    let line = describe_outcome(source_path, outcome);
    match outcome {
        OptimizationOutcome::Failed { .. } => error!("{}", line),
        _ => info!("{}", line),
    }
}

/// One report line per outcome, always naming the source file.
fn describe_outcome(source_path: &Path, outcome: &OptimizationOutcome) -> String {
    match outcome {
        OptimizationOutcome::Saved {
            bytes_saved,
            percent,
        } if *bytes_saved > 0 => format!(
            "{} {}: saved {} ({:.2}%)",
            SUCCESS_PREFIX,
            source_path.display(),
            format_file_size(*bytes_saved as u64),
            percent
        ),
        OptimizationOutcome::Saved {
            bytes_saved,
            percent,
        } => format!(
            "{} {}: saved {} B or {:.2}%, copied original",
            COPY_PREFIX,
            source_path.display(),
            bytes_saved,
            percent
        ),
        OptimizationOutcome::Skipped(reason) => {
            format!("{} Skipped {}: {}", SKIP_PREFIX, source_path.display(), reason)
        }
        OptimizationOutcome::Failed { cause } => {
            format!("Failed to process {}: {}", source_path.display(), cause)
        }
    }
}
