use crate::batch::RunConfig;
use crate::constants::{DEFAULT_JOBS, DEFAULT_MIN_SIZE_KB, DEFAULT_QUALITY};
use crate::error::Result;
use crate::kraken::Kraken;
use crate::local::LocalReencoder;
use crate::processing::{CompressionBackend, NoImprovementPolicy, SourceImage};
use crate::remote::{Credentials, RemoteBackend};
use crate::tinypng::TinyPng;
use clap::Parser;
use std::ffi::OsString;

#[derive(Parser, Debug)]
#[command(
    name = "dir-squeeze",
    version,
    about = "Recursively optimize JPEG and PNG images into a mirrored directory tree",
    long_about = "dir-squeeze walks a source directory, optimizes every JPEG and PNG it finds \
                  and writes the result to the same relative location under the destination \
                  directory. Files are re-encoded locally by default, or sent to TinyPNG or \
                  Kraken.io when an API key is given. Existing outputs are never overwritten, \
                  so an interrupted run can simply be restarted.",
    after_help = "EXAMPLES:\n  \
    dir-squeeze ./photos ./photos-small -m 200 -q 80\n  \
    dir-squeeze ./photos ./photos-small -t <TINYPNG_KEY>\n  \
    dir-squeeze ./photos ./photos-small -k <KEY>:<SECRET> -nr"
)]
pub struct Args {
    #[arg(help = "Source directory to read images from")]
    pub source: String,

    #[arg(help = "Destination directory for the optimized tree")]
    pub destination: String,

    #[arg(
        short = 'm',
        long,
        default_value_t = DEFAULT_MIN_SIZE_KB,
        help = "Only optimize files of at least this many KB",
        long_help = "Minimum file size in kilobytes (1 KB = 1024 bytes). \
                     Smaller files are skipped and produce no output."
    )]
    pub minsize: u64,

    #[arg(
        short = 'q',
        long,
        value_parser = clap::value_parser!(u8).range(0..=100),
        conflicts_with_all = ["tinypng", "kraken"],
        help = "Local re-encode quality (0-100, default: 90)",
        long_help = "JPEG quality for the local backend, from 0 (smallest) to 100 (best). \
                     PNG files are recompressed losslessly: >=90 uses Zopfli, >=70 uses \
                     high compression, lower values use standard compression."
    )]
    pub quality: Option<u8>,

    #[arg(
        short = 't',
        long,
        value_name = "KEY",
        conflicts_with = "kraken",
        help = "Optimize through TinyPNG with this API key"
    )]
    pub tinypng: Option<String>,

    #[arg(
        short = 'k',
        long,
        value_name = "KEY:SECRET",
        help = "Optimize through Kraken.io with this API key and secret"
    )]
    pub kraken: Option<String>,

    #[arg(
        long = "no-recursion",
        help = "Only process the top level of the source (alias: -nr)"
    )]
    pub no_recursion: bool,

    #[arg(short = 'v', long, help = "Print arguments and per-file skip details")]
    pub verbose: bool,

    #[arg(long, help = "Only print errors")]
    pub quiet: bool,

    #[arg(
        short = 'j',
        long,
        default_value_t = DEFAULT_JOBS,
        help = "Number of files processed in parallel (0 = all CPUs)",
        long_help = "Number of worker threads. The default of 1 processes files strictly \
                     one after another; 0 uses one worker per CPU core."
    )]
    pub jobs: usize,
}

/// Rewrites the two-letter `-nr` flag, which clap cannot express as a short.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "-nr" {
                OsString::from("--no-recursion")
            } else {
                arg
            }
        })
        .collect()
}

/// Which backend the run uses, decided once from the flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice {
    Local { quality: u8 },
    TinyPng(Credentials),
    Kraken(Credentials),
}

impl BackendChoice {
    pub fn build(&self, show_progress: bool) -> Result<Backend> {
        let backend = match self {
            BackendChoice::Local { quality } => {
                Backend::Local(LocalReencoder::new(Some(*quality))?)
            }
            BackendChoice::TinyPng(credentials) => Backend::Remote(RemoteBackend::new(
                Box::new(TinyPng::new(credentials)?),
                show_progress,
            )?),
            BackendChoice::Kraken(credentials) => Backend::Remote(RemoteBackend::new(
                Box::new(Kraken::new(credentials)?),
                show_progress,
            )?),
        };
        Ok(backend)
    }
}

/// The strategy handed to the orchestrator.
pub enum Backend {
    Local(LocalReencoder),
    Remote(RemoteBackend),
}

impl Backend {
    fn inner(&self) -> &dyn CompressionBackend {
        match self {
            Backend::Local(local) => local,
            Backend::Remote(remote) => remote,
        }
    }
}

impl CompressionBackend for Backend {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn no_improvement_policy(&self) -> NoImprovementPolicy {
        self.inner().no_improvement_policy()
    }

    fn optimize_bytes(&self, source: &SourceImage) -> Result<Vec<u8>> {
        self.inner().optimize_bytes(source)
    }
}

impl Args {
    pub fn into_config(self) -> Result<(RunConfig, BackendChoice)> {
        let choice = match (self.tinypng, self.kraken) {
            (Some(raw), _) => BackendChoice::TinyPng(Credentials::parse("TinyPNG", &raw)?),
            (None, Some(raw)) => {
                let credentials = Credentials::parse("Kraken", &raw)?;
                credentials.require_secret("Kraken")?;
                BackendChoice::Kraken(credentials)
            }
            (None, None) => BackendChoice::Local {
                quality: LocalReencoder::new(self.quality)?.quality(),
            },
        };

        let jobs = match self.jobs {
            0 => num_cpus::get(),
            n => n,
        };

        let config = RunConfig {
            source: self.source,
            destination: self.destination,
            recursive: !self.no_recursion,
            min_size_kb: self.minsize,
            jobs,
        };

        Ok((config, choice))
    }
}

impl Default for BackendChoice {
    fn default() -> Self {
        BackendChoice::Local {
            quality: DEFAULT_QUALITY,
        }
    }
}
