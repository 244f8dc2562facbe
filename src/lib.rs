pub mod batch;
pub mod cli;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod exif;
pub mod formats;
pub mod kraken;
pub mod local;
pub mod logger;
pub mod output;
pub mod processing;
pub mod remote;
pub mod tinypng;
pub mod utils;
pub mod validation;

pub use batch::{run, RunConfig, RunStatistics};
pub use cli::{Backend, BackendChoice};
pub use discovery::ImageDiscoverer;
pub use error::{Result, SqueezeError};
pub use formats::{is_supported_image, SupportedFormat};
pub use local::LocalReencoder;
pub use output::OutputMapper;
pub use processing::{
    CompressionBackend, NoImprovementPolicy, OptimizationOutcome, ProcessingTask, SkipReason,
    SourceImage,
};
pub use remote::{Credentials, RemoteBackend, RemoteService};
pub use validation::{resolve_roots, ResolvedRoots};
