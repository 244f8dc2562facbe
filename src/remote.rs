//! Shared plumbing for cloud optimization services.
//!
//! Each service implements [`RemoteService`]; [`RemoteBackend`] drives it from
//! the synchronous batch loop through one tokio runtime built at startup.

use crate::constants::{REMOTE_TIMEOUT_SECS, USER_AGENT};
use crate::error::{Result, SqueezeError};
use crate::processing::{CompressionBackend, NoImprovementPolicy, SourceImage};
use crate::utils::{create_progress_spinner, format_file_size};
use async_trait::async_trait;
use std::time::Duration;

/// API credentials parsed once from `key` or `key:secret`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"<redacted>")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn parse(service: &'static str, raw: &str) -> Result<Self> {
        let invalid = |reason: &str| SqueezeError::InvalidCredentials {
            service,
            reason: reason.to_string(),
        };

        let raw = raw.trim();
        let (key, secret) = match raw.split_once(':') {
            Some((key, secret)) => (key.trim(), Some(secret.trim())),
            None => (raw, None),
        };

        if key.is_empty() {
            return Err(invalid("API key is empty"));
        }
        if secret.is_some_and(str::is_empty) {
            return Err(invalid("API secret is empty"));
        }

        Ok(Self {
            key: key.to_string(),
            secret: secret.map(str::to_string),
        })
    }

    /// The secret, or an error naming the service that needs one.
    pub fn require_secret(&self, service: &'static str) -> Result<&str> {
        self.secret
            .as_deref()
            .ok_or_else(|| SqueezeError::InvalidCredentials {
                service,
                reason: "expected KEY:SECRET".to_string(),
            })
    }
}

/// A cloud API that turns source bytes into optimized bytes.
#[async_trait]
pub trait RemoteService: Send + Sync {
    fn name(&self) -> &'static str;

    /// Uploads the source and downloads the optimized result.
    async fn shrink(&self, source: &SourceImage) -> Result<Vec<u8>>;
}

/// HTTP client shared by the service implementations.
pub fn build_http_client(service: &'static str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
        .build()
        .map_err(|source| SqueezeError::Http { service, source })
}

/// Maps a transport error onto the service that raised it.
pub fn http_error(service: &'static str) -> impl Fn(reqwest::Error) -> SqueezeError {
    move |source| SqueezeError::Http { service, source }
}

/// Backend that delegates optimization to a [`RemoteService`].
///
/// Results that are not smaller than the source fall back to a verbatim
/// copy, so every candidate gets an output file.
pub struct RemoteBackend {
    service: Box<dyn RemoteService>,
    runtime: tokio::runtime::Runtime,
    show_progress: bool,
}

impl RemoteBackend {
    pub fn new(service: Box<dyn RemoteService>, show_progress: bool) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        Ok(Self {
            service,
            runtime,
            show_progress,
        })
    }
}

impl CompressionBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        self.service.name()
    }

    fn no_improvement_policy(&self) -> NoImprovementPolicy {
        NoImprovementPolicy::CopySource
    }

    fn optimize_bytes(&self, source: &SourceImage) -> Result<Vec<u8>> {
        let pb = create_progress_spinner(
            &format!(
                "Uploading {} ({}) to {}...",
                source.file_name(),
                format_file_size(source.len()),
                self.service.name()
            ),
            self.show_progress && !crate::logger::is_quiet(),
        );

        let result = self.runtime.block_on(self.service.shrink(source));
        pb.finish_and_clear();
        result
    }
}
