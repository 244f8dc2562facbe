use crate::constants::{TINYPNG_AUTH_USER, TINYPNG_SHRINK_URL};
use crate::error::{Result, SqueezeError};
use crate::processing::SourceImage;
use crate::remote::{build_http_client, http_error, Credentials, RemoteService};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

const SERVICE: &str = "TinyPNG";

#[derive(Debug, Deserialize)]
struct ShrinkResponse {
    output: ShrinkOutput,
}

#[derive(Debug, Deserialize)]
struct ShrinkOutput {
    url: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
    message: String,
}

/// Client for the TinyPNG / TinyJPG `shrink` API.
///
/// The source is posted as the raw request body; the response names a
/// download URL for the compressed file.
pub struct TinyPng {
    client: reqwest::Client,
    api_key: String,
    shrink_url: String,
}

impl TinyPng {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        Self::with_endpoint(credentials, TINYPNG_SHRINK_URL)
    }

    pub fn with_endpoint(credentials: &Credentials, shrink_url: &str) -> Result<Self> {
        if credentials.secret.is_some() {
            return Err(SqueezeError::InvalidCredentials {
                service: SERVICE,
                reason: "expected a single API key".to_string(),
            });
        }

        Ok(Self {
            client: build_http_client(SERVICE)?,
            api_key: credentials.key.clone(),
            shrink_url: shrink_url.to_string(),
        })
    }
}

#[async_trait]
impl RemoteService for TinyPng {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn shrink(&self, source: &SourceImage) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.shrink_url)
            .basic_auth(TINYPNG_AUTH_USER, Some(&self.api_key))
            .body(source.bytes.clone())
            .send()
            .await
            .map_err(http_error(SERVICE))?;

        let status = response.status();
        let body = response.bytes().await.map_err(http_error(SERVICE))?;
        if !status.is_success() {
            return Err(describe_failure(status, &body));
        }

        let shrink: ShrinkResponse = serde_json::from_slice(&body)?;

        let optimized = self
            .client
            .get(&shrink.output.url)
            .basic_auth(TINYPNG_AUTH_USER, Some(&self.api_key))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_error(SERVICE))?
            .bytes()
            .await
            .map_err(http_error(SERVICE))?;

        if let Some(expected) = shrink.output.size {
            if expected != optimized.len() as u64 {
                return Err(SqueezeError::RemoteService {
                    service: SERVICE,
                    message: format!(
                        "download truncated: expected {} bytes, got {}",
                        expected,
                        optimized.len()
                    ),
                });
            }
        }

        Ok(optimized.to_vec())
    }
}

fn describe_failure(status: StatusCode, body: &[u8]) -> SqueezeError {
    let message = match serde_json::from_slice::<ApiError>(body) {
        Ok(api) => format!("{} ({}): {}", api.error, status.as_u16(), api.message),
        Err(_) => format!("HTTP {}", status),
    };
    SqueezeError::RemoteService {
        service: SERVICE,
        message,
    }
}
