use crate::constants::KRAKEN_UPLOAD_URL;
use crate::error::{Result, SqueezeError};
use crate::processing::SourceImage;
use crate::remote::{build_http_client, http_error, Credentials, RemoteService};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "Kraken";

#[derive(Debug, Serialize)]
struct UploadAuth<'a> {
    api_key: &'a str,
    api_secret: &'a str,
}

#[derive(Debug, Serialize)]
struct UploadData<'a> {
    auth: UploadAuth<'a>,
    wait: bool,
    lossy: bool,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    kraked_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the Kraken.io `upload` API in synchronous (`wait`) mode.
pub struct Kraken {
    client: reqwest::Client,
    api_key: String,
    api_secret: String,
    upload_url: String,
}

impl Kraken {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        Self::with_endpoint(credentials, KRAKEN_UPLOAD_URL)
    }

    pub fn with_endpoint(credentials: &Credentials, upload_url: &str) -> Result<Self> {
        let api_secret = credentials.require_secret(SERVICE)?.to_string();

        Ok(Self {
            client: build_http_client(SERVICE)?,
            api_key: credentials.key.clone(),
            api_secret,
            upload_url: upload_url.to_string(),
        })
    }

    fn upload_data(&self) -> Result<String> {
        let data = UploadData {
            auth: UploadAuth {
                api_key: &self.api_key,
                api_secret: &self.api_secret,
            },
            wait: true,
            lossy: true,
        };
        Ok(serde_json::to_string(&data)?)
    }

    fn upload_form(&self, source: &SourceImage) -> Result<Form> {
        let file = Part::bytes(source.bytes.clone())
            .file_name(source.file_name())
            .mime_str(source.format.mime_type())
            .map_err(http_error(SERVICE))?;

        Ok(Form::new()
            .text("data", self.upload_data()?)
            .part("file", file))
    }
}

#[async_trait]
impl RemoteService for Kraken {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn shrink(&self, source: &SourceImage) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(&self.upload_url)
            .multipart(self.upload_form(source)?)
            .send()
            .await
            .map_err(http_error(SERVICE))?;

        let status = response.status();
        let body = response.bytes().await.map_err(http_error(SERVICE))?;
        let parsed: UploadResponse = serde_json::from_slice(&body).map_err(|_| {
            SqueezeError::RemoteService {
                service: SERVICE,
                message: format!("unexpected response (HTTP {})", status),
            }
        })?;

        let kraked_url = match parsed {
            UploadResponse {
                success: true,
                kraked_url: Some(url),
                ..
            } => url,
            UploadResponse { message, .. } => {
                return Err(SqueezeError::RemoteService {
                    service: SERVICE,
                    message: message.unwrap_or_else(|| format!("upload failed (HTTP {})", status)),
                })
            }
        };

        let optimized = self
            .client
            .get(&kraked_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http_error(SERVICE))?
            .bytes()
            .await
            .map_err(http_error(SERVICE))?;

        Ok(optimized.to_vec())
    }
}
