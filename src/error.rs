use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqueezeError {
    #[error("Input directory is same as output directory: {0}")]
    SamePath(PathBuf),

    #[error("No such directory or not {access}: {path}")]
    InaccessiblePath { path: PathBuf, access: &'static str },

    #[error("Invalid credentials for {service}: {reason}")]
    InvalidCredentials {
        service: &'static str,
        reason: String,
    },

    #[error("Invalid quality value: {0}. Must be between 0 and 100")]
    InvalidQuality(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Path {path} is not under source root {root}")]
    OutsideSourceRoot { path: PathBuf, root: PathBuf },

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} rejected the image: {message}")]
    RemoteService {
        service: &'static str,
        message: String,
    },

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl SqueezeError {
    /// Errors that abort the whole run before or during traversal.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SqueezeError::SamePath(_)
                | SqueezeError::InaccessiblePath { .. }
                | SqueezeError::InvalidCredentials { .. }
                | SqueezeError::InvalidQuality(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SqueezeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(SqueezeError::SamePath(PathBuf::from("/tmp")).is_config_error());
        assert!(SqueezeError::InaccessiblePath {
            path: PathBuf::from("/nope"),
            access: "readable",
        }
        .is_config_error());
        assert!(SqueezeError::InvalidQuality(120).is_config_error());
    }

    #[test]
    fn test_per_file_errors_are_not_fatal() {
        let io = SqueezeError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(!io.is_config_error());

        let remote = SqueezeError::RemoteService {
            service: "TinyPNG",
            message: "Unauthorized".to_string(),
        };
        assert!(!remote.is_config_error());
    }

    #[test]
    fn test_inaccessible_path_message() {
        let err = SqueezeError::InaccessiblePath {
            path: PathBuf::from("/srv/out"),
            access: "writable",
        };
        assert_eq!(
            err.to_string(),
            "No such directory or not writable: /srv/out"
        );
    }
}
