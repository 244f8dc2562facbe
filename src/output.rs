use crate::error::{Result, SqueezeError};
use std::fs;
use std::path::{Path, PathBuf};

/// Maps discovered source files onto the mirrored destination tree.
///
/// The relative directory under the source root is replicated under the
/// destination root and the file name is lowercased (`a/Photo.JPG` becomes
/// `a/photo.jpg`). Missing destination directories are created on demand.
#[derive(Debug, Clone)]
pub struct OutputMapper {
    source_root: PathBuf,
    destination_root: PathBuf,
}

impl OutputMapper {
    pub fn new(source_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
        }
    }

    /// Computes the destination path without touching the filesystem.
    pub fn destination_for(&self, source_path: &Path) -> Result<PathBuf> {
        let relative = source_path
            .strip_prefix(&self.source_root)
            .map_err(|_| SqueezeError::OutsideSourceRoot {
                path: source_path.to_path_buf(),
                root: self.source_root.clone(),
            })?;

        let file_name = relative
            .file_name()
            .ok_or_else(|| SqueezeError::UnsupportedFormat("Invalid file name".to_string()))?;

        let mut destination = self.destination_root.clone();
        if let Some(parent) = relative.parent() {
            destination.push(parent);
        }
        destination.push(file_name.to_string_lossy().to_lowercase());
        Ok(destination)
    }

    /// Computes the destination path and creates its parent directories.
    ///
    /// Directory creation is idempotent and safe to race with other workers.
    pub fn map(&self, source_path: &Path) -> Result<PathBuf> {
        let destination = self.destination_for(source_path)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|_| SqueezeError::DirectoryCreationFailed(parent.to_path_buf()))?;
        }
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_destination_mirrors_relative_directory() {
        let mapper = OutputMapper::new("/photos", "/backup/optimized");

        let result = mapper
            .destination_for(Path::new("/photos/2020/summer/IMG_0001.JPG"))
            .unwrap();
        assert_eq!(
            result,
            PathBuf::from("/backup/optimized/2020/summer/img_0001.jpg")
        );
    }

    #[test]
    fn test_destination_for_top_level_file() {
        let mapper = OutputMapper::new("/photos", "/out");

        let result = mapper.destination_for(Path::new("/photos/Cover.PNG")).unwrap();
        assert_eq!(result, PathBuf::from("/out/cover.png"));
    }

    #[test]
    fn test_directory_names_keep_their_case() {
        let mapper = OutputMapper::new("/photos", "/out");

        let result = mapper
            .destination_for(Path::new("/photos/Trips/ITALY/Rome.jpg"))
            .unwrap();
        assert_eq!(result, PathBuf::from("/out/Trips/ITALY/rome.jpg"));
    }

    #[test]
    fn test_path_outside_source_root_is_rejected() {
        let mapper = OutputMapper::new("/photos", "/out");

        let result = mapper.destination_for(Path::new("/elsewhere/a.jpg"));
        assert!(matches!(
            result,
            Err(SqueezeError::OutsideSourceRoot { .. })
        ));
    }

    #[test]
    fn test_prefix_match_is_component_wise() {
        // `/photos-old` shares a string prefix with `/photos` but is not under it
        let mapper = OutputMapper::new("/photos", "/out");

        assert!(mapper
            .destination_for(Path::new("/photos-old/a.jpg"))
            .is_err());
    }

    #[test]
    fn test_map_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dst");
        let mapper = OutputMapper::new(&source, &dest);

        let result = mapper.map(&source.join("b/c/IMG.png")).unwrap();

        assert_eq!(result, dest.join("b/c/img.png"));
        assert!(dest.join("b/c").is_dir());
        assert!(!result.exists());

        // second call is a no-op for the directories
        assert_eq!(mapper.map(&source.join("b/c/IMG.png")).unwrap(), result);
    }
}
