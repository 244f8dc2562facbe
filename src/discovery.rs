use crate::formats::is_supported_image;
use crate::warn;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, FilterEntry, WalkDir};

type EntryFilter = Box<dyn FnMut(&DirEntry) -> bool + Send>;

/// Lazily walks a source root and yields candidate image files.
///
/// Only regular files with a supported extension are produced. Symlinks are
/// not followed, so a link is never reported as a file. The walk is consumed
/// by iterating; there is one traversal per discoverer.
pub struct ImageDiscoverer {
    walker: FilterEntry<walkdir::IntoIter, EntryFilter>,
}

impl ImageDiscoverer {
    pub fn new(source_root: &Path, recursive: bool) -> Self {
        Self::with_excluded(source_root, recursive, None)
    }

    /// Like [`ImageDiscoverer::new`], but never descends into `excluded`.
    ///
    /// Used when the destination root sits inside the source root, so files
    /// written during the run are not picked up again.
    pub fn with_excluded(source_root: &Path, recursive: bool, excluded: Option<PathBuf>) -> Self {
        let walk = if recursive {
            WalkDir::new(source_root)
        } else {
            WalkDir::new(source_root).max_depth(1)
        };

        let predicate: EntryFilter = Box::new(move |entry: &DirEntry| match &excluded {
            Some(excluded) => !(entry.file_type().is_dir() && entry.path() == excluded.as_path()),
            None => true,
        });

        Self {
            walker: walk.follow_links(false).into_iter().filter_entry(predicate),
        }
    }
}

impl Iterator for ImageDiscoverer {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_file() && is_supported_image(entry.path()) {
                return Some(entry.into_path());
            }
        }
    }
}
