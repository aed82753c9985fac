/// Resolution of a user-supplied path into the station files to ingest
use std::fs::{self, ReadDir};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::reporter::IngestReporter;

#[derive(Debug, thiserror::Error)]
pub enum PathResolveError {
    #[error("provided path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to list directory {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Lazily yields the files named by one input path.
///
/// A file path yields itself. A directory yields its direct children that
/// are not directories, in listing order; subdirectories are reported to
/// the reporter and skipped, never descended into.
pub struct FilesToIngest {
    source: Source,
    reporter: Arc<dyn IngestReporter>,
}

enum Source {
    Single(Option<PathBuf>),
    Directory { path: PathBuf, entries: ReadDir },
}

impl FilesToIngest {
    pub fn resolve(
        path: impl AsRef<Path>,
        reporter: Arc<dyn IngestReporter>,
    ) -> Result<Self, PathResolveError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PathResolveError::NotFound(path.to_path_buf()));
        }

        let source = if path.is_dir() {
            let entries = fs::read_dir(path).map_err(|source| PathResolveError::ListDir {
                path: path.to_path_buf(),
                source,
            })?;
            Source::Directory {
                path: path.to_path_buf(),
                entries,
            }
        } else {
            Source::Single(Some(path.to_path_buf()))
        };

        Ok(Self { source, reporter })
    }
}

impl Iterator for FilesToIngest {
    type Item = Result<PathBuf, PathResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Single(path) => path.take().map(Ok),
            Source::Directory { path, entries } => loop {
                let entry = match entries.next()? {
                    Ok(entry) => entry,
                    Err(source) => {
                        return Some(Err(PathResolveError::ListDir {
                            path: path.clone(),
                            source,
                        }))
                    }
                };

                let child = entry.path();
                if child.is_dir() {
                    self.reporter.subdirectory_skipped(&child);
                    continue;
                }
                return Some(Ok(child));
            },
        }
    }
}

/// Station code for a file: its name without the extension
pub fn station_code_for(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|code| !code.is_empty())
}
