//! File system executor implementation.

use async_trait::async_trait;
use std::fs as std_fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::debug;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::config::ExecutorConfig;
use super::error::ExecutorError;
use super::traits::Executor;
use super::types::{DeleteTarget, PathPair};
use crate::batch::{Command, Job, OptionSet};

/// Executor that performs every command against the local file system.
pub struct FsExecutor {
    config: ExecutorConfig,
}

impl FsExecutor {
    /// Creates a new file system executor with the given configuration.
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Creates an executor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExecutorConfig::default())
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Attempts to move a path atomically (rename).
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // Cross-filesystem moves fail with EXDEV (18 on Linux)
                if e.kind() == io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Copies a single file through a buffer of `buffer_size` bytes.
    async fn copy_file(&self, source: &Path, destination: &Path) -> Result<u64, ExecutorError> {
        let source_file = File::open(source).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ExecutorError::SourceNotFound {
                    path: source.to_path_buf(),
                }
            } else {
                ExecutorError::Io(e)
            }
        })?;

        let dest_file = File::create(destination).await.map_err(|e| {
            ExecutorError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        let mut reader = BufReader::with_capacity(self.config.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.config.buffer_size, dest_file);
        let mut buffer = vec![0u8; self.config.buffer_size];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = reader.read(&mut buffer).await.map_err(|e| {
                ExecutorError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            if bytes_read == 0 {
                break;
            }

            writer.write_all(&buffer[..bytes_read]).await.map_err(|e| {
                ExecutorError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
            })?;

            total_bytes += bytes_read as u64;
        }

        writer.flush().await.map_err(|e| {
            ExecutorError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;

        Ok(total_bytes)
    }

    /// Copies a file or a whole directory tree.
    async fn copy_path(
        &self,
        source: &Path,
        destination: &Path,
        is_dir: bool,
    ) -> Result<u64, ExecutorError> {
        if is_dir {
            let source = source.to_path_buf();
            let destination = destination.to_path_buf();
            blocking(move || copy_tree(&source, &destination)).await
        } else {
            ensure_parent_dir(destination).await?;
            self.copy_file(source, destination).await
        }
    }
}

#[async_trait]
impl Executor for FsExecutor {
    fn name(&self) -> &str {
        "fs"
    }

    async fn copy(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        let pair = PathPair::from_job(Command::Copy, job)?;
        let source_meta = source_metadata(&pair.source).await?;
        reject_same_path(&pair).await?;
        if !pair.overwrite(options, self.config.overwrite) && exists(&pair.destination).await {
            return Err(ExecutorError::DestinationExists {
                path: pair.destination,
            });
        }

        let bytes = self
            .copy_path(&pair.source, &pair.destination, source_meta.is_dir())
            .await?;
        debug!(
            "Copied {} to {} ({} bytes)",
            pair.source.display(),
            pair.destination.display(),
            bytes
        );
        Ok(())
    }

    async fn move_path(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        let pair = PathPair::from_job(Command::Move, job)?;
        let source_meta = source_metadata(&pair.source).await?;
        reject_same_path(&pair).await?;
        prepare_destination(
            &pair,
            pair.overwrite(options, self.config.overwrite),
            source_meta.is_dir(),
        )
        .await?;
        ensure_parent_dir(&pair.destination).await?;

        let moved = Self::try_atomic_move(&pair.source, &pair.destination)
            .await
            .map_err(|e| ExecutorError::move_failed(pair.source.clone(), pair.destination.clone(), e))?;

        if !moved {
            debug!(
                "Cross-device move of {}, falling back to copy",
                pair.source.display()
            );
            self.copy_path(&pair.source, &pair.destination, source_meta.is_dir())
                .await?;
            remove_path(&pair.source).await?;
        }

        debug!(
            "Moved {} to {}",
            pair.source.display(),
            pair.destination.display()
        );
        Ok(())
    }

    async fn delete(&self, job: &Job, _options: &OptionSet) -> Result<(), ExecutorError> {
        let target = DeleteTarget::from_job(job)?;
        let path = target.path();

        if fs::symlink_metadata(path).await.is_err() {
            debug!("Nothing to delete at {}", path.display());
            return Ok(());
        }

        remove_path(path).await?;
        debug!("Deleted {}", path.display());
        Ok(())
    }

    async fn zip(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        let pair = PathPair::from_job(Command::Zip, job)?;
        source_metadata(&pair.source).await?;
        reject_same_path(&pair).await?;
        prepare_destination(&pair, pair.overwrite(options, self.config.overwrite), false).await?;
        ensure_parent_dir(&pair.destination).await?;

        let method = self.config.compression.method();
        let source = pair.source.clone();
        let destination = pair.destination.clone();
        let entries = blocking(move || write_archive(&source, &destination, method)).await?;

        debug!(
            "Archived {} into {} ({} files)",
            pair.source.display(),
            pair.destination.display(),
            entries
        );
        Ok(())
    }

    async fn unzip(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        let pair = PathPair::from_job(Command::Unzip, job)?;
        source_metadata(&pair.source).await?;
        reject_same_path(&pair).await?;
        if !pair.overwrite(options, self.config.overwrite) && exists(&pair.destination).await {
            return Err(ExecutorError::DestinationExists {
                path: pair.destination,
            });
        }

        let source = pair.source.clone();
        let destination = pair.destination.clone();
        let entries = blocking(move || extract_archive(&source, &destination)).await?;

        debug!(
            "Extracted {} into {} ({} entries)",
            pair.source.display(),
            pair.destination.display(),
            entries
        );
        Ok(())
    }

    async fn rename(&self, job: &Job, options: &OptionSet) -> Result<(), ExecutorError> {
        let pair = PathPair::from_job(Command::Rename, job)?;
        let source_meta = source_metadata(&pair.source).await?;
        reject_same_path(&pair).await?;
        prepare_destination(
            &pair,
            pair.overwrite(options, self.config.overwrite),
            source_meta.is_dir(),
        )
        .await?;

        fs::rename(&pair.source, &pair.destination)
            .await
            .map_err(|e| ExecutorError::move_failed(pair.source.clone(), pair.destination.clone(), e))?;

        debug!(
            "Renamed {} to {}",
            pair.source.display(),
            pair.destination.display()
        );
        Ok(())
    }
}

async fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).await.is_ok()
}

async fn source_metadata(path: &Path) -> Result<std::fs::Metadata, ExecutorError> {
    fs::metadata(path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ExecutorError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ExecutorError::Io(e)
        }
    })
}

/// Readies the destination of a move, rename or zip, or refuses if
/// overwriting is disabled.
///
/// An existing file is left in place for the rename or archive write to
/// replace, so it survives if that step fails. Directories, and anything a
/// directory is about to replace, have to be removed first.
async fn prepare_destination(
    pair: &PathPair,
    overwrite: bool,
    source_is_dir: bool,
) -> Result<(), ExecutorError> {
    let Ok(meta) = fs::symlink_metadata(&pair.destination).await else {
        return Ok(());
    };
    if !overwrite {
        return Err(ExecutorError::DestinationExists {
            path: pair.destination.clone(),
        });
    }
    if meta.is_dir() || source_is_dir {
        remove_path(&pair.destination).await?;
    }
    Ok(())
}

/// Refuses jobs whose destination already resolves to the source.
async fn reject_same_path(pair: &PathPair) -> Result<(), ExecutorError> {
    let (Ok(source), Ok(destination)) = (
        fs::canonicalize(&pair.source).await,
        fs::canonicalize(&pair.destination).await,
    ) else {
        return Ok(());
    };
    if source == destination {
        return Err(ExecutorError::SamePath {
            path: pair.source.clone(),
        });
    }
    Ok(())
}

async fn ensure_parent_dir(path: &Path) -> Result<(), ExecutorError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !exists(parent).await {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ExecutorError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
    }
    Ok(())
}

async fn remove_path(path: &Path) -> Result<(), ExecutorError> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| ExecutorError::DeleteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let result = if meta.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    result.map_err(|e| ExecutorError::DeleteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Runs blocking file work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, ExecutorError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ExecutorError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ExecutorError::TaskFailed(e.to_string()))?
}

fn relative_to<'a>(path: &'a Path, base: &Path) -> Result<&'a Path, ExecutorError> {
    path.strip_prefix(base).map_err(|_| {
        ExecutorError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not under {}", path.display(), base.display()),
        ))
    })
}

fn copy_tree(source: &Path, destination: &Path) -> Result<u64, ExecutorError> {
    let mut total_bytes = 0u64;

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let target = destination.join(relative_to(entry.path(), source)?);

        if entry.file_type().is_dir() {
            std_fs::create_dir_all(&target).map_err(|e| ExecutorError::DirectoryCreationFailed {
                path: target.clone(),
                source: e,
            })?;
        } else {
            total_bytes += std_fs::copy(entry.path(), &target).map_err(|e| {
                ExecutorError::copy_failed(entry.path().to_path_buf(), target.clone(), e)
            })?;
        }
    }

    Ok(total_bytes)
}

/// Zip entry name for a relative path, always `/`-separated.
fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn write_archive(
    source: &Path,
    destination: &Path,
    method: CompressionMethod,
) -> Result<usize, ExecutorError> {
    let archive_err = |source: ZipError| ExecutorError::Archive {
        path: destination.to_path_buf(),
        source,
    };

    // Directories are archived by content; a single file keeps its name.
    let base: PathBuf = if source.is_dir() {
        source.to_path_buf()
    } else {
        source.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let file = std_fs::File::create(destination)?;
    // An archive written inside the tree it archives must not include itself.
    let archive_path = std_fs::canonicalize(destination)?;
    let archive_in_source = archive_path.starts_with(std_fs::canonicalize(source)?);
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(method);
    let mut files = 0;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if archive_in_source
            && entry.file_type().is_file()
            && std_fs::canonicalize(entry.path()).is_ok_and(|p| p == archive_path)
        {
            continue;
        }
        let name = archive_name(relative_to(entry.path(), &base)?);
        if name.is_empty() {
            continue;
        }

        if entry.file_type().is_dir() {
            writer.add_directory(name, options).map_err(archive_err)?;
        } else {
            writer.start_file(name, options).map_err(archive_err)?;
            let mut input = std_fs::File::open(entry.path())?;
            io::copy(&mut input, &mut writer)?;
            files += 1;
        }
    }

    writer.finish().map_err(archive_err)?;
    Ok(files)
}

fn extract_archive(source: &Path, destination: &Path) -> Result<usize, ExecutorError> {
    let archive_err = |e: ZipError| ExecutorError::Archive {
        path: source.to_path_buf(),
        source: e,
    };

    let file = std_fs::File::open(source)?;
    let mut archive = ZipArchive::new(file).map_err(archive_err)?;
    let count = archive.len();

    std_fs::create_dir_all(destination).map_err(|e| ExecutorError::DirectoryCreationFailed {
        path: destination.to_path_buf(),
        source: e,
    })?;

    for index in 0..count {
        let mut entry = archive.by_index(index).map_err(archive_err)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(ExecutorError::UnsafeArchiveEntry {
                entry: entry.name().to_string(),
            });
        };
        let target = destination.join(relative);

        if entry.is_dir() {
            std_fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            std_fs::create_dir_all(parent)?;
        }
        let mut output = std_fs::File::create(&target)?;
        io::copy(&mut entry, &mut output)?;
    }

    Ok(count)
}
