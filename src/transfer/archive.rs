//! Zip implementations of the [`Archiver`] and [`Extractor`] stages.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::model::Archive;
use crate::traits::TransferError;
use crate::transfer::pipeline::ExtractedWorkspace;
use crate::transfer::traits::{Archiver, Extractor};

/// Creates `<folder>-<timestamp>-<random>.zip` files in the scratch directory.
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    scratch_dir: PathBuf,
    exclude: Vec<String>,
}

impl ZipArchiver {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            exclude: Vec::new(),
        }
    }

    /// Skips files and directories with any of these names, at any depth.
    pub fn with_exclude(mut self, names: Vec<String>) -> Self {
        self.exclude = names;
        self
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        self.exclude
            .iter()
            .any(|name| entry.file_name() == OsStr::new(name))
    }
}

impl Archiver for ZipArchiver {
    fn create_archive(&self, source: &Path) -> Result<Archive, TransferError> {
        let metadata = fs::metadata(source).map_err(|e| {
            TransferError::InvalidSource(format!(
                "Cannot read folder '{}': {}",
                source.display(),
                e
            ))
        })?;
        if !metadata.is_dir() {
            return Err(TransferError::InvalidSource(format!(
                "'{}' is not a folder",
                source.display()
            )));
        }
        fs::read_dir(source).map_err(|e| {
            TransferError::InvalidSource(format!(
                "Cannot read folder '{}': {}",
                source.display(),
                e
            ))
        })?;

        let folder_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());
        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");

        let (file, path) = tempfile::Builder::new()
            .prefix(&format!("{folder_name}-{stamp}-"))
            .suffix(".zip")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| archive_err("create scratch file", e))?
            .into_parts();

        let mut writer = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut files = 0usize;

        let walker = WalkDir::new(source)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e));

        for entry in walker {
            let entry = entry.map_err(|e| archive_err("walk source folder", e))?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .map_err(|e| archive_err("relativize path", e))?;
            let name = entry_name(relative);
            let entry_options = match entry.metadata().ok().and_then(|m| unix_mode(&m)) {
                Some(mode) => options.unix_permissions(mode),
                None => options,
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                writer
                    .add_directory(name, entry_options)
                    .map_err(|e| archive_err("add directory", e))?;
            } else if file_type.is_file() {
                writer
                    .start_file(name, entry_options)
                    .map_err(|e| archive_err("add file", e))?;
                let mut input = File::open(entry.path())
                    .map_err(|e| archive_err(&format!("read {}", entry.path().display()), e))?;
                io::copy(&mut input, &mut writer)
                    .map_err(|e| archive_err(&format!("compress {}", entry.path().display()), e))?;
                files += 1;
            } else {
                debug!(path = %entry.path().display(), "Skipping symlink or special file");
            }
        }

        let mut out = writer
            .finish()
            .map_err(|e| archive_err("finish archive", e))?;
        out.flush().map_err(|e| archive_err("flush archive", e))?;
        drop(out);

        let size_bytes = fs::metadata(&path)?.len();
        info!(
            files,
            size_bytes,
            archive = %path.display(),
            "Archive created"
        );

        Ok(Archive::new(path, size_bytes))
    }
}

/// Unpacks zip archives into `codeshare-<timestamp>-<random>` directories.
#[derive(Debug, Clone)]
pub struct ZipExtractor {
    scratch_dir: PathBuf,
}

impl ZipExtractor {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }
}

impl Extractor for ZipExtractor {
    fn extract(&self, archive: &Path) -> Result<ExtractedWorkspace, TransferError> {
        let file = File::open(archive).map_err(|e| {
            TransferError::Extraction(format!("Cannot open '{}': {}", archive.display(), e))
        })?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| TransferError::Extraction(format!("Not a valid zip archive: {e}")))?;

        let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        let dir = tempfile::Builder::new()
            .prefix(&format!("codeshare-{stamp}-"))
            .tempdir_in(&self.scratch_dir)
            .map_err(|e| {
                TransferError::Extraction(format!("Cannot create destination directory: {e}"))
            })?;

        // From here on the guard owns the directory and removes it on any error.
        let mut workspace = ExtractedWorkspace::new(dir.keep());

        for i in 0..zip.len() {
            let mut entry = zip
                .by_index(i)
                .map_err(|e| TransferError::Extraction(format!("Cannot read entry {i}: {e}")))?;
            let relative = entry.enclosed_name().ok_or_else(|| {
                TransferError::Extraction(format!(
                    "Refusing to extract '{}' outside the destination",
                    entry.name()
                ))
            })?;
            let output = workspace.safe_child(&relative)?;

            if entry.is_dir() {
                fs::create_dir_all(&output).map_err(|e| write_err(&output, e))?;
            } else {
                if let Some(parent) = output.parent() {
                    fs::create_dir_all(parent).map_err(|e| write_err(parent, e))?;
                }
                let mut out = File::create(&output).map_err(|e| write_err(&output, e))?;
                io::copy(&mut entry, &mut out).map_err(|e| write_err(&output, e))?;
                workspace.files_extracted += 1;
            }

            if let Some(mode) = entry.unix_mode() {
                set_unix_mode(&output, mode).map_err(|e| write_err(&output, e))?;
            }
        }

        info!(
            files = workspace.files_extracted,
            path = %workspace.path.display(),
            "Archive extracted"
        );
        Ok(workspace)
    }
}

/// Zip entry names always use `/`, whatever the host separator is.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn archive_err(action: &str, e: impl std::fmt::Display) -> TransferError {
    TransferError::Archive(format!("failed to {action}: {e}"))
}

fn write_err(path: &Path, e: io::Error) -> TransferError {
    TransferError::Extraction(format!("Cannot write '{}': {}", path.display(), e))
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn set_unix_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // Keep the owner able to traverse and clean up what was extracted.
    let mode = (mode & 0o777) | 0o600;
    let mode = if path.is_dir() { mode | 0o700 } else { mode };
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_unix_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
