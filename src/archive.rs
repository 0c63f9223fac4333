//! Streaming extraction of release archives.
//!
//! Archives are expected to list parent directories before their
//! children, so directories are created one level at a time. Only
//! directories and regular files are accepted; anything else in a tarball
//! aborts the extraction at that entry.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::EntryType;
use tracing::trace;

use crate::error::{Error, Result};

/// What an extraction wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpackSummary {
    pub directories: usize,
    pub files: usize,
}

/// Decompress a gzip stream and unpack the tar archive inside it into `dest`.
pub fn unpack_tar_gz<R: Read>(reader: R, dest: &Path) -> Result<UnpackSummary> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut summary = UnpackSummary::default();

    let entries = archive
        .entries()
        .map_err(|e| Error::io("extract tar from gzip", dest, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| Error::io("extract tar from gzip", dest, e))?;
        let path = entry
            .path()
            .map_err(|e| Error::io("extract tar from gzip: read entry path", dest, e))?
            .into_owned();
        let out = checked_path(dest, &path)?;

        match entry.header().entry_type() {
            EntryType::Directory => {
                trace!(path = %out.display(), "creating directory");
                fs::create_dir(&out).map_err(|e| Error::io("create directory", &out, e))?;
                summary.directories += 1;
            }
            EntryType::Regular => {
                let mode = entry
                    .header()
                    .mode()
                    .map_err(|e| Error::io("extract tar from gzip: read entry mode", &out, e))?;
                trace!(path = %out.display(), mode = format_args!("{mode:o}"), "writing file");
                write_file(&out, Some(mode), &mut entry)?;
                summary.files += 1;
            }
            other => {
                return Err(Error::UnsupportedEntry {
                    kind: format!("{other:?}"),
                    path,
                });
            }
        }
    }

    Ok(summary)
}

/// Unpack a zip archive into `dest`. Zip files don't always carry
/// directory entries, so parents are created as needed.
pub fn unpack_zip<R: Read + Seek>(reader: R, dest: &Path) -> Result<UnpackSummary> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut summary = UnpackSummary::default();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let path = file
            .enclosed_name()
            .ok_or_else(|| Error::UnsafePath(PathBuf::from(file.name())))?;
        let out = dest.join(&path);

        if file.is_dir() {
            fs::create_dir_all(&out).map_err(|e| Error::io("create directory", &out, e))?;
            summary.directories += 1;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
            }
            let mode = file.unix_mode();
            write_file(&out, mode, &mut file)?;
            summary.files += 1;
        }
    }

    Ok(summary)
}

/// Join `path` onto `dest`, refusing anything that could land outside it.
fn checked_path(dest: &Path, path: &Path) -> Result<PathBuf> {
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(Error::UnsafePath(path.to_path_buf()));
    }
    Ok(dest.join(path))
}

fn write_file<R: Read>(path: &Path, mode: Option<u32>, contents: &mut R) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode & 0o7777);
        }
    }

    let mut file = options
        .open(path)
        .map_err(|e| Error::io("create file", path, e))?;
    io::copy(contents, &mut file).map_err(|e| Error::io("copy file contents", path, e))?;

    // the create mode above is filtered by the umask
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Some(mode) = mode {
            fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| Error::io("set permissions", path, e))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}
