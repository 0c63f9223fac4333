use std::ffi::OsString;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::archive::{unpack_tar_gz, unpack_zip, UnpackSummary};
use crate::downloader::Downloader;
use crate::entry::DownloadEntry;
use crate::error::{Error, Result};

/// How a release archive is packed, decided from its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Windows releases ship as `.zip`; everything else is read as gzip'd tar.
    pub fn for_url(url: &str) -> Self {
        if url.ends_with(".zip") {
            Self::Zip
        } else {
            Self::TarGz
        }
    }
}

/// Result of a successful installation.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub version: Option<String>,
    /// The directory the toolchain root lives in.
    pub destination: PathBuf,
    pub root: PathBuf,
    pub summary: UnpackSummary,
}

/// Replaces the toolchain rooted at `root` with a downloaded release.
///
/// The archive is unpacked into a staging directory next to `root`, checked
/// to contain a directory named like `root`, and only then swapped in. The
/// previous installation is moved aside first and removed after the swap,
/// or moved back if the swap fails.
///
/// Nothing guards against two installers working on the same root at once.
pub struct Installer {
    root: PathBuf,
}

impl Installer {
    /// An installer for the toolchain directory `root` (usually `GOROOT`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The toolchain directory being replaced.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent of the installation root; archives unpack relative to it.
    pub fn destination(&self) -> Result<&Path> {
        self.root
            .parent()
            .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
            .ok_or_else(|| {
                Error::InstallRoot(format!("{} has no parent directory", self.root.display()))
            })
    }

    /// Download `entry` and install it.
    pub fn install(&self, entry: &DownloadEntry, downloader: &Downloader) -> Result<InstallReport> {
        // fail on a bad root before downloading anything
        self.destination()?;

        let stream = downloader.open_archive(entry.url())?;
        let bar = stream.progress.clone();
        let result = self.install_from(entry, ArchiveFormat::for_url(entry.url()), stream);
        bar.finish_and_clear();
        result
    }

    /// Install `entry` from an already opened archive stream.
    pub fn install_from<R: Read>(
        &self,
        entry: &DownloadEntry,
        format: ArchiveFormat,
        mut reader: R,
    ) -> Result<InstallReport> {
        let summary = match format {
            ArchiveFormat::TarGz => self.stage(|dir| unpack_tar_gz(reader, dir))?,
            ArchiveFormat::Zip => {
                let mut buf = Vec::new();
                reader
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::io("download archive", entry.url(), e))?;
                self.stage(|dir| unpack_zip(Cursor::new(buf), dir))?
            }
        };

        let destination = self.destination()?.to_path_buf();
        info!(
            version = entry.version().unwrap_or("unknown"),
            root = %self.root.display(),
            files = summary.files,
            directories = summary.directories,
            "installation complete"
        );

        Ok(InstallReport {
            version: entry.version().map(str::to_owned),
            destination,
            root: self.root.clone(),
            summary,
        })
    }

    fn stage<F>(&self, unpack: F) -> Result<UnpackSummary>
    where
        F: FnOnce(&Path) -> Result<UnpackSummary>,
    {
        let parent = self.destination()?;
        let name = self.root.file_name().ok_or_else(|| {
            Error::InstallRoot(format!("{} does not name a directory", self.root.display()))
        })?;

        let staging = tempfile::Builder::new()
            .prefix(".gofetch-staging-")
            .tempdir_in(parent)
            .map_err(|e| Error::io("create staging directory", parent, e))?;
        info!(staging = %staging.path().display(), "unpacking archive");

        let summary = unpack(staging.path())?;

        let top_level = top_level_entries(staging.path())?;
        let staged = staging.path().join(name);
        let populated = staged.is_dir()
            && fs::read_dir(&staged)
                .map_err(|e| Error::io("read staged installation", &staged, e))?
                .next()
                .is_some();
        if !populated {
            return Err(Error::IncompleteArchive {
                expected: PathBuf::from(name),
                found: top_level
                    .iter()
                    .map(|n| n.to_string_lossy().into_owned())
                    .collect(),
            });
        }

        // anything else the archive holds goes next to the root, never over an existing path
        let extras: Vec<OsString> = top_level
            .into_iter()
            .filter(|n| n.as_os_str() != name)
            .collect();
        for extra in &extras {
            let target = parent.join(extra);
            if fs::symlink_metadata(&target).is_ok() {
                return Err(Error::EntryExists(target));
            }
        }

        self.swap(&staged, parent)?;

        for extra in &extras {
            let target = parent.join(extra);
            fs::rename(staging.path().join(extra), &target)
                .map_err(|e| Error::io("move archive entry into place", &target, e))?;
            info!(path = %target.display(), "installed archive entry next to the root");
        }
        Ok(summary)
    }

    fn swap(&self, staged: &Path, parent: &Path) -> Result<()> {
        if fs::symlink_metadata(&self.root).is_err() {
            return fs::rename(staged, &self.root)
                .map_err(|e| Error::io("move new installation into place", &self.root, e));
        }

        let backup = tempfile::Builder::new()
            .prefix(".gofetch-previous-")
            .tempdir_in(parent)
            .map_err(|e| Error::io("create backup directory", parent, e))?;
        let previous = backup.path().join("root");

        fs::rename(&self.root, &previous)
            .map_err(|e| Error::io("move previous installation aside", &self.root, e))?;

        if let Err(e) = fs::rename(staged, &self.root) {
            if let Err(restore) = fs::rename(&previous, &self.root) {
                let kept = backup.keep();
                error!(
                    previous = %kept.display(),
                    error = %restore,
                    "could not restore the previous installation"
                );
                return Err(Error::io("restore previous installation", kept, restore));
            }
            return Err(Error::io("move new installation into place", &self.root, e));
        }

        if let Err(e) = backup.close() {
            warn!(error = %e, "failed to remove the previous installation");
        }
        Ok(())
    }
}

/// Names directly under `dir`, sorted.
fn top_level_entries(dir: &Path) -> Result<Vec<OsString>> {
    let mut names = fs::read_dir(dir)
        .map_err(|e| Error::io("read staging directory", dir, e))?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| Error::io("read staging directory", dir, e))?;
    names.sort();
    Ok(names)
}
