//! # gofetch
//!
//! Discover the Go releases listed on the official download page, pick one
//! by exact version or keyword (`latest`, `stable`, `featured`,
//! `unstable`) and install it in place of the current `GOROOT`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gofetch::{Api, Config};
//!
//! fn main() -> gofetch::Result<()> {
//!     let api = Api::new(Config::new().set_install_root("/usr/local/go"))?;
//!     let catalog = api.catalog()?;
//!     let entry = api.resolve(&catalog, "1.19.4")?;
//!     let report = api.install(entry)?;
//!     println!("installed into {}", report.root.display());
//!     Ok(())
//! }
//! ```
//!
//! Everything runs on the calling thread with blocking I/O. Installations
//! are not locked: running two installs against the same root at the same
//! time is unsafe.

pub mod api;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod downloader;
pub mod entry;
pub mod error;
pub mod install;
pub mod platform;
pub mod progress;
pub mod resolve;

pub use api::Api;
pub use catalog::Catalog;
pub use config::Config;
pub use downloader::Downloader;
pub use entry::{DownloadEntry, Os, Sections};
pub use error::{Error, Result};
pub use install::{InstallReport, Installer};
pub use platform::Platform;
pub use resolve::Request;
