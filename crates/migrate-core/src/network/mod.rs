//! Release archive retrieval.
//!
//! The pipeline only depends on the [`Downloader`] trait; [`HttpDownloader`]
//! is the reqwest-backed implementation used outside of tests.

mod download;

pub use download::{download_file_name, Downloader, HttpDownloader};
