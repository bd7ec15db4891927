mod client;

pub use client::{discard, finalize_download, temp_path_for, DownloadEntry, Downloader};
