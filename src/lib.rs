//! # camerahub-tagger
//!
//! Tag scanned film negatives with metadata from a [CameraHub](https://camerahub.info)
//! catalogue. Each JPG scan is matched to a Negative record (by filename
//! heuristic or interactively), a Scan record is created or reused, and the
//! catalogue's camera, lens, film, and exposure metadata is written into the
//! image's EXIF tags.
//!
//! ## Quick Start
//!
//! The pipeline module handles the full match → fetch → tag flow for a file:
//!
//! ```rust,no_run
//! use camerahub_tagger::api::ApiClient;
//! use camerahub_tagger::config::{Config, RunConfig};
//! use camerahub_tagger::pipeline::{collect_scans, process_scan, AutoPrompter};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let profile = config.profile("prod")?;
//!
//!     let run = RunConfig {
//!         auto: true,
//!         assume_yes: true,
//!         ..RunConfig::default()
//!     };
//!
//!     let api = ApiClient::new(&profile.server, &profile.username, &profile.password)?;
//!     api.test_credentials().await?;
//!
//!     let mut prompter = AutoPrompter;
//!     for path in collect_scans(&run, Path::new("."))? {
//!         let report = process_scan(&path, &api, &run, &mut prompter).await;
//!         if let Some(ref err) = report.error {
//!             eprintln!("{}: {err}", path.display());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] — CameraHub API client (negatives, scans, credential check)
//! - [`config`] — connection profiles and per-run options
//! - [`exif`] — EXIF reading, catalogue-to-EXIF mapping, and tag writing
//! - [`pipeline`] — scan enumeration, matching policy, and per-file processing

pub mod api;
pub mod config;
pub mod exif;
pub mod pipeline;
