//! EXIF metadata reading, mapping, and writing.
//!
//! Three stages:
//!
//! - [`read_exif`] — pull the scan ID and existing tags out of a JPG
//! - [`scan_to_tags`] / [`plan_changes`] — map a catalogue record onto
//!   standard EXIF fields and diff against what the file already has
//! - [`write_tags`] — merge the planned tags into the file's APP1 segment,
//!   leaving every other JPEG segment untouched

mod mapping;
mod reader;
mod writer;

pub use mapping::{TagChange, TagPlan, TagSet, plan_changes, scan_to_tags};
pub use reader::{ExifData, read_exif};
pub use writer::write_tags;
