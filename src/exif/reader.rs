use anyhow::{Context, Result};
use nom_exif::*;
use std::path::Path;

// Tag IDs read by raw code (IFD0 and Exif sub-IFD)
const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ARTIST: u16 = 0x013B;
const TAG_COPYRIGHT: u16 = 0x8298;
const TAG_EXPOSURE_TIME: u16 = 0x829A;
const TAG_F_NUMBER: u16 = 0x829D;
const TAG_ISO: u16 = 0x8827;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_FOCAL_LENGTH: u16 = 0x920A;
const TAG_FOCAL_LENGTH_35MM: u16 = 0xA405;
const TAG_IMAGE_UNIQUE_ID: u16 = 0xA420;
const TAG_BODY_SERIAL: u16 = 0xA431;
const TAG_LENS_MAKE: u16 = 0xA433;
const TAG_LENS_MODEL: u16 = 0xA434;
const TAG_LENS_SERIAL: u16 = 0xA435;

/// Existing EXIF data extracted from a scan file.
///
/// `scan_id` holds the `ImageUniqueID` tag, which CameraHub uses to carry the
/// Scan UUID; a file tagged on a previous run is recognized through it and
/// never re-matched.
#[derive(Debug, Clone, Default)]
pub struct ExifData {
    pub scan_id: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub body_serial: Option<String>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    pub lens_serial: Option<String>,
    pub description: Option<String>,
    pub user_comment: Option<String>,
    pub artist: Option<String>,
    pub copyright: Option<String>,
    pub date_time_original: Option<String>,
    pub exposure_time: Option<f64>,
    pub f_number: Option<f64>,
    pub iso: Option<u32>,
    pub focal_length: Option<u32>,
    pub focal_length_35mm: Option<u32>,
    pub has_gps: bool,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
}

/// Read existing EXIF data from an image file.
///
/// A file with no EXIF at all is normal for fresh scans and yields the
/// default (all-`None`) data rather than an error.
pub fn read_exif(path: &Path) -> Result<ExifData> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(ExifData::default());
        }
    };

    // Parse GPS info before converting to Exif (consumes the iterator)
    let gps_info = iter.parse_gps_info().ok().flatten();
    let exif: Exif = iter.into();

    let mut data = ExifData::default();

    data.scan_id = get_string(&exif, TAG_IMAGE_UNIQUE_ID);
    data.make = get_string(&exif, TAG_MAKE);
    data.model = get_string(&exif, TAG_MODEL);
    data.body_serial = get_string(&exif, TAG_BODY_SERIAL);
    data.lens_make = get_string(&exif, TAG_LENS_MAKE);
    data.lens_model = get_string(&exif, TAG_LENS_MODEL);
    data.lens_serial = get_string(&exif, TAG_LENS_SERIAL);
    data.artist = get_string(&exif, TAG_ARTIST);
    data.copyright = get_string(&exif, TAG_COPYRIGHT);
    data.date_time_original = get_string(&exif, TAG_DATE_TIME_ORIGINAL);
    data.exposure_time = get_f64(&exif, TAG_EXPOSURE_TIME);
    data.f_number = get_f64(&exif, TAG_F_NUMBER);
    data.iso = get_u32(&exif, TAG_ISO);
    data.focal_length = get_f64(&exif, TAG_FOCAL_LENGTH).map(|v| v.round() as u32);
    data.focal_length_35mm = get_u32(&exif, TAG_FOCAL_LENGTH_35MM);

    if let Some(val) = exif.get(ExifTag::ImageDescription) {
        data.description = entry_to_string(val);
    }
    if let Some(val) = exif.get(ExifTag::UserComment) {
        data.user_comment = entry_to_string(val);
    }

    // GPS — use nom-exif's built-in GPS parser
    if let Some(gps) = gps_info {
        data.has_gps = true;
        data.gps_latitude = Some(latlng_to_decimal(&gps.latitude, gps.latitude_ref));
        data.gps_longitude = Some(latlng_to_decimal(&gps.longitude, gps.longitude_ref));
    }

    Ok(data)
}

fn get_string(exif: &Exif, tag: u16) -> Option<String> {
    exif.get_by_ifd_tag_code(0, tag).and_then(entry_to_string)
}

fn get_f64(exif: &Exif, tag: u16) -> Option<f64> {
    exif.get_by_ifd_tag_code(0, tag)
        .and_then(entry_to_string)
        .and_then(|s| parse_number(&s))
}

fn get_u32(exif: &Exif, tag: u16) -> Option<u32> {
    get_f64(exif, tag).map(|v| v.round() as u32)
}

/// Convert an EntryValue to an Option<String>.
fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').to_string();
    if s.is_empty() { None } else { Some(s) }
}

/// Parse a numeric EXIF value rendered as either `"2.8"` or `"28/10"`.
fn parse_number(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    s.trim().parse().ok()
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> f64 {
    let degrees = latlng.0.0 as f64 / latlng.0.1 as f64;
    let minutes = latlng.1.0 as f64 / latlng.1.1 as f64;
    let seconds = latlng.2.0 as f64 / latlng.2.1 as f64;

    let mut coord = degrees + minutes / 60.0 + seconds / 3600.0;

    if reference == 'S' || reference == 'W' {
        coord = -coord;
    }

    coord
}
