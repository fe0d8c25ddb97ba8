use anyhow::{Context, Result};
use img_parts::Bytes;
use img_parts::ImageEXIF;
use img_parts::jpeg::Jpeg;
use little_exif::endian::Endian;
use little_exif::exif_tag::{ExifTag, ExifTagGroup};
use little_exif::exif_tag_format::ExifTagFormat;
use little_exif::filetype::FileExtension;
use little_exif::metadata::Metadata;
use std::path::Path;

use super::mapping::TagSet;

// IFD0 string tags
const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ARTIST: u16 = 0x013B;
const TAG_COPYRIGHT: u16 = 0x8298;

// Exif sub-IFD tags
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

// GPS IFD tags
const TAG_GPS_LATITUDE_REF: u16 = 0x0001;
const TAG_GPS_LATITUDE: u16 = 0x0002;
const TAG_GPS_LONGITUDE_REF: u16 = 0x0003;
const TAG_GPS_LONGITUDE: u16 = 0x0004;

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
// img-parts set_exif() expects just the TIFF data (after Exif\0\0)
const JPEG_EXIF_OVERHEAD: usize = 10; // 2 + 2 + 6

/// Merge the planned tags into a JPG's EXIF and write the file back.
///
/// Strategy:
/// 1. Read the entire JPEG with img-parts (preserves all segments)
/// 2. Load existing EXIF with little_exif and merge the new tags
/// 3. Write back via img-parts — only the APP1 EXIF segment changes, and it
///    stays at its original position in the segment list
///
/// Returns the number of EXIF tags written.
pub fn write_tags(path: &Path, tags: &TagSet) -> Result<usize> {
    let new_tags = build_exif_tags(tags);
    if new_tags.is_empty() {
        return Ok(0);
    }

    let file_bytes = std::fs::read(path).context("Failed to read image file")?;
    let mut jpeg = Jpeg::from_bytes(Bytes::from(file_bytes))
        .map_err(|e| anyhow::anyhow!("Failed to parse JPEG: {e}"))?;

    // Remember where the EXIF segment was originally positioned
    let orig_exif_pos = find_exif_segment_pos(&jpeg);

    let mut metadata = load_existing_metadata(path).unwrap_or_else(Metadata::new);
    for tag in &new_tags {
        metadata.set_tag(tag.clone());
    }

    let exif_bytes = metadata.as_u8_vec(FileExtension::JPEG);
    if exif_bytes.len() <= JPEG_EXIF_OVERHEAD {
        anyhow::bail!("EXIF encoding produced no data");
    }
    let tiff_data = exif_bytes[JPEG_EXIF_OVERHEAD..].to_vec();

    jpeg.set_exif(Some(Bytes::from(tiff_data)));

    // set_exif() inserts at position 3, which may be after other APP
    // segments. Move the EXIF segment back to where it originally was so
    // EXIF stays first among the APP1 segments.
    if let Some(new_pos) = find_exif_segment_pos(&jpeg) {
        let target_pos = orig_exif_pos.unwrap_or(1); // default: right after APP0
        if new_pos != target_pos && target_pos < new_pos {
            let segments = jpeg.segments_mut();
            let seg = segments.remove(new_pos);
            segments.insert(target_pos, seg);
        }
    }

    let output = jpeg.encoder().bytes();
    std::fs::write(path, &output).context("Failed to write JPEG file")?;

    Ok(new_tags.len())
}

/// Load existing EXIF metadata from a file path using little_exif.
/// Returns None if it can't parse (instead of losing data).
fn load_existing_metadata(path: &Path) -> Option<Metadata> {
    let path_owned = path.to_path_buf();
    // Suppress panics from little_exif
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = std::panic::catch_unwind(move || Metadata::new_from_path(&path_owned));
    std::panic::set_hook(prev_hook);

    match result {
        Ok(Ok(m)) => {
            if m.data().is_empty() {
                log::debug!("little_exif loaded empty metadata");
                None
            } else {
                log::debug!("little_exif loaded {} existing EXIF tags", m.data().len());
                Some(m)
            }
        }
        Ok(Err(e)) => {
            log::debug!("little_exif could not parse EXIF: {e}");
            None
        }
        Err(_) => {
            log::debug!("little_exif panicked parsing EXIF");
            None
        }
    }
}

/// Find the position of the EXIF APP1 segment in a JPEG.
/// EXIF segments have marker 0xE1 (APP1) and contents starting with "Exif\0\0".
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    const EXIF_PREFIX: &[u8] = b"Exif\0\0";
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == 0xE1 && s.contents().starts_with(EXIF_PREFIX))
}

/// Build little_exif tags for every populated field of the tag set.
fn build_exif_tags(tags: &TagSet) -> Vec<ExifTag> {
    let mut out: Vec<ExifTag> = Vec::new();

    let mut push_string = |tag_id: u16, group: ExifTagGroup, value: &Option<String>| {
        if let Some(value) = value {
            if let Some(tag) = make_string_tag(tag_id, value, group) {
                out.push(tag);
            }
        }
    };

    push_string(TAG_MAKE, ExifTagGroup::IFD0, &tags.make);
    push_string(TAG_MODEL, ExifTagGroup::IFD0, &tags.model);
    push_string(TAG_ARTIST, ExifTagGroup::IFD0, &tags.artist);
    push_string(TAG_COPYRIGHT, ExifTagGroup::IFD0, &tags.copyright);
    push_string(TAG_IMAGE_UNIQUE_ID, ExifTagGroup::ExifIFD, &tags.scan_id);
    push_string(TAG_BODY_SERIAL, ExifTagGroup::ExifIFD, &tags.body_serial);
    push_string(TAG_LENS_MAKE, ExifTagGroup::ExifIFD, &tags.lens_make);
    push_string(TAG_LENS_MODEL, ExifTagGroup::ExifIFD, &tags.lens_model);
    push_string(TAG_LENS_SERIAL, ExifTagGroup::ExifIFD, &tags.lens_serial);
    push_string(
        TAG_DATE_TIME_ORIGINAL,
        ExifTagGroup::ExifIFD,
        &tags.date_time_original,
    );

    if let Some(ref description) = tags.description {
        out.push(ExifTag::ImageDescription(description.clone()));
    }

    if let Some(ref comment) = tags.user_comment {
        let mut comment_bytes = b"ASCII\0\0\0".to_vec();
        comment_bytes.extend_from_slice(comment.as_bytes());
        out.push(ExifTag::UserComment(comment_bytes));
    }

    if let Some((num, den)) = tags.exposure_time {
        if let Some(tag) = make_rational_tag(TAG_EXPOSURE_TIME, num, den, ExifTagGroup::ExifIFD) {
            out.push(tag);
        }
    }

    if let Some(f_number) = tags.f_number {
        // f/2.8 -> 28/10
        let num = (f_number * 10.0).round() as u32;
        if let Some(tag) = make_rational_tag(TAG_F_NUMBER, num, 10, ExifTagGroup::ExifIFD) {
            out.push(tag);
        }
    }

    if let Some(focal) = tags.focal_length {
        if let Some(tag) = make_rational_tag(TAG_FOCAL_LENGTH, focal, 1, ExifTagGroup::ExifIFD) {
            out.push(tag);
        }
    }

    if let Some(iso) = tags.iso {
        if let Some(tag) = make_short_tag(TAG_ISO, iso as u16, ExifTagGroup::ExifIFD) {
            out.push(tag);
        }
    }

    if let Some(focal35) = tags.focal_length_35mm {
        if let Some(tag) = make_short_tag(TAG_FOCAL_LENGTH_35MM, focal35 as u16, ExifTagGroup::ExifIFD)
        {
            out.push(tag);
        }
    }

    if let (Some(lat), Some(lon)) = (tags.latitude, tags.longitude) {
        collect_gps_tags(&mut out, lat, lon);
    }

    out
}

/// Create a nul-terminated ASCII string tag.
fn make_string_tag(tag_id: u16, value: &str, group: ExifTagGroup) -> Option<ExifTag> {
    let mut raw_data = value.as_bytes().to_vec();
    raw_data.push(0);
    ExifTag::from_u16_with_data(
        tag_id,
        &ExifTagFormat::STRING,
        &raw_data,
        &Endian::Little,
        &group,
    )
    .ok()
}

/// Create a single unsigned-rational tag (8 bytes, little-endian).
fn make_rational_tag(tag_id: u16, num: u32, den: u32, group: ExifTagGroup) -> Option<ExifTag> {
    let mut raw_data = Vec::with_capacity(8);
    raw_data.extend_from_slice(&num.to_le_bytes());
    raw_data.extend_from_slice(&den.to_le_bytes());
    ExifTag::from_u16_with_data(
        tag_id,
        &ExifTagFormat::RATIONAL64U,
        &raw_data,
        &Endian::Little,
        &group,
    )
    .ok()
}

/// Create a single unsigned-short tag.
fn make_short_tag(tag_id: u16, value: u16, group: ExifTagGroup) -> Option<ExifTag> {
    ExifTag::from_u16_with_data(
        tag_id,
        &ExifTagFormat::INT16U,
        &value.to_le_bytes().to_vec(),
        &Endian::Little,
        &group,
    )
    .ok()
}

/// Encode a GPS coordinate as 3 rationals (deg, min, sec) = 24 bytes, little-endian.
fn encode_gps_rational(degrees: u32, minutes: u32, seconds_num: u32, seconds_den: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(24);
    bytes.extend_from_slice(&degrees.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&minutes.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&seconds_num.to_le_bytes());
    bytes.extend_from_slice(&seconds_den.to_le_bytes());
    bytes
}

/// Split a decimal coordinate into degrees, minutes, and 1/10000ths of a second.
fn deg_to_dms(coord: f64) -> (u32, u32, u32) {
    let abs = coord.abs();
    let deg = abs.floor() as u32;
    let min = ((abs - deg as f64) * 60.0).floor() as u32;
    let sec = ((abs - deg as f64 - min as f64 / 60.0) * 3600.0 * 10000.0).round() as u32;
    (deg, min, sec)
}

/// Collect GPS tags (refs and coordinates) into the tag list.
fn collect_gps_tags(tags: &mut Vec<ExifTag>, lat: f64, lon: f64) {
    let lat_ref = if lat >= 0.0 { "N" } else { "S" };
    let lon_ref = if lon >= 0.0 { "E" } else { "W" };

    let (lat_deg, lat_min, lat_sec) = deg_to_dms(lat);
    let (lon_deg, lon_min, lon_sec) = deg_to_dms(lon);

    if let Ok(tag) = ExifTag::from_u16_with_data(
        TAG_GPS_LATITUDE_REF,
        &ExifTagFormat::STRING,
        &format!("{lat_ref}\0").into_bytes(),
        &Endian::Little,
        &ExifTagGroup::GPSIFD,
    ) {
        tags.push(tag);
    }

    let lat_bytes = encode_gps_rational(lat_deg, lat_min, lat_sec, 10000);
    if let Ok(tag) = ExifTag::from_u16_with_data(
        TAG_GPS_LATITUDE,
        &ExifTagFormat::RATIONAL64U,
        &lat_bytes,
        &Endian::Little,
        &ExifTagGroup::GPSIFD,
    ) {
        tags.push(tag);
    }

    if let Ok(tag) = ExifTag::from_u16_with_data(
        TAG_GPS_LONGITUDE_REF,
        &ExifTagFormat::STRING,
        &format!("{lon_ref}\0").into_bytes(),
        &Endian::Little,
        &ExifTagGroup::GPSIFD,
    ) {
        tags.push(tag);
    }

    let lon_bytes = encode_gps_rational(lon_deg, lon_min, lon_sec, 10000);
    if let Ok(tag) = ExifTag::from_u16_with_data(
        TAG_GPS_LONGITUDE,
        &ExifTagFormat::RATIONAL64U,
        &lon_bytes,
        &Endian::Little,
        &ExifTagGroup::GPSIFD,
    ) {
        tags.push(tag);
    }
}
