use chrono::NaiveDate;

use super::reader::ExifData;
use crate::api::ScanRecord;

/// The EXIF fields the tagger wants a file to carry, flattened from a
/// catalogue Scan record. Fields the catalogue has no value for stay `None`
/// and are never written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet {
    /// Scan UUID, written to `ImageUniqueID`.
    pub scan_id: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub body_serial: Option<String>,
    pub lens_make: Option<String>,
    pub lens_model: Option<String>,
    pub lens_serial: Option<String>,
    /// Negative caption, written to `ImageDescription`.
    pub description: Option<String>,
    /// Film stock and notes, written to `UserComment`.
    pub user_comment: Option<String>,
    /// Photographer, written to `Artist`.
    pub artist: Option<String>,
    pub copyright: Option<String>,
    /// `YYYY:MM:DD 00:00:00` — the negative's date; wall-clock time unknown.
    pub date_time_original: Option<String>,
    /// Exposure time as a rational in seconds, e.g. `(1, 250)`.
    pub exposure_time: Option<(u32, u32)>,
    pub f_number: Option<f64>,
    pub iso: Option<u32>,
    /// Focal length in mm.
    pub focal_length: Option<u32>,
    pub focal_length_35mm: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One pending tag write, for display and confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct TagChange {
    pub tag: &'static str,
    pub old: Option<String>,
    pub new: String,
}

/// The outcome of diffing a file against the catalogue: the subset of tags
/// to write plus the human-readable change list.
#[derive(Debug, Clone, Default)]
pub struct TagPlan {
    pub tags: TagSet,
    pub changes: Vec<TagChange>,
}

/// Flatten a catalogue Scan record into EXIF field values.
pub fn scan_to_tags(scan: &ScanRecord) -> TagSet {
    let mut tags = TagSet {
        scan_id: Some(scan.uuid.clone()),
        ..TagSet::default()
    };

    let Some(neg) = scan.negative.as_ref() else {
        return tags;
    };

    tags.make = clean(&neg.camera_make);
    tags.model = clean(&neg.camera_model);
    tags.body_serial = clean(&neg.camera_serial);
    tags.lens_make = clean(&neg.lens_make);
    tags.lens_model = clean(&neg.lens_model);
    tags.lens_serial = clean(&neg.lens_serial);
    tags.description = clean(&neg.caption);
    tags.user_comment = build_comment(neg.film_stock.as_deref(), neg.notes.as_deref());
    tags.artist = clean(&neg.photographer);
    tags.copyright = clean(&neg.copyright);
    tags.date_time_original = neg.date.map(format_exif_date);
    tags.exposure_time = neg.shutter_speed.as_deref().and_then(parse_shutter_speed);
    tags.f_number = neg.aperture;
    tags.iso = neg.film_speed;
    tags.focal_length = neg.focal_length;
    tags.focal_length_35mm = neg.focal_length_35mm;
    tags.latitude = neg.latitude;
    tags.longitude = neg.longitude;

    tags
}

/// Diff a file's existing EXIF against the wanted tags.
///
/// The diff flows one way, catalogue → file: a field enters the plan only
/// when the catalogue has a value and the file's value differs. Fields the
/// file has but the catalogue doesn't are left alone.
pub fn plan_changes(existing: &ExifData, wanted: &TagSet) -> TagPlan {
    let mut plan = TagPlan::default();

    diff_string(&mut plan, "ImageUniqueID", &existing.scan_id, &wanted.scan_id, |p, v| {
        p.tags.scan_id = Some(v)
    });
    diff_string(&mut plan, "Make", &existing.make, &wanted.make, |p, v| {
        p.tags.make = Some(v)
    });
    diff_string(&mut plan, "Model", &existing.model, &wanted.model, |p, v| {
        p.tags.model = Some(v)
    });
    diff_string(
        &mut plan,
        "BodySerialNumber",
        &existing.body_serial,
        &wanted.body_serial,
        |p, v| p.tags.body_serial = Some(v),
    );
    diff_string(&mut plan, "LensMake", &existing.lens_make, &wanted.lens_make, |p, v| {
        p.tags.lens_make = Some(v)
    });
    diff_string(&mut plan, "LensModel", &existing.lens_model, &wanted.lens_model, |p, v| {
        p.tags.lens_model = Some(v)
    });
    diff_string(
        &mut plan,
        "LensSerialNumber",
        &existing.lens_serial,
        &wanted.lens_serial,
        |p, v| p.tags.lens_serial = Some(v),
    );
    diff_string(
        &mut plan,
        "ImageDescription",
        &existing.description,
        &wanted.description,
        |p, v| p.tags.description = Some(v),
    );
    diff_string(
        &mut plan,
        "UserComment",
        &existing.user_comment,
        &wanted.user_comment,
        |p, v| p.tags.user_comment = Some(v),
    );
    diff_string(&mut plan, "Artist", &existing.artist, &wanted.artist, |p, v| {
        p.tags.artist = Some(v)
    });
    diff_string(&mut plan, "Copyright", &existing.copyright, &wanted.copyright, |p, v| {
        p.tags.copyright = Some(v)
    });
    diff_string(
        &mut plan,
        "DateTimeOriginal",
        &existing.date_time_original,
        &wanted.date_time_original,
        |p, v| p.tags.date_time_original = Some(v),
    );

    if let Some((num, den)) = wanted.exposure_time {
        let new = num as f64 / den as f64;
        if !approx_eq(existing.exposure_time, new) {
            plan.tags.exposure_time = Some((num, den));
            plan.changes.push(TagChange {
                tag: "ExposureTime",
                old: existing.exposure_time.map(|v| format!("{v}")),
                new: format!("{num}/{den}"),
            });
        }
    }

    if let Some(new) = wanted.f_number {
        if !approx_eq(existing.f_number, new) {
            plan.tags.f_number = Some(new);
            plan.changes.push(TagChange {
                tag: "FNumber",
                old: existing.f_number.map(|v| format!("{v}")),
                new: format!("{new}"),
            });
        }
    }

    diff_u32(&mut plan, "ISO", existing.iso, wanted.iso, |p, v| p.tags.iso = Some(v));
    diff_u32(
        &mut plan,
        "FocalLength",
        existing.focal_length,
        wanted.focal_length,
        |p, v| p.tags.focal_length = Some(v),
    );
    diff_u32(
        &mut plan,
        "FocalLengthIn35mmFilm",
        existing.focal_length_35mm,
        wanted.focal_length_35mm,
        |p, v| p.tags.focal_length_35mm = Some(v),
    );

    // GPS is written as a pair; existing coordinates are never overwritten
    if let (Some(lat), Some(lon)) = (wanted.latitude, wanted.longitude) {
        if !existing.has_gps {
            plan.tags.latitude = Some(lat);
            plan.tags.longitude = Some(lon);
            plan.changes.push(TagChange {
                tag: "GPSLatitude",
                old: None,
                new: format!("{lat:.6}"),
            });
            plan.changes.push(TagChange {
                tag: "GPSLongitude",
                old: None,
                new: format!("{lon:.6}"),
            });
        }
    }

    plan
}

fn diff_string(
    plan: &mut TagPlan,
    tag: &'static str,
    existing: &Option<String>,
    wanted: &Option<String>,
    apply: impl FnOnce(&mut TagPlan, String),
) {
    if let Some(new) = wanted {
        if existing.as_deref() != Some(new.as_str()) {
            apply(plan, new.clone());
            plan.changes.push(TagChange {
                tag,
                old: existing.clone(),
                new: new.clone(),
            });
        }
    }
}

fn diff_u32(
    plan: &mut TagPlan,
    tag: &'static str,
    existing: Option<u32>,
    wanted: Option<u32>,
    apply: impl FnOnce(&mut TagPlan, u32),
) {
    if let Some(new) = wanted {
        if existing != Some(new) {
            apply(plan, new);
            plan.changes.push(TagChange {
                tag,
                old: existing.map(|v| v.to_string()),
                new: new.to_string(),
            });
        }
    }
}

// Relative tolerance: an absolute epsilon would collapse fast shutter
// speeds (1/4000 and 1/6400 differ by under 1e-4 seconds).
fn approx_eq(existing: Option<f64>, new: f64) -> bool {
    existing.is_some_and(|old| (old - new).abs() <= new.abs() * 1e-3)
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Combine film stock and negative notes into one UserComment value.
fn build_comment(film_stock: Option<&str>, notes: Option<&str>) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(stock) = film_stock.map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(format!("Film: {stock}"));
    }
    if let Some(notes) = notes.map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(notes.to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(". "))
    }
}

/// Format a date as EXIF expects: `YYYY:MM:DD HH:MM:SS`.
fn format_exif_date(date: NaiveDate) -> String {
    date.format("%Y:%m:%d 00:00:00").to_string()
}

/// Parse a shutter speed like `1/250`, `0.5` or `2` into a rational in seconds.
fn parse_shutter_speed(s: &str) -> Option<(u32, u32)> {
    let s = s.trim().trim_end_matches(['s', '"']);
    if let Some((num, den)) = s.split_once('/') {
        let num: u32 = num.trim().parse().ok()?;
        let den: u32 = den.trim().parse().ok()?;
        if den == 0 {
            return None;
        }
        return Some((num, den));
    }
    let secs: f64 = s.parse().ok()?;
    if !(secs > 0.0) {
        return None;
    }
    if secs >= 1.0 {
        Some((secs.round() as u32, 1))
    } else {
        // Sub-second decimal: express as 1/x
        Some((1, (1.0 / secs).round() as u32))
    }
}
