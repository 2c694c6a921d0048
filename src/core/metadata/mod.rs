//! # Metadata Module
//!
//! Extracts EXIF metadata from product images and scores how alike two
//! records are.
//!
//! ## Extracted Fields
//! - Camera make and model
//! - Capture date/time (DateTimeOriginal)
//! - ISO (PhotographicSensitivity)
//! - Focal length
//! - Aperture (FNumber)
//!
//! ## Supported Formats
//! EXIF metadata is typically found in JPEG, TIFF and WebP files. PNG, BMP
//! and GIF sources normally carry none, which is not an error.

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Cursor, Seek};

/// Camera metadata read from an image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExifRecord {
    /// Camera make (e.g., "Canon")
    pub camera_make: Option<String>,
    /// Camera model (e.g., "EOS R5")
    pub camera_model: Option<String>,
    /// Raw DateTimeOriginal, "YYYY:MM:DD HH:MM:SS"
    pub datetime: Option<String>,
    pub iso: Option<u32>,
    /// Focal length in millimetres
    pub focal_length: Option<f64>,
    /// Aperture as an f-number
    pub aperture: Option<f64>,
}

impl ExifRecord {
    /// Check if any field was extracted
    pub fn has_data(&self) -> bool {
        self.camera_make.is_some()
            || self.camera_model.is_some()
            || self.datetime.is_some()
            || self.iso.is_some()
            || self.focal_length.is_some()
            || self.aperture.is_some()
    }

    /// Date portion of the capture time, ignoring the time of day
    pub fn capture_date(&self) -> Option<String> {
        let raw = self.datetime.as_deref()?;
        match NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S") {
            Ok(parsed) => Some(parsed.date().format("%Y-%m-%d").to_string()),
            Err(_) => Some(raw.chars().take(10).collect()),
        }
    }
}

/// Read EXIF metadata from an in-memory image; `None` when it carries none
pub fn extract_exif_from_bytes(bytes: &[u8]) -> Option<ExifRecord> {
    read_exif(&mut Cursor::new(bytes))
}

fn read_exif<R: BufRead + Seek>(reader: &mut R) -> Option<ExifRecord> {
    let exif = Reader::new().read_from_container(reader).ok()?;
    let field = |tag: Tag| exif.get_field(tag, In::PRIMARY).map(|f| &f.value);

    let record = ExifRecord {
        camera_make: field(Tag::Make).and_then(get_string_value),
        camera_model: field(Tag::Model).and_then(get_string_value),
        datetime: field(Tag::DateTimeOriginal).and_then(get_string_value),
        iso: field(Tag::PhotographicSensitivity).and_then(get_u32_value),
        focal_length: field(Tag::FocalLength).and_then(get_rational_value),
        aperture: field(Tag::FNumber).and_then(get_rational_value),
    };

    record.has_data().then_some(record)
}

/// Fraction of shared fields that agree.
///
/// Make, model, capture date and ISO are compared, each only when both
/// records carry it. Returns 0.0 when no field is comparable.
pub fn exif_similarity(a: &ExifRecord, b: &ExifRecord) -> f64 {
    fn compare<T: PartialEq>(x: Option<T>, y: Option<T>, total: &mut u32, matches: &mut u32) {
        if let (Some(x), Some(y)) = (x, y) {
            *total += 1;
            if x == y {
                *matches += 1;
            }
        }
    }

    let mut total = 0;
    let mut matches = 0;
    compare(a.camera_make.as_ref(), b.camera_make.as_ref(), &mut total, &mut matches);
    compare(a.camera_model.as_ref(), b.camera_model.as_ref(), &mut total, &mut matches);
    compare(a.capture_date(), b.capture_date(), &mut total, &mut matches);
    compare(a.iso, b.iso, &mut total, &mut matches);

    if total == 0 {
        0.0
    } else {
        matches as f64 / total as f64
    }
}

fn get_u32_value(value: &Value) -> Option<u32> {
    match value {
        Value::Long(vec) => vec.first().copied(),
        Value::Short(vec) => vec.first().map(|v| *v as u32),
        _ => None,
    }
}

fn get_rational_value(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(vec) => vec.first().filter(|r| r.denom != 0).map(|r| r.to_f64()),
        _ => None,
    }
}

fn get_string_value(value: &Value) -> Option<String> {
    if let Value::Ascii(ref vec) = value {
        if let Some(bytes) = vec.first() {
            if let Ok(s) = std::str::from_utf8(bytes) {
                let trimmed = s.trim_end_matches('\0').trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }
    None
}
