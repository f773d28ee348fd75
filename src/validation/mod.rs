// Request payload validation and multipart field coercion.
//
// Pure transformations: raw text fields in, typed values or a full list of
// field-level violations out. HTML forms transmit everything as strings, so
// boolean/numeric coercion lives here rather than in the entity services.

pub mod forms;

use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 4000;

/// A single field-level violation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Accumulates violations so a failing payload reports every problem at once
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_inner(self) -> Vec<FieldError> {
        self.errors
    }

    /// Ok(()) when no violations were recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let paths: Vec<&str> = self.errors.iter().map(|e| e.path.as_str()).collect();
        write!(f, "validation failed: {}", paths.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a required name field
pub fn check_name(errors: &mut ValidationErrors, path: &str, value: Option<&str>) {
    match value.map(str::trim) {
        None | Some("") => errors.push(path, "is required"),
        Some(v) if v.len() > MAX_NAME_LEN => {
            errors.push(path, format!("must be at most {} characters", MAX_NAME_LEN))
        }
        Some(_) => {}
    }
}

/// Validate an optional description field
pub fn check_description(errors: &mut ValidationErrors, path: &str, value: Option<&str>) {
    if let Some(v) = value {
        if v.len() > MAX_DESCRIPTION_LEN {
            errors.push(path, format!("must be at most {} characters", MAX_DESCRIPTION_LEN));
        }
    }
}

/// Coerce a stringified boolean form field. Absent or unparsable values fall
/// back to `default` rather than failing the request.
pub fn coerce_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") | Some("yes") | Some("on") => true,
        Some("false") | Some("0") | Some("no") | Some("off") => false,
        _ => default,
    }
}

/// Coerce a stringified integer form field, falling back to `default`
pub fn coerce_i32(value: Option<&str>, default: i32) -> i32 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parse an optional price. Empty string and absent both mean "no price"
/// (paired with `isContactForPrice`); a present but malformed value is a
/// violation.
pub fn parse_price(
    errors: &mut ValidationErrors,
    path: &str,
    value: Option<&str>,
) -> Option<Decimal> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
    match Decimal::from_str(raw) {
        Ok(d) if d.is_sign_negative() => {
            errors.push(path, "must not be negative");
            None
        }
        Ok(d) => Some(d),
        Err(_) => {
            errors.push(path, "must be a number");
            None
        }
    }
}

/// Parse a category ID list transmitted as a form string: either a JSON array
/// (`"[1,2,3]"`) or a comma-separated list (`"1,2,3"`).
pub fn parse_id_list(
    errors: &mut ValidationErrors,
    path: &str,
    value: Option<&str>,
) -> Option<Vec<i64>> {
    let raw = value.map(str::trim)?;
    if raw.is_empty() {
        return Some(Vec::new());
    }

    if raw.starts_with('[') {
        match serde_json::from_str::<Vec<i64>>(raw) {
            Ok(mut ids) => {
                ids.sort_unstable();
                ids.dedup();
                return Some(ids);
            }
            Err(_) => {
                errors.push(path, "must be a JSON array of numeric IDs");
                return None;
            }
        }
    }

    let mut ids = Vec::new();
    for part in raw.split(',') {
        match part.trim().parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => {
                errors.push(path, format!("'{}' is not a numeric ID", part.trim()));
                return None;
            }
        }
    }
    ids.sort_unstable();
    ids.dedup();
    Some(ids)
}

/// Parse a `machineData` form field into a JSON object
pub fn parse_json_object(
    errors: &mut ValidationErrors,
    path: &str,
    value: Option<&str>,
) -> Option<serde_json::Map<String, serde_json::Value>> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        Ok(_) => {
            errors.push(path, "must be a JSON object");
            None
        }
        Err(_) => {
            errors.push(path, "must be valid JSON");
            None
        }
    }
}
