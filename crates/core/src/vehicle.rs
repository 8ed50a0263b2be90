//! License plate normalization.

use crate::error::CoreError;

/// Maximum stored length of a license plate.
pub const MAX_PLATE_LEN: usize = 20;

/// Normalize a license plate into its canonical stored form.
///
/// Whitespace is removed and letters are upper-cased, so `"ab 123"` and
/// `"AB123"` identify the same vehicle. The result must be 1 to
/// [`MAX_PLATE_LEN`] characters, each a letter or digit in any script or `-`,
/// so regional plates such as `"京A12345"` are accepted as-is.
pub fn normalize_plate(raw: &str) -> Result<String, CoreError> {
    let plate: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();

    if plate.is_empty() {
        return Err(CoreError::Validation("vehicle_id must not be empty".into()));
    }
    if plate.chars().count() > MAX_PLATE_LEN {
        return Err(CoreError::Validation(format!(
            "vehicle_id must be at most {MAX_PLATE_LEN} characters"
        )));
    }
    if let Some(bad) = plate.chars().find(|c| !c.is_alphanumeric() && *c != '-') {
        return Err(CoreError::Validation(format!(
            "vehicle_id contains invalid character '{bad}'"
        )));
    }
    Ok(plate)
}
