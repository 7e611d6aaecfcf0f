use cvtext_core::error::CvtextError;
use serde::Serialize;

pub fn to_string<T: Serialize>(value: &T) -> Result<String, CvtextError> {
    Ok(serde_json::to_string_pretty(value)?)
}
