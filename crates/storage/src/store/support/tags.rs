#![forbid(unsafe_code)]

use super::super::StoreError;

/// Serializes tags as a JSON array, preserving order.
pub fn encode_tags(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

/// Inverse of [`encode_tags`]. A missing or blank blob is an empty list.
pub fn decode_tags(blob: Option<&str>) -> Result<Vec<String>, StoreError> {
    let Some(raw) = blob.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(raw).map_err(|_| StoreError::CorruptRow("tasks.tags"))
}
