//! Loading schema definitions from disk.

use super::Schema;
use crate::error::{ExtractError, Result};
use std::path::Path;
use tracing::debug;

/// Read and validate a schema definition file (JSON).
///
/// The file must contain `{ "fields": { ... } }` as accepted by
/// [`Schema::validate`].
pub fn load_schema(path: impl AsRef<Path>) -> Result<Schema> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ExtractError::Schema(format!("failed to read {}: {e}", path.display()))
    })?;
    let source: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
        ExtractError::Schema(format!("{} is not valid JSON: {e}", path.display()))
    })?;
    let schema = Schema::validate(&source)?;
    debug!(path = %path.display(), fields = schema.len(), "Loaded schema");
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reports_path() {
        let err = load_schema("/nonexistent/schema.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/schema.json"));
    }
}
