//! Fluent construction of [`Schema`] values.

use super::{FieldSpec, Schema};
use crate::error::{ExtractError, Result};

/// Builder for [`Schema`].
///
/// Fields are kept in insertion order. Duplicate names are rejected at
/// [`build`](SchemaBuilder::build) time; a JSON source cannot carry
/// observable duplicates, so this seam is where the check lives.
///
/// # Example
///
/// ```
/// use ordis::schema::{FieldSpec, FieldType, Schema};
///
/// let schema = Schema::builder()
///     .field("title", FieldSpec::new(FieldType::String).describe("Document title"))
///     .field("pages", FieldSpec::new(FieldType::Number).optional())
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, FieldSpec)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Order of calls is the order the schema renders in.
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    /// Finish the schema, rejecting duplicate field names.
    pub fn build(self) -> Result<Schema> {
        for (i, (name, _)) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|(n, _)| n == name) {
                return Err(ExtractError::Schema(format!(
                    "duplicate field name '{name}'"
                )));
            }
        }
        Ok(Schema::from_fields(self.fields))
    }
}
