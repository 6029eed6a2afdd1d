//! Typed representation of the field schema an extraction targets.
//!
//! A [`Schema`] is an ordered set of named, typed fields. Order is
//! semantically irrelevant but preserved from the source, so prompt
//! rendering is deterministic.
//!
//! # Examples
//!
//! Validating a schema from its JSON source:
//!
//! ```
//! use ordis::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::validate(&json!({
//!     "fields": {
//!         "name": { "type": "string", "description": "Full name" },
//!         "age": { "type": "number", "required": false }
//!     }
//! })).unwrap();
//!
//! assert_eq!(schema.len(), 2);
//! assert!(schema.get("name").unwrap().required);
//! ```
//!
//! Building one programmatically:
//!
//! ```
//! use ordis::schema::{FieldSpec, FieldType, Schema};
//!
//! let schema = Schema::builder()
//!     .field("status", FieldSpec::new(FieldType::Enum(vec![
//!         "open".into(), "closed".into(),
//!     ])))
//!     .field("amount", FieldSpec::new(FieldType::Number))
//!     .build()
//!     .unwrap();
//! ```

mod builder;
pub mod loader;

pub use builder::SchemaBuilder;

use crate::error::{ExtractError, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

/// The type a schema field expects the model to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// An ISO-8601 calendar date (`YYYY-MM-DD`), carried as a JSON string.
    Date,
    /// One of a closed set of string values.
    Enum(Vec<String>),
    /// A JSON array, optionally with a declared element type.
    Array(Option<Box<FieldType>>),
    /// A free-form JSON object.
    Object,
}

impl FieldType {
    /// Short name used when rendering the schema into a prompt.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Enum(_) => "enum",
            FieldType::Array(_) => "array",
            FieldType::Object => "object",
        }
    }

    /// Whether a JSON value conforms to this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Date => value
                .as_str()
                .is_some_and(|s| s.parse::<NaiveDate>().is_ok()),
            FieldType::Enum(values) => value
                .as_str()
                .is_some_and(|s| values.iter().any(|v| v == s)),
            FieldType::Array(items) => match value.as_array() {
                Some(arr) => match items {
                    Some(item_type) => arr.iter().all(|v| item_type.accepts(v)),
                    None => true,
                },
                None => false,
            },
            FieldType::Object => value.is_object(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Enum(values) => write!(f, "enum({})", values.join("|")),
            FieldType::Array(Some(items)) => write!(f, "array of {}", items),
            _ => f.write_str(self.name()),
        }
    }
}

/// Specification for one named field in a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    /// Defaults to `true`.
    pub required: bool,
    pub description: Option<String>,
}

impl FieldSpec {
    /// Create a required field of the given type with no description.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            description: None,
        }
    }

    /// Mark the field optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attach a human-readable description (rendered into the prompt).
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// An ordered set of named, typed fields to extract.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    /// Create a schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Validate a JSON schema source of the form
    /// `{ "fields": { "<name>": { "type": ..., ... }, ... } }`.
    ///
    /// Fails with a schema error when a field has an unrecognized `type`
    /// or a malformed enum/array specification. Field order in the source
    /// is preserved.
    pub fn validate(source: &Value) -> Result<Schema> {
        let fields_obj = source
            .get("fields")
            .and_then(|f| f.as_object())
            .ok_or_else(|| {
                ExtractError::Schema("schema source must have a \"fields\" object".into())
            })?;

        let mut builder = Schema::builder();
        for (name, spec) in fields_obj {
            builder = builder.field(name, parse_field_spec(name, spec)?);
        }
        builder.build()
    }

    pub(crate) fn from_fields(fields: Vec<(String, FieldSpec)>) -> Self {
        Self { fields }
    }

    /// Iterate `(name, spec)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn parse_field_spec(name: &str, spec: &Value) -> Result<FieldSpec> {
    let obj = spec.as_object().ok_or_else(|| {
        ExtractError::Schema(format!("field '{name}': specification must be an object"))
    })?;

    let type_name = obj.get("type").and_then(|t| t.as_str()).ok_or_else(|| {
        ExtractError::Schema(format!("field '{name}': missing or non-string \"type\""))
    })?;

    let field_type = parse_field_type(name, type_name, obj)?;

    let required = match obj.get("required") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            return Err(ExtractError::Schema(format!(
                "field '{name}': \"required\" must be a boolean"
            )))
        }
    };

    let description = obj
        .get("description")
        .and_then(|d| d.as_str())
        .map(str::to_string);

    Ok(FieldSpec {
        field_type,
        required,
        description,
    })
}

fn parse_field_type(
    name: &str,
    type_name: &str,
    obj: &serde_json::Map<String, Value>,
) -> Result<FieldType> {
    match type_name {
        "string" => Ok(FieldType::String),
        "number" => Ok(FieldType::Number),
        "boolean" => Ok(FieldType::Boolean),
        "date" => Ok(FieldType::Date),
        "object" => Ok(FieldType::Object),
        "enum" => {
            let values = obj
                .get("values")
                .and_then(|v| v.as_array())
                .ok_or_else(|| {
                    ExtractError::Schema(format!(
                        "field '{name}': enum requires a \"values\" array"
                    ))
                })?;
            if values.is_empty() {
                return Err(ExtractError::Schema(format!(
                    "field '{name}': enum \"values\" must not be empty"
                )));
            }
            let values = values
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        ExtractError::Schema(format!(
                            "field '{name}': enum values must be strings"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(FieldType::Enum(values))
        }
        "array" => {
            let items = match obj.get("items") {
                None => None,
                Some(Value::String(item_type)) => {
                    // Bare type name, e.g. "items": "string"
                    Some(parse_field_type(name, item_type, &serde_json::Map::new())?)
                }
                Some(Value::Object(item_obj)) => {
                    let item_type =
                        item_obj.get("type").and_then(|t| t.as_str()).ok_or_else(|| {
                            ExtractError::Schema(format!(
                                "field '{name}': array \"items\" object needs a \"type\""
                            ))
                        })?;
                    Some(parse_field_type(name, item_type, item_obj)?)
                }
                Some(_) => {
                    return Err(ExtractError::Schema(format!(
                        "field '{name}': array \"items\" must be a type name or an object"
                    )))
                }
            };
            Ok(FieldType::Array(items.map(Box::new)))
        }
        other => Err(ExtractError::Schema(format!(
            "field '{name}': unrecognized type \"{other}\""
        ))),
    }
}
