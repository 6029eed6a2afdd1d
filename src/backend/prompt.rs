//! Deterministic prompt construction from a schema and raw input.
//!
//! The prompt is always exactly two messages: one system message carrying
//! the schema rendering plus the fixed output contract, and one user message
//! carrying the raw input verbatim. Keeping the input in its own message
//! means input content can never be mistaken for instructions. The build is
//! a pure function of `(schema, input)`: no timestamps, no randomness, so
//! identical inputs yield byte-identical messages.

use crate::backend::messages::ChatMessage;
use crate::schema::Schema;
use std::fmt::Write;

/// Fixed instruction describing the required response shape.
const OUTPUT_CONTRACT: &str = "Respond with a single JSON object of exactly this shape and nothing else (no prose, no code fences):\n\
{\"data\": {<field>: <value>, ...}, \"confidence\": <number 0-100>, \"confidenceByField\": {<field>: <number 0-100>, ...}}\n\
Set \"confidence\" to your overall certainty and \"confidenceByField\" to your certainty per field. \
Use null for optional fields that are absent from the text. Do not invent values.";

/// Build the chat message sequence for one extraction.
pub fn build_messages(schema: &Schema, input: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(render_system(schema)),
        ChatMessage::user(input),
    ]
}

fn render_system(schema: &Schema) -> String {
    let mut out = String::from(
        "You are a data extraction engine. Extract the following fields from the user's text.\n\nFields:\n",
    );
    for (name, spec) in schema.iter() {
        let requirement = if spec.required { "required" } else { "optional" };
        // Write into a String cannot fail
        let _ = write!(out, "- {} ({}, {})", name, spec.field_type, requirement);
        if let Some(desc) = &spec.description {
            let _ = write!(out, ": {desc}");
        }
        out.push('\n');
    }
    out.push('\n');
    out.push_str(OUTPUT_CONTRACT);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::messages::ChatRole;
    use crate::schema::{FieldSpec, FieldType, Schema};

    fn sample_schema() -> Schema {
        Schema::builder()
            .field(
                "name",
                FieldSpec::new(FieldType::String).describe("Full name"),
            )
            .field("age", FieldSpec::new(FieldType::Number).optional())
            .field(
                "tier",
                FieldSpec::new(FieldType::Enum(vec!["gold".into(), "silver".into()])),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn produces_one_system_and_one_user_message() {
        let messages = build_messages(&sample_schema(), "Name: Ada");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].role, ChatRole::User);
    }

    #[test]
    fn user_message_is_the_raw_input_verbatim() {
        let input = "Name: Ada\nAge: 36\n\n  trailing whitespace  ";
        let messages = build_messages(&sample_schema(), input);
        assert_eq!(messages[1].content, input);
    }

    #[test]
    fn system_message_renders_every_field() {
        let messages = build_messages(&sample_schema(), "x");
        let system = &messages[0].content;
        assert!(system.contains("- name (string, required): Full name"));
        assert!(system.contains("- age (number, optional)"));
        assert!(system.contains("- tier (enum(gold|silver), required)"));
        assert!(system.contains("confidenceByField"));
    }

    #[test]
    fn build_is_deterministic() {
        let schema = sample_schema();
        let a = build_messages(&schema, "Name: Ada");
        let b = build_messages(&schema, "Name: Ada");
        assert_eq!(a, b);
    }
}
