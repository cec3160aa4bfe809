use crate::error::PlanError;
use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};
use webpilot_core::ToolName;

/// The fixed plan wire schema, parameterized by the accepted tool vocabulary.
pub fn plan_schema_document(vocabulary: &[&str]) -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "required": ["reasoning_summary", "plan_id", "autonomy_level", "steps"],
        "properties": {
            "reasoning_summary": {"type": "string"},
            "plan_id": {"type": "string", "minLength": 1},
            "autonomy_level": {"type": "string", "enum": ["assisted", "semi_auto", "auto"]},
            "steps": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["tool", "args", "explanation", "estimated_risk", "confidence"],
                    "properties": {
                        "tool": {"type": "string", "enum": vocabulary},
                        "args": {"type": "object"},
                        "explanation": {"type": "string"},
                        "estimated_risk": {"type": "string", "enum": ["low", "medium", "high"]},
                        "confidence": {"type": "number", "minimum": 0, "maximum": 1}
                    }
                }
            }
        }
    })
}

/// Compiled plan schema over the full tool vocabulary.
pub struct PlanSchema {
    document: Value,
    compiled: JSONSchema,
}

impl PlanSchema {
    pub fn new() -> Result<Self, PlanError> {
        Self::for_vocabulary(&ToolName::vocabulary())
    }

    pub fn for_vocabulary(vocabulary: &[&str]) -> Result<Self, PlanError> {
        let document = plan_schema_document(vocabulary);
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&document)
            .map_err(|e| PlanError::Schema {
                message: e.to_string(),
            })?;
        Ok(Self { document, compiled })
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Every violation, each prefixed with its JSON pointer.
    pub fn validate(&self, instance: &Value) -> Result<(), Vec<String>> {
        match self.compiled.validate(instance) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .map(|e| {
                    let pointer = e.instance_path.to_string();
                    if pointer.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", pointer, e)
                    }
                })
                .collect()),
        }
    }
}
