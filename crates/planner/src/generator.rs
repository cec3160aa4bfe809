//! Plan generator with a single bounded repair retry.

use crate::coerce::coerce_plan;
use crate::error::PlanError;
use crate::prompt::{self, MAX_CONTEXT_ELEMENTS};
use crate::schema::PlanSchema;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webpilot_core::{AutonomyLevel, ContextSnapshot, Plan, ToolCatalog};
use webpilot_policy::GuardrailProfile;
use webpilot_providers::{ChatMessage, InferenceRequest, InferenceService, ResponseFormat};

/// Total generation attempts: the first try plus one repair.
pub const MAX_ATTEMPTS: usize = 2;

/// Raw-text snippets attached to diagnostics are capped at this many chars.
const SNIPPET_CHARS: usize = 400;

/// Policy information embedded in the prompt. Advisory only: the guardrail
/// validator enforces the profile independently of generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyHint {
    pub profile: String,
    pub constraints: String,
}

impl From<&GuardrailProfile> for PolicyHint {
    fn from(profile: &GuardrailProfile) -> Self {
        Self {
            profile: profile.name.clone(),
            constraints: profile.constraint_text(),
        }
    }
}

pub struct PlanRequest<'a> {
    pub goal: &'a str,
    pub context: &'a ContextSnapshot,
    pub policy: &'a PolicyHint,
    pub catalog: &'a ToolCatalog,
    pub autonomy_default: Option<AutonomyLevel>,
}

/// Accumulating conversation for one generation. Each attempt builds its
/// request from the transcript value; repairs produce a longer transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(system: String, user: String) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }

    /// Append the rejected output and a corrective instruction.
    pub fn with_repair(mut self, rejected: &str, errors: &[String]) -> Self {
        self.messages.push(ChatMessage::assistant(rejected));
        self.messages
            .push(ChatMessage::user(prompt::repair_instruction(errors)));
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

enum Rejection {
    InvalidJson(String),
    Schema(Vec<String>),
}

pub struct PlanGenerator<S: InferenceService + ?Sized> {
    service: Arc<S>,
    model: String,
    schema: PlanSchema,
    max_context_elements: usize,
}

impl<S: InferenceService + ?Sized> PlanGenerator<S> {
    pub fn new(service: Arc<S>, model: impl Into<String>) -> Result<Self, PlanError> {
        Ok(Self {
            service,
            model: model.into(),
            schema: PlanSchema::new()?,
            max_context_elements: MAX_CONTEXT_ELEMENTS,
        })
    }

    pub fn with_max_context_elements(mut self, max: usize) -> Self {
        self.max_context_elements = max;
        self
    }

    /// Generate a schema-conformant plan. No browser interaction happens here.
    pub async fn generate(&self, request: PlanRequest<'_>) -> Result<Plan, PlanError> {
        self.generate_with_attempts(request).await.0
    }

    /// Like [`generate`](Self::generate), also reporting how many model calls
    /// were made.
    pub async fn generate_with_attempts(
        &self,
        request: PlanRequest<'_>,
    ) -> (Result<Plan, PlanError>, usize) {
        let mut attempts = 0;
        let result = self.run_attempts(request, &mut attempts).await;
        (result, attempts)
    }

    async fn run_attempts(
        &self,
        request: PlanRequest<'_>,
        attempts: &mut usize,
    ) -> Result<Plan, PlanError> {
        let goal = request.goal.trim();
        if goal.is_empty() {
            return Err(PlanError::InvalidGoal {
                reason: "goal is empty".to_string(),
            });
        }

        let autonomy = request.autonomy_default.unwrap_or_default();
        let system = prompt::system_prompt(
            &request.policy.profile,
            autonomy,
            request.catalog,
            &request.policy.constraints,
        );
        let context = prompt::context_payload(request.context, self.max_context_elements);
        let mut transcript = Transcript::new(system, prompt::user_prompt(goal, &context));

        let mut last_errors = Vec::new();
        let mut last_raw = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            *attempts = attempt + 1;
            debug!("Plan generation attempt {}/{}", attempt + 1, MAX_ATTEMPTS);

            let inference = InferenceRequest {
                model: self.model.clone(),
                messages: transcript.messages().to_vec(),
                response_format: Some(ResponseFormat {
                    name: "plan".to_string(),
                    schema: self.schema.document().clone(),
                }),
            };

            let raw = self
                .service
                .complete(&inference)
                .await
                .map_err(|e| PlanError::Inference {
                    message: e.to_string(),
                })?;

            match self.accept(&raw, request.autonomy_default) {
                Ok(plan) => {
                    info!(
                        "Generated plan {} with {} steps on attempt {}",
                        plan.plan_id,
                        plan.steps.len(),
                        attempt + 1
                    );
                    return Ok(plan);
                }
                Err(Rejection::InvalidJson(message)) => {
                    warn!("Model output is not a JSON object: {}", message);
                    return Err(PlanError::InvalidJson {
                        message,
                        raw_snippet: snippet(&raw),
                    });
                }
                Err(Rejection::Schema(errors)) => {
                    warn!(
                        "Plan failed schema validation on attempt {} ({} errors)",
                        attempt + 1,
                        errors.len()
                    );
                    transcript = transcript.with_repair(&raw, &errors);
                    last_errors = errors;
                    last_raw = raw;
                }
            }
        }

        Err(PlanError::SchemaValidationFailed {
            attempts: MAX_ATTEMPTS,
            errors: last_errors,
            raw_snippet: snippet(&last_raw),
        })
    }

    fn accept(&self, raw: &str, autonomy_default: Option<AutonomyLevel>) -> Result<Plan, Rejection> {
        accept_with(&self.schema, raw, autonomy_default)
    }
}

/// Accept plan text produced elsewhere, such as a saved plan file. Same
/// extraction, coercion and schema checks as generation, without repair.
pub fn parse_plan(raw: &str, autonomy_default: Option<AutonomyLevel>) -> Result<Plan, PlanError> {
    let schema = PlanSchema::new()?;
    accept_with(&schema, raw, autonomy_default).map_err(|rejection| match rejection {
        Rejection::InvalidJson(message) => PlanError::InvalidJson {
            message,
            raw_snippet: snippet(raw),
        },
        Rejection::Schema(errors) => PlanError::SchemaValidationFailed {
            attempts: 1,
            errors,
            raw_snippet: snippet(raw),
        },
    })
}

/// Re-check a plan built in code. It takes the same coercion and schema path
/// as model output, so an empty id is replaced and confidence is pinned into
/// [0, 1] before anything runs.
pub fn accept_plan(
    plan: &Plan,
    autonomy_default: Option<AutonomyLevel>,
) -> Result<Plan, PlanError> {
    let schema = PlanSchema::new()?;
    let value = serde_json::to_value(plan).map_err(|e| PlanError::InvalidJson {
        message: e.to_string(),
        raw_snippet: String::new(),
    })?;
    let raw = value.to_string();
    accept_value(&schema, value, autonomy_default).map_err(|errors| {
        PlanError::SchemaValidationFailed {
            attempts: 1,
            errors,
            raw_snippet: snippet(&raw),
        }
    })
}

fn accept_with(
    schema: &PlanSchema,
    raw: &str,
    autonomy_default: Option<AutonomyLevel>,
) -> Result<Plan, Rejection> {
    let value = extract_json_object(raw).map_err(Rejection::InvalidJson)?;
    accept_value(schema, value, autonomy_default).map_err(Rejection::Schema)
}

fn accept_value(
    schema: &PlanSchema,
    value: Value,
    autonomy_default: Option<AutonomyLevel>,
) -> Result<Plan, Vec<String>> {
    let coerced = coerce_plan(value, autonomy_default);
    schema.validate(&coerced)?;
    serde_json::from_value(coerced).map_err(|e| vec![e.to_string()])
}

/// Parse model text as a single JSON object, tolerating Markdown fences and
/// prose around the object.
pub fn extract_json_object(raw: &str) -> Result<Value, String> {
    let trimmed = strip_fences(raw.trim());

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ Value::Object(_)) => return Ok(value),
        Ok(other) => {
            if !trimmed.contains('{') {
                return Err(format!("expected an object, got {}", json_kind(&other)));
            }
        }
        Err(e) => {
            if !trimmed.contains('{') {
                return Err(e.to_string());
            }
        }
    }

    let start = trimmed.find('{').ok_or("no object found")?;
    let end = trimmed.rfind('}').ok_or("no object found")?;
    if end <= start {
        return Err("no object found".to_string());
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(format!("expected an object, got {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn snippet(raw: &str) -> String {
    if raw.chars().count() <= SNIPPET_CHARS {
        return raw.to_string();
    }
    let cut: String = raw.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_object() {
        assert_eq!(extract_json_object(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_extract_fenced_object() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_extract_object_in_prose() {
        let raw = "Here is the plan: {\"a\": {\"b\": 2}} hope it helps";
        assert_eq!(extract_json_object(raw).unwrap(), json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_extract_rejects_non_objects() {
        assert!(extract_json_object("[1, 2]").is_err());
        assert!(extract_json_object("definitely not json").is_err());
        assert!(extract_json_object("{broken").is_err());
    }

    #[test]
    fn test_snippet_truncates_on_char_boundary() {
        let raw = "é".repeat(1000);
        let cut = snippet(&raw);
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_parse_plan_single_shot() {
        let plan = parse_plan(
            r#"{"summary": "s", "steps": [{"tool": "wait", "args": [500], "explanation": "", "estimated_risk": "low"}]}"#,
            Some(AutonomyLevel::Auto),
        )
        .unwrap();
        assert_eq!(plan.autonomy_level, AutonomyLevel::Auto);
        assert_eq!(plan.steps[0].args["ms"], 500);

        let err = parse_plan(r#"{"steps": []}"#, None).unwrap_err();
        assert!(matches!(err, PlanError::SchemaValidationFailed { attempts: 1, .. }));
    }

    #[test]
    fn test_accept_plan_repairs_id_and_confidence() {
        let mut plan = Plan::new("s", vec![webpilot_core::Step::new("wait", json!({"ms": 5}))]);
        plan.plan_id = "  ".to_string();
        plan.steps[0].confidence = 1.7;
        plan.autonomy_level = AutonomyLevel::SemiAuto;

        let accepted = accept_plan(&plan, Some(AutonomyLevel::Auto)).unwrap();
        assert!(!accepted.plan_id.trim().is_empty());
        assert_eq!(accepted.steps[0].confidence, 1.0);
        assert_eq!(accepted.autonomy_level, AutonomyLevel::SemiAuto);

        plan.steps[0].confidence = f64::NAN;
        let accepted = accept_plan(&plan, None).unwrap();
        assert_eq!(accepted.steps[0].confidence, webpilot_core::DEFAULT_CONFIDENCE);
    }

    #[test]
    fn test_accept_plan_rejects_unknown_tool() {
        let plan = Plan::new("s", vec![webpilot_core::Step::new("teleport", json!({}))]);
        let err = accept_plan(&plan, None).unwrap_err();
        assert!(matches!(err, PlanError::SchemaValidationFailed { attempts: 1, .. }));
    }

    #[test]
    fn test_transcript_accumulates() {
        let t = Transcript::new("sys".into(), "goal".into());
        let t = t.with_repair("{bad}", &["missing steps".to_string()]);
        assert_eq!(t.messages().len(), 4);
        assert_eq!(t.messages()[2].role, "assistant");
        assert_eq!(t.messages()[2].content, "{bad}");
        assert!(t.messages()[3].content.contains("missing steps"));
    }
}
