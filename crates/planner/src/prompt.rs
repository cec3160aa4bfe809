//! Request construction for the plan generator.

use serde_json::{json, Value};
use webpilot_core::{AutonomyLevel, ContextSnapshot, ToolCatalog};

/// Interactables embedded in a prompt are capped to bound its size.
pub const MAX_CONTEXT_ELEMENTS: usize = 50;

pub fn system_prompt(
    profile: &str,
    autonomy: AutonomyLevel,
    catalog: &ToolCatalog,
    constraints: &str,
) -> String {
    let tools = catalog
        .entries()
        .map(|entry| format!("- {} (risk: {}): {}", entry.name, entry.risk, entry.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You plan browser actions for a user goal.\n\
         Guardrail profile: {profile}. Autonomy level: {autonomy}.\n\
         Policy constraints: {constraints}\n\n\
         Available tools:\n{tools}\n\n\
         Respond with exactly one JSON object with the fields reasoning_summary, plan_id, \
         autonomy_level and steps. Each step has tool, args (an object of named arguments), \
         explanation, estimated_risk (low, medium or high) and confidence (a number from 0 to 1). \
         Points are {{\"x\": .., \"y\": ..}} in pixels, or fractions in [-1, 1] of the viewport. \
         Do not add any other top-level fields."
    )
}

/// Context serialization with the interactable list truncated to `max_elements`.
pub fn context_payload(context: &ContextSnapshot, max_elements: usize) -> Value {
    let shown = context.interactables.len().min(max_elements);
    json!({
        "url": context.url,
        "origin": context.origin,
        "title": context.title,
        "viewport": context.viewport,
        "has_screenshot": context.screenshot.is_some(),
        "interactable_count": context.interactables.len(),
        "interactables": &context.interactables[..shown],
    })
}

pub fn user_prompt(goal: &str, context: &Value) -> String {
    format!("Goal: {}\n\nPage context:\n{}", goal.trim(), context)
}

pub fn repair_instruction(errors: &[String]) -> String {
    format!(
        "Your previous response did not match the required plan schema:\n- {}\n\
         Return a corrected plan as a single JSON object and nothing else.",
        errors.join("\n- ")
    )
}
