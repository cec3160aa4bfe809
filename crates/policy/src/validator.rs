use crate::error::PolicyError;
use crate::password::looks_like_password_field;
use crate::profile::GuardrailProfile;
use std::str::FromStr;
use webpilot_core::{Plan, Step, ToolCatalog, ToolName};

/// Argument keys that may carry a text-entry target identifier.
const TARGET_KEYS: &[&str] = &["target", "selector", "field", "name"];

/// Check a normalized plan against a profile and the catalog in force.
///
/// Fail-fast: the step count is checked first, then each step in order, and
/// the first violation is returned.
pub fn validate(
    plan: &Plan,
    profile: &GuardrailProfile,
    catalog: &ToolCatalog,
) -> Result<(), PolicyError> {
    if plan.steps.len() > profile.max_steps {
        return Err(PolicyError::MaxStepsExceeded {
            max: profile.max_steps,
            actual: plan.steps.len(),
        });
    }

    for (index, step) in plan.steps.iter().enumerate() {
        if !catalog.contains(&step.tool) {
            return Err(PolicyError::UnknownTool {
                index,
                tool: step.tool.clone(),
            });
        }

        if profile.is_blocked(&step.tool) {
            return Err(PolicyError::ToolBlocked {
                index,
                tool: step.tool.clone(),
                profile: profile.name.clone(),
            });
        }

        if !profile.allow_password {
            if let Some(target) = password_target(step) {
                return Err(PolicyError::PasswordFieldBlocked {
                    index,
                    tool: step.tool.clone(),
                    target: target.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// The password-like target of a text-entry step, if any.
pub fn password_target(step: &Step) -> Option<&str> {
    let is_text_entry = ToolName::from_str(&step.tool)
        .map(|t| t.is_text_entry())
        .unwrap_or(false);
    if !is_text_entry {
        return None;
    }

    TARGET_KEYS
        .iter()
        .filter_map(|key| step.arg_str(key))
        .find(|value| looks_like_password_field(value))
}
