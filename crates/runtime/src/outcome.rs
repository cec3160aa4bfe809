use serde::Serialize;
use webpilot_executor::{ExecutionError, StepRecord};
use webpilot_planner::{PlanError, SkipNotice};
use webpilot_policy::PolicyError;

/// Exactly one terminal outcome per run. Each variant carries enough detail
/// to explain the result without consulting logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Ok {
        plan_id: String,
        records: Vec<StepRecord>,
        skipped: Vec<SkipNotice>,
    },
    RejectedByUser {
        plan_id: String,
    },
    PolicyBlock {
        plan_id: String,
        error: PolicyError,
    },
    PlannerError {
        error: PlanError,
        skipped: Vec<SkipNotice>,
    },
    Killed {
        plan_id: String,
        at_step: usize,
        completed: usize,
    },
    Failed {
        plan_id: String,
        index: usize,
        tool: String,
        error: ExecutionError,
        completed: usize,
    },
}

impl RunOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "ok",
            Self::RejectedByUser { .. } => "rejected_by_user",
            Self::PolicyBlock { .. } => "policy_block",
            Self::PlannerError { .. } => "planner_error",
            Self::Killed { .. } => "killed",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// One-paragraph human explanation of the outcome.
    pub fn explain(&self) -> String {
        match self {
            Self::Ok {
                plan_id,
                records,
                skipped,
            } => {
                let mut text = format!("Plan {} completed {} steps.", plan_id, records.len());
                if !skipped.is_empty() {
                    text.push_str(&format!(
                        " {} step(s) were dropped during normalization: {}.",
                        skipped.len(),
                        describe_skips(skipped)
                    ));
                }
                text
            }
            Self::RejectedByUser { plan_id } => {
                format!("Plan {} was rejected at confirmation; nothing was executed.", plan_id)
            }
            Self::PolicyBlock { plan_id, error } => {
                let location = match (error.step_index(), error.tool()) {
                    (Some(index), Some(tool)) => format!(" at step {} ({})", index, tool),
                    _ => String::new(),
                };
                format!(
                    "Plan {} was blocked by the guardrail policy{}: {}. Nothing was executed.",
                    plan_id, location, error
                )
            }
            Self::PlannerError { error, skipped } => {
                let mut text = format!("Planning failed ({}): {}.", error.code(), error);
                match error {
                    PlanError::SchemaValidationFailed { raw_snippet, .. }
                    | PlanError::InvalidJson { raw_snippet, .. } => {
                        text.push_str(&format!(" Model output began: {}", raw_snippet));
                    }
                    PlanError::EmptyAfterNormalization { .. } => {
                        text.push_str(&format!(" Dropped: {}.", describe_skips(skipped)));
                    }
                    _ => {}
                }
                text
            }
            Self::Killed {
                plan_id,
                at_step,
                completed,
            } => format!(
                "Plan {} was cancelled at step {} after {} completed step(s).",
                plan_id, at_step, completed
            ),
            Self::Failed {
                plan_id,
                index,
                tool,
                error,
                completed,
            } => format!(
                "Plan {} failed at step {} ({}) after {} completed step(s): {}. The run was aborted.",
                plan_id, index, tool, completed, error
            ),
        }
    }
}

fn describe_skips(skipped: &[SkipNotice]) -> String {
    skipped
        .iter()
        .map(|s| format!("step {} ({}): {}", s.index, s.tool, s.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_block_explanation_names_step() {
        let outcome = RunOutcome::PolicyBlock {
            plan_id: "p".into(),
            error: PolicyError::ToolBlocked {
                index: 1,
                tool: "shell".into(),
                profile: "conservative".into(),
            },
        };
        assert_eq!(outcome.status(), "policy_block");
        let text = outcome.explain();
        assert!(text.contains("at step 1 (shell)"));
        assert!(text.contains("conservative"));
    }

    #[test]
    fn test_planner_error_includes_snippet() {
        let outcome = RunOutcome::PlannerError {
            error: PlanError::InvalidJson {
                message: "expected value".into(),
                raw_snippet: "Sure! Here".into(),
            },
            skipped: vec![],
        };
        assert!(outcome.explain().contains("Sure! Here"));
        assert!(!outcome.is_ok());
    }

    #[test]
    fn test_serialized_status_tag() {
        let outcome = RunOutcome::Killed {
            plan_id: "p".into(),
            at_step: 2,
            completed: 2,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "killed");
        assert_eq!(value["at_step"], 2);
    }
}
