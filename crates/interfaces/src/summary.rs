use std::fmt::Write;
use webpilot_core::Plan;
use webpilot_policy::looks_like_password_field;

/// Human-readable plan listing shown before confirmation.
///
/// Typing into a target that looks like a password field is flagged so the
/// reviewer notices it even when the active profile allows it.
pub fn describe_plan(plan: &Plan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan {} ({})", plan.plan_id, plan.autonomy_level);
    if !plan.reasoning_summary.trim().is_empty() {
        let _ = writeln!(out, "  {}", plan.reasoning_summary.trim());
    }

    for (index, step) in plan.steps.iter().enumerate() {
        let args = step
            .args
            .iter()
            .map(|(k, v)| match v.as_str() {
                Some(s) => format!("{}={}", k, s),
                None => format!("{}={}", k, v),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            out,
            "  {}. {}({}) [risk: {}, confidence: {:.2}]",
            index + 1,
            step.tool,
            args,
            step.estimated_risk,
            step.confidence
        );
        if step.tool == "type" && step.arg_str("target").is_some_and(looks_like_password_field) {
            out.push_str(" !! password-like field");
        }
        out.push('\n');
        if !step.explanation.trim().is_empty() {
            let _ = writeln!(out, "     {}", step.explanation.trim());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webpilot_core::Step;

    #[test]
    fn test_describe_lists_steps() {
        let plan = Plan::new(
            "log in",
            vec![
                Step::new("navigate", json!({"url": "https://example.com"})).with_explanation("open"),
                Step::new("type", json!({"target": "#Password", "text": "x"})),
            ],
        );
        let text = describe_plan(&plan);
        assert!(text.contains("1. navigate(url=https://example.com)"));
        assert!(text.contains("     open"));
        assert!(text.contains("!! password-like field"));
    }

    #[test]
    fn test_plain_fields_not_flagged() {
        let plan = Plan::new("", vec![Step::new("type", json!({"target": "email", "text": "a"}))]);
        assert!(!describe_plan(&plan).contains("!!"));
    }
}
