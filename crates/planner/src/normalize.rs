//! Spatial normalization of coordinate-bearing steps.
//!
//! Components whose magnitude is at most 1 on both axes are treated as
//! viewport fractions and scaled to pixels. Every resolved point is clamped
//! into the viewport. Steps with a missing or non-finite point are dropped.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;
use webpilot_core::{Plan, Point, Step, ToolName, Viewport};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkipNotice {
    pub index: usize,
    pub tool: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub plan: Plan,
    pub skipped: Vec<SkipNotice>,
}

/// Resolve every coordinate argument against `viewport`, or
/// [`Viewport::FALLBACK`] when none is known. Non-coordinate steps pass
/// through untouched.
pub fn normalize(plan: &Plan, viewport: Option<Viewport>) -> Normalized {
    let viewport = viewport.unwrap_or(Viewport::FALLBACK);
    let mut steps = Vec::with_capacity(plan.steps.len());
    let mut skipped = Vec::new();

    for (index, step) in plan.steps.iter().enumerate() {
        let tool = step.tool.parse::<ToolName>().ok();
        let result = match tool {
            Some(ToolName::ClickPoint) | Some(ToolName::LongPress) => {
                normalize_single(step, viewport)
            }
            Some(ToolName::Drag) => normalize_drag(step, viewport),
            _ => Ok(step.clone()),
        };

        match result {
            Ok(step) => steps.push(step),
            Err(reason) => {
                warn!(
                    "Dropping step {} ({}) during normalization: {}",
                    index, step.tool, reason
                );
                skipped.push(SkipNotice {
                    index,
                    tool: step.tool.clone(),
                    reason,
                });
            }
        }
    }

    Normalized {
        plan: plan.with_steps(steps),
        skipped,
    }
}

fn normalize_single(step: &Step, viewport: Viewport) -> Result<Step, String> {
    let mut args = step.args.clone();
    let raw = match args.remove("point") {
        Some(value) => Point::from_value(&value),
        None => legacy_xy(&mut args),
    };
    let point = resolve(raw, "point", viewport)?;
    args.insert("point".to_string(), point.to_value());
    Ok(with_args(step, args))
}

fn normalize_drag(step: &Step, viewport: Viewport) -> Result<Step, String> {
    let mut args = step.args.clone();
    let from = take_aliased(&mut args, "from", "start");
    let to = take_aliased(&mut args, "to", "end");

    let from = resolve(from.as_ref().and_then(Point::from_value), "from", viewport)?;
    let to = resolve(to.as_ref().and_then(Point::from_value), "to", viewport)?;

    args.insert("from".to_string(), from.to_value());
    args.insert("to".to_string(), to.to_value());
    Ok(with_args(step, args))
}

fn take_aliased(args: &mut Map<String, Value>, key: &str, alias: &str) -> Option<Value> {
    let primary = args.remove(key);
    let legacy = args.remove(alias);
    primary.or(legacy)
}

/// Older plans put `x`/`y` directly in the step arguments.
fn legacy_xy(args: &mut Map<String, Value>) -> Option<Point> {
    if !(args.contains_key("x") && args.contains_key("y")) {
        return None;
    }
    let x = args.remove("x")?;
    let y = args.remove("y")?;
    Point::from_value(&Value::Array(vec![x, y]))
}

fn resolve(point: Option<Point>, name: &str, viewport: Viewport) -> Result<Point, String> {
    let point = point.ok_or_else(|| format!("missing or unreadable {}", name))?;
    if !point.is_finite() {
        return Err(format!("non-finite {}", name));
    }
    Ok(to_pixels(point, viewport))
}

fn to_pixels(point: Point, viewport: Viewport) -> Point {
    let width = f64::from(viewport.width);
    let height = f64::from(viewport.height);

    let (x, y) = if point.x.abs() <= 1.0 && point.y.abs() <= 1.0 {
        (point.x * width, point.y * height)
    } else {
        (point.x, point.y)
    };

    Point::new(x.clamp(0.0, width), y.clamp(0.0, height))
}

fn with_args(step: &Step, args: Map<String, Value>) -> Step {
    Step {
        args,
        ..step.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_of(steps: Vec<Step>) -> Plan {
        Plan::new("test", steps)
    }

    fn point_of(step: &Step, key: &str) -> Point {
        Point::from_value(&step.args[key]).unwrap()
    }

    #[test]
    fn test_fractional_point_scaled() {
        let plan = plan_of(vec![Step::new("click_point", json!({"point": {"x": 0.1, "y": 0.2}}))]);
        let out = normalize(&plan, Some(Viewport::new(1000, 800)));
        assert_eq!(point_of(&out.plan.steps[0], "point"), Point::new(100.0, 160.0));
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_absolute_point_clamped() {
        let plan = plan_of(vec![Step::new("click_point", json!({"point": {"x": 1400, "y": 50}}))]);
        let out = normalize(&plan, Some(Viewport::new(1280, 800)));
        assert_eq!(point_of(&out.plan.steps[0], "point"), Point::new(1280.0, 50.0));
    }

    #[test]
    fn test_drag_endpoints_scaled() {
        let plan = plan_of(vec![Step::new(
            "drag",
            json!({"from": [0.1, 0.2], "to": {"x": 0.9, "y": 0.9}}),
        )]);
        let out = normalize(&plan, Some(Viewport::new(800, 600)));
        let step = &out.plan.steps[0];
        assert_eq!(point_of(step, "from"), Point::new(80.0, 120.0));
        assert_eq!(point_of(step, "to"), Point::new(720.0, 540.0));
    }

    #[test]
    fn test_drag_start_end_aliases() {
        let plan = plan_of(vec![Step::new(
            "drag",
            json!({"start": "10,10", "end": "20,20", "steps": 5}),
        )]);
        let out = normalize(&plan, None);
        let step = &out.plan.steps[0];
        assert_eq!(point_of(step, "from"), Point::new(10.0, 10.0));
        assert!(step.args.get("start").is_none());
        assert_eq!(step.args["steps"], 5);
    }

    #[test]
    fn test_non_finite_point_dropped() {
        let plan = plan_of(vec![
            Step::new("click_point", json!({"point": {"x": "NaN", "y": 5}})),
            Step::new("wait", json!({"ms": 100})),
        ]);
        let out = normalize(&plan, None);
        assert_eq!(out.plan.steps.len(), 1);
        assert_eq!(out.plan.steps[0].tool, "wait");
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].index, 0);
        assert!(out.skipped[0].reason.contains("non-finite"));
    }

    #[test]
    fn test_missing_point_dropped() {
        let plan = plan_of(vec![Step::new("long_press", json!({"duration_ms": 500}))]);
        let out = normalize(&plan, None);
        assert!(out.plan.steps.is_empty());
        assert_eq!(out.skipped[0].tool, "long_press");
    }

    #[test]
    fn test_legacy_xy_arguments() {
        let plan = plan_of(vec![Step::new("click_point", json!({"x": 0.5, "y": 0.5}))]);
        let out = normalize(&plan, None);
        let step = &out.plan.steps[0];
        assert_eq!(point_of(step, "point"), Point::new(640.0, 400.0));
        assert!(step.args.get("x").is_none());
    }

    #[test]
    fn test_fallback_viewport_and_passthrough() {
        let plan = plan_of(vec![
            Step::new("click", json!({"target": "Search"})),
            Step::new("click_point", json!({"point": [-0.5, 2000]})),
        ]);
        let out = normalize(&plan, None);
        assert_eq!(out.plan.steps[0], plan.steps[0]);
        assert_eq!(point_of(&out.plan.steps[1], "point"), Point::new(0.0, 800.0));
        assert_eq!(out.plan.plan_id, plan.plan_id);
    }
}
