//! Repairs for legacy and loosely-shaped model output.
//!
//! Runs before schema validation: renames alternate field names, recovers
//! named arguments from positional arrays through a per-tool table, fills a
//! missing plan id, resolves the autonomy level and pins confidence into
//! [0, 1]. Anything that cannot be repaired is left in place for the schema
//! to reject.

use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};
use webpilot_core::{AutonomyLevel, Plan, Point, ToolName, DEFAULT_CONFIDENCE};

const PLAN_ALIASES: &[(&str, &str)] = &[
    ("summary", "reasoning_summary"),
    ("reasoning", "reasoning_summary"),
    ("actions", "steps"),
    ("plan", "steps"),
    ("id", "plan_id"),
];

const AUTONOMY_ALIASES: &[&str] = &["autonomy", "mode"];

const STEP_ALIASES: &[(&str, &str)] = &[
    ("action", "tool"),
    ("name", "tool"),
    ("arguments", "args"),
    ("params", "args"),
    ("parameters", "args"),
    ("reason", "explanation"),
    ("why", "explanation"),
    ("risk", "estimated_risk"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot coerce positional args for '{tool}': {reason}")]
pub struct CoercionError {
    pub tool: String,
    pub reason: String,
}

type Coercion = fn(&[Value]) -> Result<Map<String, Value>, String>;

/// Coerce a raw model object into the canonical plan shape.
pub fn coerce_plan(raw: Value, autonomy_default: Option<AutonomyLevel>) -> Value {
    let Value::Object(mut obj) = raw else {
        return raw;
    };

    rename_aliases(&mut obj, PLAN_ALIASES);

    let autonomy = resolve_autonomy(&mut obj, autonomy_default);
    obj.insert("autonomy_level".to_string(), autonomy);

    let plan_id = match obj.remove("plan_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => Plan::fresh_id(),
    };
    obj.insert("plan_id".to_string(), Value::String(plan_id));

    match obj.remove("steps") {
        Some(Value::Array(steps)) => {
            let steps = steps.into_iter().map(coerce_step).collect();
            obj.insert("steps".to_string(), Value::Array(steps));
        }
        Some(other) => {
            obj.insert("steps".to_string(), other);
        }
        None => {}
    }

    Value::Object(obj)
}

/// Explicit field > legacy alias > caller default > assisted.
fn resolve_autonomy(obj: &mut Map<String, Value>, caller_default: Option<AutonomyLevel>) -> Value {
    let explicit = obj.remove("autonomy_level");
    let legacy = AUTONOMY_ALIASES
        .iter()
        .filter_map(|alias| obj.remove(*alias))
        .next();

    match explicit.or(legacy) {
        Some(Value::String(s)) => match AutonomyLevel::parse_lenient(&s) {
            Some(level) => Value::String(level.as_str().to_string()),
            None => Value::String(s),
        },
        Some(other) => other,
        None => Value::String(caller_default.unwrap_or_default().as_str().to_string()),
    }
}

fn coerce_step(raw: Value) -> Value {
    let Value::Object(mut step) = raw else {
        return raw;
    };

    rename_aliases(&mut step, STEP_ALIASES);

    if let Some(Value::String(tool)) = step.get("tool") {
        let tool = tool.trim().to_ascii_lowercase();
        step.insert("tool".to_string(), Value::String(tool));
    }

    if let Some(Value::String(risk)) = step.get("estimated_risk") {
        let risk = risk.trim().to_ascii_lowercase();
        step.insert("estimated_risk".to_string(), Value::String(risk));
    }

    let confidence = coerce_confidence(step.get("confidence"));
    step.insert("confidence".to_string(), Value::from(confidence));

    let tool = step
        .get("tool")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();
    match step.remove("args") {
        None | Some(Value::Null) => {
            step.insert("args".to_string(), Value::Object(Map::new()));
        }
        Some(Value::Object(args)) => {
            step.insert("args".to_string(), Value::Object(args));
        }
        Some(Value::Array(items)) => {
            step.insert("args".to_string(), positional_or_raw(&tool, items));
        }
        Some(scalar) => {
            step.insert("args".to_string(), positional_or_raw(&tool, vec![scalar]));
        }
    }

    Value::Object(step)
}

fn positional_or_raw(tool: &str, items: Vec<Value>) -> Value {
    match coerce_positional_args(tool, &items) {
        Ok(named) => {
            debug!("Recovered named args for '{}' from positional form", tool);
            Value::Object(named)
        }
        Err(e) => {
            warn!("{}", e);
            Value::Array(items)
        }
    }
}

/// Numbers clamp into [0, 1], numeric strings are parsed then clamped,
/// everything else becomes the default.
pub fn coerce_confidence(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

/// Recover named arguments from a positional array for `tool`.
pub fn coerce_positional_args(tool: &str, items: &[Value]) -> Result<Map<String, Value>, CoercionError> {
    let tool_name = ToolName::from_str(tool).map_err(|e| CoercionError {
        tool: tool.to_string(),
        reason: e.to_string(),
    })?;
    coercion_for(tool_name)(items).map_err(|reason| CoercionError {
        tool: tool.to_string(),
        reason,
    })
}

fn coercion_for(tool: ToolName) -> Coercion {
    match tool {
        ToolName::Navigate | ToolName::Fetch => |items| named(items, &["url"], 1),
        ToolName::Click => |items| named(items, &["target"], 1),
        ToolName::Type => |items| named(items, &["target", "text"], 2),
        ToolName::ClickPoint => coerce_click_point,
        ToolName::Drag => coerce_drag,
        ToolName::LongPress => coerce_long_press,
        ToolName::Scroll => |items| named(items, &["dx", "dy"], 0),
        ToolName::PressKey => |items| named(items, &["key"], 1),
        ToolName::Wait => |items| named(items, &["ms"], 1),
        ToolName::Screenshot => |_| Ok(Map::new()),
        ToolName::FileRead => |items| named(items, &["path"], 1),
        ToolName::FileWrite => |items| named(items, &["path", "content"], 2),
        ToolName::Shell => |items| named(items, &["command", "timeout_ms"], 1),
    }
}

fn named(items: &[Value], names: &[&str], required: usize) -> Result<Map<String, Value>, String> {
    if items.len() < required {
        return Err(format!(
            "expected at least {} positional values, got {}",
            required,
            items.len()
        ));
    }
    Ok(names
        .iter()
        .zip(items.iter())
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect())
}

fn point_arg(value: &Value) -> Result<Value, String> {
    Point::from_value(value)
        .map(|p| p.to_value())
        .ok_or_else(|| format!("cannot read a point from {}", value))
}

fn coerce_click_point(items: &[Value]) -> Result<Map<String, Value>, String> {
    let point = match items {
        [single] => point_arg(single)?,
        [x, y] if x.is_number() && y.is_number() => point_arg(&Value::Array(vec![x.clone(), y.clone()]))?,
        _ => return Err(format!("expected a point or x, y; got {} values", items.len())),
    };
    let mut map = Map::new();
    map.insert("point".to_string(), point);
    Ok(map)
}

fn coerce_drag(items: &[Value]) -> Result<Map<String, Value>, String> {
    let (from, to) = match items {
        [from, to, ..] if !from.is_number() => (point_arg(from)?, point_arg(to)?),
        [x1, y1, x2, y2] => (
            point_arg(&Value::Array(vec![x1.clone(), y1.clone()]))?,
            point_arg(&Value::Array(vec![x2.clone(), y2.clone()]))?,
        ),
        _ => return Err(format!("expected two points; got {} values", items.len())),
    };
    let mut map = Map::new();
    map.insert("from".to_string(), from);
    map.insert("to".to_string(), to);
    Ok(map)
}

fn coerce_long_press(items: &[Value]) -> Result<Map<String, Value>, String> {
    let first = items
        .first()
        .ok_or_else(|| "expected a point".to_string())?;
    let mut map = Map::new();
    map.insert("point".to_string(), point_arg(first)?);
    if let Some(duration) = items.get(1) {
        map.insert("duration_ms".to_string(), duration.clone());
    }
    Ok(map)
}

fn rename_aliases(obj: &mut Map<String, Value>, aliases: &[(&str, &str)]) {
    for (alias, canonical) in aliases {
        if obj.contains_key(*canonical) {
            continue;
        }
        if let Some(value) = obj.remove(*alias) {
            obj.insert(canonical.to_string(), value);
        }
    }
}
