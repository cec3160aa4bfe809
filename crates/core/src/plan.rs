use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence assigned to a step when the generator supplied nothing usable.
pub const DEFAULT_CONFIDENCE: f64 = 0.6;

/// Declared human-oversight tier carried in plan metadata.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyLevel {
    #[default]
    Assisted,
    SemiAuto,
    Auto,
}

impl AutonomyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assisted => "assisted",
            Self::SemiAuto => "semi_auto",
            Self::Auto => "auto",
        }
    }

    /// Lenient parse used when reading legacy documents and model output.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "assisted" | "manual" | "confirm" => Some(Self::Assisted),
            "semi_auto" | "semiauto" | "semi" => Some(Self::SemiAuto),
            "auto" | "autonomous" | "full" => Some(Self::Auto),
            _ => None,
        }
    }
}

impl fmt::Display for AutonomyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutonomyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| format!("Unknown autonomy level: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tool invocation inside a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Step {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
    pub explanation: String,
    pub estimated_risk: RiskLevel,
    pub confidence: f64,
}

impl Step {
    pub fn new(tool: impl Into<String>, args: serde_json::Value) -> Self {
        let args = match args {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            tool: tool.into(),
            args,
            explanation: String::new(),
            estimated_risk: RiskLevel::Low,
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.estimated_risk = risk;
        self
    }

    /// String argument lookup, ignoring blank values.
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Schema-conformant action sequence for one goal/context pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub reasoning_summary: String,
    pub plan_id: String,
    pub autonomy_level: AutonomyLevel,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(reasoning_summary: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            reasoning_summary: reasoning_summary.into(),
            plan_id: Self::fresh_id(),
            autonomy_level: AutonomyLevel::default(),
            steps,
        }
    }

    pub fn fresh_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Same metadata, different steps. Plans are treated as immutable values.
    pub fn with_steps(&self, steps: Vec<Step>) -> Self {
        Self {
            reasoning_summary: self.reasoning_summary.clone(),
            plan_id: self.plan_id.clone(),
            autonomy_level: self.autonomy_level,
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_autonomy_wire_names() {
        assert_eq!(serde_json::to_value(AutonomyLevel::SemiAuto).unwrap(), json!("semi_auto"));
        assert_eq!(AutonomyLevel::default(), AutonomyLevel::Assisted);
    }

    #[test]
    fn test_autonomy_lenient_parse() {
        assert_eq!(AutonomyLevel::parse_lenient("Semi-Auto"), Some(AutonomyLevel::SemiAuto));
        assert_eq!(AutonomyLevel::parse_lenient(" AUTO "), Some(AutonomyLevel::Auto));
        assert_eq!(AutonomyLevel::parse_lenient("yolo"), None);
    }

    #[test]
    fn test_plan_roundtrip_wire_shape() {
        let raw = json!({
            "reasoning_summary": "open the docs",
            "plan_id": "p-1",
            "autonomy_level": "assisted",
            "steps": [{
                "tool": "navigate",
                "args": {"url": "https://example.com"},
                "explanation": "go there",
                "estimated_risk": "medium",
                "confidence": 0.9
            }]
        });
        let plan: Plan = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(plan.steps[0].arg_str("url"), Some("https://example.com"));
        assert_eq!(serde_json::to_value(&plan).unwrap(), raw);
    }

    #[test]
    fn test_with_steps_keeps_identity() {
        let plan = Plan::new("x", vec![Step::new("wait", json!({"ms": 10}))]);
        let emptied = plan.with_steps(vec![]);
        assert_eq!(emptied.plan_id, plan.plan_id);
        assert!(emptied.is_empty());
        assert_eq!(plan.len(), 1);
    }
}
