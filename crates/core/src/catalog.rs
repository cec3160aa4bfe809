//! Tool vocabulary and the catalog of tools currently in force.
//!
//! The vocabulary is fixed and is what the plan schema accepts. A catalog is
//! the (possibly narrower) set of tools a deployment actually exposes; the
//! guardrail layer checks plans against the catalog, not the vocabulary.

use crate::plan::RiskLevel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tool: {0}")]
pub struct UnknownTool(pub String);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    Navigate,
    Click,
    Type,
    ClickPoint,
    Drag,
    LongPress,
    Scroll,
    PressKey,
    Wait,
    Screenshot,
    Fetch,
    FileRead,
    FileWrite,
    Shell,
}

impl ToolName {
    pub const ALL: [ToolName; 14] = [
        ToolName::Navigate,
        ToolName::Click,
        ToolName::Type,
        ToolName::ClickPoint,
        ToolName::Drag,
        ToolName::LongPress,
        ToolName::Scroll,
        ToolName::PressKey,
        ToolName::Wait,
        ToolName::Screenshot,
        ToolName::Fetch,
        ToolName::FileRead,
        ToolName::FileWrite,
        ToolName::Shell,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Click => "click",
            Self::Type => "type",
            Self::ClickPoint => "click_point",
            Self::Drag => "drag",
            Self::LongPress => "long_press",
            Self::Scroll => "scroll",
            Self::PressKey => "press_key",
            Self::Wait => "wait",
            Self::Screenshot => "screenshot",
            Self::Fetch => "fetch",
            Self::FileRead => "file_read",
            Self::FileWrite => "file_write",
            Self::Shell => "shell",
        }
    }

    /// Tools that write text into a page element.
    pub fn is_text_entry(&self) -> bool {
        matches!(self, Self::Type)
    }

    /// Tools whose arguments are viewport coordinates.
    pub fn is_coordinate(&self) -> bool {
        matches!(self, Self::ClickPoint | Self::Drag | Self::LongPress)
    }

    pub fn vocabulary() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }

    fn default_risk(&self) -> RiskLevel {
        match self {
            Self::Click
            | Self::ClickPoint
            | Self::LongPress
            | Self::Scroll
            | Self::PressKey
            | Self::Wait
            | Self::Screenshot => RiskLevel::Low,
            Self::Navigate | Self::Type | Self::Drag | Self::Fetch | Self::FileRead => {
                RiskLevel::Medium
            }
            Self::FileWrite | Self::Shell => RiskLevel::High,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::Navigate => "Load a URL in the current tab",
            Self::Click => "Click an element identified by id, name, label, placeholder or text",
            Self::Type => "Type text into an element identified like click",
            Self::ClickPoint => "Click at a viewport point (absolute pixels or fractions in [-1,1])",
            Self::Drag => "Press at one point, move to another and release",
            Self::LongPress => "Press and hold at a viewport point",
            Self::Scroll => "Scroll the page by a pixel delta",
            Self::PressKey => "Press and release a single key",
            Self::Wait => "Pause for a number of milliseconds",
            Self::Screenshot => "Capture the current viewport",
            Self::Fetch => "HTTP GET a URL outside the browser",
            Self::FileRead => "Read a local text file",
            Self::FileWrite => "Write a local text file",
            Self::Shell => "Run a shell command with a timeout",
        }
    }

    fn argument_schema(&self) -> serde_json::Value {
        let point = json!({"type": "object", "properties": {"x": {"type": "number"}, "y": {"type": "number"}}});
        match self {
            Self::Navigate | Self::Fetch => json!({
                "type": "object",
                "properties": {"url": {"type": "string"}},
                "required": ["url"]
            }),
            Self::Click => json!({
                "type": "object",
                "properties": {"target": {"type": "string"}},
                "required": ["target"]
            }),
            Self::Type => json!({
                "type": "object",
                "properties": {"target": {"type": "string"}, "text": {"type": "string"}},
                "required": ["target", "text"]
            }),
            Self::ClickPoint => json!({
                "type": "object",
                "properties": {"point": point},
                "required": ["point"]
            }),
            Self::Drag => json!({
                "type": "object",
                "properties": {
                    "from": point.clone(),
                    "to": point,
                    "steps": {"type": "integer"},
                    "hold_ms": {"type": "integer"}
                },
                "required": ["from", "to"]
            }),
            Self::LongPress => json!({
                "type": "object",
                "properties": {"point": point, "duration_ms": {"type": "integer"}},
                "required": ["point"]
            }),
            Self::Scroll => json!({
                "type": "object",
                "properties": {"dx": {"type": "number"}, "dy": {"type": "number"}}
            }),
            Self::PressKey => json!({
                "type": "object",
                "properties": {"key": {"type": "string"}},
                "required": ["key"]
            }),
            Self::Wait => json!({
                "type": "object",
                "properties": {"ms": {"type": "integer"}},
                "required": ["ms"]
            }),
            Self::Screenshot => json!({"type": "object", "properties": {}}),
            Self::FileRead => json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"]
            }),
            Self::FileWrite => json!({
                "type": "object",
                "properties": {"path": {"type": "string"}, "content": {"type": "string"}},
                "required": ["path", "content"]
            }),
            Self::Shell => json!({
                "type": "object",
                "properties": {"command": {"type": "string"}, "timeout_ms": {"type": "integer"}},
                "required": ["command"]
            }),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = UnknownTool;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTool(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCatalogEntry {
    pub name: String,
    pub arguments: serde_json::Value,
    pub risk: RiskLevel,
    pub description: String,
}

impl From<ToolName> for ToolCatalogEntry {
    fn from(tool: ToolName) -> Self {
        Self {
            name: tool.as_str().to_string(),
            arguments: tool.argument_schema(),
            risk: tool.default_risk(),
            description: tool.description().to_string(),
        }
    }
}

/// Tools currently in force, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: BTreeMap<String, ToolCatalogEntry>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Catalog exposing the full vocabulary with default risk levels.
    pub fn full() -> Self {
        let mut catalog = Self::new();
        for tool in ToolName::ALL {
            catalog.register(tool.into());
        }
        catalog
    }

    pub fn register(&mut self, entry: ToolCatalogEntry) -> &mut Self {
        self.entries.insert(entry.name.clone(), entry);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<ToolCatalogEntry> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolCatalogEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ToolCatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
