use crate::error::DriverError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use webpilot_core::{Point, Viewport};

/// How a locator identifies an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    Id,
    Name,
    Label,
    Placeholder,
    Text,
}

impl LocatorStrategy {
    /// Cascade order for identifier-based actions.
    pub const CASCADE: [LocatorStrategy; 5] = [
        LocatorStrategy::Id,
        LocatorStrategy::Name,
        LocatorStrategy::Label,
        LocatorStrategy::Placeholder,
        LocatorStrategy::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Label => "label",
            Self::Placeholder => "placeholder",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub value: String,
}

impl Locator {
    pub fn new(strategy: LocatorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.as_str(), self.value)
    }
}

/// Browser automation primitives. The browser itself is a black box.
///
/// Methods that target an element must return [`DriverError::NotFound`] when
/// nothing matches so callers can try the next locator.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn click(&self, locator: &Locator) -> Result<(), DriverError>;

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), DriverError>;

    async fn mouse_move(&self, point: Point) -> Result<(), DriverError>;

    async fn mouse_down(&self) -> Result<(), DriverError>;

    async fn mouse_up(&self) -> Result<(), DriverError>;

    async fn wheel(&self, dx: f64, dy: f64) -> Result<(), DriverError>;

    async fn key_down(&self, key: &str) -> Result<(), DriverError>;

    async fn key_up(&self, key: &str) -> Result<(), DriverError>;

    /// Base64 encoded PNG of the current viewport.
    async fn screenshot(&self) -> Result<String, DriverError>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, DriverError>;

    async fn viewport_size(&self) -> Result<Viewport, DriverError>;
}
