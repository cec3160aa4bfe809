//! Page context consumed by the planner and the dispatcher.
//!
//! A snapshot is assembled by the browser collaborator once per cycle and is
//! read-only from then on. Element ids are best-effort and are not stable
//! across snapshots.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Read a point from `{x, y}`, `[x, y]` or an `"x,y"` string. Components
    /// may be numbers or numeric strings; non-finite values are returned
    /// as-is for the caller to reject.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;

        fn component(value: &Value) -> Option<f64> {
            match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
        }

        match value {
            Value::Object(map) => Some(Self::new(
                component(map.get("x")?)?,
                component(map.get("y")?)?,
            )),
            Value::Array(items) if items.len() == 2 => {
                Some(Self::new(component(&items[0])?, component(&items[1])?))
            }
            Value::String(s) => {
                let (x, y) = s.split_once(',')?;
                Some(Self::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
            }
            _ => None,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({"x": self.x, "y": self.y})
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Used whenever neither the snapshot nor the driver reports a size.
    pub const FALLBACK: Viewport = Viewport {
        width: 1280,
        height: 800,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FALLBACK
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl BoundingBox {
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            center_x: x + width / 2.0,
            center_y: y + height / 2.0,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x, self.center_y)
    }
}

/// A candidate UI element description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Interactable {
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub locator_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextSnapshot {
    pub url: String,
    pub origin: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub interactables: Vec<Interactable>,
    /// Base64 encoded screenshot, when visual data was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

impl ContextSnapshot {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let origin = crate::origin::origin_of(&url).unwrap_or_default();
        Self {
            url,
            origin,
            ..Default::default()
        }
    }

    pub fn with_interactables(mut self, interactables: Vec<Interactable>) -> Self {
        self.interactables = interactables;
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bbox_center() {
        let bbox = BoundingBox::from_rect(10.0, 20.0, 100.0, 40.0);
        assert_eq!(bbox.center(), Point::new(60.0, 40.0));
    }

    #[test]
    fn test_point_shapes() {
        let expected = Some(Point::new(3.0, 4.5));
        assert_eq!(Point::from_value(&json!({"x": 3, "y": 4.5})), expected);
        assert_eq!(Point::from_value(&json!([3, "4.5"])), expected);
        assert_eq!(Point::from_value(&json!(" 3 , 4.5 ")), expected);
        assert_eq!(Point::from_value(&json!({"x": 3})), None);
        assert_eq!(Point::from_value(&json!([1, 2, 3])), None);
    }

    #[test]
    fn test_point_non_finite_is_reported() {
        let p = Point::from_value(&json!({"x": "NaN", "y": 5})).unwrap();
        assert!(!p.is_finite());
    }

    #[test]
    fn test_interactable_wire_names() {
        let el: Interactable = serde_json::from_value(json!({
            "id": "submit",
            "role": "button",
            "type": "submit",
            "label": "Send",
            "locator_hint": "#submit",
            "bbox": {"x": 0, "y": 0, "width": 10, "height": 10, "centerX": 5, "centerY": 5}
        }))
        .unwrap();
        assert_eq!(el.kind, "submit");
        assert_eq!(el.bbox.unwrap().center_x, 5.0);
    }

    #[test]
    fn test_snapshot_derives_origin() {
        let snap = ContextSnapshot::new("https://example.com:8443/a/b?c=1");
        assert_eq!(snap.origin, "https://example.com:8443");
        assert!(snap.viewport.is_none());
    }
}
