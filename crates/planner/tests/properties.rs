#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use serde_json::json;
use webpilot_core::{Plan, Point, Step, Viewport};
use webpilot_planner::{coerce_confidence, normalize};

proptest! {
    #[test]
    fn normalization_is_idempotent_for_pixel_points(
        width in 64u32..4000,
        height in 64u32..4000,
        fx in 0.0f64..1.0,
        fy in 0.0f64..1.0,
    ) {
        let viewport = Viewport::new(width, height);
        let x = 2.0 + fx * (f64::from(width) - 2.0);
        let y = 2.0 + fy * (f64::from(height) - 2.0);
        let plan = Plan::new("p", vec![Step::new("click_point", json!({"point": {"x": x, "y": y}}))]);

        let once = normalize(&plan, Some(viewport));
        let twice = normalize(&once.plan, Some(viewport));
        prop_assert_eq!(&once.plan, &twice.plan);
        prop_assert_eq!(Point::from_value(&once.plan.steps[0].args["point"]), Some(Point::new(x, y)));
    }

    #[test]
    fn normalized_points_stay_inside_viewport(
        x in -5000.0f64..5000.0,
        y in -5000.0f64..5000.0,
    ) {
        let plan = Plan::new("p", vec![Step::new("long_press", json!({"point": [x, y]}))]);
        let out = normalize(&plan, None);
        let point = Point::from_value(&out.plan.steps[0].args["point"]).unwrap();
        prop_assert!((0.0..=1280.0).contains(&point.x));
        prop_assert!((0.0..=800.0).contains(&point.y));
    }

    #[test]
    fn confidence_always_in_unit_range(value in proptest::num::f64::ANY) {
        let c = coerce_confidence(Some(&json!(value)));
        prop_assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn confidence_strings_in_unit_range(text in "\\PC{0,12}") {
        let c = coerce_confidence(Some(&json!(text)));
        prop_assert!((0.0..=1.0).contains(&c));
    }
}
