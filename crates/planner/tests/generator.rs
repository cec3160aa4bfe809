#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use webpilot_core::{AutonomyLevel, ContextSnapshot, Interactable, ToolCatalog};
use webpilot_planner::{PlanError, PlanGenerator, PlanRequest, PolicyHint, MAX_ATTEMPTS};
use webpilot_providers::{InferenceRequest, InferenceService, ProviderError};

/// Returns scripted responses in order and records every request.
struct ScriptedService {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedService {
    fn new(responses: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl InferenceService for ScriptedService {
    async fn complete(&self, request: &InferenceRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unavailable("script exhausted".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn hint() -> PolicyHint {
    PolicyHint {
        profile: "conservative".to_string(),
        constraints: "max 8 steps".to_string(),
    }
}

fn context() -> ContextSnapshot {
    ContextSnapshot::new("https://shop.example.com/").with_interactables(vec![Interactable {
        id: "search".to_string(),
        role: "textbox".to_string(),
        label: "Search".to_string(),
        ..Default::default()
    }])
}

fn valid_plan() -> String {
    json!({
        "reasoning_summary": "search for shoes",
        "plan_id": "p-1",
        "autonomy_level": "assisted",
        "steps": [{
            "tool": "type",
            "args": {"target": "Search", "text": "shoes"},
            "explanation": "enter query",
            "estimated_risk": "medium",
            "confidence": 0.9
        }]
    })
    .to_string()
}

async fn run(service: Arc<ScriptedService>, goal: &str) -> Result<webpilot_core::Plan, PlanError> {
    let generator = PlanGenerator::new(service, "test-model").unwrap();
    let catalog = ToolCatalog::full();
    let context = context();
    let policy = hint();
    generator
        .generate(PlanRequest {
            goal,
            context: &context,
            policy: &policy,
            catalog: &catalog,
            autonomy_default: None,
        })
        .await
}

#[tokio::test]
async fn test_first_attempt_success() {
    let service = ScriptedService::new(vec![Ok(valid_plan())]);
    let plan = run(service.clone(), "find shoes").await.unwrap();

    assert_eq!(plan.plan_id, "p-1");
    assert_eq!(plan.steps[0].tool, "type");
    assert_eq!(service.calls(), 1);

    let request = &service.requests.lock()[0];
    assert_eq!(request.model, "test-model");
    assert!(request.response_format.is_some());
    assert!(request.messages[1].content.contains("find shoes"));
}

#[tokio::test]
async fn test_repair_on_second_attempt() {
    let service = ScriptedService::new(vec![
        Ok(r#"{"reasoning_summary": "x", "steps": []}"#.to_string()),
        Ok(valid_plan()),
    ]);
    let plan = run(service.clone(), "find shoes").await.unwrap();

    assert_eq!(plan.steps.len(), 1);
    assert_eq!(service.calls(), 2);

    let repair = &service.requests.lock()[1];
    assert_eq!(repair.messages.len(), 4);
    assert_eq!(repair.messages[2].role, "assistant");
    assert!(repair.messages[3].content.contains("/steps"));
}

#[tokio::test]
async fn test_two_schema_failures_stop_after_bounded_attempts() {
    let bad = r#"{"reasoning_summary": "x", "steps": [{"tool": "teleport"}]}"#;
    let service = ScriptedService::new(vec![
        Ok(bad.to_string()),
        Ok(bad.to_string()),
        Ok(valid_plan()),
    ]);
    let err = run(service.clone(), "find shoes").await.unwrap_err();

    assert_eq!(service.calls(), MAX_ATTEMPTS);
    match err {
        PlanError::SchemaValidationFailed {
            attempts,
            errors,
            raw_snippet,
        } => {
            assert_eq!(attempts, 2);
            assert!(!errors.is_empty());
            assert!(raw_snippet.contains("teleport"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_json_is_terminal() {
    let service = ScriptedService::new(vec![Ok("I cannot help with that".to_string()), Ok(valid_plan())]);
    let err = run(service.clone(), "find shoes").await.unwrap_err();

    assert_eq!(err.code(), "invalid_json");
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_legacy_shape_accepted() {
    let legacy = json!({
        "summary": "legacy",
        "mode": "semi_auto",
        "actions": [{"action": "NAVIGATE", "params": ["https://example.com"], "risk": "Medium", "confidence": "1.7", "why": "go"}]
    })
    .to_string();
    let service = ScriptedService::new(vec![Ok(format!("```json\n{}\n```", legacy))]);
    let plan = run(service, "open example").await.unwrap();

    assert_eq!(plan.autonomy_level, AutonomyLevel::SemiAuto);
    assert_eq!(plan.steps[0].tool, "navigate");
    assert_eq!(plan.steps[0].args["url"], "https://example.com");
    assert_eq!(plan.steps[0].confidence, 1.0);
    assert!(!plan.plan_id.is_empty());
}

#[tokio::test]
async fn test_inference_error_surfaces() {
    let service = ScriptedService::new(vec![Err(ProviderError::Http("connection reset".into()))]);
    let err = run(service, "find shoes").await.unwrap_err();
    assert_eq!(err.code(), "inference_error");
}

#[tokio::test]
async fn test_empty_goal_rejected_without_calls() {
    let service = ScriptedService::new(vec![Ok(valid_plan())]);
    let err = run(service.clone(), "   ").await.unwrap_err();
    assert_eq!(err.code(), "invalid_goal");
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_attempt_count_reported() {
    let catalog = ToolCatalog::full();
    let context = context();
    let policy = hint();
    let request = |goal: &'static str| PlanRequest {
        goal,
        context: &context,
        policy: &policy,
        catalog: &catalog,
        autonomy_default: None,
    };

    let service = ScriptedService::new(vec![
        Ok(r#"{"reasoning_summary": "x", "steps": []}"#.to_string()),
        Ok(valid_plan()),
    ]);
    let generator = PlanGenerator::new(service, "test-model").unwrap();
    let (result, attempts) = generator.generate_with_attempts(request("find shoes")).await;
    assert!(result.is_ok());
    assert_eq!(attempts, 2);

    let service = ScriptedService::new(vec![Ok("not json".to_string())]);
    let generator = PlanGenerator::new(service, "test-model").unwrap();
    let (result, attempts) = generator.generate_with_attempts(request("find shoes")).await;
    assert!(matches!(result, Err(PlanError::InvalidJson { .. })));
    assert_eq!(attempts, 1);

    let (result, attempts) = generator.generate_with_attempts(request("  ")).await;
    assert!(matches!(result, Err(PlanError::InvalidGoal { .. })));
    assert_eq!(attempts, 0);
}
