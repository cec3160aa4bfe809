//! Run orchestration.
//!
//! GENERATE or ACCEPT_PRECOMPUTED -> NORMALIZE -> POLICY_CHECK -> CONFIRM ->
//! EXECUTING -> TERMINAL. Each run owns its own state; concurrent runs need
//! independent browser sessions.

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::metrics::{self, MetricTimer};
use crate::outcome::RunOutcome;
use std::sync::Arc;
use tracing::{info, warn};
use webpilot_core::{AutonomyLevel, ContextSnapshot, Plan, ToolCatalog, ToolName, Viewport};
use webpilot_executor::{BrowserDriver, CancellationToken, Dispatcher, ExecutionOutcome, HostIo};
use webpilot_interfaces::{OriginConfirmer, PlanConfirmer};
use webpilot_planner::{
    accept_plan, normalize, parse_plan, Normalized, PlanError, PlanGenerator, PlanRequest,
    PolicyHint,
};
use webpilot_policy::{validate, GuardrailProfile, GuardrailSet};
use webpilot_providers::InferenceService;

/// Where the plan for a run comes from.
#[derive(Debug, Clone)]
pub enum PlanSource {
    Goal(String),
    /// Plan built in code. Re-coerced and schema-checked before use.
    Precomputed(Plan),
    /// Plan text produced elsewhere; checked like model output, without repair.
    PrecomputedJson(String),
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: PlanSource,
    pub context: ContextSnapshot,
    /// Overrides the configured profile.
    pub profile: Option<String>,
    /// Overrides the configured autonomy default.
    pub autonomy_default: Option<AutonomyLevel>,
}

impl RunRequest {
    pub fn goal(goal: impl Into<String>, context: ContextSnapshot) -> Self {
        Self {
            source: PlanSource::Goal(goal.into()),
            context,
            profile: None,
            autonomy_default: None,
        }
    }

    pub fn precomputed(plan: Plan, context: ContextSnapshot) -> Self {
        Self {
            source: PlanSource::Precomputed(plan),
            context,
            profile: None,
            autonomy_default: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

pub struct Runner {
    config: RuntimeConfig,
    guardrails: GuardrailSet,
    catalog: ToolCatalog,
    generator: Option<PlanGenerator<dyn InferenceService>>,
    driver: Arc<dyn BrowserDriver>,
    host: Arc<dyn HostIo>,
    plan_confirmer: Option<Arc<dyn PlanConfirmer>>,
    origin_confirmer: Option<Arc<dyn OriginConfirmer>>,
}

impl Runner {
    pub fn new(
        config: RuntimeConfig,
        guardrails: GuardrailSet,
        driver: Arc<dyn BrowserDriver>,
        host: Arc<dyn HostIo>,
    ) -> Self {
        if let Some(error) = &guardrails.load_error {
            warn!("Guardrail document unusable, running with defaults: {}", error);
        }
        Self {
            config,
            guardrails,
            catalog: ToolCatalog::full(),
            generator: None,
            driver,
            host,
            plan_confirmer: None,
            origin_confirmer: None,
        }
    }

    /// Build a runner from configuration, loading the guardrail document and
    /// the inference provider it names.
    pub async fn from_config(
        config: RuntimeConfig,
        driver: Arc<dyn BrowserDriver>,
        host: Arc<dyn HostIo>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;
        let guardrails = match &config.guardrails_path {
            Some(path) => GuardrailSet::load(path).await,
            None => GuardrailSet::defaults(),
        };
        let service: Arc<dyn InferenceService> = Arc::new(config.build_provider());
        let model = config.inference.model.clone();
        let max_elements = config.max_context_elements;

        let runner = Self::new(config, guardrails, driver, host);
        runner.with_inference(service, model, max_elements)
    }

    pub fn with_inference(
        mut self,
        service: Arc<dyn InferenceService>,
        model: impl Into<String>,
        max_context_elements: usize,
    ) -> Result<Self, RuntimeError> {
        let generator = PlanGenerator::new(service, model)
            .map_err(|e| RuntimeError::ConfigError(e.to_string()))?
            .with_max_context_elements(max_context_elements);
        self.generator = Some(generator);
        Ok(self)
    }

    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_plan_confirmer(mut self, hook: Arc<dyn PlanConfirmer>) -> Self {
        self.plan_confirmer = Some(hook);
        self
    }

    pub fn with_origin_confirmer(mut self, hook: Arc<dyn OriginConfirmer>) -> Self {
        self.origin_confirmer = Some(hook);
        self
    }

    pub fn guardrails(&self) -> &GuardrailSet {
        &self.guardrails
    }

    /// Drive one request to its terminal outcome.
    ///
    /// # Errors
    /// Only configuration faults: no plan confirmation hook, an unknown
    /// profile, or a goal-based run without an inference service.
    pub async fn run(&self, request: RunRequest, cancel: CancellationToken) -> Result<RunOutcome, RuntimeError> {
        let _timer = MetricTimer::new(metrics::RUN_DURATION);

        let confirmer = self
            .plan_confirmer
            .as_ref()
            .ok_or(RuntimeError::MissingPlanConfirmer)?;
        let profile_name = request.profile.as_deref().unwrap_or(&self.config.profile);
        let profile = self
            .guardrails
            .profile(profile_name)
            .map_err(|_| RuntimeError::UnknownProfile(profile_name.to_string()))?;
        let autonomy_default = request
            .autonomy_default
            .or(self.config.autonomy_default)
            .or_else(|| AutonomyLevel::parse_lenient(&profile.autonomy_level));

        info!("Run started under profile '{}'", profile.name);

        let plan = match self
            .obtain_plan(request.source, &request.context, profile, autonomy_default)
            .await?
        {
            Ok(plan) => plan,
            Err(error) => {
                warn!("Planning failed: {}", error);
                return Ok(finish(RunOutcome::PlannerError {
                    error,
                    skipped: Vec::new(),
                }));
            }
        };

        let viewport = self.viewport_for(&plan, &request.context).await;
        let Normalized { plan, skipped } = normalize(&plan, Some(viewport));
        metrics::record_skipped_steps(skipped.len() as u64);
        if plan.is_empty() {
            let error = PlanError::EmptyAfterNormalization {
                plan_id: plan.plan_id.clone(),
                skipped: skipped.len(),
            };
            return Ok(finish(RunOutcome::PlannerError { error, skipped }));
        }

        if let Err(error) = validate(&plan, profile, &self.catalog) {
            warn!("Plan {} blocked by policy: {}", plan.plan_id, error);
            return Ok(finish(RunOutcome::PolicyBlock {
                plan_id: plan.plan_id,
                error,
            }));
        }

        if !confirmer.confirm_plan(&plan).await {
            info!("Plan {} rejected at confirmation", plan.plan_id);
            return Ok(finish(RunOutcome::RejectedByUser {
                plan_id: plan.plan_id,
            }));
        }

        let mut dispatcher = Dispatcher::new(self.driver.clone(), self.host.clone())
            .with_settings(self.config.dispatch_settings(profile));
        if let Some(hook) = &self.origin_confirmer {
            dispatcher = dispatcher.with_origin_hook(hook.clone());
        }

        let execution = dispatcher.execute(&plan, &request.context, &cancel).await;
        for record in execution.records() {
            metrics::record_step_latency(record.duration_ms as f64);
        }

        let plan_id = plan.plan_id;
        let outcome = match execution {
            ExecutionOutcome::Completed { records } => RunOutcome::Ok {
                plan_id,
                records,
                skipped,
            },
            ExecutionOutcome::Cancelled { at_step, records } => RunOutcome::Killed {
                plan_id,
                at_step,
                completed: records.len(),
            },
            ExecutionOutcome::Failed {
                index,
                tool,
                error,
                records,
            } => RunOutcome::Failed {
                plan_id,
                index,
                tool,
                error,
                completed: records.len(),
            },
        };
        Ok(finish(outcome))
    }

    /// Outer `Err` is a configuration fault, inner `Err` a planning failure.
    async fn obtain_plan(
        &self,
        source: PlanSource,
        context: &ContextSnapshot,
        profile: &GuardrailProfile,
        autonomy_default: Option<AutonomyLevel>,
    ) -> Result<Result<Plan, PlanError>, RuntimeError> {
        match source {
            PlanSource::Precomputed(plan) => Ok(accept_plan(&plan, autonomy_default)),
            PlanSource::PrecomputedJson(raw) => Ok(parse_plan(&raw, autonomy_default)),
            PlanSource::Goal(goal) => {
                let generator = self.generator.as_ref().ok_or(RuntimeError::MissingGenerator)?;
                let policy = PolicyHint::from(profile);
                let _timer = MetricTimer::new(metrics::PLAN_GENERATION_LATENCY);
                let (result, attempts) = generator
                    .generate_with_attempts(PlanRequest {
                        goal: &goal,
                        context,
                        policy: &policy,
                        catalog: &self.catalog,
                        autonomy_default,
                    })
                    .await;
                metrics::record_generation_attempts(attempts as u64);
                Ok(result)
            }
        }
    }

    /// The driver is only asked when the snapshot has no size and some step
    /// actually carries coordinates.
    async fn viewport_for(&self, plan: &Plan, context: &ContextSnapshot) -> Viewport {
        if let Some(viewport) = context.viewport {
            return viewport;
        }
        let has_coordinates = plan
            .steps
            .iter()
            .any(|s| s.tool.parse::<ToolName>().is_ok_and(|t| t.is_coordinate()));
        if !has_coordinates {
            return self.config.fallback_viewport;
        }
        match self.driver.viewport_size().await {
            Ok(viewport) if viewport.width > 0 && viewport.height > 0 => viewport,
            Ok(_) => self.config.fallback_viewport,
            Err(e) => {
                warn!("Viewport size unavailable, using fallback: {}", e);
                self.config.fallback_viewport
            }
        }
    }
}

fn finish(outcome: RunOutcome) -> RunOutcome {
    metrics::record_outcome(outcome.status());
    info!("Run finished: {}", outcome.status());
    outcome
}
