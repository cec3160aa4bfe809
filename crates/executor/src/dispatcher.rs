use crate::driver::BrowserDriver;
use crate::error::{ExecutionError, Interrupt};
use crate::host::HostIo;
use crate::pacing::Pacer;
use crate::tools::{run_tool, StepContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use webpilot_core::{ContextSnapshot, Plan, ToolName};
use webpilot_interfaces::OriginConfirmer;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    /// Minimum gap between one action's completion and the next dispatch.
    pub min_interval: Duration,
    pub require_origin_confirmation: bool,
    pub shell_timeout: Duration,
    /// Upper bound for `wait` and for drag/long-press holds.
    pub max_wait: Duration,
    pub drag_steps: u32,
    pub drag_hold: Duration,
    pub long_press: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(250),
            require_origin_confirmation: true,
            shell_timeout: Duration::from_secs(30),
            max_wait: Duration::from_secs(60),
            drag_steps: 12,
            drag_hold: Duration::from_millis(120),
            long_press: Duration::from_millis(800),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub index: usize,
    pub tool: String,
    pub output: Value,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Completed {
        records: Vec<StepRecord>,
    },
    /// Cancellation observed before step `at_step` finished.
    Cancelled {
        at_step: usize,
        records: Vec<StepRecord>,
    },
    Failed {
        index: usize,
        tool: String,
        error: ExecutionError,
        records: Vec<StepRecord>,
    },
}

impl ExecutionOutcome {
    pub fn records(&self) -> &[StepRecord] {
        match self {
            Self::Completed { records }
            | Self::Cancelled { records, .. }
            | Self::Failed { records, .. } => records,
        }
    }
}

/// Runs validated plans step by step against a browser driver.
pub struct Dispatcher {
    driver: Arc<dyn BrowserDriver>,
    host: Arc<dyn HostIo>,
    origin_hook: Option<Arc<dyn OriginConfirmer>>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(driver: Arc<dyn BrowserDriver>, host: Arc<dyn HostIo>) -> Self {
        Self {
            driver,
            host,
            origin_hook: None,
            settings: DispatchSettings::default(),
        }
    }

    pub fn with_origin_hook(mut self, hook: Arc<dyn OriginConfirmer>) -> Self {
        self.origin_hook = Some(hook);
        self
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Execute every step in order. The first failure aborts the run; nothing
    /// is retried. `context` supplies the starting origin and the element
    /// list used for fuzzy fallback.
    pub async fn execute(
        &self,
        plan: &Plan,
        context: &ContextSnapshot,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome {
        let mut cx = StepContext {
            driver: &*self.driver,
            host: &*self.host,
            origin_hook: self.origin_hook.as_deref(),
            interactables: &context.interactables,
            cancel,
            settings: &self.settings,
            current_origin: context.origin.clone(),
        };
        let mut pacer = Pacer::new(self.settings.min_interval);
        let mut records = Vec::with_capacity(plan.steps.len());

        info!("Executing plan {} ({} steps)", plan.plan_id, plan.steps.len());

        for (index, step) in plan.steps.iter().enumerate() {
            if pacer.wait_turn(cancel).await.is_err() || cancel.is_cancelled() {
                warn!("Run cancelled before step {}", index);
                return ExecutionOutcome::Cancelled {
                    at_step: index,
                    records,
                };
            }

            let tool = match ToolName::from_str(&step.tool) {
                Ok(tool) => tool,
                Err(_) => {
                    error!("Step {} names unsupported tool '{}'", index, step.tool);
                    return ExecutionOutcome::Failed {
                        index,
                        tool: step.tool.clone(),
                        error: ExecutionError::UnsupportedTool {
                            tool: step.tool.clone(),
                        },
                        records,
                    };
                }
            };

            debug!("Dispatching step {}: {}", index, tool);
            let started_at = Utc::now();
            let started = Instant::now();
            let result = run_tool(tool, &step.args, &mut cx).await;
            pacer.mark_done();
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(output) => {
                    debug!("Step {} ({}) completed in {}ms", index, tool, duration_ms);
                    records.push(StepRecord {
                        index,
                        tool: step.tool.clone(),
                        output,
                        started_at,
                        duration_ms,
                    });
                }
                Err(Interrupt::Cancelled) => {
                    warn!("Run cancelled during step {} ({})", index, tool);
                    return ExecutionOutcome::Cancelled {
                        at_step: index,
                        records,
                    };
                }
                Err(Interrupt::Failed(e)) => {
                    error!("Step {} ({}) failed: {}", index, tool, e);
                    return ExecutionOutcome::Failed {
                        index,
                        tool: step.tool.clone(),
                        error: e,
                        records,
                    };
                }
            }
        }

        info!("Plan {} completed", plan.plan_id);
        ExecutionOutcome::Completed { records }
    }
}
