//! Tool handlers. Every tool maps to one handler with the same
//! `(args, context)` contract; adding a tool means adding a [`ToolName`]
//! variant and an arm in [`run_tool`].

use crate::dispatcher::DispatchSettings;
use crate::driver::BrowserDriver;
use crate::error::{DriverError, ExecutionError, Interrupt};
use crate::fuzzy;
use crate::host::HostIo;
use crate::locator;
use crate::pacing::sleep_cancellable;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use webpilot_core::{origin_of, Interactable, Point, ToolName};
use webpilot_interfaces::OriginConfirmer;

type Args = Map<String, Value>;

/// Fetched bodies are truncated to this many chars in step output.
const MAX_BODY_CHARS: usize = 64 * 1024;

/// Run-scoped state threaded through every handler. Owned by a single run.
pub(crate) struct StepContext<'a> {
    pub driver: &'a dyn BrowserDriver,
    pub host: &'a dyn HostIo,
    pub origin_hook: Option<&'a dyn OriginConfirmer>,
    pub interactables: &'a [Interactable],
    pub cancel: &'a CancellationToken,
    pub settings: &'a DispatchSettings,
    pub current_origin: String,
}

impl StepContext<'_> {
    async fn gate_origin(&self, target: &str) -> Result<(), ExecutionError> {
        if !self.settings.require_origin_confirmation
            || self.current_origin.is_empty()
            || self.current_origin == target
        {
            return Ok(());
        }

        let approved = match self.origin_hook {
            Some(hook) => {
                hook.confirm_origin_change(&self.current_origin, target)
                    .await
            }
            None => {
                warn!("No origin confirmation hook installed; denying navigation to {}", target);
                false
            }
        };

        if approved {
            info!("Origin change approved: {} -> {}", self.current_origin, target);
            Ok(())
        } else {
            Err(ExecutionError::OriginChangeDenied {
                from: self.current_origin.clone(),
                to: target.to_string(),
            })
        }
    }

    fn fuzzy_point(&self, target: &str) -> Result<Point, ExecutionError> {
        let not_found = || ExecutionError::SelectorNotFound {
            target: target.to_string(),
        };
        let (element, score) = fuzzy::best_match(target, self.interactables).ok_or_else(not_found)?;
        let center = element.bbox.map(|b| b.center()).ok_or_else(not_found)?;
        warn!(
            "Locator cascade failed for '{}'; using fuzzy match '{}' (score {:.2})",
            target, element.id, score
        );
        Ok(center)
    }
}

pub(crate) async fn run_tool(
    tool: ToolName,
    args: &Args,
    cx: &mut StepContext<'_>,
) -> Result<Value, Interrupt> {
    match tool {
        ToolName::Navigate => navigate(args, cx).await,
        ToolName::Click => click(args, cx).await,
        ToolName::Type => type_text(args, cx).await,
        ToolName::ClickPoint => click_point(args, cx).await,
        ToolName::Drag => drag(args, cx).await,
        ToolName::LongPress => long_press(args, cx).await,
        ToolName::Scroll => scroll(args, cx).await,
        ToolName::PressKey => press_key(args, cx).await,
        ToolName::Wait => wait(args, cx).await,
        ToolName::Screenshot => screenshot(args, cx).await,
        ToolName::Fetch => fetch(args, cx).await,
        ToolName::FileRead => file_read(args, cx).await,
        ToolName::FileWrite => file_write(args, cx).await,
        ToolName::Shell => shell(args, cx).await,
    }
}

async fn navigate(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let url = absolute_url(required_str(args, ToolName::Navigate, "url")?);
    let target = origin_of(&url)
        .ok_or_else(|| ExecutionError::invalid("navigate", "url", "URL has no origin"))?;

    cx.gate_origin(&target).await?;
    cx.driver.navigate(&url).await?;
    cx.current_origin = target.clone();
    Ok(json!({"url": url, "origin": target}))
}

async fn click(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let target = required_str(args, ToolName::Click, "target")?;
    let driver = cx.driver;

    match locator::cascade(target, |l| async move { driver.click(&l).await }).await {
        Ok(found) => Ok(json!({"target": target, "locator": found.to_string()})),
        Err(DriverError::NotFound(_)) => {
            let point = cx.fuzzy_point(target)?;
            click_at(driver, point).await?;
            Ok(json!({"target": target, "fallback_point": point.to_value()}))
        }
        Err(e) => Err(e.into()),
    }
}

async fn type_text(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let target = required_str(args, ToolName::Type, "target")?;
    let text = required_text(args, ToolName::Type, "text")?;
    let driver = cx.driver;

    match locator::cascade(target, |l| async move { driver.type_text(&l, text).await }).await {
        Ok(found) => Ok(json!({"target": target, "locator": found.to_string(), "chars": text.chars().count()})),
        Err(DriverError::NotFound(_)) => {
            let point = cx.fuzzy_point(target)?;
            click_at(driver, point).await?;
            for c in text.chars() {
                let key = c.to_string();
                driver.key_down(&key).await?;
                driver.key_up(&key).await?;
            }
            Ok(json!({"target": target, "fallback_point": point.to_value(), "chars": text.chars().count()}))
        }
        Err(e) => Err(e.into()),
    }
}

async fn click_point(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let point = required_point(args, ToolName::ClickPoint, "point")?;
    click_at(cx.driver, point).await?;
    Ok(json!({"point": point.to_value()}))
}

async fn drag(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let from = required_point(args, ToolName::Drag, "from")?;
    let to = required_point(args, ToolName::Drag, "to")?;
    let steps = optional_u64(args, ToolName::Drag, "steps")?
        .map(|s| s.clamp(1, 100) as u32)
        .unwrap_or(cx.settings.drag_steps)
        .max(1);
    let hold = optional_u64(args, ToolName::Drag, "hold_ms")?
        .map(Duration::from_millis)
        .unwrap_or(cx.settings.drag_hold)
        .min(cx.settings.max_wait);

    let driver = cx.driver;
    driver.mouse_move(from).await?;
    driver.mouse_down().await?;
    for i in 1..=steps {
        let t = f64::from(i) / f64::from(steps);
        let p = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
        driver.mouse_move(p).await?;
    }
    let held = sleep_cancellable(hold, cx.cancel).await;
    // release even when cancelled mid-hold
    driver.mouse_up().await?;
    held?;

    Ok(json!({"from": from.to_value(), "to": to.to_value(), "steps": steps}))
}

async fn long_press(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let point = required_point(args, ToolName::LongPress, "point")?;
    let duration = optional_u64(args, ToolName::LongPress, "duration_ms")?
        .map(Duration::from_millis)
        .unwrap_or(cx.settings.long_press)
        .min(cx.settings.max_wait);

    let driver = cx.driver;
    driver.mouse_move(point).await?;
    driver.mouse_down().await?;
    let held = sleep_cancellable(duration, cx.cancel).await;
    driver.mouse_up().await?;
    held?;

    Ok(json!({"point": point.to_value(), "duration_ms": duration.as_millis() as u64}))
}

async fn scroll(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let dx = optional_f64(args, ToolName::Scroll, "dx")?.unwrap_or(0.0);
    let dy = optional_f64(args, ToolName::Scroll, "dy")?.unwrap_or(0.0);
    cx.driver.wheel(dx, dy).await?;
    Ok(json!({"dx": dx, "dy": dy}))
}

async fn press_key(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let key = required_str(args, ToolName::PressKey, "key")?;
    cx.driver.key_down(key).await?;
    cx.driver.key_up(key).await?;
    Ok(json!({"key": key}))
}

async fn wait(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let ms = optional_u64(args, ToolName::Wait, "ms")?
        .ok_or_else(|| ExecutionError::missing("wait", "ms"))?;
    let mut duration = Duration::from_millis(ms);
    if duration > cx.settings.max_wait {
        warn!("Capping wait of {}ms to {:?}", ms, cx.settings.max_wait);
        duration = cx.settings.max_wait;
    }
    sleep_cancellable(duration, cx.cancel).await?;
    Ok(json!({"waited_ms": duration.as_millis() as u64}))
}

async fn screenshot(_args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let data = cx.driver.screenshot().await?;
    Ok(json!({"screenshot": data}))
}

async fn fetch(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let url = required_str(args, ToolName::Fetch, "url")?;
    let response = cx.host.fetch(url).await?;
    let truncated = response.body.chars().count() > MAX_BODY_CHARS;
    let body: String = response.body.chars().take(MAX_BODY_CHARS).collect();
    Ok(json!({"url": url, "status": response.status, "body": body, "truncated": truncated}))
}

async fn file_read(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let path = required_str(args, ToolName::FileRead, "path")?;
    let content = cx.host.read_file(Path::new(path)).await?;
    Ok(json!({"path": path, "content": content}))
}

async fn file_write(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let path = required_str(args, ToolName::FileWrite, "path")?;
    let content = required_text(args, ToolName::FileWrite, "content")?;
    let bytes = cx.host.write_file(Path::new(path), content).await?;
    Ok(json!({"path": path, "bytes": bytes}))
}

async fn shell(args: &Args, cx: &mut StepContext<'_>) -> Result<Value, Interrupt> {
    let command = required_str(args, ToolName::Shell, "command")?;
    let limit = optional_u64(args, ToolName::Shell, "timeout_ms")?
        .map(Duration::from_millis)
        .unwrap_or(cx.settings.shell_timeout);
    let output = cx.host.run_shell(command, limit).await?;
    Ok(json!(output))
}

async fn click_at(driver: &dyn BrowserDriver, point: Point) -> Result<(), DriverError> {
    driver.mouse_move(point).await?;
    driver.mouse_down().await?;
    driver.mouse_up().await
}

/// Bare hosts such as `example.com/path` are treated as https.
fn absolute_url(raw: &str) -> String {
    if raw.contains("://") || raw.starts_with("about:") || raw.starts_with("data:") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Trimmed, non-empty string argument.
fn required_str<'a>(args: &'a Args, tool: ToolName, name: &str) -> Result<&'a str, ExecutionError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ExecutionError::missing(tool.as_str(), name)),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(ExecutionError::missing(tool.as_str(), name))
        }
        Some(Value::String(s)) => Ok(s.trim()),
        Some(_) => Err(ExecutionError::invalid(tool.as_str(), name, "expected a string")),
    }
}

/// String argument taken verbatim; may be empty.
fn required_text<'a>(args: &'a Args, tool: ToolName, name: &str) -> Result<&'a str, ExecutionError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ExecutionError::missing(tool.as_str(), name)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(ExecutionError::invalid(tool.as_str(), name, "expected a string")),
    }
}

fn optional_f64(args: &Args, tool: ToolName, name: &str) -> Result<Option<f64>, ExecutionError> {
    let parsed = match args.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(ExecutionError::invalid(tool.as_str(), name, "expected a finite number")),
    }
}

fn optional_u64(args: &Args, tool: ToolName, name: &str) -> Result<Option<u64>, ExecutionError> {
    match optional_f64(args, tool, name)? {
        None => Ok(None),
        Some(v) if v >= 0.0 => Ok(Some(v.round() as u64)),
        Some(_) => Err(ExecutionError::invalid(tool.as_str(), name, "must not be negative")),
    }
}

fn required_point(args: &Args, tool: ToolName, name: &str) -> Result<Point, ExecutionError> {
    let value = args
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ExecutionError::missing(tool.as_str(), name))?;
    match Point::from_value(value) {
        Some(p) if p.is_finite() => Ok(p),
        _ => Err(ExecutionError::invalid(tool.as_str(), name, "expected a finite point")),
    }
}
