use crate::error::GuardrailError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, warn};

/// Named bundle of execution limits and restrictions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuardrailProfile {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_steps: usize,
    #[serde(default)]
    pub blocked_tools: BTreeSet<String>,
    #[serde(default)]
    pub allow_password: bool,
    #[serde(default = "default_require_origin_confirmation")]
    pub require_origin_confirmation: bool,
    #[serde(default = "default_autonomy_level")]
    pub autonomy_level: String,
}

fn default_require_origin_confirmation() -> bool {
    true
}

fn default_autonomy_level() -> String {
    "assisted".to_string()
}

impl GuardrailProfile {
    pub fn is_blocked(&self, tool: &str) -> bool {
        self.blocked_tools.contains(tool)
    }

    /// Constraint text embedded in the planning prompt.
    pub fn constraint_text(&self) -> String {
        let blocked = if self.blocked_tools.is_empty() {
            "none".to_string()
        } else {
            self.blocked_tools
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Profile '{}': at most {} steps. Blocked tools: {}. Typing into password fields is {}. Cross-origin navigation {}.",
            self.name,
            self.max_steps,
            blocked,
            if self.allow_password { "allowed" } else { "forbidden" },
            if self.require_origin_confirmation {
                "requires human confirmation"
            } else {
                "is unrestricted"
            }
        )
    }

    fn builtin(
        name: &str,
        description: &str,
        max_steps: usize,
        blocked: &[&str],
        allow_password: bool,
        require_origin_confirmation: bool,
        autonomy_level: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            max_steps,
            blocked_tools: blocked.iter().map(|s| s.to_string()).collect(),
            allow_password,
            require_origin_confirmation,
            autonomy_level: autonomy_level.to_string(),
        }
    }
}

/// Every profile known to a run, plus where they came from.
#[derive(Debug, Clone)]
pub struct GuardrailSet {
    profiles: BTreeMap<String, GuardrailProfile>,
    /// Set when the document could not be used and defaults were substituted.
    pub load_error: Option<String>,
}

impl GuardrailSet {
    pub const DEFAULT_PROFILE: &'static str = "conservative";

    pub fn defaults() -> Self {
        let high_risk = ["shell", "file_write"];
        let profiles = [
            GuardrailProfile::builtin(
                "conservative",
                "Short plans, high-risk tools blocked, cross-origin navigation confirmed",
                8,
                &high_risk,
                false,
                true,
                "assisted",
            ),
            GuardrailProfile::builtin(
                "lenient",
                "Longer plans with the same tool blocks as conservative",
                20,
                &high_risk,
                false,
                true,
                "semi_auto",
            ),
            GuardrailProfile::builtin(
                "high_autonomy",
                "No tool blocks, password entry allowed, no origin confirmation",
                40,
                &[],
                true,
                false,
                "auto",
            ),
            GuardrailProfile::builtin(
                "maximal",
                "Highest step ceiling, fully unrestricted",
                200,
                &[],
                true,
                false,
                "auto",
            ),
            GuardrailProfile::builtin(
                "mobile",
                "Touch-first variant of conservative",
                8,
                &high_risk,
                false,
                true,
                "assisted",
            ),
        ];

        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
            load_error: None,
        }
    }

    /// Parse a guardrail document (YAML; JSON is accepted as a subset).
    pub fn from_yaml_str(content: &str) -> Result<Self, GuardrailError> {
        let raw: BTreeMap<String, GuardrailProfile> = serde_yaml::from_str(content)?;

        let mut profiles = BTreeMap::new();
        for (name, mut profile) in raw {
            if profile.max_steps == 0 {
                return Err(GuardrailError::InvalidProfile {
                    profile: name,
                    reason: "max_steps must be greater than zero".to_string(),
                });
            }
            profile.name = name.clone();
            profiles.insert(name, profile);
        }

        if profiles.is_empty() {
            return Err(GuardrailError::InvalidProfile {
                profile: String::new(),
                reason: "document defines no profiles".to_string(),
            });
        }

        Ok(Self {
            profiles,
            load_error: None,
        })
    }

    /// Load a guardrail document. Never fails: any problem yields the
    /// built-in defaults tagged with the error.
    pub async fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let result = match tokio::fs::read_to_string(path).await {
            Ok(content) => Self::from_yaml_str(&content),
            Err(e) => Err(GuardrailError::Io(e)),
        };

        match result {
            Ok(set) => {
                debug!(
                    "Loaded {} guardrail profiles from {}",
                    set.profiles.len(),
                    path.display()
                );
                set
            }
            Err(e) => {
                warn!(
                    "Guardrail document {} unusable, falling back to defaults: {}",
                    path.display(),
                    e
                );
                let mut set = Self::defaults();
                set.load_error = Some(e.to_string());
                set
            }
        }
    }

    pub fn profile(&self, name: &str) -> Result<&GuardrailProfile, GuardrailError> {
        self.profiles
            .get(name)
            .ok_or_else(|| GuardrailError::UnknownProfile(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

impl Default for GuardrailSet {
    fn default() -> Self {
        Self::defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_profiles() {
        let set = GuardrailSet::defaults();
        assert_eq!(
            set.names(),
            vec!["conservative", "high_autonomy", "lenient", "maximal", "mobile"]
        );

        let conservative = set.profile("conservative").unwrap();
        assert!(conservative.is_blocked("shell"));
        assert!(conservative.require_origin_confirmation);
        assert!(!conservative.allow_password);

        let lenient = set.profile("lenient").unwrap();
        assert!(lenient.max_steps > conservative.max_steps);
        assert_eq!(lenient.blocked_tools, conservative.blocked_tools);

        let high = set.profile("high_autonomy").unwrap();
        assert!(high.blocked_tools.is_empty());
        assert!(high.allow_password);
        assert!(!high.require_origin_confirmation);

        let maximal = set.profile("maximal").unwrap();
        assert!(maximal.max_steps > high.max_steps);

        let mobile = set.profile("mobile").unwrap();
        assert_eq!(mobile.blocked_tools, conservative.blocked_tools);
        assert_eq!(mobile.max_steps, conservative.max_steps);
    }

    #[test]
    fn test_parse_document() {
        let doc = r#"
strict:
  description: "read only"
  max_steps: 3
  blocked_tools: [shell, file_write, fetch]
  allow_password: false
  require_origin_confirmation: true
  autonomy_level: assisted
"#;
        let set = GuardrailSet::from_yaml_str(doc).unwrap();
        let strict = set.profile("strict").unwrap();
        assert_eq!(strict.name, "strict");
        assert_eq!(strict.max_steps, 3);
        assert!(strict.is_blocked("fetch"));
    }

    #[test]
    fn test_parse_json_document() {
        let doc = r#"{"open": {"max_steps": 5, "allow_password": true}}"#;
        let set = GuardrailSet::from_yaml_str(doc).unwrap();
        let open = set.profile("open").unwrap();
        assert!(open.allow_password);
        assert!(open.require_origin_confirmation);
        assert_eq!(open.autonomy_level, "assisted");
    }

    #[test]
    fn test_zero_max_steps_rejected() {
        let err = GuardrailSet::from_yaml_str("bad:\n  max_steps: 0\n").unwrap_err();
        assert!(err.to_string().contains("max_steps"));
    }

    #[test]
    fn test_unknown_profile() {
        let set = GuardrailSet::defaults();
        assert!(matches!(
            set.profile("nope"),
            Err(GuardrailError::UnknownProfile(_))
        ));
    }

    #[tokio::test]
    async fn test_load_falls_back_on_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("guardrails.yaml");
        fs::write(&path, "conservative: [this is: not a profile").unwrap();

        let set = GuardrailSet::load(&path).await;
        assert!(set.load_error.is_some());
        assert!(set.profile("conservative").is_ok());
    }

    #[tokio::test]
    async fn test_load_falls_back_on_missing_file() {
        let set = GuardrailSet::load("/nonexistent/guardrails.yaml").await;
        assert!(set.load_error.as_deref().unwrap().contains("IO error"));
        assert_eq!(set.names().len(), 5);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("guardrails.yaml");
        fs::write(&path, "kiosk:\n  max_steps: 4\n  blocked_tools: [navigate]\n").unwrap();

        let set = GuardrailSet::load(&path).await;
        assert!(set.load_error.is_none());
        assert!(set.profile("kiosk").unwrap().is_blocked("navigate"));
    }

    #[test]
    fn test_constraint_text_lists_blocks() {
        let set = GuardrailSet::defaults();
        let text = set.profile("conservative").unwrap().constraint_text();
        assert!(text.contains("file_write, shell"));
        assert!(text.contains("at most 8 steps"));
    }
}
