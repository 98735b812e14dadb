//! Per-deployment YAML: which pages to scan and how to read them.
//!
//! ```yaml
//! label_selector: ".h3.mb-0"
//! policy: available-only
//! states:
//!   - state: unavailable
//!     label: 予約不可
//!     glyph: "⚪️"
//!     selector: "i[title='予約不可']"
//!   - state: available
//!     label: 予約可
//!     glyph: "✅"
//!     selector: "i[title='予約可']"
//! targets:
//!   - url: https://reserve.example.com/select_date?base_date=2025-07-07
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};
use crate::policy::ActionableSlotsPolicy;
use crate::state::{SlotState, StateSet, StateSpec};

/// One page to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    /// Optional display name used in logs.
    #[serde(default)]
    pub name: Option<String>,
}

impl Target {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

/// Either a preset name or an explicit state list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicySetting {
    Preset(String),
    Explicit {
        #[serde(default)]
        name: Option<String>,
        states: Vec<SlotState>,
    },
}

impl Default for PolicySetting {
    fn default() -> Self {
        PolicySetting::Preset("available-only".to_string())
    }
}

/// Raw file shape before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeploymentFile {
    label_selector: String,
    #[serde(default)]
    policy: PolicySetting,
    states: Vec<StateSpec>,
    targets: Vec<Target>,
}

/// Validated deployment configuration, read-only for the whole run.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub states: StateSet,
    pub label_selector: String,
    pub policy: ActionableSlotsPolicy,
    pub targets: Vec<Target>,
}

impl Deployment {
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: DeploymentFile = serde_yaml::from_str(yaml)?;
        let states = StateSet::new(file.states)?;

        if file.label_selector.trim().is_empty() {
            return Err(MonitorError::Config("label_selector must not be empty".to_string()));
        }
        if file.targets.is_empty() {
            return Err(MonitorError::Config("at least one target must be configured".to_string()));
        }
        if let Some(bad) = file.targets.iter().find(|t| t.url.trim().is_empty()) {
            return Err(MonitorError::Config(format!(
                "target '{}' has an empty url",
                bad.display_name()
            )));
        }

        let policy = resolve_policy(file.policy)?;
        if let Some(missing) = policy.states.iter().find(|s| !states.contains(**s)) {
            return Err(MonitorError::Config(format!(
                "policy '{}' references unconfigured state '{}'",
                policy.name,
                missing.key()
            )));
        }

        Ok(Self {
            states,
            label_selector: file.label_selector,
            policy,
            targets: file.targets,
        })
    }
}

fn resolve_policy(setting: PolicySetting) -> Result<ActionableSlotsPolicy> {
    match setting {
        PolicySetting::Preset(name) => ActionableSlotsPolicy::preset(&name)
            .ok_or_else(|| MonitorError::Config(format!("unknown policy preset: '{}'", name))),
        PolicySetting::Explicit { name, states } => Ok(ActionableSlotsPolicy::new(
            name.unwrap_or_else(|| "custom".to_string()),
            states,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FOUR_STATES: &str = r#"
label_selector: ".h3.mb-0"
policy: available-or-limited
states:
  - state: unavailable
    label: 予約不可
    glyph: "⚪️"
    selector: "i[title='予約不可']"
  - state: full
    label: 空きなし
    glyph: "❌"
    selector: "i[title='空きなし']"
  - state: limited_availability
    label: 残りわずか
    glyph: "🔺"
    selector: "i[title='残りわずか']"
  - state: available
    label: 予約可
    glyph: "✅"
    selector: "i[title='予約可']"
targets:
  - url: https://reserve.example.com/r/1/select_date?base_date=2025-07-07
    name: July
  - url: https://reserve.example.com/r/1/select_date?base_date=2025-08-07
"#;

    #[test]
    fn parse_full_deployment() {
        let d = Deployment::from_yaml(FOUR_STATES).unwrap();
        assert_eq!(d.states.len(), 4);
        assert_eq!(d.label_selector, ".h3.mb-0");
        assert_eq!(d.policy, ActionableSlotsPolicy::available_or_limited());
        assert_eq!(d.targets.len(), 2);
        assert_eq!(d.targets[0].display_name(), "July");
        assert!(d.targets[1].display_name().ends_with("2025-08-07"));
        let order: Vec<_> = d.states.states().collect();
        assert_eq!(
            order,
            vec![
                SlotState::Unavailable,
                SlotState::Full,
                SlotState::LimitedAvailability,
                SlotState::Available
            ]
        );
    }

    #[test]
    fn policy_defaults_to_available_only() {
        let yaml = r#"
label_selector: "h2"
states:
  - state: available
    label: Open
    selector: "td.open"
targets:
  - url: https://example.com
"#;
        let d = Deployment::from_yaml(yaml).unwrap();
        assert_eq!(d.policy, ActionableSlotsPolicy::available_only());
        assert_eq!(d.states.get(SlotState::Available).unwrap().glyph, "•");
    }

    #[test]
    fn explicit_policy_list() {
        let yaml = r#"
label_selector: "h2"
policy:
  name: open-or-full
  states: [available, full]
states:
  - state: full
    label: Full
    selector: "td.full"
  - state: available
    label: Open
    selector: "td.open"
targets:
  - url: https://example.com
"#;
        let d = Deployment::from_yaml(yaml).unwrap();
        assert_eq!(d.policy.name, "open-or-full");
        assert!(d.policy.is_actionable(SlotState::Full));
    }

    #[test]
    fn policy_outside_state_set_rejected() {
        let yaml = r#"
label_selector: "h2"
policy: available-or-limited
states:
  - state: available
    label: Open
    selector: "td.open"
targets:
  - url: https://example.com
"#;
        let err = Deployment::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("limited_availability"), "{err}");
    }

    #[test]
    fn unknown_preset_rejected() {
        let yaml = r#"
label_selector: "h2"
policy: everything
states:
  - state: available
    label: Open
    selector: "td.open"
targets:
  - url: https://example.com
"#;
        let err = Deployment::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown policy preset"));
    }

    #[test]
    fn no_targets_rejected() {
        let yaml = r#"
label_selector: "h2"
states:
  - state: available
    label: Open
    selector: "td.open"
targets: []
"#;
        let err = Deployment::from_yaml(yaml).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FOUR_STATES.as_bytes()).unwrap();
        let d = Deployment::load(file.path()).unwrap();
        assert_eq!(d.targets.len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Deployment::load(Path::new("/nonexistent/slotwatch/targets.yml")).unwrap_err();
        assert!(matches!(err, MonitorError::Io(_)));
    }
}
