use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::Level;

/// The terminal artifact of a pipeline run.
///
/// Every collection is required on the wire: a synthesis response that omits
/// one does not decode. Empty collections are fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub okrs: Vec<Okr>,
    pub action_items: Vec<ActionItem>,
    pub timeline: Vec<TimelineItem>,
    pub stakeholders: Vec<Stakeholder>,
    pub risks: Vec<Risk>,
    pub automations: Vec<Automation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Okr {
    pub objective: String,
    #[serde(default)]
    pub key_results: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Level>,
}

/// A roadmap phase. Dates are opaque strings (normally `YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub phase: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stakeholder {
    pub name: String,
    pub role: String,
    pub influence: Level,
    pub interest: Level,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub description: String,
    pub severity: Level,
    pub mitigation: String,
}

// ──────────────────────────────────────────────
// Automations
// ──────────────────────────────────────────────

pub const TASK_CREATE: &str = "task.create";
pub const NOTIFY_CHANNEL: &str = "notify.channel";

/// Payload of a `task.create` automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAutomation {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Payload of a `notify.channel` automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyAutomation {
    pub channel: String,
    pub message: String,
}

/// A follow-up workflow proposed by synthesis.
///
/// Known types get a typed payload. Anything else, including a known type
/// whose payload does not fit, is kept as `Unknown` with the payload untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAutomation", into = "RawAutomation")]
pub enum Automation {
    CreateTask(TaskAutomation),
    NotifyChannel(NotifyAutomation),
    Unknown {
        kind: String,
        payload: Map<String, Value>,
    },
}

impl Automation {
    /// The wire type tag, e.g. `task.create`.
    pub fn kind(&self) -> &str {
        match self {
            Self::CreateTask(_) => TASK_CREATE,
            Self::NotifyChannel(_) => NOTIFY_CHANNEL,
            Self::Unknown { kind, .. } => kind.as_str(),
        }
    }

    /// Best display title for the automation.
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::CreateTask(task) => Some(task.title.as_str()),
            Self::NotifyChannel(notify) => Some(notify.message.as_str()),
            Self::Unknown { payload, .. } => payload.get("title").and_then(Value::as_str),
        }
    }

    /// Assignee, when the automation carries one.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::CreateTask(task) => task.owner.as_deref(),
            Self::NotifyChannel(_) => None,
            Self::Unknown { payload, .. } => payload.get("owner").and_then(Value::as_str),
        }
    }
}

/// Wire form: `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAutomation {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Map<String, Value>>,
}

impl From<RawAutomation> for Automation {
    fn from(raw: RawAutomation) -> Self {
        let payload = raw.payload.unwrap_or_default();
        let typed = match raw.kind.as_str() {
            TASK_CREATE => serde_json::from_value(Value::Object(payload.clone()))
                .map(Automation::CreateTask)
                .ok(),
            NOTIFY_CHANNEL => serde_json::from_value(Value::Object(payload.clone()))
                .map(Automation::NotifyChannel)
                .ok(),
            _ => None,
        };

        typed.unwrap_or_else(|| {
            tracing::debug!(kind = %raw.kind, "Automation kept as opaque payload");
            Automation::Unknown {
                kind: raw.kind,
                payload,
            }
        })
    }
}

impl From<Automation> for RawAutomation {
    fn from(automation: Automation) -> Self {
        let (kind, payload) = match automation {
            Automation::CreateTask(task) => (TASK_CREATE.to_string(), to_object(&task)),
            Automation::NotifyChannel(notify) => (NOTIFY_CHANNEL.to_string(), to_object(&notify)),
            Automation::Unknown { kind, payload } => (kind, payload),
        };
        RawAutomation {
            kind,
            payload: Some(payload),
        }
    }
}

fn to_object<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_document() -> &'static str {
        r##"{
            "okrs": [{"objective": "Grow revenue", "key_results": ["+20% ARR"]}],
            "action_items": [{"title": "Hire AE", "owner": "Sam", "priority": "High"}],
            "timeline": [{"phase": "Q1", "start_date": "2025-12-01", "end_date": "2026-02-28", "description": "Ramp"}],
            "stakeholders": [{"name": "Board", "role": "Sponsor", "influence": "High", "interest": "Medium"}],
            "risks": [{"description": "Churn", "severity": "Medium", "mitigation": "CS program"}],
            "automations": [
                {"type": "task.create", "payload": {"title": "Open req", "owner": "HR"}},
                {"type": "notify.channel", "payload": {"channel": "#sales", "message": "Kickoff"}},
                {"type": "calendar.invite", "payload": {"when": "Monday"}}
            ]
        }"##
    }

    #[test]
    fn decodes_complete_document() {
        let result: StrategyResult = serde_json::from_str(full_document()).unwrap();
        assert_eq!(result.okrs[0].objective, "Grow revenue");
        assert_eq!(result.action_items[0].priority, Some(Level::High));
        assert_eq!(result.action_items[0].duration, None);
        assert_eq!(result.stakeholders[0].interest, Level::Medium);
        assert_eq!(result.automations.len(), 3);
    }

    #[test]
    fn automations_are_tagged() {
        let result: StrategyResult = serde_json::from_str(full_document()).unwrap();
        match &result.automations[0] {
            Automation::CreateTask(task) => {
                assert_eq!(task.title, "Open req");
                assert_eq!(task.owner.as_deref(), Some("HR"));
            }
            other => panic!("expected task automation, got {other:?}"),
        }
        match &result.automations[1] {
            Automation::NotifyChannel(notify) => assert_eq!(notify.channel, "#sales"),
            other => panic!("expected channel automation, got {other:?}"),
        }
        match &result.automations[2] {
            Automation::Unknown { kind, payload } => {
                assert_eq!(kind, "calendar.invite");
                assert_eq!(payload.get("when").and_then(Value::as_str), Some("Monday"));
            }
            other => panic!("expected unknown automation, got {other:?}"),
        }
    }

    #[test]
    fn known_type_with_wrong_payload_stays_opaque() {
        let automation: Automation =
            serde_json::from_str(r#"{"type": "task.create", "payload": {"owner": "HR"}}"#).unwrap();
        assert_eq!(automation.kind(), "task.create");
        assert!(matches!(automation, Automation::Unknown { .. }));
        assert_eq!(automation.owner(), Some("HR"));
    }

    #[test]
    fn automation_serializes_to_wire_shape() {
        let automation = Automation::CreateTask(TaskAutomation {
            title: "Set up analytics".into(),
            owner: None,
        });
        let value = serde_json::to_value(&automation).unwrap();
        assert_eq!(value["type"], "task.create");
        assert_eq!(value["payload"]["title"], "Set up analytics");
    }

    #[test]
    fn missing_collection_rejected() {
        let mut value: Value = serde_json::from_str(full_document()).unwrap();
        value.as_object_mut().unwrap().remove("risks");
        assert!(serde_json::from_value::<StrategyResult>(value).is_err());
    }

    #[test]
    fn empty_collections_accepted() {
        let result: StrategyResult = serde_json::from_str(
            r#"{"okrs": [], "action_items": [], "timeline": [], "stakeholders": [], "risks": [], "automations": []}"#,
        )
        .unwrap();
        assert!(result.okrs.is_empty());
        assert!(result.automations.is_empty());
    }
}
