//! Offline demo: a fixed reference strategy and the pacing used to walk the
//! state machine without touching the network.

use std::time::Duration;

use crate::models::{
    ActionItem, Automation, Level, NotifyAutomation, Okr, Risk, Stakeholder, StrategyResult,
    TaskAutomation, TimelineItem,
};

/// Placeholder board photo shown while the demo runs.
pub const DEMO_PREVIEW_URL: &str = "https://images.unsplash.com/photo-1531403009284-440f080d1e12?auto=format&fit=crop&q=80&w=2940&ixlib=rb-4.0.3";

/// How long the demo lingers in each working state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoScript {
    pub transcribing: Duration,
    pub classifying: Duration,
    pub synthesizing: Duration,
}

impl Default for DemoScript {
    fn default() -> Self {
        Self {
            transcribing: Duration::from_millis(800),
            classifying: Duration::from_millis(1000),
            synthesizing: Duration::from_millis(1200),
        }
    }
}

impl DemoScript {
    /// No pauses. Same transitions.
    pub fn instant() -> Self {
        Self {
            transcribing: Duration::ZERO,
            classifying: Duration::ZERO,
            synthesizing: Duration::ZERO,
        }
    }

    pub fn total(&self) -> Duration {
        self.transcribing + self.classifying + self.synthesizing
    }
}

fn okr(objective: &str, key_results: &[&str]) -> Okr {
    Okr {
        objective: objective.to_string(),
        key_results: key_results.iter().map(|kr| kr.to_string()).collect(),
    }
}

fn action(title: &str, owner: &str, duration: &str, priority: Level) -> ActionItem {
    ActionItem {
        title: title.to_string(),
        owner: Some(owner.to_string()),
        duration: Some(duration.to_string()),
        priority: Some(priority),
    }
}

fn phase(name: &str, start: &str, end: &str, description: &str) -> TimelineItem {
    TimelineItem {
        phase: name.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        description: description.to_string(),
    }
}

fn stakeholder(name: &str, role: &str, influence: Level, interest: Level) -> Stakeholder {
    Stakeholder {
        name: name.to_string(),
        role: role.to_string(),
        influence,
        interest,
    }
}

fn risk(description: &str, severity: Level, mitigation: &str) -> Risk {
    Risk {
        description: description.to_string(),
        severity,
        mitigation: mitigation.to_string(),
    }
}

/// The strategy the demo always completes with.
pub fn reference_strategy() -> StrategyResult {
    StrategyResult {
        okrs: vec![
            okr(
                "Launch Stratify MVP and achieve 1000 active users",
                &[
                    "Reach 5,000 unique website visitors",
                    "Achieve 20% sign-up conversion rate",
                    "Maintain < 2s average processing latency",
                ],
            ),
            okr(
                "Establish Market Presence in Enterprise Sector",
                &[
                    "Secure 3 beta partners from Fortune 500",
                    "Publish 2 case studies on efficiency gains",
                    "Integrate with Jira and Salesforce",
                ],
            ),
        ],
        action_items: vec![
            action("Finalize Gemini 3 Pro API integration", "Dev Team", "1 week", Level::High),
            action("Design landing page marketing assets", "Sarah", "3 days", Level::Medium),
            action("Conduct security audit for data compliance", "Alex", "2 weeks", Level::High),
            action("Draft user documentation", "Jamie", "1 week", Level::Low),
        ],
        timeline: vec![
            phase("Alpha Release", "2025-12-01", "2025-12-14", "Internal testing and core feature validation"),
            phase("Beta Launch", "2025-12-15", "2025-12-30", "Public beta with waitlist access"),
            phase("V1.0 Go-Live", "2026-01-10", "2026-01-31", "Full public launch and marketing push"),
        ],
        stakeholders: vec![
            stakeholder("Executive Board", "Sponsor", Level::High, Level::High),
            stakeholder("Product Team", "Execution", Level::High, Level::High),
            stakeholder("Marketing Dept", "Promotion", Level::Medium, Level::Medium),
            stakeholder("Legal & Compliance", "Reviewer", Level::High, Level::Low),
        ],
        risks: vec![
            risk(
                "API Rate limits exceeded during launch",
                Level::High,
                "Implement robust caching and quota management",
            ),
            risk(
                "Low user adoption of advanced features",
                Level::Medium,
                "Create interactive tutorials and onboarding flow",
            ),
            risk(
                "Browser compatibility issues",
                Level::Low,
                "Extensive cross-browser testing suite",
            ),
        ],
        automations: vec![
            Automation::CreateTask(TaskAutomation {
                title: "Set up analytics dashboard".to_string(),
                owner: Some("Dev Team".to_string()),
            }),
            Automation::NotifyChannel(NotifyAutomation {
                channel: "#launches".to_string(),
                message: "Beta is live!".to_string(),
            }),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_has_expected_shape() {
        let strategy = reference_strategy();
        assert_eq!(strategy.okrs.len(), 2);
        assert_eq!(strategy.action_items.len(), 4);
        assert_eq!(strategy.timeline.len(), 3);
        assert_eq!(strategy.stakeholders.len(), 4);
        assert_eq!(strategy.risks.len(), 3);
        assert_eq!(strategy.automations.len(), 2);
        assert!(strategy.okrs.iter().all(|o| o.key_results.len() == 3));
    }

    #[test]
    fn fixture_survives_wire_round_trip() {
        let strategy = reference_strategy();
        let json = serde_json::to_string(&strategy).unwrap();
        let decoded: StrategyResult = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, strategy);
    }

    #[test]
    fn default_pacing() {
        let script = DemoScript::default();
        assert_eq!(script.transcribing, Duration::from_millis(800));
        assert_eq!(script.total(), Duration::from_millis(3000));
        assert_eq!(DemoScript::instant().total(), Duration::ZERO);
    }
}
