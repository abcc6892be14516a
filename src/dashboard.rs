//! Dashboard views: pure derivations from a finished `StrategyResult`.
//!
//! Nothing here calls the model or mutates the document. Each view is a
//! serializable payload ready for the presentation layer.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Automation, Level, Okr, StrategyResult, TimelineItem};

/// OKRs shown on the summary tab.
const SUMMARY_OKRS: usize = 3;

/// Roadmap phases shown on the summary tab.
const SUMMARY_PHASES: usize = 4;

pub const STRATEGY_ROOT_LABEL: &str = "Strategy Core";
pub const UNASSIGNED: &str = "Unassigned";

// ── Types ──────────────────────────────────────────────────────────────────

/// Every view at once, for a single payload to the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub roadmap: Roadmap,
    pub risks: Vec<RiskPoint>,
    pub stakeholders: StakeholderMap,
    pub automations: Vec<AutomationCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub okr_count: usize,
    pub action_count: usize,
    pub stakeholder_count: usize,
    pub high_risk_count: usize,
    pub top_okrs: Vec<Okr>,
    pub phases: Vec<TimelineItem>,
}

/// A phase placed on the roadmap axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadmapPhase {
    pub phase: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    /// Days from the earliest parsable start. `None` when the start is not a date.
    pub offset_days: Option<i64>,
    /// Inclusive length in days. `None` unless both dates parse in order.
    pub span_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roadmap {
    pub phases: Vec<RoadmapPhase>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

impl Roadmap {
    /// Days covered from the first start to the last end, inclusive.
    pub fn total_days(&self) -> Option<i64> {
        match (self.starts_on, self.ends_on) {
            (Some(start), Some(end)) if end >= start => Some((end - start).num_days() + 1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPoint {
    pub description: String,
    pub severity: Level,
    pub impact: f64,
    pub mitigation: String,
}

/// Power/interest grid placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    ManageClosely,
    KeepSatisfied,
    KeepInformed,
    Monitor,
}

impl Quadrant {
    /// Only `High` counts as high power or high interest.
    pub fn of(influence: Level, interest: Level) -> Self {
        match (influence == Level::High, interest == Level::High) {
            (true, true) => Self::ManageClosely,
            (true, false) => Self::KeepSatisfied,
            (false, true) => Self::KeepInformed,
            (false, false) => Self::Monitor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeholderNode {
    pub id: String,
    pub label: String,
    pub role: Option<String>,
    pub influence: Option<Level>,
    pub interest: Option<Level>,
    pub quadrant: Option<Quadrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeholderLink {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeholderMap {
    pub nodes: Vec<StakeholderNode>,
    pub links: Vec<StakeholderLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutomationCard {
    pub kind: String,
    pub title: String,
    pub assignee: String,
}

// ── Views ──────────────────────────────────────────────────────────────────

impl Dashboard {
    pub fn from_strategy(strategy: &StrategyResult) -> Self {
        Self {
            summary: summarize(strategy),
            roadmap: build_roadmap(&strategy.timeline),
            risks: risk_matrix(strategy),
            stakeholders: stakeholder_map(strategy),
            automations: automation_cards(&strategy.automations),
        }
    }
}

pub fn summarize(strategy: &StrategyResult) -> DashboardSummary {
    DashboardSummary {
        okr_count: strategy.okrs.len(),
        action_count: strategy.action_items.len(),
        stakeholder_count: strategy.stakeholders.len(),
        high_risk_count: strategy
            .risks
            .iter()
            .filter(|r| r.severity == Level::High)
            .count(),
        top_okrs: strategy.okrs.iter().take(SUMMARY_OKRS).cloned().collect(),
        phases: strategy.timeline.iter().take(SUMMARY_PHASES).cloned().collect(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Phases sorted by start date. Unparsable starts keep their relative order
/// at the end.
pub fn build_roadmap(timeline: &[TimelineItem]) -> Roadmap {
    let mut dated: Vec<(Option<NaiveDate>, &TimelineItem)> =
        timeline.iter().map(|item| (parse_date(&item.start_date), item)).collect();
    // Stable: equal keys keep input order
    dated.sort_by_key(|(start, _)| (start.is_none(), *start));

    let starts_on = dated.iter().filter_map(|(start, _)| *start).min();
    let ends_on = timeline.iter().filter_map(|item| parse_date(&item.end_date)).max();

    let phases = dated
        .into_iter()
        .map(|(start, item)| {
            let end = parse_date(&item.end_date);
            RoadmapPhase {
                phase: item.phase.clone(),
                start_date: item.start_date.clone(),
                end_date: item.end_date.clone(),
                description: item.description.clone(),
                offset_days: match (start, starts_on) {
                    (Some(s), Some(origin)) => Some((s - origin).num_days()),
                    _ => None,
                },
                span_days: match (start, end) {
                    (Some(s), Some(e)) if e >= s => Some((e - s).num_days() + 1),
                    _ => None,
                },
            }
        })
        .collect();

    Roadmap {
        phases,
        starts_on,
        ends_on,
    }
}

/// Impact score plotted on the risk matrix.
pub fn impact_score(severity: Level) -> f64 {
    match severity {
        Level::High => 3.5,
        Level::Medium => 2.0,
        Level::Low => 1.0,
    }
}

/// One point per risk, most severe first.
pub fn risk_matrix(strategy: &StrategyResult) -> Vec<RiskPoint> {
    let mut points: Vec<RiskPoint> = strategy
        .risks
        .iter()
        .map(|risk| RiskPoint {
            description: risk.description.clone(),
            severity: risk.severity,
            impact: impact_score(risk.severity),
            mitigation: risk.mitigation.clone(),
        })
        .collect();
    points.sort_by_key(|p| std::cmp::Reverse(p.severity.rank()));
    points
}

/// Root node linked to every stakeholder.
pub fn stakeholder_map(strategy: &StrategyResult) -> StakeholderMap {
    let root_id = "root".to_string();
    let mut nodes = vec![StakeholderNode {
        id: root_id.clone(),
        label: STRATEGY_ROOT_LABEL.to_string(),
        role: None,
        influence: None,
        interest: None,
        quadrant: None,
    }];
    let mut links = Vec::with_capacity(strategy.stakeholders.len());

    for (index, stakeholder) in strategy.stakeholders.iter().enumerate() {
        let id = format!("stakeholder-{index}");
        nodes.push(StakeholderNode {
            id: id.clone(),
            label: stakeholder.name.clone(),
            role: Some(stakeholder.role.clone()),
            influence: Some(stakeholder.influence),
            interest: Some(stakeholder.interest),
            quadrant: Some(Quadrant::of(stakeholder.influence, stakeholder.interest)),
        });
        links.push(StakeholderLink {
            source: root_id.clone(),
            target: id,
        });
    }

    StakeholderMap { nodes, links }
}

pub fn automation_cards(automations: &[Automation]) -> Vec<AutomationCard> {
    automations
        .iter()
        .map(|automation| AutomationCard {
            kind: automation.kind().to_string(),
            title: automation
                .title()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(automation.kind())
                .to_string(),
            assignee: automation
                .owner()
                .filter(|o| !o.trim().is_empty())
                .unwrap_or(UNASSIGNED)
                .to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Risk, Stakeholder, TaskAutomation};
    use crate::pipeline::demo::reference_strategy;

    fn phase(name: &str, start: &str, end: &str) -> TimelineItem {
        TimelineItem {
            phase: name.into(),
            start_date: start.into(),
            end_date: end.into(),
            description: String::new(),
        }
    }

    #[test]
    fn summary_of_reference_strategy() {
        let summary = summarize(&reference_strategy());
        assert_eq!(summary.okr_count, 2);
        assert_eq!(summary.action_count, 4);
        assert_eq!(summary.stakeholder_count, 4);
        assert_eq!(summary.high_risk_count, 1);
        assert_eq!(summary.top_okrs.len(), 2);
        assert_eq!(summary.phases.len(), 3);
    }

    #[test]
    fn summary_caps_lists() {
        let mut strategy = reference_strategy();
        strategy.okrs.extend(strategy.okrs.clone());
        strategy.timeline.extend(strategy.timeline.clone());
        let summary = summarize(&strategy);
        assert_eq!(summary.okr_count, 4);
        assert_eq!(summary.top_okrs.len(), 3);
        assert_eq!(summary.phases.len(), 4);
    }

    #[test]
    fn roadmap_sorted_with_offsets() {
        let roadmap = build_roadmap(&[
            phase("Beta", "2025-12-15", "2025-12-30"),
            phase("Alpha", "2025-12-01", "2025-12-14"),
        ]);
        assert_eq!(roadmap.phases[0].phase, "Alpha");
        assert_eq!(roadmap.phases[0].offset_days, Some(0));
        assert_eq!(roadmap.phases[0].span_days, Some(14));
        assert_eq!(roadmap.phases[1].offset_days, Some(14));
        assert_eq!(roadmap.total_days(), Some(30));
    }

    #[test]
    fn unparsable_dates_sort_last_in_order() {
        let roadmap = build_roadmap(&[
            phase("Later", "Q3", "Q4"),
            phase("Sometime", "TBD", "TBD"),
            phase("Kickoff", "2026-01-05", "2026-01-09"),
        ]);
        let names: Vec<&str> = roadmap.phases.iter().map(|p| p.phase.as_str()).collect();
        assert_eq!(names, vec!["Kickoff", "Later", "Sometime"]);
        assert_eq!(roadmap.phases[1].offset_days, None);
        assert_eq!(roadmap.phases[1].span_days, None);
    }

    #[test]
    fn inverted_phase_has_no_span() {
        let roadmap = build_roadmap(&[phase("Odd", "2026-02-01", "2026-01-01")]);
        assert_eq!(roadmap.phases[0].span_days, None);
        assert_eq!(roadmap.total_days(), None);
    }

    #[test]
    fn empty_roadmap() {
        let roadmap = build_roadmap(&[]);
        assert!(roadmap.phases.is_empty());
        assert_eq!(roadmap.starts_on, None);
    }

    #[test]
    fn risks_ordered_by_severity() {
        let mut strategy = reference_strategy();
        strategy.risks.reverse();
        strategy.risks.push(Risk {
            description: "Key hire leaves".into(),
            severity: Level::High,
            mitigation: "Succession plan".into(),
        });

        let points = risk_matrix(&strategy);
        let severities: Vec<Level> = points.iter().map(|p| p.severity).collect();
        assert_eq!(severities, vec![Level::High, Level::High, Level::Medium, Level::Low]);
        assert_eq!(points[0].description, "API Rate limits exceeded during launch");
        assert_eq!(points[0].impact, 3.5);
        assert_eq!(points[3].impact, 1.0);
    }

    #[test]
    fn stakeholder_map_links_root_to_everyone() {
        let map = stakeholder_map(&reference_strategy());
        assert_eq!(map.nodes.len(), 5);
        assert_eq!(map.nodes[0].label, STRATEGY_ROOT_LABEL);
        assert_eq!(map.links.len(), 4);
        assert!(map.links.iter().all(|l| l.source == "root"));

        let legal = map.nodes.iter().find(|n| n.label == "Legal & Compliance").unwrap();
        assert_eq!(legal.quadrant, Some(Quadrant::KeepSatisfied));
        let marketing = map.nodes.iter().find(|n| n.label == "Marketing Dept").unwrap();
        assert_eq!(marketing.quadrant, Some(Quadrant::Monitor));
    }

    #[test]
    fn quadrant_grid() {
        assert_eq!(Quadrant::of(Level::High, Level::High), Quadrant::ManageClosely);
        assert_eq!(Quadrant::of(Level::Low, Level::High), Quadrant::KeepInformed);
        let stakeholder = Stakeholder {
            name: "Ops".into(),
            role: "Support".into(),
            influence: Level::Medium,
            interest: Level::Low,
        };
        assert_eq!(Quadrant::of(stakeholder.influence, stakeholder.interest), Quadrant::Monitor);
    }

    #[test]
    fn automation_cards_fall_back() {
        let cards = automation_cards(&[
            Automation::CreateTask(TaskAutomation {
                title: "Set up analytics dashboard".into(),
                owner: None,
            }),
            Automation::Unknown {
                kind: "calendar.invite".into(),
                payload: serde_json::Map::new(),
            },
        ]);
        assert_eq!(cards[0].assignee, UNASSIGNED);
        assert_eq!(cards[0].title, "Set up analytics dashboard");
        assert_eq!(cards[1].title, "calendar.invite");
    }

    #[test]
    fn reference_dashboard_serializes() {
        let dashboard = Dashboard::from_strategy(&reference_strategy());
        let value = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(value["summary"]["high_risk_count"], 1);
        assert_eq!(value["automations"][0]["assignee"], "Dev Team");
        assert_eq!(value["stakeholders"]["nodes"][1]["quadrant"], "manage_closely");
    }
}
