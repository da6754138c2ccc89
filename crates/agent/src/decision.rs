//! Staged decision planning: scan, assess, strategize, coordinate, execute,
//! reflect.
//!
//! The planner owns a small team roster and a resource table. Every stage
//! returns a plain value; only coordination and execution change the roster.

use attune_core::{Clock, SystemClock};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MAX_EXPERIENCE: f64 = 10.0;
const EXPERIENCE_GAIN: f64 = 0.1;
const READY_SCORE_PER_SKILL: f64 = 5.0;
const STRONG_SCORE_PER_RESOURCE: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn score(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardLevel {
    Low = 1,
    Medium = 2,
    High = 3,
    Exceptional = 4,
}

impl RewardLevel {
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            1 => Some(Self::Low),
            2 => Some(Self::Medium),
            3 => Some(Self::High),
            4 => Some(Self::Exceptional),
            _ => None,
        }
    }

    pub fn score(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    ActImmediately,
    PrepareAndAct,
    ActIfConvenient,
    Avoid,
    Reassess,
}

impl DecisionAction {
    /// Risk/reward matrix.
    pub fn evaluate(risk: RiskLevel, reward: RewardLevel) -> Self {
        match (reward.score() >= 3, risk.score() >= 3) {
            (true, false) => Self::ActImmediately,
            (true, true) => Self::PrepareAndAct,
            (false, false) => Self::ActIfConvenient,
            (false, true) => Self::Avoid,
        }
    }

    /// Like [`evaluate`](Self::evaluate) for raw 1-4 scores; anything out of
    /// range asks for reassessment.
    pub fn evaluate_scores(risk: u8, reward: u8) -> Self {
        match (RiskLevel::from_score(risk), RewardLevel::from_score(reward)) {
            (Some(risk), Some(reward)) => Self::evaluate(risk, reward),
            _ => Self::Reassess,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ActImmediately => "Act immediately - high reward, low risk",
            Self::PrepareAndAct => "Prepare thoroughly, then act - high reward, high risk",
            Self::ActIfConvenient => "Act if convenient - low reward, low risk",
            Self::Avoid => "Avoid - low reward, high risk",
            Self::Reassess => "Reassess - unclear risk/reward profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn from_count(threats: usize) -> Self {
        match threats {
            0 => Self::Low,
            1..=2 => Self::Moderate,
            3..=4 => Self::High,
            _ => Self::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub name: String,
    pub description: String,
    pub risk: RiskLevel,
    pub reward: RewardLevel,
    pub resources_required: Vec<String>,
    #[serde(default)]
    pub time_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub strengths: Vec<String>,
    /// 1 to 10; grows fractionally with successful executions
    pub experience: f64,
    pub available: bool,
    pub current_task: Option<String>,
}

impl TeamMember {
    pub fn new(name: &str, strengths: &[&str], experience: f64) -> Self {
        Self {
            name: name.to_string(),
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            experience,
            available: true,
            current_task: None,
        }
    }

    fn has_skill(&self, skill: &str) -> bool {
        self.strengths.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentScan {
    pub timestamp: DateTime<Local>,
    pub threats: Vec<String>,
    pub opportunities: Vec<Opportunity>,
    pub resources: BTreeMap<String, i64>,
    pub threat_level: ThreatLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatch {
    pub member: String,
    pub skill: String,
    pub experience: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityAssessment {
    pub total_capacity: usize,
    pub available_members: Vec<String>,
    pub capability_score: f64,
    pub skill_matches: Vec<SkillMatch>,
    pub readiness: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strategy {
    pub opportunity: String,
    pub action: DecisionAction,
    pub team_ready: bool,
    pub resources_available: bool,
    pub recommended_approach: String,
    pub contingency_plan: String,
    pub go: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub role: String,
    pub assigned_to: String,
    pub experience: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    pub status: ExecutionStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lesson {
    pub timestamp: DateTime<Local>,
    pub opportunity: String,
    pub approach: String,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannerStatus {
    pub team_name: String,
    pub total_members: usize,
    pub available_members: usize,
    pub resources: BTreeMap<String, i64>,
    pub lessons: usize,
    pub successes: usize,
}

pub struct DecisionPlanner {
    team_name: String,
    members: Vec<TeamMember>,
    resources: BTreeMap<String, i64>,
    lessons: Vec<Lesson>,
    clock: Arc<dyn Clock>,
}

impl DecisionPlanner {
    pub fn new(team_name: &str) -> Self {
        Self::with_clock(team_name, Arc::new(SystemClock))
    }

    pub fn with_clock(team_name: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            team_name: team_name.to_string(),
            members: Vec::new(),
            resources: BTreeMap::new(),
            lessons: Vec::new(),
            clock,
        }
    }

    pub fn add_member(&mut self, member: TeamMember) {
        debug!(member = %member.name, "Added team member");
        self.members.push(member);
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// Record the resources on hand and rate the threats.
    pub fn scan_environment(
        &mut self,
        threats: Vec<String>,
        opportunities: Vec<Opportunity>,
        resources: BTreeMap<String, i64>,
    ) -> EnvironmentScan {
        let threat_level = ThreatLevel::from_count(threats.len());
        self.resources = resources.clone();
        debug!(threats = threats.len(), level = ?threat_level, "Scanned environment");
        EnvironmentScan {
            timestamp: self.clock.now(),
            threats,
            opportunities,
            resources,
            threat_level,
        }
    }

    /// For each skill, the first available member holding it contributes
    /// their experience. Ready when the score averages 5 per skill.
    pub fn assess_capacity(&self, required_skills: &[&str]) -> CapacityAssessment {
        let available: Vec<&TeamMember> = self.members.iter().filter(|m| m.available).collect();

        let skill_matches: Vec<SkillMatch> = required_skills
            .iter()
            .filter_map(|skill| {
                available.iter().find(|m| m.has_skill(skill)).map(|m| SkillMatch {
                    member: m.name.clone(),
                    skill: skill.to_string(),
                    experience: m.experience,
                })
            })
            .collect();
        let capability_score: f64 = skill_matches.iter().map(|m| m.experience).sum();

        CapacityAssessment {
            total_capacity: available.len(),
            available_members: available.iter().map(|m| m.name.clone()).collect(),
            capability_score,
            skill_matches,
            readiness: capability_score >= required_skills.len() as f64 * READY_SCORE_PER_SKILL,
        }
    }

    pub fn strategize(&self, opportunity: &Opportunity, assessment: &CapacityAssessment) -> Strategy {
        let action = DecisionAction::evaluate(opportunity.risk, opportunity.reward);
        let resources_available = opportunity
            .resources_required
            .iter()
            .all(|r| self.resources.get(r).copied().unwrap_or(0) > 0);

        let recommended_approach = if opportunity.time_sensitive {
            "Swift coordinated action - time-sensitive opportunity"
        } else if opportunity.risk >= RiskLevel::High {
            "Cautious approach - high risk requires preparation"
        } else if assessment.capability_score
            > opportunity.resources_required.len() as f64 * STRONG_SCORE_PER_RESOURCE
        {
            "Aggressive approach - team is highly capable"
        } else {
            "Measured approach - balance capability with risk"
        };
        let contingency_plan = if opportunity.risk >= RiskLevel::High {
            "Retreat and reassess if conditions worsen"
        } else {
            "Adapt approach based on initial results"
        };

        let go = assessment.readiness && resources_available && action != DecisionAction::Avoid;
        info!(opportunity = %opportunity.name, action = ?action, go, "Strategy decided");

        Strategy {
            opportunity: opportunity.name.clone(),
            action,
            team_ready: assessment.readiness,
            resources_available,
            recommended_approach: recommended_approach.to_string(),
            contingency_plan: contingency_plan.to_string(),
            go,
        }
    }

    /// Give each skill to the most experienced member holding it among those
    /// available when coordination starts. One member may take several
    /// roles; members with zero experience are never picked. Assigned
    /// members become unavailable until the strategy is reflected on.
    pub fn coordinate(&mut self, strategy: &Strategy, required_skills: &[&str]) -> Vec<Assignment> {
        let available: Vec<usize> = (0..self.members.len())
            .filter(|&idx| self.members[idx].available)
            .collect();

        let mut assignments = Vec::new();
        for skill in required_skills {
            // Strictly greater keeps the earliest member on equal experience
            let mut best: Option<usize> = None;
            let mut best_score = 0.0;
            for &idx in &available {
                let member = &self.members[idx];
                if member.has_skill(skill) && member.experience > best_score {
                    best_score = member.experience;
                    best = Some(idx);
                }
            }

            if let Some(idx) = best {
                let member = &mut self.members[idx];
                member.available = false;
                member.current_task = Some(strategy.opportunity.clone());
                assignments.push(Assignment {
                    role: skill.to_string(),
                    assigned_to: member.name.clone(),
                    experience: member.experience,
                });
            }
        }
        debug!(assigned = assignments.len(), "Coordinated roles");
        assignments
    }

    /// Run `action` when the strategy is a go, then reflect on the outcome.
    /// A no-go strategy is aborted without running or reflecting.
    pub fn execute<F, E>(&mut self, strategy: &Strategy, action: F) -> ExecutionOutcome
    where
        F: FnOnce() -> std::result::Result<String, E>,
        E: Display,
    {
        if !strategy.go {
            warn!(opportunity = %strategy.opportunity, "Execution aborted by go/no-go check");
            return ExecutionOutcome {
                status: ExecutionStatus::Aborted,
                result: None,
                error: Some("Strategy assessment failed go/no-go criteria".to_string()),
                timestamp: self.clock.now(),
            };
        }

        let outcome = match action() {
            Ok(result) => ExecutionOutcome {
                status: ExecutionStatus::Success,
                result: Some(result),
                error: None,
                timestamp: self.clock.now(),
            },
            Err(e) => ExecutionOutcome {
                status: ExecutionStatus::Failed,
                result: None,
                error: Some(e.to_string()),
                timestamp: self.clock.now(),
            },
        };
        self.reflect(strategy, &outcome);
        outcome
    }

    /// Store the lesson and release everyone working on the strategy.
    pub fn reflect(&mut self, strategy: &Strategy, outcome: &ExecutionOutcome) {
        let success = outcome.status == ExecutionStatus::Success;
        self.lessons.push(Lesson {
            timestamp: self.clock.now(),
            opportunity: strategy.opportunity.clone(),
            approach: strategy.recommended_approach.clone(),
            success,
        });

        for member in &mut self.members {
            if member.current_task.as_deref() == Some(strategy.opportunity.as_str()) {
                member.available = true;
                member.current_task = None;
                if success {
                    member.experience = (member.experience + EXPERIENCE_GAIN).min(MAX_EXPERIENCE);
                }
            }
        }
        info!(opportunity = %strategy.opportunity, success, "Reflected on execution");
    }

    pub fn status(&self) -> PlannerStatus {
        PlannerStatus {
            team_name: self.team_name.clone(),
            total_members: self.members.len(),
            available_members: self.members.iter().filter(|m| m.available).count(),
            resources: self.resources.clone(),
            lessons: self.lessons.len(),
            successes: self.lessons.iter().filter(|l| l.success).count(),
        }
    }
}
