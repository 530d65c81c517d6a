//! Tournament, its settings and lifecycle status.

use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Lifecycle: Draft (registration open) -> Active (groups or bracket built) -> Completed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Draft,
    Active,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Group stage only; placements come from the group tables.
    Groups,
    /// Group stage feeding a single-elimination playoff.
    #[default]
    GroupsKnockout,
    /// Single-elimination bracket seeded from the registrations.
    Elimination,
}

impl TournamentFormat {
    pub fn has_groups(self) -> bool {
        matches!(self, Self::Groups | Self::GroupsKnockout)
    }

    pub fn has_playoffs(self) -> bool {
        matches!(self, Self::GroupsKnockout | Self::Elimination)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFormat {
    #[default]
    RoundRobin,
    /// Four-player double-match group: two openings, winners' and losers' match, decider.
    Gsl,
}

/// How GSL rounds 2 and 3 come into existence.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GslPopulation {
    /// Insert round 2/3 matches when their players are known.
    #[default]
    Lazy,
    /// Create all five rows upfront; later rounds start with empty slots.
    Placeholders,
}

/// Stage a match is played under; selects the scoring limits.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Group,
    Playoff,
    Semifinal,
    Final,
}

/// Points/innings ceilings. `None` means unlimited.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreLimits {
    pub points: Option<u32>,
    pub innings: Option<u32>,
}

impl ScoreLimits {
    pub fn new(points: u32, innings: u32) -> Self {
        Self {
            points: Some(points),
            innings: Some(innings),
        }
    }

    pub fn innings_reached(&self, innings: u32) -> bool {
        self.innings.is_some_and(|limit| innings >= limit)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StageLimits {
    pub group: ScoreLimits,
    pub playoff: ScoreLimits,
    pub semifinal: ScoreLimits,
    #[serde(rename = "final")]
    pub final_round: ScoreLimits,
}

impl StageLimits {
    pub fn for_stage(&self, stage: Stage) -> ScoreLimits {
        match stage {
            Stage::Group => self.group,
            Stage::Playoff => self.playoff,
            Stage::Semifinal => self.semifinal,
            Stage::Final => self.final_round,
        }
    }

    fn all(&self) -> [ScoreLimits; 4] {
        [self.group, self.playoff, self.semifinal, self.final_round]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentSettings {
    /// Maximum number of active registrations.
    pub capacity: u32,
    pub format: TournamentFormat,
    pub group_size: u32,
    pub group_format: GroupFormat,
    pub qualifiers_per_group: u32,
    /// Bracket size; derived from the qualifier count when absent.
    pub playoff_size: Option<u32>,
    pub limits: StageLimits,
    /// Equal scores at the innings limit end a round-robin match as a draw.
    pub allow_draws: bool,
    /// Each player's points target is their handicap instead of the stage limit.
    pub handicapped: bool,
    pub gsl_population: GslPopulation,
    /// Scales ranking points; must exist in the ranking table.
    pub tier: u8,
    /// Only official tournaments feed the ranking.
    pub official: bool,
    pub season: i32,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            capacity: 32,
            format: TournamentFormat::GroupsKnockout,
            group_size: 4,
            group_format: GroupFormat::RoundRobin,
            qualifiers_per_group: 2,
            playoff_size: None,
            limits: StageLimits::default(),
            allow_draws: false,
            handicapped: false,
            gsl_population: GslPopulation::Lazy,
            tier: 1,
            official: true,
            season: Utc::now().year(),
        }
    }
}

impl TournamentSettings {
    /// Reject settings the engine cannot run.
    pub fn validate(&self) -> EngineResult<()> {
        if self.capacity < 2 {
            return Err(EngineError::InvalidSettings("capacity must be at least 2".into()));
        }
        if self.format.has_groups() {
            if self.group_size < 2 {
                return Err(EngineError::InvalidSettings("group size must be at least 2".into()));
            }
            if self.qualifiers_per_group == 0 || self.qualifiers_per_group > self.group_size {
                return Err(EngineError::InvalidSettings(format!(
                    "qualifiers per group must be between 1 and {}",
                    self.group_size
                )));
            }
            if self.group_format == GroupFormat::Gsl {
                if self.group_size != 4 {
                    return Err(EngineError::InvalidSettings("gsl groups have exactly 4 players".into()));
                }
                if self.qualifiers_per_group != 2 {
                    return Err(EngineError::InvalidSettings("gsl groups yield exactly 2 qualifiers".into()));
                }
            }
        }
        if let Some(size) = self.playoff_size {
            if size < 2 || !size.is_power_of_two() {
                return Err(EngineError::InvalidSettings(format!(
                    "playoff size {size} is not a power of two"
                )));
            }
        }
        let zero_limit = self
            .limits
            .all()
            .iter()
            .any(|l| l.points == Some(0) || l.innings == Some(0));
        if zero_limit {
            return Err(EngineError::InvalidSettings("score limits must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub settings: TournamentSettings,
    pub status: TournamentStatus,
    /// Set once the ranking aggregator has folded this tournament in.
    pub ranked: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create a tournament in Draft state.
    pub fn new(name: impl Into<String>, settings: TournamentSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            settings,
            status: TournamentStatus::Draft,
            ranked: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn require_status(&self, expected: TournamentStatus) -> EngineResult<()> {
        if self.status != expected {
            return Err(EngineError::InvalidState {
                tournament: self.id,
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    pub fn complete(&mut self) {
        self.status = TournamentStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}
