//! Match records, their slots and result fields.

use crate::models::phase::{GroupId, PhaseId};
use crate::models::registration::RegistrationId;
use crate::models::tournament::{Stage, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// One of the two player positions of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    #[default]
    One,
    Two,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    Normal,
    Walkover,
    Forfeit,
}

/// Position of a match inside a GSL group.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GslRole {
    /// Seed 1 vs seed 4.
    OpeningA,
    /// Seed 2 vs seed 3.
    OpeningB,
    WinnersMatch,
    LosersMatch,
    Decider,
}

impl GslRole {
    pub fn round(self) -> u32 {
        match self {
            GslRole::OpeningA | GslRole::OpeningB => 1,
            GslRole::WinnersMatch | GslRole::LosersMatch => 2,
            GslRole::Decider => 3,
        }
    }
}

/// Where the winner of a bracket match goes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NextSlot {
    pub match_id: MatchId,
    pub slot: Slot,
}

/// A single match. Null player slots mark a pending slot awaiting upstream results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub phase_id: PhaseId,
    pub group_id: Option<GroupId>,
    pub player_1: Option<RegistrationId>,
    pub player_2: Option<RegistrationId>,
    pub score_1: u32,
    pub score_2: u32,
    pub innings: u32,
    pub high_run_1: u32,
    pub high_run_2: u32,
    /// None while unplayed, or for a permitted draw.
    pub winner: Option<RegistrationId>,
    pub win_reason: Option<WinReason>,
    pub status: MatchStatus,
    pub stage: Stage,
    pub round: u32,
    /// Human-readable bracket round name.
    pub label: Option<String>,
    pub gsl_role: Option<GslRole>,
    /// Order inside a bracket round (top to bottom).
    pub bracket_position: Option<u32>,
    pub next: Option<NextSlot>,
    pub table: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GameMatch {
    pub fn new(
        tournament_id: TournamentId,
        phase_id: PhaseId,
        player_1: Option<RegistrationId>,
        player_2: Option<RegistrationId>,
        stage: Stage,
        round: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            phase_id,
            group_id: None,
            player_1,
            player_2,
            score_1: 0,
            score_2: 0,
            innings: 0,
            high_run_1: 0,
            high_run_2: 0,
            winner: None,
            win_reason: None,
            status: MatchStatus::Scheduled,
            stage,
            round,
            label: None,
            gsl_role: None,
            bracket_position: None,
            next: None,
            table: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    pub fn in_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_role(mut self, role: GslRole) -> Self {
        self.gsl_role = Some(role);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// Both slots populated.
    pub fn is_ready(&self) -> bool {
        self.player_1.is_some() && self.player_2.is_some()
    }

    pub fn player(&self, slot: Slot) -> Option<RegistrationId> {
        match slot {
            Slot::One => self.player_1,
            Slot::Two => self.player_2,
        }
    }

    pub fn set_player(&mut self, slot: Slot, registration: Option<RegistrationId>) {
        match slot {
            Slot::One => self.player_1 = registration,
            Slot::Two => self.player_2 = registration,
        }
    }

    pub fn slot_of(&self, registration: RegistrationId) -> Option<Slot> {
        if self.player_1 == Some(registration) {
            Some(Slot::One)
        } else if self.player_2 == Some(registration) {
            Some(Slot::Two)
        } else {
            None
        }
    }

    /// The non-winning player of a decided match.
    pub fn loser(&self) -> Option<RegistrationId> {
        let winner = self.winner?;
        match self.slot_of(winner)? {
            Slot::One => self.player_2,
            Slot::Two => self.player_1,
        }
    }

    /// Score of the given registration and of its opponent.
    pub fn scores_for(&self, registration: RegistrationId) -> Option<(u32, u32)> {
        match self.slot_of(registration)? {
            Slot::One => Some((self.score_1, self.score_2)),
            Slot::Two => Some((self.score_2, self.score_1)),
        }
    }

    /// True once anyone has touched the result fields.
    pub fn has_play(&self) -> bool {
        self.status != MatchStatus::Scheduled
    }
}
