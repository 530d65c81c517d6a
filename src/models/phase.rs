//! Phases (group stage, bracket rounds) and groups.

use crate::models::registration::RegistrationId;
use crate::models::tournament::{GroupFormat, TournamentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PhaseId = Uuid;
pub type GroupId = Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Group,
    Elimination,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub kind: PhaseKind,
    /// Strictly increasing within a tournament; later phases depend on earlier ones.
    pub sequence: u32,
}

impl Phase {
    pub fn new(tournament_id: TournamentId, name: impl Into<String>, kind: PhaseKind, sequence: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: name.into(),
            kind,
            sequence,
        }
    }
}

/// Stored progress of a group. GSL groups walk Round(1) -> Round(2) -> Round(3) -> Finished;
/// round-robin groups go straight from Round(1) to Finished.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStage {
    Round(u32),
    Finished,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub phase_id: PhaseId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// Position of the group inside its phase (A = 0).
    pub index: u32,
    pub format: GroupFormat,
    pub stage: GroupStage,
    /// Members, best seed first.
    pub seeds: Vec<RegistrationId>,
}

impl Group {
    pub fn new(
        tournament_id: TournamentId,
        phase_id: PhaseId,
        index: u32,
        format: GroupFormat,
        seeds: Vec<RegistrationId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase_id,
            tournament_id,
            name: group_name(index),
            index,
            format,
            stage: GroupStage::Round(1),
            seeds,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stage == GroupStage::Finished
    }
}

/// A, B, ..., Z, then AA, AB, ...
pub fn group_name(index: u32) -> String {
    let mut n = index;
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
