//! Tournament-scoped entries.

use crate::models::player::PlayerId;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RegistrationId = Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Active,
    Waitlist,
    Eliminated,
    Disqualified,
    Withdrawn,
}

impl RegistrationStatus {
    /// Statuses that still compete for a seat in the field.
    pub fn is_entry(self) -> bool {
        matches!(self, Self::Active | Self::Waitlist)
    }
}

/// Someone asking to enter a tournament. `player_id` may be absent for unlinked names.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub club: Option<String>,
    /// 1 is the best seed. Unseeded entrants sort after every seeded one.
    #[serde(default)]
    pub seed_rank: Option<u32>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub tournament_id: TournamentId,
    pub player_id: Option<PlayerId>,
    pub display_name: String,
    pub team: Option<String>,
    pub club: Option<String>,
    pub seed_rank: Option<u32>,
    pub status: RegistrationStatus,
    /// Position in the admission queue (0 = first to register).
    pub admission_order: u32,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn new(
        tournament_id: TournamentId,
        entrant: Entrant,
        admission_order: u32,
        status: RegistrationStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            player_id: entrant.player_id,
            display_name: entrant.display_name,
            team: entrant.team,
            club: entrant.club,
            seed_rank: entrant.seed_rank,
            status,
            admission_order,
            registered_at: Utc::now(),
        }
    }

    /// Sort key for seeding: seeded first by rank, then unseeded by admission.
    pub fn seed_key(&self) -> (u32, u32) {
        (self.seed_rank.unwrap_or(u32::MAX), self.admission_order)
    }
}
