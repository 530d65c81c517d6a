//! Data structures for cue-sports tournaments: players, registrations, phases, groups, matches.

mod game;
mod phase;
mod player;
mod registration;
mod tournament;

pub use game::{GameMatch, GslRole, MatchId, MatchStatus, NextSlot, Slot, WinReason};
pub use phase::{group_name, Group, GroupId, GroupStage, Phase, PhaseId, PhaseKind};
pub use player::{Category, Player, PlayerId};
pub use registration::{Entrant, Registration, RegistrationId, RegistrationStatus};
pub use tournament::{
    GroupFormat, GslPopulation, ScoreLimits, Stage, StageLimits, Tournament, TournamentFormat,
    TournamentId, TournamentSettings, TournamentStatus,
};
