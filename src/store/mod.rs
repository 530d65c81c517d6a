//! Storage collaborator: repository trait and the transactional in-memory store.

mod memory;

pub use memory::{Database, MemoryStore};

use crate::error::EngineResult;
use crate::models::{
    GameMatch, Group, GroupId, MatchId, Phase, PhaseId, PhaseKind, Player, PlayerId,
    Registration, RegistrationId, RegistrationStatus, Tournament, TournamentId,
};

/// CRUD and query accessors the engine needs. `save_*` inserts or replaces by id.
///
/// Lookups by id fail with the matching `NotFound` error; list queries return owned
/// snapshots in a stable order (insertion order unless stated otherwise).
pub trait Repository {
    fn tournament(&self, id: TournamentId) -> EngineResult<Tournament>;
    fn save_tournament(&mut self, tournament: Tournament);
    fn tournaments(&self) -> Vec<Tournament>;

    fn player(&self, id: PlayerId) -> EngineResult<Player>;
    fn save_player(&mut self, player: Player);
    fn players(&self) -> Vec<Player>;

    fn registration(&self, id: RegistrationId) -> EngineResult<Registration>;
    fn save_registration(&mut self, registration: Registration);
    /// All registrations of a tournament in admission order.
    fn registrations(&self, tournament: TournamentId) -> Vec<Registration>;

    fn phase(&self, id: PhaseId) -> EngineResult<Phase>;
    fn save_phase(&mut self, phase: Phase);
    /// Phases ordered by sequence.
    fn phases(&self, tournament: TournamentId) -> Vec<Phase>;
    fn delete_phase(&mut self, id: PhaseId);

    fn group(&self, id: GroupId) -> EngineResult<Group>;
    fn save_group(&mut self, group: Group);
    /// Groups of a phase ordered by index.
    fn groups_in_phase(&self, phase: PhaseId) -> Vec<Group>;

    fn game(&self, id: MatchId) -> EngineResult<GameMatch>;
    fn save_game(&mut self, game: GameMatch);
    fn matches_in_group(&self, group: GroupId) -> Vec<GameMatch>;
    fn matches_in_phase(&self, phase: PhaseId) -> Vec<GameMatch>;
    fn matches_in_tournament(&self, tournament: TournamentId) -> Vec<GameMatch>;
    fn delete_matches_in_phase(&mut self, phase: PhaseId);

    /// Active registrations, best seed first.
    fn active_registrations_by_seed(&self, tournament: TournamentId) -> Vec<Registration> {
        let mut active: Vec<_> = self
            .registrations(tournament)
            .into_iter()
            .filter(|r| r.status == RegistrationStatus::Active)
            .collect();
        active.sort_by_key(Registration::seed_key);
        active
    }

    fn completed_matches_in_phase(&self, phase: PhaseId) -> Vec<GameMatch> {
        self.matches_in_phase(phase)
            .into_iter()
            .filter(GameMatch::is_completed)
            .collect()
    }

    fn phases_of_kind(&self, tournament: TournamentId, kind: PhaseKind) -> Vec<Phase> {
        self.phases(tournament)
            .into_iter()
            .filter(|p| p.kind == kind)
            .collect()
    }
}
