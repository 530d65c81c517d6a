//! In-memory arena store and the transactional handle shared by request handlers.

use crate::error::{EngineError, EngineResult};
use crate::models::{
    GameMatch, Group, GroupId, MatchId, Phase, PhaseId, Player, PlayerId, Registration,
    RegistrationId, Tournament, TournamentId,
};
use crate::store::Repository;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Rows of one entity kind, kept in insertion order and addressed by id.
#[derive(Clone, Debug)]
struct Table<T> {
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Clone> Table<T> {
    fn get(&self, id: Uuid, key: impl Fn(&T) -> Uuid) -> Option<T> {
        self.rows.iter().find(|r| key(r) == id).cloned()
    }

    fn upsert(&mut self, row: T, key: impl Fn(&T) -> Uuid) {
        let id = key(&row);
        match self.rows.iter_mut().find(|r| key(r) == id) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.iter().filter(|r| pred(r)).cloned().collect()
    }

    fn retain(&mut self, pred: impl Fn(&T) -> bool) {
        self.rows.retain(|r| pred(r));
    }
}

/// Arena of every record, keyed by id. Cheap to snapshot for rollback.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tournaments: Table<Tournament>,
    players: Table<Player>,
    registrations: Table<Registration>,
    phases: Table<Phase>,
    groups: Table<Group>,
    matches: Table<GameMatch>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Repository for MemoryStore {
    fn tournament(&self, id: TournamentId) -> EngineResult<Tournament> {
        self.tournaments
            .get(id, |t| t.id)
            .ok_or(EngineError::TournamentNotFound(id))
    }

    fn save_tournament(&mut self, tournament: Tournament) {
        self.tournaments.upsert(tournament, |t| t.id);
    }

    fn tournaments(&self) -> Vec<Tournament> {
        self.tournaments.rows.clone()
    }

    fn player(&self, id: PlayerId) -> EngineResult<Player> {
        self.players
            .get(id, |p| p.id)
            .ok_or(EngineError::PlayerNotFound(id))
    }

    fn save_player(&mut self, player: Player) {
        self.players.upsert(player, |p| p.id);
    }

    fn players(&self) -> Vec<Player> {
        self.players.rows.clone()
    }

    fn registration(&self, id: RegistrationId) -> EngineResult<Registration> {
        self.registrations
            .get(id, |r| r.id)
            .ok_or(EngineError::RegistrationNotFound(id))
    }

    fn save_registration(&mut self, registration: Registration) {
        self.registrations.upsert(registration, |r| r.id);
    }

    fn registrations(&self, tournament: TournamentId) -> Vec<Registration> {
        let mut regs = self.registrations.filter(|r| r.tournament_id == tournament);
        regs.sort_by_key(|r| r.admission_order);
        regs
    }

    fn phase(&self, id: PhaseId) -> EngineResult<Phase> {
        self.phases.get(id, |p| p.id).ok_or(EngineError::PhaseNotFound(id))
    }

    fn save_phase(&mut self, phase: Phase) {
        self.phases.upsert(phase, |p| p.id);
    }

    fn phases(&self, tournament: TournamentId) -> Vec<Phase> {
        let mut phases = self.phases.filter(|p| p.tournament_id == tournament);
        phases.sort_by_key(|p| p.sequence);
        phases
    }

    fn delete_phase(&mut self, id: PhaseId) {
        self.groups.retain(|g| g.phase_id != id);
        self.phases.retain(|p| p.id != id);
    }

    fn group(&self, id: GroupId) -> EngineResult<Group> {
        self.groups.get(id, |g| g.id).ok_or(EngineError::GroupNotFound(id))
    }

    fn save_group(&mut self, group: Group) {
        self.groups.upsert(group, |g| g.id);
    }

    fn groups_in_phase(&self, phase: PhaseId) -> Vec<Group> {
        let mut groups = self.groups.filter(|g| g.phase_id == phase);
        groups.sort_by_key(|g| g.index);
        groups
    }

    fn game(&self, id: MatchId) -> EngineResult<GameMatch> {
        self.matches.get(id, |m| m.id).ok_or(EngineError::MatchNotFound(id))
    }

    fn save_game(&mut self, game: GameMatch) {
        self.matches.upsert(game, |m| m.id);
    }

    fn matches_in_group(&self, group: GroupId) -> Vec<GameMatch> {
        self.matches.filter(|m| m.group_id == Some(group))
    }

    fn matches_in_phase(&self, phase: PhaseId) -> Vec<GameMatch> {
        self.matches.filter(|m| m.phase_id == phase)
    }

    fn matches_in_tournament(&self, tournament: TournamentId) -> Vec<GameMatch> {
        self.matches.filter(|m| m.tournament_id == tournament)
    }

    fn delete_matches_in_phase(&mut self, phase: PhaseId) {
        self.matches.retain(|m| m.phase_id != phase);
    }
}

/// Shared store handle. Each `transaction` holds the lock for its whole read-then-write
/// section and restores the previous state if the closure fails.
#[derive(Debug, Default)]
pub struct Database {
    inner: Mutex<MemoryStore>,
}

impl Database {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    /// Run `f` all-or-nothing.
    pub fn transaction<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut MemoryStore) -> EngineResult<T>,
    {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = guard.clone();
        match f(&mut guard) {
            Ok(value) => Ok(value),
            Err(e) => {
                *guard = snapshot;
                Err(e)
            }
        }
    }

    /// Run a read-only query against the current state.
    pub fn read<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&MemoryStore) -> EngineResult<T>,
    {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}
