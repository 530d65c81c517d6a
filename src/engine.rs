//! Caller-facing facade: every operation runs in its own store transaction.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::logic::{
    self, BracketRound, GroupTable, Placement, Qualifier, RankingUpdate, ResultSheet, ScoreDelta,
    StandingRow,
};
use crate::models::{
    Entrant, GameMatch, Group, GroupId, GroupStage, MatchId, Phase, PhaseId, PhaseKind, Player, PlayerId,
    Registration, RegistrationId, RegistrationStatus, Tournament, TournamentId,
    TournamentSettings, WinReason,
};
use crate::store::{Database, MemoryStore, Repository};

/// Tournament progression engine over a shared store.
#[derive(Debug, Default)]
pub struct Engine {
    db: Database,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(MemoryStore::new(), config)
    }

    pub fn with_store(store: MemoryStore, config: EngineConfig) -> Self {
        Self {
            db: Database::new(store),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- players and tournaments ---

    pub fn create_player(&self, name: &str, club: Option<String>) -> EngineResult<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::EmptyName);
        }
        let player = Player::new(name, club);
        self.db.transaction(|s| {
            s.save_player(player.clone());
            Ok(player)
        })
    }

    pub fn player(&self, id: PlayerId) -> EngineResult<Player> {
        self.db.read(|s| s.player(id))
    }

    pub fn create_tournament(&self, name: &str, settings: TournamentSettings) -> EngineResult<Tournament> {
        settings.validate()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::EmptyName);
        }
        if settings.official && !self.config.ranking.table.has_tier(settings.tier) {
            return Err(EngineError::UnknownTier(settings.tier));
        }
        let tournament = Tournament::new(name, settings);
        log::info!("Created tournament {} ({})", tournament.name, tournament.id);
        self.db.transaction(|s| {
            s.save_tournament(tournament.clone());
            Ok(tournament)
        })
    }

    pub fn tournament(&self, id: TournamentId) -> EngineResult<Tournament> {
        self.db.read(|s| s.tournament(id))
    }

    // --- registration ---

    pub fn register(&self, tournament: TournamentId, entrant: Entrant) -> EngineResult<Registration> {
        self.db.transaction(|s| logic::register(s, tournament, entrant))
    }

    /// Returns the registrations promoted from the waitlist.
    pub fn withdraw(&self, registration: RegistrationId) -> EngineResult<Vec<Registration>> {
        self.db.transaction(|s| logic::withdraw(s, registration))
    }

    pub fn disqualify(&self, registration: RegistrationId) -> EngineResult<Vec<Registration>> {
        self.db.transaction(|s| logic::disqualify(s, registration))
    }

    pub fn reconcile(&self, tournament: TournamentId) -> EngineResult<Vec<Registration>> {
        self.db.transaction(|s| logic::reconcile(s, tournament))
    }

    pub fn registrations(&self, tournament: TournamentId) -> EngineResult<Vec<Registration>> {
        self.db.read(|s| {
            s.tournament(tournament)?;
            Ok(s.registrations(tournament))
        })
    }

    pub fn active_count(&self, tournament: TournamentId) -> EngineResult<usize> {
        Ok(self
            .registrations(tournament)?
            .iter()
            .filter(|r| r.status == RegistrationStatus::Active)
            .count())
    }

    /// Phases in play order: the group phase first, then each bracket round.
    pub fn phases(&self, tournament: TournamentId) -> EngineResult<Vec<Phase>> {
        self.db.read(|s| {
            s.tournament(tournament)?;
            Ok(s.phases(tournament))
        })
    }

    pub fn phase(&self, id: PhaseId) -> EngineResult<Phase> {
        self.db.read(|s| s.phase(id))
    }

    // --- group stage ---

    pub fn build_groups(&self, tournament: TournamentId) -> EngineResult<Vec<Group>> {
        self.db.transaction(|s| logic::build_groups(s, tournament))
    }

    pub fn groups(&self, tournament: TournamentId) -> EngineResult<Vec<Group>> {
        self.db.read(|s| {
            s.tournament(tournament)?;
            Ok(s.phases_of_kind(tournament, PhaseKind::Group)
                .iter()
                .flat_map(|p| s.groups_in_phase(p.id))
                .collect())
        })
    }

    pub fn group(&self, id: GroupId) -> EngineResult<Group> {
        self.db.read(|s| s.group(id))
    }

    pub fn group_matches(&self, group: GroupId) -> EngineResult<Vec<GameMatch>> {
        self.db.read(|s| {
            s.group(group)?;
            Ok(s.matches_in_group(group))
        })
    }

    /// Re-run GSL advancement for a group; a no-op when nothing new is ready.
    pub fn advance_group(&self, group: GroupId) -> EngineResult<GroupStage> {
        self.db.transaction(|s| logic::advance_gsl_group(s, group))
    }

    pub fn standings(&self, group: GroupId) -> EngineResult<Vec<StandingRow>> {
        self.db.read(|s| logic::group_standings(s, group, &self.config.standings))
    }

    pub fn phase_standings(&self, phase: PhaseId) -> EngineResult<Vec<GroupTable>> {
        self.db.read(|s| logic::phase_standings(s, phase, &self.config.standings))
    }

    pub fn qualifiers(&self, group: GroupId) -> EngineResult<Vec<Qualifier>> {
        self.db.read(|s| {
            let tournament = s.tournament(s.group(group)?.tournament_id)?;
            logic::select_qualifiers(
                s,
                group,
                tournament.settings.qualifiers_per_group as usize,
                &self.config.standings,
            )
        })
    }

    // --- matches ---

    pub fn game(&self, id: MatchId) -> EngineResult<GameMatch> {
        self.db.read(|s| s.game(id))
    }

    pub fn matches(&self, tournament: TournamentId) -> EngineResult<Vec<GameMatch>> {
        self.db.read(|s| {
            s.tournament(tournament)?;
            Ok(s.matches_in_tournament(tournament))
        })
    }

    pub fn submit_result(&self, id: MatchId, sheet: ResultSheet) -> EngineResult<GameMatch> {
        self.db
            .transaction(|s| logic::submit_result(s, id, sheet, &self.config.standings))
    }

    pub fn apply_delta(&self, id: MatchId, delta: ScoreDelta) -> EngineResult<GameMatch> {
        self.db
            .transaction(|s| logic::apply_delta(s, id, delta, &self.config.standings))
    }

    pub fn walkover(&self, id: MatchId, winner: RegistrationId) -> EngineResult<GameMatch> {
        self.award_match(id, winner, WinReason::Walkover)
    }

    pub fn award_match(&self, id: MatchId, winner: RegistrationId, reason: WinReason) -> EngineResult<GameMatch> {
        self.db
            .transaction(|s| logic::award_match(s, id, winner, reason, &self.config.standings))
    }

    pub fn start_match(&self, id: MatchId, table: Option<u32>) -> EngineResult<GameMatch> {
        self.db.transaction(|s| logic::start_match(s, id, table))
    }

    // --- playoffs ---

    pub fn build_playoffs(&self, tournament: TournamentId) -> EngineResult<Vec<BracketRound>> {
        self.db
            .transaction(|s| logic::build_playoffs(s, tournament, &self.config.standings))
    }

    pub fn regenerate_playoffs(&self, tournament: TournamentId) -> EngineResult<Vec<BracketRound>> {
        self.db
            .transaction(|s| logic::regenerate_playoffs(s, tournament, &self.config.standings))
    }

    pub fn bracket(&self, tournament: TournamentId) -> EngineResult<Vec<BracketRound>> {
        self.db.read(|s| logic::bracket(s, tournament))
    }

    // --- ranking ---

    pub fn placements(&self, tournament: TournamentId) -> EngineResult<Vec<Placement>> {
        self.db
            .read(|s| logic::placements(s, tournament, &self.config.standings))
    }

    pub fn recalculate_ranking(&self, tournament: TournamentId) -> EngineResult<Vec<RankingUpdate>> {
        self.db
            .transaction(|s| logic::recalculate_ranking(s, tournament, &self.config))
    }

    pub fn rebuild_rankings(&self) -> EngineResult<usize> {
        self.db.transaction(|s| logic::rebuild_rankings(s, &self.config))
    }

    pub fn ranking(&self) -> EngineResult<Vec<Player>> {
        self.db.read(|s| Ok(logic::annual_ranking(s, self.config.season)))
    }
}
