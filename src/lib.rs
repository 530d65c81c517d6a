//! Cue-sports tournament organizer: library with models, progression logic and the engine
//! facade used by the web binary.

pub mod config;
pub mod engine;
pub mod error;
pub mod logic;
pub mod models;
pub mod store;

pub use config::{EngineConfig, RankingConfig, RankingTable, StandingsRules, TieBreaker};
pub use engine::Engine;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use logic::{
    handicap, snake_seed, BracketRound, GroupTable, Placement, Qualifier, RankingUpdate, ResultSheet,
    ScoreDelta, StandingRow,
};
pub use models::{
    Category, Entrant, GameMatch, Group, GroupFormat, GroupId, GroupStage, GslPopulation, GslRole,
    MatchId, MatchStatus, Phase, PhaseKind, Player, PlayerId, Registration, RegistrationId,
    RegistrationStatus, ScoreLimits, Slot, Stage, StageLimits, Tournament, TournamentFormat,
    TournamentId, TournamentSettings, TournamentStatus, WinReason,
};
pub use store::{Database, MemoryStore, Repository};
