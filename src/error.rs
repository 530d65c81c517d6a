//! Engine errors and their classification.

use crate::models::{
    GroupId, MatchId, PhaseId, PlayerId, RegistrationId, RegistrationStatus, TournamentId,
    TournamentStatus,
};
use serde::Serialize;
use thiserror::Error;

/// Broad class of an error, used by callers to pick a response.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// An id that does not resolve.
    NotFound,
    /// Malformed input, rejected before any mutation.
    Validation,
    /// The operation's dependency is not satisfied yet.
    Precondition,
    /// The result would leave stored data contradictory.
    Consistency,
    /// Configuration could not be loaded.
    Config,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tournament {0} not found")]
    TournamentNotFound(TournamentId),

    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    #[error("registration {0} not found")]
    RegistrationNotFound(RegistrationId),

    #[error("phase {0} not found")]
    PhaseNotFound(PhaseId),

    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    #[error("match {0} not found")]
    MatchNotFound(MatchId),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("player {0} is already registered")]
    AlreadyRegistered(PlayerId),

    #[error("group {group} has {actual} players, format requires {required}")]
    GroupSizeMismatch {
        group: String,
        required: usize,
        actual: usize,
    },

    #[error("need at least {needed} active players, have {found}")]
    NotEnoughPlayers { needed: usize, found: usize },

    #[error("match {0} is waiting for players")]
    PendingSlot(MatchId),

    #[error("registration {registration} does not play in match {match_id}")]
    NotAParticipant {
        match_id: MatchId,
        registration: RegistrationId,
    },

    #[error("score of match {0} would become negative")]
    NegativeScore(MatchId),

    #[error("score of match {0} is out of range")]
    ScoreOverflow(MatchId),

    #[error("high run of match {0} exceeds the score")]
    HighRunExceedsScore(MatchId),

    #[error("{0:?} is not a default-win reason")]
    InvalidWinReason(crate::models::WinReason),

    #[error("playoff size {size} cannot hold {qualifiers} qualifiers")]
    BracketSize { size: u32, qualifiers: usize },

    #[error("tournament {tournament} is {actual:?}, expected {expected:?}")]
    InvalidState {
        tournament: TournamentId,
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("registration {registration} cannot move from {from:?} to {to:?}")]
    StatusTransition {
        registration: RegistrationId,
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("tournament {0} has no group stage")]
    NoGroupStage(TournamentId),

    #[error("tournament {0} has no playoff stage")]
    NoPlayoffStage(TournamentId),

    #[error("groups of tournament {0} are already built")]
    GroupsAlreadyBuilt(TournamentId),

    #[error("playoffs of tournament {0} are already built")]
    PlayoffsAlreadyBuilt(TournamentId),

    #[error("group {0} still has unfinished matches")]
    GroupIncomplete(GroupId),

    #[error("match {0} is already completed")]
    MatchCompleted(MatchId),

    #[error("tournament {0} is not official")]
    NotOfficial(TournamentId),

    #[error("tournament {0} is already ranked")]
    AlreadyRanked(TournamentId),

    #[error("no ranking points configured for tier {0}")]
    UnknownTier(u8),

    #[error("match {0} ends level and this format needs a winner")]
    UnresolvedTie(MatchId),

    #[error("match {0} has already been played by other players")]
    DownstreamPlayed(MatchId),

    #[error("ranking table: {0}")]
    Csv(#[from] csv::Error),

    #[error("ranking table: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        use EngineError::*;
        match self {
            TournamentNotFound(_) | PlayerNotFound(_) | RegistrationNotFound(_)
            | PhaseNotFound(_) | GroupNotFound(_) | MatchNotFound(_) => ErrorKind::NotFound,
            InvalidSettings(_)
            | EmptyName
            | AlreadyRegistered(_)
            | GroupSizeMismatch { .. }
            | PendingSlot(_)
            | NotAParticipant { .. }
            | NegativeScore(_)
            | ScoreOverflow(_)
            | HighRunExceedsScore(_)
            | InvalidWinReason(_)
            | BracketSize { .. }
            | UnknownTier(_) => ErrorKind::Validation,
            NotEnoughPlayers { .. }
            | InvalidState { .. }
            | StatusTransition { .. }
            | NoGroupStage(_)
            | NoPlayoffStage(_)
            | GroupsAlreadyBuilt(_)
            | PlayoffsAlreadyBuilt(_)
            | GroupIncomplete(_)
            | MatchCompleted(_)
            | NotOfficial(_)
            | AlreadyRanked(_) => ErrorKind::Precondition,
            UnresolvedTie(_) | DownstreamPlayed(_) => ErrorKind::Consistency,
            Csv(_) | Io(_) => ErrorKind::Config,
        }
    }
}
