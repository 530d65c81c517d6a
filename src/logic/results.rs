//! Match adjudication: result entry, live scoring with forced completion, walkovers, and
//! the downstream advancement every completed match triggers.

use crate::config::StandingsRules;
use crate::error::{EngineError, EngineResult};
use crate::logic::finals::{advance_bracket, complete_tournament};
use crate::logic::gsl::advance_gsl_group;
use crate::logic::standings::final_group_order;
use crate::models::{
    GameMatch, Group, GroupFormat, GroupStage, MatchId, MatchStatus, PhaseKind, RegistrationId,
    Stage, Tournament, TournamentFormat, TournamentStatus, WinReason,
};
use crate::store::Repository;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Full result of a match as entered by the referee.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultSheet {
    pub score_1: u32,
    pub score_2: u32,
    pub innings: u32,
    #[serde(default)]
    pub high_run_1: u32,
    #[serde(default)]
    pub high_run_2: u32,
}

/// Live-scoring increment. A positive player delta counts as one run for high-run tracking.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScoreDelta {
    #[serde(default)]
    pub player_1: i32,
    #[serde(default)]
    pub player_2: i32,
    #[serde(default)]
    pub innings: i32,
}

fn open_tournament<R: Repository>(store: &R, game: &GameMatch) -> EngineResult<Tournament> {
    let tournament = store.tournament(game.tournament_id)?;
    if tournament.status == TournamentStatus::Draft {
        return Err(EngineError::InvalidState {
            tournament: tournament.id,
            expected: TournamentStatus::Active,
            actual: tournament.status,
        });
    }
    Ok(tournament)
}

fn ready_match<R: Repository>(store: &R, match_id: MatchId) -> EngineResult<(GameMatch, Tournament)> {
    let game = store.game(match_id)?;
    if !game.is_ready() {
        return Err(EngineError::PendingSlot(match_id));
    }
    let tournament = open_tournament(store, &game)?;
    Ok((game, tournament))
}

/// Points each player plays to: their handicap in handicapped events, else the stage limit.
fn targets<R: Repository>(
    store: &R,
    game: &GameMatch,
    tournament: &Tournament,
) -> EngineResult<(Option<u32>, Option<u32>)> {
    let stage_limit = tournament.settings.limits.for_stage(game.stage).points;
    if !tournament.settings.handicapped {
        return Ok((stage_limit, stage_limit));
    }
    let target = |registration: Option<RegistrationId>| -> EngineResult<Option<u32>> {
        let Some(registration) = registration else {
            return Ok(stage_limit);
        };
        let Some(player_id) = store.registration(registration)?.player_id else {
            return Ok(stage_limit);
        };
        let handicap = store.player(player_id)?.handicap();
        Ok(if handicap > 0 { Some(handicap) } else { stage_limit })
    };
    Ok((target(game.player_1)?, target(game.player_2)?))
}

/// Draws exist only in round-robin group matches of events that allow them, and only when
/// the innings limit ended the match.
fn draw_allowed(game: &GameMatch, tournament: &Tournament) -> bool {
    let limits = tournament.settings.limits.for_stage(game.stage);
    tournament.settings.allow_draws
        && game.stage == Stage::Group
        && game.gsl_role.is_none()
        && limits.innings_reached(game.innings)
}

/// Winner from the current scores. A player who reached their target wins outright;
/// otherwise the higher score wins; level scores are a draw only where permitted.
fn decide(
    game: &GameMatch,
    tournament: &Tournament,
    targets: (Option<u32>, Option<u32>),
) -> EngineResult<Option<RegistrationId>> {
    let reached_1 = targets.0.is_some_and(|t| game.score_1 >= t);
    let reached_2 = targets.1.is_some_and(|t| game.score_2 >= t);
    match (reached_1, reached_2) {
        (true, false) => return Ok(game.player_1),
        (false, true) => return Ok(game.player_2),
        _ => {}
    }
    match game.score_1.cmp(&game.score_2) {
        std::cmp::Ordering::Greater => Ok(game.player_1),
        std::cmp::Ordering::Less => Ok(game.player_2),
        std::cmp::Ordering::Equal if draw_allowed(game, tournament) => Ok(None),
        std::cmp::Ordering::Equal => Err(EngineError::UnresolvedTie(game.id)),
    }
}

fn finish(game: &mut GameMatch, winner: Option<RegistrationId>, reason: WinReason) {
    let now = Utc::now();
    game.winner = winner;
    game.win_reason = Some(reason);
    game.status = MatchStatus::Completed;
    game.started_at.get_or_insert(now);
    game.completed_at = Some(now);
}

/// Commit a full result. A completed match may be corrected; downstream rounds are
/// re-checked either way.
pub fn submit_result<R: Repository>(
    store: &mut R,
    match_id: MatchId,
    sheet: ResultSheet,
    rules: &StandingsRules,
) -> EngineResult<GameMatch> {
    let (mut game, tournament) = ready_match(store, match_id)?;
    if sheet.high_run_1 > sheet.score_1 || sheet.high_run_2 > sheet.score_2 {
        return Err(EngineError::HighRunExceedsScore(match_id));
    }
    let corrected = game.is_completed();
    game.score_1 = sheet.score_1;
    game.score_2 = sheet.score_2;
    game.innings = sheet.innings;
    game.high_run_1 = sheet.high_run_1;
    game.high_run_2 = sheet.high_run_2;
    let winner = decide(&game, &tournament, targets(store, &game, &tournament)?)?;
    finish(&mut game, winner, WinReason::Normal);
    store.save_game(game.clone());
    log::info!(
        "{} match {}: {}-{} in {} innings",
        if corrected { "Corrected" } else { "Completed" },
        match_id,
        game.score_1,
        game.score_2,
        game.innings
    );
    on_completed(store, &game, rules)?;
    store.game(match_id)
}

/// Add to the running score. Reaching a points target or the innings ceiling completes
/// the match on the spot.
pub fn apply_delta<R: Repository>(
    store: &mut R,
    match_id: MatchId,
    delta: ScoreDelta,
    rules: &StandingsRules,
) -> EngineResult<GameMatch> {
    let (mut game, tournament) = ready_match(store, match_id)?;
    if game.is_completed() {
        return Err(EngineError::MatchCompleted(match_id));
    }
    let add = |value: u32, delta: i32| -> EngineResult<u32> {
        let sum = i64::from(value) + i64::from(delta);
        if sum < 0 {
            return Err(EngineError::NegativeScore(match_id));
        }
        u32::try_from(sum).map_err(|_| EngineError::ScoreOverflow(match_id))
    };
    game.score_1 = add(game.score_1, delta.player_1)?;
    game.score_2 = add(game.score_2, delta.player_2)?;
    game.innings = add(game.innings, delta.innings)?;
    if delta.player_1 > 0 {
        game.high_run_1 = game.high_run_1.max(delta.player_1.unsigned_abs());
    }
    if delta.player_2 > 0 {
        game.high_run_2 = game.high_run_2.max(delta.player_2.unsigned_abs());
    }
    game.high_run_1 = game.high_run_1.min(game.score_1);
    game.high_run_2 = game.high_run_2.min(game.score_2);
    game.status = MatchStatus::InProgress;
    game.started_at.get_or_insert_with(Utc::now);

    let targets = targets(store, &game, &tournament)?;
    let limits = tournament.settings.limits.for_stage(game.stage);
    let limit_hit = targets.0.is_some_and(|t| game.score_1 >= t)
        || targets.1.is_some_and(|t| game.score_2 >= t)
        || limits.innings_reached(game.innings);
    if !limit_hit {
        store.save_game(game.clone());
        return Ok(game);
    }

    let winner = decide(&game, &tournament, targets)?;
    finish(&mut game, winner, WinReason::Normal);
    store.save_game(game.clone());
    log::info!(
        "Match {} reached its limit at {}-{} after {} innings",
        match_id,
        game.score_1,
        game.score_2,
        game.innings
    );
    on_completed(store, &game, rules)?;
    store.game(match_id)
}

/// Decide a match without (full) play. A walkover wipes every score to zero; a forfeit
/// keeps what was recorded.
pub fn award_match<R: Repository>(
    store: &mut R,
    match_id: MatchId,
    winner: RegistrationId,
    reason: WinReason,
    rules: &StandingsRules,
) -> EngineResult<GameMatch> {
    let (mut game, _) = ready_match(store, match_id)?;
    if game.slot_of(winner).is_none() {
        return Err(EngineError::NotAParticipant {
            match_id,
            registration: winner,
        });
    }
    match reason {
        WinReason::Walkover => {
            game.score_1 = 0;
            game.score_2 = 0;
            game.innings = 0;
            game.high_run_1 = 0;
            game.high_run_2 = 0;
        }
        WinReason::Forfeit => {}
        WinReason::Normal => return Err(EngineError::InvalidWinReason(reason)),
    }
    finish(&mut game, Some(winner), reason);
    store.save_game(game.clone());
    log::info!("Match {} awarded to {} by {:?}", match_id, winner, reason);
    on_completed(store, &game, rules)?;
    store.game(match_id)
}

/// Put a scheduled match on a table.
pub fn start_match<R: Repository>(
    store: &mut R,
    match_id: MatchId,
    table: Option<u32>,
) -> EngineResult<GameMatch> {
    let (mut game, _) = ready_match(store, match_id)?;
    if game.is_completed() {
        return Err(EngineError::MatchCompleted(match_id));
    }
    game.status = MatchStatus::InProgress;
    game.table = table.or(game.table);
    game.started_at.get_or_insert_with(Utc::now);
    store.save_game(game.clone());
    Ok(game)
}

fn refresh_round_robin<R: Repository>(store: &mut R, mut group: Group) -> GroupStage {
    let done = store
        .matches_in_group(group.id)
        .iter()
        .all(GameMatch::is_completed);
    let stage = if done { GroupStage::Finished } else { GroupStage::Round(1) };
    if group.stage != stage {
        group.stage = stage;
        log::info!("Group {} is now {:?}", group.name, stage);
        store.save_group(group);
    }
    stage
}

/// Groups-only events end when the last group finishes.
fn finish_group_event<R: Repository>(
    store: &mut R,
    tournament: &Tournament,
    rules: &StandingsRules,
) -> EngineResult<()> {
    if tournament.settings.format != TournamentFormat::Groups {
        return Ok(());
    }
    let Some(phase) = store.phases_of_kind(tournament.id, PhaseKind::Group).into_iter().next() else {
        return Ok(());
    };
    let groups = store.groups_in_phase(phase.id);
    if !groups.iter().all(Group::is_finished) {
        return Ok(());
    }
    let champion = match groups.as_slice() {
        [only] => final_group_order(store, only.id, rules)?.first().copied(),
        _ => None,
    };
    complete_tournament(store, tournament.id, champion)
}

/// Downstream effects of a completed match: GSL round materialization, group completion,
/// bracket advancement.
fn on_completed<R: Repository>(store: &mut R, game: &GameMatch, rules: &StandingsRules) -> EngineResult<()> {
    match game.group_id {
        Some(group_id) => {
            let group = store.group(group_id)?;
            match group.format {
                GroupFormat::Gsl => {
                    advance_gsl_group(store, group_id)?;
                }
                GroupFormat::RoundRobin => {
                    refresh_round_robin(store, group);
                }
            }
            let tournament = store.tournament(game.tournament_id)?;
            finish_group_event(store, &tournament, rules)
        }
        None => advance_bracket(store, game.id),
    }
}
