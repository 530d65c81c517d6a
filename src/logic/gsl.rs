//! GSL groups: four players, five matches, three rounds.
//!
//! Round 1 is seeded (1v4, 2v3). Once both openings are decided the winners meet in the
//! winners' match and the losers in the losers' match. Once both of those are decided the
//! loser of the winners' match meets the winner of the losers' match in the decider.
//! The group qualifies the winners' match winner (1st) and the decider winner (2nd).
//!
//! Advancement runs after every completed match of the group and is idempotent: a round is
//! materialized at most once, existing rows (including empty placeholders) are filled in
//! place, and repeating the call with nothing new to do leaves the store untouched.

use crate::error::{EngineError, EngineResult};
use crate::models::{
    GameMatch, Group, GroupFormat, GroupId, GroupStage, GslRole, RegistrationId, Stage,
};
use crate::store::Repository;

/// Winner and loser of a decided match.
#[derive(Clone, Copy, Debug)]
struct Decided {
    winner: RegistrationId,
    loser: RegistrationId,
}

fn by_role(matches: &[GameMatch], role: GslRole) -> Option<&GameMatch> {
    matches.iter().find(|m| m.gsl_role == Some(role))
}

/// `None` until the match is completed; a completed GSL match without a winner is invalid.
fn decided(game: Option<&GameMatch>) -> EngineResult<Option<Decided>> {
    let Some(game) = game.filter(|m| m.is_completed()) else {
        return Ok(None);
    };
    match (game.winner, game.loser()) {
        (Some(winner), Some(loser)) => Ok(Some(Decided { winner, loser })),
        _ => Err(EngineError::UnresolvedTie(game.id)),
    }
}

/// Make sure the match for `role` exists with exactly these players.
/// Returns whether anything was written.
fn place<R: Repository>(
    store: &mut R,
    group: &Group,
    matches: &[GameMatch],
    role: GslRole,
    player_1: RegistrationId,
    player_2: RegistrationId,
) -> EngineResult<bool> {
    match by_role(matches, role) {
        Some(m) if m.player_1 == Some(player_1) && m.player_2 == Some(player_2) => Ok(false),
        Some(m) if m.has_play() => Err(EngineError::DownstreamPlayed(m.id)),
        Some(m) => {
            let mut m = m.clone();
            m.player_1 = Some(player_1);
            m.player_2 = Some(player_2);
            store.save_game(m);
            Ok(true)
        }
        None => {
            let m = GameMatch::new(
                group.tournament_id,
                group.phase_id,
                Some(player_1),
                Some(player_2),
                Stage::Group,
                role.round(),
            )
            .in_group(group.id)
            .with_role(role);
            store.save_game(m);
            Ok(true)
        }
    }
}

/// Materialize whatever rounds the current results allow and store the group's stage.
/// Non-GSL groups are left as they are.
pub fn advance_gsl_group<R: Repository>(store: &mut R, group_id: GroupId) -> EngineResult<GroupStage> {
    let mut group = store.group(group_id)?;
    if group.format != GroupFormat::Gsl {
        return Ok(group.stage);
    }

    let mut stage = GroupStage::Round(1);
    let mut changed = false;
    let matches = store.matches_in_group(group_id);
    let opening_a = decided(by_role(&matches, GslRole::OpeningA))?;
    let opening_b = decided(by_role(&matches, GslRole::OpeningB))?;

    if let (Some(a), Some(b)) = (opening_a, opening_b) {
        changed |= place(store, &group, &matches, GslRole::WinnersMatch, a.winner, b.winner)?;
        changed |= place(store, &group, &matches, GslRole::LosersMatch, a.loser, b.loser)?;
        stage = GroupStage::Round(2);

        let matches = store.matches_in_group(group_id);
        let winners = decided(by_role(&matches, GslRole::WinnersMatch))?;
        let losers = decided(by_role(&matches, GslRole::LosersMatch))?;
        if let (Some(c), Some(d)) = (winners, losers) {
            changed |= place(store, &group, &matches, GslRole::Decider, c.loser, d.winner)?;
            stage = GroupStage::Round(3);

            let matches = store.matches_in_group(group_id);
            if decided(by_role(&matches, GslRole::Decider))?.is_some() {
                stage = GroupStage::Finished;
            }
        }
    }

    if changed {
        log::info!("Group {} advanced to {:?}", group.name, stage);
    } else {
        log::debug!("Group {} unchanged at {:?}", group.name, stage);
    }
    if group.stage != stage {
        group.stage = stage;
        store.save_group(group);
    }
    Ok(stage)
}

/// Final order of a finished GSL group: winners' match winner, decider winner,
/// decider loser, losers' match loser.
pub fn gsl_final_order<R: Repository>(store: &R, group_id: GroupId) -> EngineResult<Vec<RegistrationId>> {
    let group = store.group(group_id)?;
    let matches = store.matches_in_group(group_id);
    let winners = decided(by_role(&matches, GslRole::WinnersMatch))?;
    let losers = decided(by_role(&matches, GslRole::LosersMatch))?;
    let decider = decided(by_role(&matches, GslRole::Decider))?;
    match (group.stage, winners, losers, decider) {
        (GroupStage::Finished, Some(c), Some(d), Some(e)) => Ok(vec![c.winner, e.winner, e.loser, d.loser]),
        _ => Err(EngineError::GroupIncomplete(group_id)),
    }
}
