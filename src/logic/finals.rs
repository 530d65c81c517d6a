//! Playoffs: single-elimination bracket built from group qualifiers (or straight from the
//! registrations), winner advancement and full regeneration.

use crate::config::StandingsRules;
use crate::error::{EngineError, EngineResult};
use crate::logic::standings::phase_qualifiers;
use crate::models::{
    GameMatch, MatchId, NextSlot, Phase, PhaseKind, Registration, RegistrationId,
    RegistrationStatus, Slot, Stage, TournamentId, TournamentStatus,
};
use crate::store::Repository;
use serde::Serialize;

/// Seed numbers (1-based) in bracket order for a power-of-two `size`; consecutive pairs
/// meet in round one (1v8, 4v5, 2v7, 3v6 for eight).
pub fn bracket_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let mirror = order.len() * 2 + 1;
        order = order.iter().flat_map(|&s| [s, mirror - s]).collect();
    }
    order
}

/// Round name by number of players still in.
pub fn round_label(players: usize) -> String {
    match players {
        2 => "Final".to_string(),
        4 => "Semifinal".to_string(),
        8 => "Cuartos de Final".to_string(),
        16 => "Octavos de Final".to_string(),
        32 => "Dieciseisavos de Final".to_string(),
        n => format!("Ronda de {n}"),
    }
}

fn stage_for(players: usize) -> Stage {
    match players {
        2 => Stage::Final,
        4 => Stage::Semifinal,
        _ => Stage::Playoff,
    }
}

/// One bracket round with its matches in bracket order.
#[derive(Clone, Debug, Serialize)]
pub struct BracketRound {
    pub phase: Phase,
    pub matches: Vec<GameMatch>,
}

/// A bracket seed with the group it came out of.
#[derive(Clone, Copy, Debug)]
struct Seed {
    registration_id: RegistrationId,
    group_index: Option<u32>,
    rank: u32,
}

fn clashes(seeds: &[Seed], opponent: &[usize], i: usize) -> bool {
    let j = opponent[i];
    j < seeds.len() && seeds[i].group_index.is_some() && seeds[i].group_index == seeds[j].group_index
}

/// Swap equally ranked seeds so no first-round match repeats a group pairing. A clash
/// with no valid swap (a single group) is left as is.
fn separate_group_rematches(seeds: &mut [Seed]) {
    let size = seeds.len().next_power_of_two();
    let mut opponent = vec![0; size];
    for pair in bracket_order(size).chunks(2) {
        opponent[pair[0] - 1] = pair[1] - 1;
        opponent[pair[1] - 1] = pair[0] - 1;
    }
    for i in 0..seeds.len() {
        if !clashes(seeds, &opponent, i) {
            continue;
        }
        let weaker = i.max(opponent[i]);
        for k in 0..seeds.len() {
            if k == weaker || seeds[k].rank != seeds[weaker].rank {
                continue;
            }
            seeds.swap(k, weaker);
            if !clashes(seeds, &opponent, weaker) && !clashes(seeds, &opponent, k) {
                log::debug!("Swapped seeds {} and {} to avoid a group rematch", k + 1, weaker + 1);
                break;
            }
            seeds.swap(k, weaker);
        }
    }
}

/// Seeds for the bracket, best first.
fn seeded_entrants<R: Repository>(
    store: &R,
    tournament_id: TournamentId,
    rules: &StandingsRules,
) -> EngineResult<Vec<RegistrationId>> {
    let tournament = store.tournament(tournament_id)?;
    if !tournament.settings.format.has_playoffs() {
        return Err(EngineError::NoPlayoffStage(tournament_id));
    }
    if !tournament.settings.format.has_groups() {
        // Eliminated entrants still hold their seed: a completed bracket can be rebuilt.
        let mut entrants: Vec<_> = store
            .registrations(tournament_id)
            .into_iter()
            .filter(|r| {
                matches!(
                    r.status,
                    RegistrationStatus::Active | RegistrationStatus::Eliminated
                )
            })
            .collect();
        entrants.sort_by_key(Registration::seed_key);
        return Ok(entrants.into_iter().map(|r| r.id).collect());
    }
    let group_phase = store
        .phases_of_kind(tournament_id, PhaseKind::Group)
        .into_iter()
        .next()
        .ok_or(EngineError::NoGroupStage(tournament_id))?;
    let per_group = tournament.settings.qualifiers_per_group as usize;
    let mut seeds: Vec<Seed> = phase_qualifiers(store, group_phase.id, per_group, rules)?
        .into_iter()
        .map(|q| Seed {
            registration_id: q.registration_id,
            group_index: Some(q.group_index),
            rank: q.rank,
        })
        .collect();
    separate_group_rematches(&mut seeds);
    Ok(seeds.into_iter().map(|s| s.registration_id).collect())
}

/// Create one phase per round and every bracket match. Round one gets its players, a top
/// seed without an opponent goes straight into round two, later rounds start empty.
fn create_bracket<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
    seeds: &[RegistrationId],
    requested_size: Option<u32>,
) -> EngineResult<Vec<Phase>> {
    if seeds.len() < 2 {
        return Err(EngineError::NotEnoughPlayers {
            needed: 2,
            found: seeds.len(),
        });
    }
    let natural = seeds.len().next_power_of_two();
    let size = requested_size.map_or(natural, |s| s as usize);
    if size != natural {
        return Err(EngineError::BracketSize {
            size: size as u32,
            qualifiers: seeds.len(),
        });
    }

    let first_sequence = store
        .phases(tournament_id)
        .last()
        .map_or(1, |p| p.sequence + 1);

    // Later rounds first so every match knows where its winner goes.
    let rounds = size.trailing_zeros() as usize;
    let mut phases = Vec::with_capacity(rounds);
    let mut next_round: Vec<MatchId> = Vec::new();
    let mut by_round: Vec<Vec<GameMatch>> = Vec::with_capacity(rounds);
    for round in (1..=rounds).rev() {
        let players = size >> (round - 1);
        let label = round_label(players);
        let phase = Phase::new(
            tournament_id,
            label.clone(),
            PhaseKind::Elimination,
            first_sequence + round as u32 - 1,
        );
        let matches: Vec<GameMatch> = (0..players / 2)
            .map(|position| {
                let mut m = GameMatch::new(
                    tournament_id,
                    phase.id,
                    None,
                    None,
                    stage_for(players),
                    round as u32,
                );
                m.label = Some(label.clone());
                m.bracket_position = Some(position as u32);
                m.next = next_round.get(position / 2).map(|&match_id| NextSlot {
                    match_id,
                    slot: if position % 2 == 0 { Slot::One } else { Slot::Two },
                });
                m
            })
            .collect();
        next_round = matches.iter().map(|m| m.id).collect();
        phases.push(phase);
        by_round.push(matches);
    }
    phases.reverse();
    by_round.reverse();

    let order = bracket_order(size);
    let (first, rest) = by_round.split_at_mut(1);
    let mut byes = Vec::new();
    for (position, pair) in order.chunks(2).enumerate() {
        let top = seeds.get(pair[0] - 1).copied();
        let bottom = seeds.get(pair[1] - 1).copied();
        let m = &mut first[0][position];
        match (top, bottom) {
            (Some(a), Some(b)) => {
                m.player_1 = Some(a);
                m.player_2 = Some(b);
            }
            (Some(a), None) | (None, Some(a)) => {
                if let (Some(next), Some(round_two)) = (m.next, rest.first_mut()) {
                    if let Some(target) = round_two.iter_mut().find(|n| n.id == next.match_id) {
                        target.set_player(next.slot, Some(a));
                    }
                }
                byes.push(m.id);
            }
            (None, None) => byes.push(m.id),
        }
    }
    first[0].retain(|m| !byes.contains(&m.id));

    for phase in &phases {
        store.save_phase(phase.clone());
    }
    for m in by_round.into_iter().flatten() {
        store.save_game(m);
    }
    log::info!(
        "Built {}-player bracket for tournament {} ({} bye(s))",
        size,
        tournament_id,
        byes.len()
    );
    Ok(phases)
}

/// Build the playoff bracket once the group stage is complete.
pub fn build_playoffs<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
    rules: &StandingsRules,
) -> EngineResult<Vec<BracketRound>> {
    let mut tournament = store.tournament(tournament_id)?;
    if !store.phases_of_kind(tournament_id, PhaseKind::Elimination).is_empty() {
        return Err(EngineError::PlayoffsAlreadyBuilt(tournament_id));
    }
    if tournament.settings.format.has_groups() {
        tournament.require_status(TournamentStatus::Active)?;
    } else {
        tournament.require_status(TournamentStatus::Draft)?;
    }
    let seeds = seeded_entrants(store, tournament_id, rules)?;
    create_bracket(store, tournament_id, &seeds, tournament.settings.playoff_size)?;
    if tournament.status == TournamentStatus::Draft {
        tournament.status = TournamentStatus::Active;
        store.save_tournament(tournament);
    }
    bracket(store, tournament_id)
}

/// Throw away every bracket phase and rebuild from the current group results. The group
/// phase is never touched; calling this twice yields the same pairings.
pub fn regenerate_playoffs<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
    rules: &StandingsRules,
) -> EngineResult<Vec<BracketRound>> {
    let mut tournament = store.tournament(tournament_id)?;
    if tournament.status == TournamentStatus::Draft {
        return Err(EngineError::InvalidState {
            tournament: tournament_id,
            expected: TournamentStatus::Active,
            actual: tournament.status,
        });
    }
    // Qualifiers first: an incomplete group stage fails before anything is deleted.
    let seeds = seeded_entrants(store, tournament_id, rules)?;

    let old = store.phases_of_kind(tournament_id, PhaseKind::Elimination);
    for phase in &old {
        store.delete_matches_in_phase(phase.id);
        store.delete_phase(phase.id);
    }
    create_bracket(store, tournament_id, &seeds, tournament.settings.playoff_size)?;

    if tournament.status == TournamentStatus::Completed {
        for mut r in store.registrations(tournament_id) {
            if r.status == RegistrationStatus::Eliminated && seeds.contains(&r.id) {
                r.status = RegistrationStatus::Active;
                store.save_registration(r);
            }
        }
        tournament.status = TournamentStatus::Active;
        tournament.completed_at = None;
        store.save_tournament(tournament);
    }
    log::info!(
        "Regenerated playoffs of tournament {} ({} old round(s) dropped)",
        tournament_id,
        old.len()
    );
    bracket(store, tournament_id)
}

/// Move the winner of a completed bracket match into its next slot; completing the final
/// completes the tournament.
pub fn advance_bracket<R: Repository>(store: &mut R, match_id: MatchId) -> EngineResult<()> {
    let game = store.game(match_id)?;
    let Some(winner) = game.winner.filter(|_| game.is_completed()) else {
        return Err(EngineError::UnresolvedTie(match_id));
    };
    match game.next {
        Some(next) => {
            let mut target = store.game(next.match_id)?;
            match target.player(next.slot) {
                Some(current) if current == winner => {
                    log::debug!("Bracket slot of match {} already holds the winner", target.id);
                }
                _ if target.has_play() => return Err(EngineError::DownstreamPlayed(target.id)),
                _ => {
                    target.set_player(next.slot, Some(winner));
                    store.save_game(target);
                }
            }
        }
        None => complete_tournament(store, game.tournament_id, Some(winner))?,
    }
    Ok(())
}

/// Mark the tournament completed and everyone but the champion (if there is one)
/// eliminated. A corrected final hands the title to whoever now won it.
pub fn complete_tournament<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
    champion: Option<RegistrationId>,
) -> EngineResult<()> {
    let mut tournament = store.tournament(tournament_id)?;
    for mut r in store.registrations(tournament_id) {
        let status = match r.status {
            RegistrationStatus::Active if Some(r.id) != champion => RegistrationStatus::Eliminated,
            RegistrationStatus::Eliminated if Some(r.id) == champion => RegistrationStatus::Active,
            _ => continue,
        };
        r.status = status;
        store.save_registration(r);
    }
    if tournament.status != TournamentStatus::Completed {
        tournament.complete();
        store.save_tournament(tournament);
        log::info!("Tournament {} completed", tournament_id);
    }
    Ok(())
}

/// Every bracket round in order, matches top to bottom.
pub fn bracket<R: Repository>(store: &R, tournament_id: TournamentId) -> EngineResult<Vec<BracketRound>> {
    store.tournament(tournament_id)?;
    Ok(store
        .phases_of_kind(tournament_id, PhaseKind::Elimination)
        .into_iter()
        .map(|phase| {
            let mut matches = store.matches_in_phase(phase.id);
            matches.sort_by_key(|m| m.bracket_position);
            BracketRound { phase, matches }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_order_pairs_top_and_bottom() {
        assert_eq!(bracket_order(2), vec![1, 2]);
        assert_eq!(bracket_order(4), vec![1, 4, 2, 3]);
        assert_eq!(bracket_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn round_labels() {
        assert_eq!(round_label(8), "Cuartos de Final");
        assert_eq!(round_label(2), "Final");
        assert_eq!(round_label(64), "Ronda de 64");
    }

    fn seed(group: u32, rank: u32) -> Seed {
        Seed {
            registration_id: uuid::Uuid::new_v4(),
            group_index: Some(group),
            rank,
        }
    }

    #[test]
    fn three_groups_avoid_first_round_rematches() {
        // A1 B1 C1 A2 B2 C2: straight seeding pairs C1 with C2.
        let mut seeds = vec![seed(0, 1), seed(1, 1), seed(2, 1), seed(0, 2), seed(1, 2), seed(2, 2)];
        separate_group_rematches(&mut seeds);
        let groups: Vec<_> = seeds.iter().map(|s| s.group_index.unwrap_or(99)).collect();
        assert_eq!(groups, vec![0, 1, 2, 2, 1, 0]);
        // Winners keep their seeds.
        assert!(seeds[..3].iter().all(|s| s.rank == 1));
    }

    #[test]
    fn single_group_clash_is_left_alone() {
        let mut seeds = vec![seed(0, 1), seed(0, 2)];
        let before: Vec<_> = seeds.iter().map(|s| s.registration_id).collect();
        separate_group_rematches(&mut seeds);
        let after: Vec<_> = seeds.iter().map(|s| s.registration_id).collect();
        assert_eq!(before, after);
    }
}
