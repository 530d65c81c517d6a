//! Group stage: snake seeding, group creation and the group match skeleton.

use crate::error::{EngineError, EngineResult};
use crate::models::{
    GameMatch, Group, GroupFormat, GslPopulation, GslRole, Phase, PhaseKind, RegistrationId,
    Stage, TournamentId, TournamentStatus,
};
use crate::store::Repository;

/// Name of the group phase.
pub const GROUP_PHASE_NAME: &str = "Fase de Grupos";

/// Distribute `ranked` (best first) over `ceil(n / group_size)` groups in serpentine order:
/// the first block of seeds fills groups 0..g, the next fills g-1..0, and so on.
///
/// Within each group members stay in rank order.
pub fn snake_seed<T: Clone>(ranked: &[T], group_size: usize) -> Vec<Vec<T>> {
    if ranked.is_empty() || group_size == 0 {
        return Vec::new();
    }
    let groups = ranked.len().div_ceil(group_size);
    let mut out: Vec<Vec<T>> = vec![Vec::with_capacity(group_size); groups];
    for (i, item) in ranked.iter().enumerate() {
        let block = i / groups;
        let offset = i % groups;
        let target = if block % 2 == 0 { offset } else { groups - 1 - offset };
        out[target].push(item.clone());
    }
    out
}

/// Round-robin schedule by the circle method: `(round, i, j)` index pairs, every unordered
/// pair exactly once, nobody twice in the same round.
pub fn round_robin_pairings(n: usize) -> Vec<(u32, usize, usize)> {
    if n < 2 {
        return Vec::new();
    }
    // Odd fields get a ghost seat; pairings against it are byes.
    let seats = if n % 2 == 0 { n } else { n + 1 };
    let mut ring: Vec<usize> = (0..seats).collect();
    let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
    for round in 0..seats - 1 {
        for k in 0..seats / 2 {
            let (a, b) = (ring[k], ring[seats - 1 - k]);
            if a < n && b < n {
                pairs.push((round as u32 + 1, a.min(b), a.max(b)));
            }
        }
        // Keep seat 0 fixed, rotate the rest.
        ring[1..].rotate_right(1);
    }
    pairs
}

/// Matches of one group. GSL creates the two openings (and, with placeholders, empty
/// rounds 2 and 3); round robin creates every pair.
fn group_matches(tournament_id: TournamentId, group: &Group, population: GslPopulation) -> Vec<GameMatch> {
    let seeds = &group.seeds;
    let new_match = |p1: Option<RegistrationId>, p2: Option<RegistrationId>, round: u32| {
        GameMatch::new(tournament_id, group.phase_id, p1, p2, Stage::Group, round).in_group(group.id)
    };
    match group.format {
        GroupFormat::RoundRobin => round_robin_pairings(seeds.len())
            .into_iter()
            .map(|(round, i, j)| new_match(Some(seeds[i]), Some(seeds[j]), round))
            .collect(),
        GroupFormat::Gsl => {
            let mut matches = vec![
                new_match(Some(seeds[0]), Some(seeds[3]), 1).with_role(GslRole::OpeningA),
                new_match(Some(seeds[1]), Some(seeds[2]), 1).with_role(GslRole::OpeningB),
            ];
            if population == GslPopulation::Placeholders {
                for role in [GslRole::WinnersMatch, GslRole::LosersMatch, GslRole::Decider] {
                    matches.push(new_match(None, None, role.round()).with_role(role));
                }
            }
            matches
        }
    }
}

/// Build the group phase from the active registrations (best seed first) and move the
/// tournament to Active. Nothing is written if any group has the wrong size.
pub fn build_groups<R: Repository>(store: &mut R, tournament_id: TournamentId) -> EngineResult<Vec<Group>> {
    let mut tournament = store.tournament(tournament_id)?;
    tournament.require_status(TournamentStatus::Draft)?;
    let settings = tournament.settings.clone();
    if !settings.format.has_groups() {
        return Err(EngineError::NoGroupStage(tournament_id));
    }
    if !store.phases_of_kind(tournament_id, PhaseKind::Group).is_empty() {
        return Err(EngineError::GroupsAlreadyBuilt(tournament_id));
    }

    let ranked: Vec<RegistrationId> = store
        .active_registrations_by_seed(tournament_id)
        .into_iter()
        .map(|r| r.id)
        .collect();
    let group_size = settings.group_size as usize;
    if ranked.len() < 2 {
        return Err(EngineError::NotEnoughPlayers {
            needed: 2,
            found: ranked.len(),
        });
    }

    let buckets = snake_seed(&ranked, group_size);
    for (index, members) in buckets.iter().enumerate() {
        let required = match settings.group_format {
            GroupFormat::Gsl => Some(4),
            GroupFormat::RoundRobin if members.len() < 2 => Some(2),
            GroupFormat::RoundRobin => None,
        };
        if let Some(required) = required.filter(|&r| r != members.len()) {
            return Err(EngineError::GroupSizeMismatch {
                group: crate::models::group_name(index as u32),
                required,
                actual: members.len(),
            });
        }
    }

    let phase = Phase::new(tournament_id, GROUP_PHASE_NAME, PhaseKind::Group, 1);
    store.save_phase(phase.clone());

    let mut groups = Vec::with_capacity(buckets.len());
    for (index, members) in buckets.into_iter().enumerate() {
        let group = Group::new(tournament_id, phase.id, index as u32, settings.group_format, members);
        for m in group_matches(tournament_id, &group, settings.gsl_population) {
            store.save_game(m);
        }
        store.save_group(group.clone());
        groups.push(group);
    }

    tournament.status = TournamentStatus::Active;
    store.save_tournament(tournament);
    log::info!(
        "Built {} {:?} group(s) for tournament {} from {} players",
        groups.len(),
        settings.group_format,
        tournament_id,
        ranked.len()
    );
    Ok(groups)
}
