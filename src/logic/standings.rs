//! Group tables and qualifier selection.

use crate::config::{StandingsRules, TieBreaker};
use crate::error::{EngineError, EngineResult};
use crate::logic::gsl::gsl_final_order;
use crate::models::{
    GameMatch, Group, GroupFormat, GroupId, GroupStage, PhaseId, Registration, RegistrationId,
};
use crate::store::Repository;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One line of a group table.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StandingRow {
    pub registration_id: RegistrationId,
    pub display_name: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
    pub score_for: u32,
    pub score_against: u32,
    pub differential: i64,
    #[serde(skip)]
    seed_key: (u32, u32),
}

impl StandingRow {
    fn new(registration: &Registration) -> Self {
        Self {
            registration_id: registration.id,
            display_name: registration.display_name.clone(),
            played: 0,
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
            score_for: 0,
            score_against: 0,
            differential: 0,
            seed_key: registration.seed_key(),
        }
    }
}

/// A player advancing from a group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Qualifier {
    pub registration_id: RegistrationId,
    pub group_id: GroupId,
    pub group_name: String,
    pub group_index: u32,
    /// 1 = group winner.
    pub rank: u32,
}

/// Table of one group within a phase overview.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupTable {
    pub group_id: GroupId,
    pub group_name: String,
    pub stage: GroupStage,
    pub rows: Vec<StandingRow>,
}

fn head_to_head(matches: &[GameMatch], a: RegistrationId, b: RegistrationId) -> Ordering {
    let direct = matches.iter().find(|m| {
        m.is_completed() && m.slot_of(a).is_some() && m.slot_of(b).is_some()
    });
    match direct.and_then(|m| m.winner) {
        Some(w) if w == a => Ordering::Less,
        Some(w) if w == b => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Table from the completed matches among `members`, sorted best first. Points, then the
/// configured tie-breakers, then admission order so the result is always deterministic.
pub fn compute_standings(
    members: &[Registration],
    matches: &[GameMatch],
    rules: &StandingsRules,
) -> Vec<StandingRow> {
    let mut rows: HashMap<RegistrationId, StandingRow> =
        members.iter().map(|r| (r.id, StandingRow::new(r))).collect();

    for m in matches.iter().filter(|m| m.is_completed()) {
        let (Some(p1), Some(p2)) = (m.player_1, m.player_2) else {
            continue;
        };
        for (me, other) in [(p1, p2), (p2, p1)] {
            let Some(row) = rows.get_mut(&me) else {
                continue;
            };
            let (own, against) = m.scores_for(me).unwrap_or((0, 0));
            row.played += 1;
            row.score_for += own;
            row.score_against += against;
            row.differential += i64::from(own) - i64::from(against);
            match m.winner {
                Some(w) if w == me => {
                    row.wins += 1;
                    row.points += rules.win_points;
                }
                Some(w) if w == other => {
                    row.losses += 1;
                    row.points += rules.loss_points;
                }
                _ => {
                    row.draws += 1;
                    row.points += rules.draw_points;
                }
            }
        }
    }

    let mut table: Vec<StandingRow> = rows.into_values().collect();
    // Head-to-head is not transitive, so it only reorders two-way ties after a plain sort.
    let split = rules
        .tie_breakers
        .iter()
        .position(|tb| *tb == TieBreaker::HeadToHead);
    let (before, after): (&[TieBreaker], &[TieBreaker]) = match split {
        Some(i) => (&rules.tie_breakers[..i], &rules.tie_breakers[i + 1..]),
        None => (&rules.tie_breakers, &[]),
    };
    table.sort_by(|a, b| {
        compare(a, b, before)
            .then_with(|| compare(a, b, after))
            .then(a.seed_key.1.cmp(&b.seed_key.1))
    });

    if split.is_some() {
        let mut start = 0;
        while start < table.len() {
            let end = (start..table.len())
                .find(|&i| compare(&table[start], &table[i], before) != Ordering::Equal)
                .unwrap_or(table.len());
            if end - start == 2 {
                let (a, b) = (table[start].registration_id, table[start + 1].registration_id);
                if head_to_head(matches, a, b) == Ordering::Greater {
                    table.swap(start, start + 1);
                }
            }
            start = end;
        }
    }
    table
}

fn compare(a: &StandingRow, b: &StandingRow, tie_breakers: &[TieBreaker]) -> Ordering {
    let mut ord = b.points.cmp(&a.points);
    for tb in tie_breakers {
        if ord != Ordering::Equal {
            break;
        }
        ord = match tb {
            TieBreaker::Differential => b.differential.cmp(&a.differential),
            TieBreaker::ScoreFor => b.score_for.cmp(&a.score_for),
            TieBreaker::SeedRank => a.seed_key.0.cmp(&b.seed_key.0),
            TieBreaker::HeadToHead => Ordering::Equal,
        };
    }
    ord
}

fn members<R: Repository>(store: &R, group: &Group) -> EngineResult<Vec<Registration>> {
    group.seeds.iter().map(|id| store.registration(*id)).collect()
}

/// Current table of a group, complete or not. GSL groups list their players by final
/// position once finished.
pub fn group_standings<R: Repository>(
    store: &R,
    group_id: GroupId,
    rules: &StandingsRules,
) -> EngineResult<Vec<StandingRow>> {
    let group = store.group(group_id)?;
    let matches = store.matches_in_group(group_id);
    let mut table = compute_standings(&members(store, &group)?, &matches, rules);
    if group.format == GroupFormat::Gsl && group.is_finished() {
        let order = gsl_final_order(store, group_id)?;
        table.sort_by_key(|row| order.iter().position(|id| *id == row.registration_id));
    }
    Ok(table)
}

/// Current tables of every group in a phase, in group order.
pub fn phase_standings<R: Repository>(
    store: &R,
    phase_id: PhaseId,
    rules: &StandingsRules,
) -> EngineResult<Vec<GroupTable>> {
    store.phase(phase_id)?;
    store
        .groups_in_phase(phase_id)
        .into_iter()
        .map(|group| {
            Ok(GroupTable {
                rows: group_standings(store, group.id, rules)?,
                group_id: group.id,
                group_name: group.name,
                stage: group.stage,
            })
        })
        .collect()
}

/// Final order of a completed group, best first. Fails while any match is unfinished.
pub fn final_group_order<R: Repository>(
    store: &R,
    group_id: GroupId,
    rules: &StandingsRules,
) -> EngineResult<Vec<RegistrationId>> {
    let group = store.group(group_id)?;
    match group.format {
        GroupFormat::Gsl => gsl_final_order(store, group_id),
        GroupFormat::RoundRobin => {
            let matches = store.matches_in_group(group_id);
            if matches.iter().any(|m| !m.is_completed()) {
                return Err(EngineError::GroupIncomplete(group_id));
            }
            Ok(compute_standings(&members(store, &group)?, &matches, rules)
                .into_iter()
                .map(|row| row.registration_id)
                .collect())
        }
    }
}

/// Top `count` of a completed group, tagged with group and rank.
pub fn select_qualifiers<R: Repository>(
    store: &R,
    group_id: GroupId,
    count: usize,
    rules: &StandingsRules,
) -> EngineResult<Vec<Qualifier>> {
    let group = store.group(group_id)?;
    let count = match group.format {
        GroupFormat::Gsl => 2,
        GroupFormat::RoundRobin => count,
    };
    Ok(final_group_order(store, group_id, rules)?
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(i, registration_id)| Qualifier {
            registration_id,
            group_id,
            group_name: group.name.clone(),
            group_index: group.index,
            rank: i as u32 + 1,
        })
        .collect())
}

/// Qualifiers of every group of a phase, in bracket seeding order: all group winners
/// (A1, B1, ...), then all runners-up (A2, B2, ...), and so on.
pub fn phase_qualifiers<R: Repository>(
    store: &R,
    phase_id: PhaseId,
    per_group: usize,
    rules: &StandingsRules,
) -> EngineResult<Vec<Qualifier>> {
    let mut qualifiers = Vec::new();
    for group in store.groups_in_phase(phase_id) {
        qualifiers.extend(select_qualifiers(store, group.id, per_group, rules)?);
    }
    qualifiers.sort_by_key(|q| (q.rank, q.group_index));
    Ok(qualifiers)
}
