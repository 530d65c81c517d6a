//! Final placements and the global ranking: points, categories, rolling average, handicap.

use crate::config::{EngineConfig, StandingsRules};
use crate::error::{EngineError, EngineResult};
use crate::logic::standings::final_group_order;
use crate::models::{
    PhaseKind, Player, PlayerId, RegistrationId, Tournament, TournamentId, TournamentStatus,
    WinReason,
};
use crate::store::Repository;
use serde::Serialize;
use std::collections::HashMap;

/// Points target from a rolling average. Missing or negative averages give 0.
pub fn handicap(average: Option<f64>) -> u32 {
    match average {
        Some(avg) if avg >= 0.0 => match avg {
            a if a < 0.250 => 18,
            a if a < 0.400 => 20,
            a if a < 0.550 => 22,
            a if a < 0.700 => 24,
            a if a < 0.850 => 26,
            _ => 28,
        },
        _ => 0,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Placement {
    pub registration_id: RegistrationId,
    /// 1 = champion; tied players share a position.
    pub position: u32,
}

/// What the aggregator did for one player.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankingUpdate {
    pub player_id: PlayerId,
    pub position: u32,
    pub points: u32,
}

/// Final positions of a completed tournament, best first.
///
/// In a bracket the losers of a round with n players share position n/2 + 1 and group
/// players who did not qualify share bracket size + 1. Without a bracket, rank r of g
/// groups shares position (r - 1) * g + 1.
pub fn placements<R: Repository>(
    store: &R,
    tournament_id: TournamentId,
    rules: &StandingsRules,
) -> EngineResult<Vec<Placement>> {
    let tournament = store.tournament(tournament_id)?;
    tournament.require_status(TournamentStatus::Completed)?;

    let mut positions: HashMap<RegistrationId, u32> = HashMap::new();
    let rounds = store.phases_of_kind(tournament_id, PhaseKind::Elimination);
    if rounds.is_empty() {
        if let Some(phase) = store.phases_of_kind(tournament_id, PhaseKind::Group).first() {
            let groups = store.groups_in_phase(phase.id);
            let count = groups.len() as u32;
            for group in &groups {
                for (rank, id) in final_group_order(store, group.id, rules)?.into_iter().enumerate() {
                    positions.insert(id, rank as u32 * count + 1);
                }
            }
        }
    } else {
        let size = 1u32 << rounds.len();
        for (i, phase) in rounds.iter().enumerate() {
            let players = size >> i;
            for m in store.completed_matches_in_phase(phase.id) {
                if let Some(loser) = m.loser() {
                    positions.insert(loser, players / 2 + 1);
                }
                if m.next.is_none() {
                    if let Some(winner) = m.winner {
                        positions.insert(winner, 1);
                    }
                }
            }
        }
        if let Some(phase) = store.phases_of_kind(tournament_id, PhaseKind::Group).first() {
            for group in store.groups_in_phase(phase.id) {
                for id in group.seeds {
                    positions.entry(id).or_insert(size + 1);
                }
            }
        }
    }

    let mut out: Vec<Placement> = positions
        .into_iter()
        .map(|(registration_id, position)| Placement {
            registration_id,
            position,
        })
        .collect();
    let order: HashMap<RegistrationId, u32> = store
        .registrations(tournament_id)
        .into_iter()
        .map(|r| (r.id, r.admission_order))
        .collect();
    out.sort_by_key(|p| (p.position, order.get(&p.registration_id).copied()));
    Ok(out)
}

/// Scoring totals (points, innings) per registration over matches actually played.
fn played_totals<R: Repository>(store: &R, tournament_id: TournamentId) -> HashMap<RegistrationId, (u64, u64)> {
    let mut totals: HashMap<RegistrationId, (u64, u64)> = HashMap::new();
    for m in store.matches_in_tournament(tournament_id) {
        if !m.is_completed() || m.win_reason == Some(WinReason::Walkover) || m.innings == 0 {
            continue;
        }
        for (slot_player, score) in [(m.player_1, m.score_1), (m.player_2, m.score_2)] {
            if let Some(id) = slot_player {
                let entry = totals.entry(id).or_default();
                entry.0 += u64::from(score);
                entry.1 += u64::from(m.innings);
            }
        }
    }
    totals
}

fn apply_tournament<R: Repository>(
    store: &mut R,
    tournament: &Tournament,
    config: &EngineConfig,
) -> EngineResult<Vec<RankingUpdate>> {
    let table = &config.ranking.table;
    if !table.has_tier(tournament.settings.tier) {
        return Err(EngineError::UnknownTier(tournament.settings.tier));
    }
    let season = tournament.settings.season;
    let totals = played_totals(store, tournament.id);
    let mut updates = Vec::new();

    for placement in placements(store, tournament.id, &config.standings)? {
        let registration = store.registration(placement.registration_id)?;
        let Some(player_id) = registration.player_id else {
            continue;
        };
        let mut player: Player = store.player(player_id)?;
        let points = table.points(tournament.settings.tier, placement.position)?;

        if player.season.map_or(true, |s| season > s) {
            player.season = Some(season);
            player.annual_points = 0;
            player.annual_tournaments_played = 0;
        }
        if player.season == Some(season) {
            player.annual_points += points;
            player.annual_tournaments_played += 1;
        }
        player.ranking_points += points;
        player.tournaments_played += 1;

        if let Some(&(scored, innings)) = totals.get(&registration.id) {
            player.career_points += scored;
            player.career_innings += innings;
        }
        if player.career_innings > 0 {
            player.average = Some(player.career_points as f64 / player.career_innings as f64);
        }
        player.category = config.ranking.category(player.ranking_points);

        updates.push(RankingUpdate {
            player_id,
            position: placement.position,
            points,
        });
        store.save_player(player);
    }
    Ok(updates)
}

/// Fold a completed, official tournament into its players' rankings. Runs once per
/// tournament.
pub fn recalculate_ranking<R: Repository>(
    store: &mut R,
    tournament_id: TournamentId,
    config: &EngineConfig,
) -> EngineResult<Vec<RankingUpdate>> {
    let mut tournament = store.tournament(tournament_id)?;
    tournament.require_status(TournamentStatus::Completed)?;
    if !tournament.settings.official {
        return Err(EngineError::NotOfficial(tournament_id));
    }
    if tournament.ranked {
        return Err(EngineError::AlreadyRanked(tournament_id));
    }
    let updates = apply_tournament(store, &tournament, config)?;
    tournament.ranked = true;
    store.save_tournament(tournament);
    log::info!(
        "Ranked tournament {}: {} player(s) updated",
        tournament_id,
        updates.len()
    );
    Ok(updates)
}

/// Reset every player and re-apply all ranked tournaments in completion order.
/// Returns how many tournaments were applied.
pub fn rebuild_rankings<R: Repository>(store: &mut R, config: &EngineConfig) -> EngineResult<usize> {
    for mut player in store.players() {
        player.reset_ranking();
        store.save_player(player);
    }
    let mut ranked: Vec<Tournament> = store
        .tournaments()
        .into_iter()
        .filter(|t| t.ranked && t.status == TournamentStatus::Completed)
        .collect();
    ranked.sort_by_key(|t| (t.completed_at, t.created_at));
    for tournament in &ranked {
        apply_tournament(store, tournament, config)?;
    }
    log::info!("Rebuilt rankings from {} tournament(s)", ranked.len());
    Ok(ranked.len())
}

/// Players ordered by annual points for `season` (others count as zero), then lifetime.
pub fn annual_ranking<R: Repository>(store: &R, season: i32) -> Vec<Player> {
    let mut players = store.players();
    let annual = |p: &Player| if p.season == Some(season) { p.annual_points } else { 0 };
    players.sort_by(|a, b| {
        annual(b)
            .cmp(&annual(a))
            .then(b.ranking_points.cmp(&a.ranking_points))
            .then_with(|| a.name.cmp(&b.name))
    });
    players
}

#[cfg(test)]
mod tests {
    use super::handicap;

    #[test]
    fn handicap_brackets() {
        assert_eq!(handicap(None), 0);
        assert_eq!(handicap(Some(-0.1)), 0);
        assert_eq!(handicap(Some(0.0)), 18);
        assert_eq!(handicap(Some(0.249)), 18);
        assert_eq!(handicap(Some(0.250)), 20);
        assert_eq!(handicap(Some(0.399)), 20);
        assert_eq!(handicap(Some(0.400)), 22);
        assert_eq!(handicap(Some(0.549)), 22);
        assert_eq!(handicap(Some(0.550)), 24);
        assert_eq!(handicap(Some(0.700)), 26);
        assert_eq!(handicap(Some(0.849)), 26);
        assert_eq!(handicap(Some(0.850)), 28);
        assert_eq!(handicap(Some(3.0)), 28);
    }
}
