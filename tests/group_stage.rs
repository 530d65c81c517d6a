//! Integration tests for the group stage: snake seeding, round-robin tables and qualifiers.

mod common;

use common::{beat, engine, favourite_wins, field, id_of, settings, tournament};
use cue_tournament_web::{
    EngineError, GroupFormat, GroupStage, ResultSheet, ScoreLimits, StageLimits, TournamentFormat,
    TournamentSettings, TournamentStatus,
};

#[test]
fn eight_players_snake_into_two_groups() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin));
    let regs = field(&engine, &t, 8);

    let groups = engine.build_groups(t.id).unwrap();
    assert_eq!(groups.len(), 2);
    let names = |i: usize| -> Vec<String> {
        groups[i]
            .seeds
            .iter()
            .map(|id| regs.iter().find(|r| r.id == *id).unwrap().display_name.clone())
            .collect()
    };
    assert_eq!(names(0), ["P1", "P4", "P5", "P8"]);
    assert_eq!(names(1), ["P2", "P3", "P6", "P7"]);
    assert_eq!(groups[0].name, "A");
    assert_eq!(groups[1].name, "B");
    assert_eq!(engine.tournament(t.id).unwrap().status, TournamentStatus::Active);
}

#[test]
fn round_robin_group_plays_every_pair() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin));
    field(&engine, &t, 8);
    let groups = engine.build_groups(t.id).unwrap();
    for group in &groups {
        assert_eq!(engine.group_matches(group.id).unwrap().len(), 6);
    }
}

#[test]
fn seed_rank_orders_the_field_before_admission() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin));
    // Registered in reverse: seeding must still follow seed rank.
    let regs: Vec<_> = (1..=4)
        .rev()
        .map(|i| engine.register(t.id, common::entrant(&format!("P{i}"), i)).unwrap())
        .collect();
    let groups = engine.build_groups(t.id).unwrap();
    assert_eq!(groups[0].seeds[0], id_of(&regs, "P1"));
    assert_eq!(groups[0].seeds[3], id_of(&regs, "P4"));
}

#[test]
fn gsl_needs_groups_of_four() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::Gsl));
    field(&engine, &t, 6);

    let err = engine.build_groups(t.id).unwrap_err();
    assert!(matches!(
        err,
        EngineError::GroupSizeMismatch { required: 4, actual: 3, .. }
    ));
    // Nothing was written.
    assert!(engine.groups(t.id).unwrap().is_empty());
    assert_eq!(engine.tournament(t.id).unwrap().status, TournamentStatus::Draft);
}

#[test]
fn groups_are_built_once() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin));
    field(&engine, &t, 4);
    engine.build_groups(t.id).unwrap();
    assert!(engine.build_groups(t.id).is_err());
}

#[test]
fn standings_rank_by_points_then_differential() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin));
    let regs = field(&engine, &t, 4);
    let group = engine.build_groups(t.id).unwrap().remove(0);

    for game in engine.group_matches(group.id).unwrap() {
        favourite_wins(&engine, &game, &regs);
    }

    let table = engine.standings(group.id).unwrap();
    let order: Vec<_> = table.iter().map(|row| row.display_name.as_str()).collect();
    assert_eq!(order, ["P1", "P2", "P3", "P4"]);
    assert_eq!(table[0].points, 9);
    assert_eq!(table[0].differential, 15);
    assert_eq!(table[3].losses, 3);
    assert_eq!(engine.group(group.id).unwrap().stage, GroupStage::Finished);

    let qualifiers = engine.qualifiers(group.id).unwrap();
    assert_eq!(qualifiers.len(), 2);
    assert_eq!(qualifiers[0].registration_id, id_of(&regs, "P1"));
    assert_eq!(qualifiers[1].rank, 2);
}

#[test]
fn qualifiers_wait_for_the_whole_group() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin));
    let regs = field(&engine, &t, 4);
    let group = engine.build_groups(t.id).unwrap().remove(0);
    let game = engine.group_matches(group.id).unwrap().remove(0);
    beat(&engine, &game, game.player_1.unwrap());

    assert_eq!(engine.standings(group.id).unwrap().len(), regs.len());
    assert!(matches!(
        engine.qualifiers(group.id),
        Err(EngineError::GroupIncomplete(_))
    ));
}

#[test]
fn level_score_at_innings_limit_is_a_draw_when_allowed() {
    let engine = engine();
    let t = tournament(
        &engine,
        TournamentSettings {
            allow_draws: true,
            limits: StageLimits {
                group: ScoreLimits::new(30, 20),
                ..StageLimits::default()
            },
            ..settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin)
        },
    );
    field(&engine, &t, 4);
    let group = engine.build_groups(t.id).unwrap().remove(0);
    let game = engine.group_matches(group.id).unwrap().remove(0);

    let sheet = ResultSheet { score_1: 12, score_2: 12, innings: 20, ..ResultSheet::default() };
    let drawn = engine.submit_result(game.id, sheet).unwrap();
    assert!(drawn.is_completed());
    assert_eq!(drawn.winner, None);

    let table = engine.standings(group.id).unwrap();
    let row = table.iter().find(|r| Some(r.registration_id) == game.player_1).unwrap();
    assert_eq!((row.draws, row.points), (1, 0));
}

#[test]
fn groups_only_event_completes_with_the_last_match() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::Groups, GroupFormat::RoundRobin));
    let regs = field(&engine, &t, 3);
    let group = engine.build_groups(t.id).unwrap().remove(0);
    for game in engine.group_matches(group.id).unwrap() {
        favourite_wins(&engine, &game, &regs);
    }
    assert_eq!(engine.tournament(t.id).unwrap().status, TournamentStatus::Completed);

    let placements = engine.placements(t.id).unwrap();
    assert_eq!(placements[0].registration_id, id_of(&regs, "P1"));
    assert_eq!(placements.iter().map(|p| p.position).collect::<Vec<_>>(), [1, 2, 3]);
    assert!(matches!(
        engine.build_playoffs(t.id),
        Err(EngineError::InvalidState { .. })
    ));
}

#[test]
fn phase_overview_lists_every_group_table() {
    let engine = engine();
    let t = tournament(&engine, settings(TournamentFormat::GroupsKnockout, GroupFormat::RoundRobin));
    field(&engine, &t, 8);
    let groups = engine.build_groups(t.id).unwrap();

    let phases = engine.phases(t.id).unwrap();
    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].sequence, 1);
    let tables = engine.phase_standings(phases[0].id).unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[1].group_id, groups[1].id);
    assert_eq!(tables[1].group_name, "B");
    assert_eq!(tables[0].stage, GroupStage::Round(1));
    assert!(tables.iter().all(|table| table.rows.len() == 4));
}
