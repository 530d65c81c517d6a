//! Integration tests for placements and the global ranking.

mod common;

use common::{beat, settings};
use cue_tournament_web::{
    handicap, Category, Engine, EngineConfig, EngineError, Entrant, ErrorKind, GroupFormat, Player,
    RankingTable, ResultSheet, Tournament, TournamentFormat, TournamentSettings,
};

fn config() -> EngineConfig {
    EngineConfig {
        season: 2024,
        ..EngineConfig::default()
    }
}

fn knockout(season: i32) -> TournamentSettings {
    TournamentSettings {
        season,
        ..settings(TournamentFormat::Elimination, GroupFormat::RoundRobin)
    }
}

/// Two-player knockout between `players`; the first one wins the final 10-5 in 12 innings.
fn play_final(engine: &Engine, settings: TournamentSettings, players: [&Player; 2]) -> Tournament {
    let t = engine.create_tournament("Copa", settings).unwrap();
    let regs: Vec<_> = players
        .iter()
        .map(|p| {
            let entry = Entrant { player_id: Some(p.id), ..Entrant::default() };
            engine.register(t.id, entry).unwrap()
        })
        .collect();
    let game = engine.build_playoffs(t.id).unwrap()[0].matches[0].clone();
    beat(engine, &game, regs[0].id);
    t
}

#[test]
fn handicap_follows_the_average_brackets() {
    assert_eq!(handicap(None), 0);
    assert_eq!(handicap(Some(0.10)), 18);
    assert_eq!(handicap(Some(0.40)), 22);
    assert_eq!(handicap(Some(0.70)), 26);
    assert_eq!(handicap(Some(1.20)), 28);
}

#[test]
fn completed_tournament_feeds_the_ranking_once() {
    let engine = Engine::new(config());
    let ana = engine.create_player("Ana", None).unwrap();
    let bea = engine.create_player("Bea", None).unwrap();
    let t = play_final(&engine, knockout(2024), [&ana, &bea]);

    let updates = engine.recalculate_ranking(t.id).unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!((updates[0].player_id, updates[0].position, updates[0].points), (ana.id, 1, 100));
    assert_eq!((updates[1].player_id, updates[1].position, updates[1].points), (bea.id, 2, 75));

    let ana = engine.player(ana.id).unwrap();
    assert_eq!(ana.ranking_points, 100);
    assert_eq!(ana.annual_points, 100);
    assert_eq!(ana.season, Some(2024));
    assert_eq!(ana.tournaments_played, 1);
    assert_eq!(ana.category, Category::B);
    let average = ana.average.unwrap();
    assert!((average - 10.0 / 12.0).abs() < 1e-9);
    assert_eq!(ana.handicap(), 26);
    assert_eq!(engine.player(bea.id).unwrap().category, Category::C);

    assert!(engine.tournament(t.id).unwrap().ranked);
    let err = engine.recalculate_ranking(t.id).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyRanked(_)));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(engine.player(ana.id).unwrap().ranking_points, 100);
}

#[test]
fn only_completed_official_events_are_ranked() {
    let engine = Engine::new(config());
    let ana = engine.create_player("Ana", None).unwrap();
    let bea = engine.create_player("Bea", None).unwrap();

    let open = engine.create_tournament("Open", knockout(2024)).unwrap();
    assert!(matches!(
        engine.recalculate_ranking(open.id),
        Err(EngineError::InvalidState { .. })
    ));

    let friendly = TournamentSettings {
        official: false,
        ..knockout(2024)
    };
    let t = play_final(&engine, friendly, [&ana, &bea]);
    assert!(matches!(
        engine.recalculate_ranking(t.id),
        Err(EngineError::NotOfficial(_))
    ));
}

#[test]
fn unknown_tier_is_rejected_at_creation() {
    let engine = Engine::new(config());
    let settings = TournamentSettings {
        tier: 9,
        ..knockout(2024)
    };
    assert!(matches!(
        engine.create_tournament("Copa", settings),
        Err(EngineError::UnknownTier(9))
    ));
}

#[test]
fn new_season_resets_annual_counters() {
    let engine = Engine::new(config());
    let ana = engine.create_player("Ana", None).unwrap();
    let bea = engine.create_player("Bea", None).unwrap();

    let first = play_final(&engine, knockout(2024), [&ana, &bea]);
    engine.recalculate_ranking(first.id).unwrap();
    let second = play_final(&engine, knockout(2025), [&bea, &ana]);
    engine.recalculate_ranking(second.id).unwrap();

    let ana = engine.player(ana.id).unwrap();
    assert_eq!(ana.season, Some(2025));
    assert_eq!(ana.annual_points, 75);
    assert_eq!(ana.ranking_points, 175);
    assert_eq!(ana.annual_tournaments_played, 1);
    assert_eq!(ana.tournaments_played, 2);
}

#[test]
fn rebuild_gives_the_same_totals() {
    let engine = Engine::new(config());
    let ana = engine.create_player("Ana", None).unwrap();
    let bea = engine.create_player("Bea", None).unwrap();
    for _ in 0..2 {
        let t = play_final(&engine, knockout(2024), [&ana, &bea]);
        engine.recalculate_ranking(t.id).unwrap();
    }
    let before = engine.ranking().unwrap();

    assert_eq!(engine.rebuild_rankings().unwrap(), 2);
    let after = engine.ranking().unwrap();
    assert_eq!(before, after);
    assert_eq!(after[0].name, "Ana");
    assert_eq!(after[0].annual_points, 200);
    assert_eq!(after[1].annual_points, 150);
}

#[test]
fn walkovers_do_not_count_towards_the_average() {
    let engine = Engine::new(config());
    let ana = engine.create_player("Ana", None).unwrap();
    let bea = engine.create_player("Bea", None).unwrap();
    let t = engine.create_tournament("Copa", knockout(2024)).unwrap();
    let reg = engine
        .register(t.id, Entrant { player_id: Some(ana.id), ..Entrant::default() })
        .unwrap();
    engine
        .register(t.id, Entrant { player_id: Some(bea.id), ..Entrant::default() })
        .unwrap();
    let game = engine.build_playoffs(t.id).unwrap()[0].matches[0].clone();
    engine.walkover(game.id, reg.id).unwrap();
    engine.recalculate_ranking(t.id).unwrap();

    let ana = engine.player(ana.id).unwrap();
    assert_eq!(ana.ranking_points, 100);
    assert_eq!(ana.average, None);
}

#[test]
fn ranking_table_loads_from_csv() {
    let csv = "tier,position,points\n1,1,50\n1,2,30\n1,4,10\n";
    let table = RankingTable::from_csv_reader(csv.as_bytes()).unwrap();
    assert!(table.has_tier(1));
    assert_eq!(table.points(1, 1).unwrap(), 50);
    assert_eq!(table.points(1, 3).unwrap(), 30);
    assert_eq!(table.points(1, 17).unwrap(), 10);
    assert!(matches!(table.points(2, 1), Err(EngineError::UnknownTier(2))));

    let broken = RankingTable::from_csv_reader("tier,position,points\n1,first,50\n".as_bytes());
    assert_eq!(broken.unwrap_err().kind(), ErrorKind::Config);
}

#[test]
fn result_sheet_is_plain_json() {
    let sheet: ResultSheet =
        serde_json::from_str(r#"{"score_1": 30, "score_2": 21, "innings": 25}"#).unwrap();
    assert_eq!(sheet.high_run_1, 0);
    assert_eq!(sheet.score_2, 21);
}
