//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use cue_tournament_web::{
    Engine, EngineConfig, Entrant, GameMatch, GroupFormat, Registration, RegistrationId,
    ResultSheet, Tournament, TournamentFormat, TournamentSettings,
};

pub fn engine() -> Engine {
    Engine::new(EngineConfig::default())
}

pub fn settings(format: TournamentFormat, group_format: GroupFormat) -> TournamentSettings {
    TournamentSettings {
        format,
        group_format,
        season: 2024,
        ..TournamentSettings::default()
    }
}

pub fn tournament(engine: &Engine, settings: TournamentSettings) -> Tournament {
    engine.create_tournament("Open", settings).unwrap()
}

pub fn entrant(name: &str, seed: u32) -> Entrant {
    Entrant {
        display_name: name.to_string(),
        seed_rank: Some(seed),
        ..Entrant::default()
    }
}

/// Register `P1`..`Pn` seeded 1..n.
pub fn field(engine: &Engine, tournament: &Tournament, n: u32) -> Vec<Registration> {
    (1..=n)
        .map(|i| engine.register(tournament.id, entrant(&format!("P{i}"), i)).unwrap())
        .collect()
}

/// Complete `game` with `winner` ahead 10-5 over 12 innings.
pub fn beat(engine: &Engine, game: &GameMatch, winner: RegistrationId) -> GameMatch {
    let sheet = if game.player_1 == Some(winner) {
        ResultSheet { score_1: 10, score_2: 5, innings: 12, ..ResultSheet::default() }
    } else {
        ResultSheet { score_1: 5, score_2: 10, innings: 12, ..ResultSheet::default() }
    };
    engine.submit_result(game.id, sheet).unwrap()
}

/// Complete `game` with the better seed (lower admission order) winning.
pub fn favourite_wins(engine: &Engine, game: &GameMatch, field: &[Registration]) -> GameMatch {
    let rank = |id| field.iter().position(|r| Some(r.id) == id).unwrap();
    let winner = if rank(game.player_1) < rank(game.player_2) {
        game.player_1
    } else {
        game.player_2
    };
    beat(engine, game, winner.unwrap())
}

pub fn id_of(field: &[Registration], name: &str) -> RegistrationId {
    field.iter().find(|r| r.display_name == name).unwrap().id
}
