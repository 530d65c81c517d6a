//! HTTP front for the tournament engine. JSON in, JSON out.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Ranking configuration comes from RANKING_TABLE (CSV path) and RANKING_SEASON.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use cue_tournament_web::{
    Engine, EngineConfig, EngineError, EngineResult, Entrant, ErrorKind, RegistrationId,
    ResultSheet, ScoreDelta, TournamentSettings, WinReason,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

type AppState = Data<Engine>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreatePlayerBody {
    name: String,
    #[serde(default)]
    club: Option<String>,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default)]
    settings: TournamentSettings,
}

#[derive(Deserialize)]
struct AwardBody {
    winner: RegistrationId,
    reason: WinReason,
}

#[derive(Deserialize, Default)]
struct StartBody {
    #[serde(default)]
    table: Option<u32>,
}

#[derive(Deserialize)]
struct IdPath {
    id: Uuid,
}

fn status_for(kind: ErrorKind) -> actix_web::http::StatusCode {
    use actix_web::http::StatusCode;
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Precondition => StatusCode::CONFLICT,
        ErrorKind::Consistency => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: EngineError) -> HttpResponse {
    let status = status_for(e.kind());
    if status.is_server_error() {
        log::error!("{}", e);
    } else {
        log::debug!("Rejected request: {}", e);
    }
    HttpResponse::build(status).json(serde_json::json!({ "error": e.to_string(), "kind": e.kind() }))
}

fn respond<T: Serialize>(result: EngineResult<T>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "cue-tournament-web",
    })
}

// --- players and ranking ---

#[post("/api/players")]
async fn api_create_player(engine: AppState, body: Json<CreatePlayerBody>) -> HttpResponse {
    let body = body.into_inner();
    respond(engine.create_player(&body.name, body.club))
}

#[get("/api/players/{id}")]
async fn api_get_player(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.player(path.id))
}

/// Annual ranking of the configured season.
#[get("/api/ranking")]
async fn api_ranking(engine: AppState) -> HttpResponse {
    respond(engine.ranking())
}

#[post("/api/ranking/rebuild")]
async fn api_rebuild_ranking(engine: AppState) -> HttpResponse {
    respond(engine.rebuild_rankings().map(|applied| serde_json::json!({ "tournaments": applied })))
}

// --- tournaments and registration ---

#[post("/api/tournaments")]
async fn api_create_tournament(engine: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    respond(engine.create_tournament(&body.name, body.settings))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.tournament(path.id))
}

#[get("/api/tournaments/{id}/registrations")]
async fn api_registrations(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.registrations(path.id))
}

#[post("/api/tournaments/{id}/registrations")]
async fn api_register(engine: AppState, path: Path<IdPath>, body: Json<Entrant>) -> HttpResponse {
    respond(engine.register(path.id, body.into_inner()))
}

/// Withdraw; answers with whoever moved up from the waitlist.
#[delete("/api/registrations/{id}")]
async fn api_withdraw(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.withdraw(path.id))
}

#[post("/api/registrations/{id}/disqualify")]
async fn api_disqualify(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.disqualify(path.id))
}

#[post("/api/tournaments/{id}/reconcile")]
async fn api_reconcile(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.reconcile(path.id))
}

#[get("/api/tournaments/{id}/phases")]
async fn api_phases(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.phases(path.id))
}

#[get("/api/phases/{id}")]
async fn api_get_phase(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.phase(path.id))
}

// --- group stage ---

#[post("/api/tournaments/{id}/groups")]
async fn api_build_groups(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.build_groups(path.id))
}

#[get("/api/tournaments/{id}/groups")]
async fn api_groups(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.groups(path.id))
}

#[get("/api/groups/{id}/matches")]
async fn api_group_matches(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.group_matches(path.id))
}

#[get("/api/groups/{id}/standings")]
async fn api_group_standings(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.standings(path.id))
}

#[get("/api/phases/{id}/standings")]
async fn api_phase_standings(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.phase_standings(path.id))
}

#[get("/api/groups/{id}/qualifiers")]
async fn api_group_qualifiers(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.qualifiers(path.id))
}

#[post("/api/groups/{id}/advance")]
async fn api_advance_group(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.advance_group(path.id))
}

// --- matches ---

#[get("/api/tournaments/{id}/matches")]
async fn api_matches(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.matches(path.id))
}

#[get("/api/matches/{id}")]
async fn api_get_match(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.game(path.id))
}

#[post("/api/matches/{id}/start")]
async fn api_start_match(engine: AppState, path: Path<IdPath>, body: Option<Json<StartBody>>) -> HttpResponse {
    let table = body.map(|b| b.into_inner()).unwrap_or_default().table;
    respond(engine.start_match(path.id, table))
}

/// Live scoring increment.
#[post("/api/matches/{id}/score")]
async fn api_score(engine: AppState, path: Path<IdPath>, body: Json<ScoreDelta>) -> HttpResponse {
    respond(engine.apply_delta(path.id, body.into_inner()))
}

/// Full result entry or correction.
#[put("/api/matches/{id}/result")]
async fn api_result(engine: AppState, path: Path<IdPath>, body: Json<ResultSheet>) -> HttpResponse {
    respond(engine.submit_result(path.id, body.into_inner()))
}

#[post("/api/matches/{id}/award")]
async fn api_award(engine: AppState, path: Path<IdPath>, body: Json<AwardBody>) -> HttpResponse {
    respond(engine.award_match(path.id, body.winner, body.reason))
}

// --- playoffs and results ---

#[post("/api/tournaments/{id}/playoffs")]
async fn api_build_playoffs(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.build_playoffs(path.id))
}

#[post("/api/tournaments/{id}/playoffs/regenerate")]
async fn api_regenerate_playoffs(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.regenerate_playoffs(path.id))
}

#[get("/api/tournaments/{id}/bracket")]
async fn api_bracket(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.bracket(path.id))
}

#[get("/api/tournaments/{id}/placements")]
async fn api_placements(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.placements(path.id))
}

#[post("/api/tournaments/{id}/ranking")]
async fn api_recalculate_ranking(engine: AppState, path: Path<IdPath>) -> HttpResponse {
    respond(engine.recalculate_ranking(path.id))
}

/// Avoid 404 in browser tab.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);

    let config = EngineConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    log::info!("Ranking season {}", config.season);
    let engine = Data::new(Engine::new(config));

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .service(api_health)
            .service(favicon)
            .service(api_create_player)
            .service(api_get_player)
            .service(api_ranking)
            .service(api_rebuild_ranking)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_registrations)
            .service(api_register)
            .service(api_withdraw)
            .service(api_disqualify)
            .service(api_reconcile)
            .service(api_phases)
            .service(api_get_phase)
            .service(api_build_groups)
            .service(api_groups)
            .service(api_group_matches)
            .service(api_group_standings)
            .service(api_phase_standings)
            .service(api_group_qualifiers)
            .service(api_advance_group)
            .service(api_matches)
            .service(api_get_match)
            .service(api_start_match)
            .service(api_score)
            .service(api_result)
            .service(api_award)
            .service(api_build_playoffs)
            .service(api_regenerate_playoffs)
            .service(api_bracket)
            .service(api_placements)
            .service(api_recalculate_ranking)
    })
    .bind(bind)?
    .run()
    .await
}
