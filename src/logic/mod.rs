//! Tournament business logic: registration, groups, GSL advancement, standings, playoffs,
//! result entry and ranking.

mod finals;
mod group_play;
mod gsl;
mod ranking;
mod registration;
mod results;
mod standings;

pub use finals::{
    advance_bracket, bracket, bracket_order, build_playoffs, complete_tournament,
    regenerate_playoffs, round_label, BracketRound,
};
pub use group_play::{build_groups, round_robin_pairings, snake_seed, GROUP_PHASE_NAME};
pub use gsl::{advance_gsl_group, gsl_final_order};
pub use ranking::{
    annual_ranking, handicap, placements, rebuild_rankings, recalculate_ranking, Placement,
    RankingUpdate,
};
pub use registration::{disqualify, reconcile, register, withdraw};
pub use results::{apply_delta, award_match, start_match, submit_result, ResultSheet, ScoreDelta};
pub use standings::{
    compute_standings, final_group_order, group_standings, phase_qualifiers, phase_standings,
    select_qualifiers, GroupTable, Qualifier, StandingRow,
};
