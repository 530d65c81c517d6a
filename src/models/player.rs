//! Player (global identity) and ranking category.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (shared by every tournament they enter).
pub type PlayerId = Uuid;

/// Ranking category derived from accumulated points.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Category {
    A,
    B,
    #[default]
    C,
}

/// A player across tournaments. Only the ranking aggregator mutates the ranking fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub club: Option<String>,
    /// Points per inning over every ranked match; None until the first ranked match.
    pub average: Option<f64>,
    pub ranking_points: u32,
    pub annual_points: u32,
    /// Season the annual counters belong to.
    pub season: Option<i32>,
    pub category: Category,
    pub tournaments_played: u32,
    pub annual_tournaments_played: u32,
    /// Running totals behind `average`.
    pub career_points: u64,
    pub career_innings: u64,
}

impl Player {
    /// Create a player with no ranking history.
    pub fn new(name: impl Into<String>, club: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            club,
            average: None,
            ranking_points: 0,
            annual_points: 0,
            season: None,
            category: Category::C,
            tournaments_played: 0,
            annual_tournaments_played: 0,
            career_points: 0,
            career_innings: 0,
        }
    }

    /// Points target adjustment derived from the rolling average.
    pub fn handicap(&self) -> u32 {
        crate::logic::handicap(self.average)
    }

    /// Drop every ranking counter (used before a full rebuild).
    pub fn reset_ranking(&mut self) {
        self.average = None;
        self.ranking_points = 0;
        self.annual_points = 0;
        self.season = None;
        self.category = Category::C;
        self.tournaments_played = 0;
        self.annual_tournaments_played = 0;
        self.career_points = 0;
        self.career_innings = 0;
    }
}
