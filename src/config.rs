//! Engine configuration: standings rules, ranking table and category thresholds.

use crate::error::{EngineError, EngineResult};
use crate::models::Category;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Ordering keys applied after match points, in the given order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreaker {
    /// Sum of own score minus opponent score.
    Differential,
    /// Total score made.
    ScoreFor,
    /// Winner of the direct match between exactly two tied players.
    HeadToHead,
    /// Better seed rank first.
    SeedRank,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandingsRules {
    pub win_points: u32,
    pub draw_points: u32,
    pub loss_points: u32,
    pub tie_breakers: Vec<TieBreaker>,
}

impl Default for StandingsRules {
    fn default() -> Self {
        Self {
            win_points: 3,
            draw_points: 0,
            loss_points: 0,
            tie_breakers: vec![TieBreaker::Differential, TieBreaker::SeedRank],
        }
    }
}

/// One row of the placement table: players placed at `position` or worse (until the next
/// row) earn `points`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlacementPoints {
    pub tier: u8,
    pub position: u32,
    pub points: u32,
}

/// Placement -> points per tournament tier.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RankingTable {
    tiers: BTreeMap<u8, BTreeMap<u32, u32>>,
}

impl RankingTable {
    pub fn from_rows(rows: impl IntoIterator<Item = PlacementPoints>) -> Self {
        let mut tiers: BTreeMap<u8, BTreeMap<u32, u32>> = BTreeMap::new();
        for row in rows {
            tiers.entry(row.tier).or_default().insert(row.position, row.points);
        }
        Self { tiers }
    }

    /// Parse `tier,position,points` records (with header).
    pub fn from_csv_reader<R: Read>(reader: R) -> EngineResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let rows = rdr
            .deserialize::<PlacementPoints>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(rows))
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn has_tier(&self, tier: u8) -> bool {
        self.tiers.contains_key(&tier)
    }

    /// Points for a final position; 0 below the last configured position.
    pub fn points(&self, tier: u8, position: u32) -> EngineResult<u32> {
        let table = self.tiers.get(&tier).ok_or(EngineError::UnknownTier(tier))?;
        Ok(table
            .range(..=position)
            .next_back()
            .map(|(_, points)| *points)
            .unwrap_or(0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankingConfig {
    pub table: RankingTable,
    /// Lifetime points needed for category A.
    pub category_a: u32,
    /// Lifetime points needed for category B.
    pub category_b: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        let base: [(u32, u32); 7] = [(1, 100), (2, 75), (3, 55), (5, 35), (9, 20), (17, 10), (33, 5)];
        let rows = (1u8..=3).flat_map(|tier| {
            base.iter().map(move |&(position, points)| PlacementPoints {
                tier,
                position,
                points: points * u32::from(4 - tier) / 3,
            })
        });
        Self {
            table: RankingTable::from_rows(rows),
            category_a: 300,
            category_b: 100,
        }
    }
}

impl RankingConfig {
    pub fn category(&self, points: u32) -> Category {
        if points >= self.category_a {
            Category::A
        } else if points >= self.category_b {
            Category::B
        } else {
            Category::C
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub standings: StandingsRules,
    pub ranking: RankingConfig,
    /// Season the annual counters track.
    pub season: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            standings: StandingsRules::default(),
            ranking: RankingConfig::default(),
            season: Utc::now().year(),
        }
    }

    /// Defaults overridden by `RANKING_TABLE` (CSV path) and `RANKING_SEASON`.
    pub fn from_env() -> EngineResult<Self> {
        let mut config = Self::new();
        if let Ok(path) = std::env::var("RANKING_TABLE") {
            config.ranking.table = RankingTable::from_csv_path(&path)?;
            log::info!("Loaded ranking table from {}", path);
        }
        if let Ok(season) = std::env::var("RANKING_SEASON") {
            match season.parse() {
                Ok(season) => config.season = season,
                Err(_) => log::warn!("Ignoring unparsable RANKING_SEASON={}", season),
            }
        }
        Ok(config)
    }
}
