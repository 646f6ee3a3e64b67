//! League rolling statistics
//!
//! Over percentages across the five most recent finished matches of each
//! league. Used only as a gate by the strategy rules; a league without a full
//! sample has no entry at all.

#[cfg(test)]
mod tests;

use crate::types::{FinishedMatch, Score};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Matches per league the rolling window covers
pub const ROLLING_WINDOW: usize = 5;

/// Rolling over-N percentages for one league
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueRollingStats {
    pub sample_size: usize,
    pub ht_over_0_5: f64,
    pub ht_over_1_5: f64,
    pub ht_over_2_5: f64,
    pub ft_over_0_5: f64,
    pub ft_over_1_5: f64,
    pub ft_over_2_5: f64,
    pub ft_over_3_5: f64,
    pub ft_over_4_5: f64,
}

impl LeagueRollingStats {
    fn from_window(window: &[&FinishedMatch]) -> Self {
        let ht: Vec<Score> = window.iter().map(|m| m.half_time).collect();
        let ft: Vec<Score> = window.iter().map(|m| m.final_score).collect();
        let pct = |scores: &[Score], line: u32| {
            let hits = scores.iter().filter(|s| s.total() > line).count();
            hits as f64 / scores.len() as f64 * 100.0
        };
        let (ht, ft) = (ht.as_slice(), ft.as_slice());

        Self {
            sample_size: window.len(),
            ht_over_0_5: pct(ht, 0),
            ht_over_1_5: pct(ht, 1),
            ht_over_2_5: pct(ht, 2),
            ft_over_0_5: pct(ft, 0),
            ft_over_1_5: pct(ft, 1),
            ft_over_2_5: pct(ft, 2),
            ft_over_3_5: pct(ft, 3),
            ft_over_4_5: pct(ft, 4),
        }
    }
}

/// Rolling stats keyed by league display name
#[derive(Debug, Clone, Default)]
pub struct LeagueTable {
    leagues: HashMap<String, LeagueRollingStats>,
}

impl LeagueTable {
    /// Build the table from a batch of finished matches in any order.
    ///
    /// Only ended matches with a league name qualify. Undated matches sort
    /// after every dated one.
    pub fn compute(matches: &[FinishedMatch]) -> Self {
        let mut by_league: HashMap<&str, Vec<&FinishedMatch>> = HashMap::new();
        for m in matches.iter().filter(|m| m.is_ended()) {
            if let Some(league) = m.league.as_deref() {
                by_league.entry(league).or_default().push(m);
            }
        }

        let mut leagues = HashMap::new();
        for (league, mut group) in by_league {
            if group.len() < ROLLING_WINDOW {
                debug!(
                    "League {}: {} finished matches, need {}",
                    league,
                    group.len(),
                    ROLLING_WINDOW
                );
                continue;
            }
            // Option orders None first, so compare reversed for "newest first, None last"
            group.sort_by(|a, b| b.start_time.cmp(&a.start_time));
            let stats = LeagueRollingStats::from_window(&group[..ROLLING_WINDOW]);
            debug!(
                "League {}: HT O0.5={:.0}% O1.5={:.0}% | FT O1.5={:.0}% O2.5={:.0}%",
                league, stats.ht_over_0_5, stats.ht_over_1_5, stats.ft_over_1_5, stats.ft_over_2_5
            );
            leagues.insert(league.to_string(), stats);
        }

        Self { leagues }
    }

    pub fn get(&self, league: &str) -> Option<&LeagueRollingStats> {
        self.leagues.get(league)
    }

    pub fn len(&self) -> usize {
        self.leagues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leagues.is_empty()
    }
}
