//! Strategy rule engine
//!
//! A fixed catalogue of hand-authored rules evaluated against one match's
//! derived metrics, head-to-head record and league gate. Several rules may
//! fire for the same match in one cycle; each yields its own candidate.

mod catalogue;

use crate::h2h::HeadToHeadMetrics;
use crate::league::LeagueRollingStats;
use crate::metrics::DerivedMetrics;
use crate::types::{Market, MatchSnapshot};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Named strategies, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StrategyKind {
    /// +1.5 HT on 1-0/0-1 early in 8-minute leagues
    HtOver15Fast,
    /// +1.5 HT on 1-0/0-1 in 10/12-minute leagues
    HtOver15Slow,
    /// +0.5 HT on 0-0 in the Battle 8m league
    HtOver05Battle,
    /// +0.5 HT on 0-0 elsewhere, backed by attacking pressure
    HtOver05Pressure,
    /// 2.5/3.0 goals FT on 1-0/0-1
    FtLine30,
    /// +1.5 goals for a dominant player on 0-0
    PlayerOver15,
    /// 1.5/2.0 goals FT on 0-0
    FtLine20,
}

/// Every strategy in its fixed evaluation order
pub const CATALOGUE: [StrategyKind; 7] = [
    StrategyKind::HtOver15Fast,
    StrategyKind::HtOver15Slow,
    StrategyKind::HtOver05Battle,
    StrategyKind::HtOver05Pressure,
    StrategyKind::FtLine30,
    StrategyKind::PlayerOver15,
    StrategyKind::FtLine20,
];

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::HtOver15Fast => "ht_over_1.5_fast",
            StrategyKind::HtOver15Slow => "ht_over_1.5_slow",
            StrategyKind::HtOver05Battle => "ht_over_0.5_battle",
            StrategyKind::HtOver05Pressure => "ht_over_0.5_pressure",
            StrategyKind::FtLine30 => "ft_line_2.5_3.0",
            StrategyKind::PlayerOver15 => "player_over_1.5",
            StrategyKind::FtLine20 => "ft_line_1.5_2.0",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a rule may read about one match in one cycle
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub snapshot: &'a MatchSnapshot,
    pub metrics: &'a DerivedMetrics,
    /// `None` when head-to-head history is unavailable
    pub h2h: Option<&'a HeadToHeadMetrics>,
    /// `None` when the league has no full rolling sample
    pub league: Option<&'a LeagueRollingStats>,
}

/// A rule that fired, not yet deduplicated or delivered
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: StrategyKind,
    /// Display label, e.g. "+1.5 HT"
    pub label: String,
    pub market: Market,
}

impl Candidate {
    fn new(kind: StrategyKind, label: impl Into<String>, market: Market) -> Self {
        Self {
            kind,
            label: label.into(),
            market,
        }
    }
}

/// Evaluates the strategy catalogue against a match
#[derive(Debug, Clone)]
pub struct RuleEngine {
    strategies: Vec<StrategyKind>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self {
            strategies: CATALOGUE.to_vec(),
        }
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategies(&self) -> &[StrategyKind] {
        &self.strategies
    }

    /// All candidates for this match, in catalogue order
    pub fn evaluate(&self, ctx: &MatchContext<'_>) -> Vec<Candidate> {
        let candidates: Vec<Candidate> = self
            .strategies
            .iter()
            .flat_map(|kind| catalogue::evaluate(*kind, ctx))
            .collect();

        debug!(
            "Match {} ({} {} @ {:.2}): {} candidate(s) [h2h: {}, league gate: {}]",
            ctx.snapshot.id,
            ctx.snapshot.league,
            ctx.snapshot.score,
            ctx.metrics.elapsed.minutes,
            candidates.len(),
            if ctx.h2h.is_some() { "yes" } else { "n/a" },
            if ctx.league.is_some() { "yes" } else { "n/a" },
        );
        candidates
    }
}
