//! Head-to-head aggregation
//!
//! Turns the raw history of prior meetings between two players into the
//! percentages and averages the strategy rules gate on. Upstream history
//! records are not schema-stable across API versions, so the full-time score
//! is located through an ordered chain of extractors.

#[cfg(test)]
mod tests;

use crate::utils::{count, json_i64, json_str};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Raw (home, away) goals as found by an extractor; a side may be missing
type RawGoals = (Option<i64>, Option<i64>);

/// A final-score extractor. Returns `Some` when it found a non-null home value.
type Extractor = fn(&Value) -> Option<RawGoals>;

/// Final-score extractors in precedence order. Order matters: some sources
/// populate several of these fields with different meanings.
const FINAL_SCORE_EXTRACTORS: &[(&str, Extractor)] = &[
    ("final_score_fields", |m| flat_pair(m, "final_score_home", "final_score_away")),
    ("score_fields", |m| flat_pair(m, "score_home", "score_away")),
    ("home_away_score_fields", |m| flat_pair(m, "home_score", "away_score")),
    ("nested_score_object", nested_score_object),
    ("nested_result_object", nested_result_object),
    ("ft_score_fields", |m| flat_pair(m, "ft_score_home", "ft_score_away")),
    ("goals_fields", |m| flat_pair(m, "home_goals", "away_goals")),
    ("score_string", score_string),
];

fn non_null<'a>(m: &'a Value, key: &str) -> Option<&'a Value> {
    m.get(key).filter(|v| !v.is_null())
}

fn flat_pair(m: &Value, home: &str, away: &str) -> Option<RawGoals> {
    let h = non_null(m, home)?;
    Some((json_i64(h), non_null(m, away).and_then(json_i64)))
}

fn nested_score_object(m: &Value) -> Option<RawGoals> {
    let obj = m
        .get("score")
        .filter(|s| s.is_object())
        .or_else(|| m.get("final_score").filter(|s| s.is_object()))?;
    flat_pair(obj, "home", "away")
}

fn nested_result_object(m: &Value) -> Option<RawGoals> {
    let obj = m.get("result").filter(|r| r.is_object())?;
    let home = non_null(obj, "home").or_else(|| non_null(obj, "home_score"))?;
    let away = non_null(obj, "away").or_else(|| non_null(obj, "away_score"));
    Some((json_i64(home), away.and_then(json_i64)))
}

fn score_string(m: &Value) -> Option<RawGoals> {
    let s = json_str(m, "score")?;
    let (home, away) = s.split_once('-')?;
    if away.contains('-') {
        return None;
    }
    let home = home.trim().parse::<i64>().ok()?;
    let away = away.trim().parse::<i64>().ok()?;
    Some((Some(home), Some(away)))
}

/// Full-time goals of one historical meeting. Falls through the extractor
/// chain and defaults to 0-0 when nothing matches.
pub fn final_goals(record: &Value) -> (u32, u32) {
    for (name, extract) in FINAL_SCORE_EXTRACTORS {
        if let Some((home, away)) = extract(record) {
            debug!("Final score via {}", name);
            let clamp = |g: Option<i64>| g.and_then(count).unwrap_or(0);
            return (clamp(home), clamp(away));
        }
    }
    (0, 0)
}

/// Half-time goals of one historical meeting; missing reads as zero
pub fn half_time_goals(record: &Value) -> (u32, u32) {
    let read = |key: &str| {
        non_null(record, key)
            .and_then(json_i64)
            .and_then(count)
            .unwrap_or(0)
    };
    (read("halftime_score_home"), read("halftime_score_away"))
}

/// Aggregated head-to-head record, from player 1's (home) perspective
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadMetrics {
    pub sample_size: usize,
    pub player1_win_percentage: f64,
    pub player2_win_percentage: f64,
    pub player1_avg_goals: f64,
    pub player2_avg_goals: f64,
    pub over_0_5_ht_percentage: f64,
    pub over_1_5_ht_percentage: f64,
    pub over_2_5_ht_percentage: f64,
    pub btts_ht_percentage: f64,
}

impl HeadToHeadMetrics {
    pub fn avg_goals_sum(&self) -> f64 {
        self.player1_avg_goals + self.player2_avg_goals
    }
}

#[derive(Default)]
struct Tally {
    player1_wins: u32,
    player2_wins: u32,
    player1_goals: u64,
    player2_goals: u64,
    over_0_5_ht: u32,
    over_1_5_ht: u32,
    over_2_5_ht: u32,
    btts_ht: u32,
}

impl Tally {
    fn add(&mut self, record: &Value) {
        let (ht_home, ht_away) = half_time_goals(record);
        let ht_total = ht_home.saturating_add(ht_away);
        if ht_total > 0 {
            self.over_0_5_ht += 1;
        }
        if ht_total > 1 {
            self.over_1_5_ht += 1;
        }
        if ht_total > 2 {
            self.over_2_5_ht += 1;
        }
        if ht_home > 0 && ht_away > 0 {
            self.btts_ht += 1;
        }

        let (ft_home, ft_away) = final_goals(record);
        if ft_home > ft_away {
            self.player1_wins += 1;
        } else if ft_away > ft_home {
            self.player2_wins += 1;
        }
        self.player1_goals += u64::from(ft_home);
        self.player2_goals += u64::from(ft_away);
    }
}

/// Aggregate a list of historical meetings. `None` for an empty list.
pub fn aggregate(records: &[Value]) -> Option<HeadToHeadMetrics> {
    if records.is_empty() {
        return None;
    }

    let mut tally = Tally::default();
    for record in records {
        tally.add(record);
    }

    let n = records.len() as f64;
    let pct = |hits: u32| f64::from(hits) / n * 100.0;

    Some(HeadToHeadMetrics {
        sample_size: records.len(),
        player1_win_percentage: pct(tally.player1_wins),
        player2_win_percentage: pct(tally.player2_wins),
        player1_avg_goals: tally.player1_goals as f64 / n,
        player2_avg_goals: tally.player2_goals as f64 / n,
        over_0_5_ht_percentage: pct(tally.over_0_5_ht),
        over_1_5_ht_percentage: pct(tally.over_1_5_ht),
        over_2_5_ht_percentage: pct(tally.over_2_5_ht),
        btts_ht_percentage: pct(tally.btts_ht),
    })
}

/// Aggregate a raw head-to-head response body.
///
/// The body must carry a `matches` array; anything else, or an empty array,
/// is unavailable and callers must not evaluate H2H-gated rules.
pub fn from_response(body: &Value) -> Option<HeadToHeadMetrics> {
    let Some(matches) = body.get("matches").and_then(Value::as_array) else {
        debug!("H2H response missing matches collection");
        return None;
    };
    let metrics = aggregate(matches);
    match &metrics {
        Some(m) => debug!(
            "H2H over {} games | Win1={:.1}% Win2={:.1}% AvgG1={:.2} AvgG2={:.2} | O0.5={:.1} O1.5={:.1} O2.5={:.1} BTTS={:.1}",
            m.sample_size,
            m.player1_win_percentage,
            m.player2_win_percentage,
            m.player1_avg_goals,
            m.player2_avg_goals,
            m.over_0_5_ht_percentage,
            m.over_1_5_ht_percentage,
            m.over_2_5_ht_percentage,
            m.btts_ht_percentage,
        ),
        None => debug!("H2H history empty"),
    }
    metrics
}
