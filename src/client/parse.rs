//! Lenient batch parsing of feed bodies

use crate::types::{FinishedMatch, MatchSnapshot};
use crate::utils::{json_id, json_str};
use chrono::{FixedOffset, NaiveDate};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// bet365 event id keyed by lower-cased (home player, away player)
pub type LinkMap = HashMap<(String, String), String>;

fn records<'a>(body: &'a Value, key: &str) -> &'a [Value] {
    body.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Live feed body `{data: [...]}`
pub fn parse_live(body: &Value) -> Vec<MatchSnapshot> {
    let raw = records(body, "data");
    let matches: Vec<MatchSnapshot> = raw.iter().filter_map(MatchSnapshot::from_value).collect();
    if matches.len() < raw.len() {
        debug!("Skipped {} malformed live records", raw.len() - matches.len());
    }
    matches
}

/// Links feed body `{data: [{player_home_name, player_away_name, bet365_ev_id}]}`
pub fn parse_links(body: &Value) -> LinkMap {
    records(body, "data")
        .iter()
        .filter_map(|m| {
            let home = json_str(m, "player_home_name")?.to_lowercase();
            let away = json_str(m, "player_away_name")?.to_lowercase();
            let event = m.get("bet365_ev_id").and_then(json_id)?;
            Some(((home, away), event))
        })
        .collect()
}

/// Ended feed body `{items: [...]}`, keeping matches that started on the
/// reporting day `today` (in `offset`) or later. Undated records are kept.
pub fn parse_ended(body: &Value, today: NaiveDate, offset: FixedOffset) -> Vec<FinishedMatch> {
    let raw = records(body, "items");
    let mut skipped = 0;
    let matches = raw
        .iter()
        .filter_map(|record| {
            let parsed = FinishedMatch::from_value(record);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .filter(|m| {
            m.start_time
                .map(|t| t.with_timezone(&offset).date_naive() >= today)
                .unwrap_or(true)
        })
        .collect();
    if skipped > 0 {
        debug!("Skipped {} malformed ended records", skipped);
    }
    matches
}
