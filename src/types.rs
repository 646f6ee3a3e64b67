//! Core types shared across the signal pipeline

use crate::utils::{count, goals, json_f64, json_i64, json_id, json_str, nested_str};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque handle returned by the notification channel
pub type DeliveryId = i64;

/// Stable match identifier, normalised to a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Goal pair (home, away)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    /// Total goals, saturating on absurd upstream values
    pub fn total(&self) -> u32 {
        self.home.saturating_add(self.away)
    }

    /// Exactly one goal on the board, 1-0 or 0-1
    pub fn is_single_goal(&self) -> bool {
        (self.home == 1 && self.away == 0) || (self.home == 0 && self.away == 1)
    }

    pub fn is_goalless(&self) -> bool {
        self.total() == 0
    }

    /// Parse an "H-A" score string
    pub fn parse(s: &str) -> Option<Self> {
        let (home, away) = s.split_once('-')?;
        Some(Self {
            home: home.trim().parse().ok()?,
            away: away.trim().parse().ok()?,
        })
    }

    /// Read `{home, away}` from an object; absent sides read as zero
    pub fn from_object(value: &Value) -> Self {
        Self {
            home: goals(value, "home"),
            away: goals(value, "away"),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Match clock as reported by the live feed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    pub minutes: f64,
    pub seconds: f64,
}

/// In-play statistics block
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LiveStats {
    /// Home and away dangerous-attack counters; `None` when malformed
    pub dangerous_attacks: Option<(u32, u32)>,
}

/// One poll's view of an in-progress match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSnapshot {
    pub id: MatchId,
    pub league: String,
    pub home: String,
    pub away: String,
    pub score: Score,
    pub timer: Option<Timer>,
    pub stats: Option<LiveStats>,
}

impl MatchSnapshot {
    /// Build a snapshot from a raw live-feed record.
    ///
    /// Requires `id`, `league.name`, `home.name` and `away.name`; everything
    /// else degrades to a default.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value.get("id").and_then(json_id)?;
        let league = nested_str(value, "league", "name")?.to_string();
        let home = nested_str(value, "home", "name")?.to_string();
        let away = nested_str(value, "away", "name")?.to_string();

        let score = json_str(value, "ss").and_then(Score::parse).unwrap_or_default();

        let timer = value
            .get("timer")
            .and_then(Value::as_object)
            .filter(|t| !t.is_empty())
            .map(|t| Timer {
                minutes: t.get("tm").and_then(json_f64).unwrap_or(0.0),
                seconds: t.get("ts").and_then(json_f64).unwrap_or(0.0),
            });

        let stats = value.get("stats").filter(|s| s.is_object()).map(|s| {
            let dangerous_attacks = s
                .get("dangerous_attacks")
                .and_then(Value::as_array)
                .and_then(|da| {
                    let home = da.first().and_then(json_i64).and_then(count)?;
                    let away = da.get(1).and_then(json_i64).and_then(count)?;
                    Some((home, away))
                });
            LiveStats { dangerous_attacks }
        });

        Some(Self {
            id: MatchId(id),
            league,
            home,
            away,
            score,
            timer,
            stats,
        })
    }

    /// Clock rendered as "m:ss", "0:00" when unknown
    pub fn clock(&self) -> String {
        match self.timer {
            Some(t) => format!("{}:{:02}", t.minutes as i64, t.seconds as i64),
            None => "0:00".to_string(),
        }
    }
}

/// A record from the ended-matches feed
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedMatch {
    pub event_id: MatchId,
    pub status: String,
    pub league: Option<String>,
    pub final_score: Score,
    pub half_time: Score,
    pub start_time: Option<DateTime<Utc>>,
}

impl FinishedMatch {
    /// Build from a raw ended-feed record. Only `eventID` is required.
    pub fn from_value(value: &Value) -> Option<Self> {
        let event_id = value.get("eventID").and_then(json_id)?;
        let status = json_str(value, "status").unwrap_or_default().to_string();

        let final_score = value
            .get("score")
            .filter(|s| s.is_object())
            .or_else(|| value.get("scoreFT").filter(|s| s.is_object()))
            .map(Score::from_object)
            .unwrap_or_default();
        let half_time = value
            .get("scoreHT")
            .map(Score::from_object)
            .unwrap_or_default();

        let league = nested_str(value, "competition", "name")
            .or_else(|| nested_str(value, "league", "name"))
            .or_else(|| json_str(value, "leagueName"))
            .or_else(|| nested_str(value, "tournament", "name"))
            .map(str::to_string);

        let start_time = json_str(value, "startTime").and_then(parse_timestamp);

        Some(Self {
            event_id: MatchId(event_id),
            status,
            league,
            final_score,
            half_time,
            start_time,
        })
    }

    pub fn is_ended(&self) -> bool {
        self.status.eq_ignore_ascii_case("ended")
    }
}

/// RFC 3339, or a naive ISO timestamp taken as UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = s.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|n| n.and_utc())
}

/// The bet a signal recommends, which also decides how it settles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Market {
    /// Half-time total goals over `line`
    HalfTimeOver { line: f64 },
    /// Full-time goals line that pushes on exactly `push` goals
    FullTimeLine { push: u32 },
    /// A named player's full-time goals over `line`
    PlayerOver { player: String, line: f64 },
}

impl Market {
    /// Stable key used for deduplication
    pub fn key(&self) -> String {
        match self {
            Market::HalfTimeOver { line } => format!("ht_over_{:.1}", line),
            Market::FullTimeLine { push } => format!("ft_line_{}", push),
            Market::PlayerOver { player, line } => {
                format!("player_over_{:.1}:{}", line, player.to_lowercase())
            }
        }
    }
}

/// Deduplication key: one emission per (match, market)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalKey {
    pub match_id: MatchId,
    pub market: String,
}

impl SignalKey {
    pub fn new(match_id: MatchId, market: &Market) -> Self {
        Self {
            match_id,
            market: market.key(),
        }
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.match_id, self.market)
    }
}

/// Settlement state; moves forward only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    Pending,
    Green,
    Red,
    Refund,
}

impl SignalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SignalStatus::Pending)
    }

    /// Marker appended to the delivered message once settled
    pub fn marker(&self) -> &'static str {
        match self {
            SignalStatus::Pending => "",
            SignalStatus::Green => "✅✅✅✅✅",
            SignalStatus::Red => "❌❌❌❌❌",
            SignalStatus::Refund => "↩️↩️↩️↩️↩️",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Pending => write!(f, "PENDING"),
            SignalStatus::Green => write!(f, "GREEN"),
            SignalStatus::Red => write!(f, "RED"),
            SignalStatus::Refund => write!(f, "REFUND"),
        }
    }
}

/// An emitted tip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub key: SignalKey,
    /// Display label of the strategy that fired
    pub strategy: String,
    pub market: Market,
    pub league: String,
    /// Home/away display names at emission time
    pub home: String,
    pub away: String,
    pub emitted_at: DateTime<Utc>,
    pub delivery_id: DeliveryId,
    /// Delivered text, kept so the outcome can be appended later
    pub text: String,
    pub status: SignalStatus,
    #[serde(default)]
    pub settled_at: Option<DateTime<Utc>>,
}

impl Signal {
    /// Text with the outcome marker appended
    pub fn settled_text(&self) -> String {
        format!("{}{}", self.text, self.status.marker())
    }
}
