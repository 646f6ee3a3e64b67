//! Shared fixtures for unit tests

use crate::types::{FinishedMatch, Market, MatchId, Score, Signal, SignalKey, SignalStatus};
use chrono::{DateTime, Utc};

pub const BATTLE: &str = "Esoccer Battle - 8 mins play";

/// A pending signal on match `match_id` for `market`, emitted now
pub fn signal(match_id: &str, market: Market) -> Signal {
    signal_at(match_id, market, Utc::now())
}

pub fn signal_at(match_id: &str, market: Market, emitted_at: DateTime<Utc>) -> Signal {
    let key = SignalKey::new(MatchId::new(match_id), &market);
    Signal {
        id: format!("sig-{}", key),
        key,
        strategy: "test".to_string(),
        market,
        league: BATTLE.to_string(),
        home: "Arsenal (Kray)".to_string(),
        away: "Chelsea (Boulevard)".to_string(),
        emitted_at,
        delivery_id: 100,
        text: "tip".to_string(),
        status: SignalStatus::Pending,
        settled_at: None,
    }
}

pub fn with_status(mut signal: Signal, status: SignalStatus) -> Signal {
    signal.status = status;
    signal
}

/// An ended match with the given half-time and full-time scores
pub fn ended(match_id: &str, ht: (u32, u32), ft: (u32, u32)) -> FinishedMatch {
    FinishedMatch {
        event_id: MatchId::new(match_id),
        status: "ended".to_string(),
        league: Some(BATTLE.to_string()),
        final_score: Score::new(ft.0, ft.1),
        half_time: Score::new(ht.0, ht.1),
        start_time: Some(Utc::now()),
    }
}
