//! Derived match metrics
//!
//! Pure functions that turn a live snapshot into the quantities the strategy
//! rules read: elapsed time, half indicator and dangerous-attack rate.

#[cfg(test)]
mod tests;

use crate::types::MatchSnapshot;
use tracing::debug;

/// Elapsed match time in minutes
///
/// `known` is false when the snapshot carried no timer; `minutes` is then 0
/// and must not be read as kickoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elapsed {
    pub minutes: f64,
    pub known: bool,
}

impl Elapsed {
    pub fn unknown() -> Self {
        Self { minutes: 0.0, known: false }
    }

    /// Known and past kickoff
    pub fn is_running(&self) -> bool {
        self.known && self.minutes > 0.0
    }
}

/// Match-length family parsed from the league name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueFormat {
    EightMinute,
    TenMinute,
    TwelveMinute,
    Other,
}

impl LeagueFormat {
    pub fn classify(league: &str) -> Self {
        if league.contains("8 mins play") {
            LeagueFormat::EightMinute
        } else if league.contains("12 mins play") {
            LeagueFormat::TwelveMinute
        } else if league.contains("10 mins play") {
            LeagueFormat::TenMinute
        } else {
            LeagueFormat::Other
        }
    }

    /// First half lasts while elapsed is below this, if the format is known
    pub fn half_time_cutoff(&self) -> Option<f64> {
        match self {
            LeagueFormat::EightMinute => Some(4.0),
            LeagueFormat::TenMinute | LeagueFormat::TwelveMinute => Some(6.0),
            LeagueFormat::Other => None,
        }
    }
}

const BATTLE_8: &str = "Esoccer Battle - 8 mins play";
const GG_8: &str = "Esoccer H2H GG League - 8 mins play";

/// Leagues the full-time strategies are tuned for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeagueFamily {
    Battle8,
    Gg8,
    Gt12,
}

impl LeagueFamily {
    pub fn classify(league: &str) -> Option<Self> {
        if league.contains(BATTLE_8) {
            Some(LeagueFamily::Battle8)
        } else if league.contains(GG_8) {
            Some(LeagueFamily::Gg8)
        } else if league.contains("GT Leagues") && league.contains("12 mins play") {
            // Source uses an en dash in this name; match the two fragments
            Some(LeagueFamily::Gt12)
        } else {
            None
        }
    }

    /// Eight-minute families are "fast"; GT 12m plays slower
    pub fn is_fast(&self) -> bool {
        matches!(self, LeagueFamily::Battle8 | LeagueFamily::Gg8)
    }
}

/// Elapsed minutes from the snapshot timer
pub fn elapsed_minutes(snapshot: &MatchSnapshot) -> Elapsed {
    match snapshot.timer {
        Some(timer) => Elapsed {
            minutes: timer.minutes + timer.seconds / 60.0,
            known: true,
        },
        None => {
            debug!("Match {}: no timer", snapshot.id);
            Elapsed::unknown()
        }
    }
}

/// Whether the match is in its first half.
///
/// Only 8/10/12-minute leagues are recognised; anything else is never
/// first-half, so half-time strategies stay silent for unknown formats.
pub fn is_first_half(snapshot: &MatchSnapshot, league_name: &str) -> bool {
    let minutes = elapsed_minutes(snapshot).minutes;
    let first = LeagueFormat::classify(league_name)
        .half_time_cutoff()
        .map(|cutoff| minutes < cutoff)
        .unwrap_or(false);
    debug!(
        "Match {} ({}): {:.2} min, first half: {}",
        snapshot.id, league_name, minutes, first
    );
    first
}

/// Dangerous attacks per minute, both sides combined
pub fn dangerous_attack_rate(snapshot: &MatchSnapshot, elapsed: f64) -> f64 {
    if elapsed <= 0.0 {
        return 0.0;
    }
    let Some((home, away)) = snapshot.stats.and_then(|s| s.dangerous_attacks) else {
        debug!("Match {}: dangerous attacks unavailable", snapshot.id);
        return 0.0;
    };
    let attacks = u64::from(home) + u64::from(away);
    let rate = attacks as f64 / elapsed;
    debug!(
        "Match {}: DA={} over {:.2} min => {:.2}/min",
        snapshot.id, attacks, elapsed, rate
    );
    rate
}

/// Player identity from a display name such as "Arsenal (Kray)".
///
/// A parenthesised suffix is the player; otherwise the whole name is.
pub fn player_identity(display: &str) -> String {
    match display.rfind('(') {
        Some(idx) => display[idx + 1..].trim_end().trim_end_matches(')').trim().to_string(),
        None => display.trim().to_string(),
    }
}

/// Everything derived from one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub elapsed: Elapsed,
    pub first_half: bool,
    pub format: LeagueFormat,
    pub family: Option<LeagueFamily>,
    pub dangerous_attack_rate: f64,
    pub player1: String,
    pub player2: String,
}

impl DerivedMetrics {
    pub fn from_snapshot(snapshot: &MatchSnapshot) -> Self {
        let elapsed = elapsed_minutes(snapshot);
        Self {
            elapsed,
            first_half: is_first_half(snapshot, &snapshot.league),
            format: LeagueFormat::classify(&snapshot.league),
            family: LeagueFamily::classify(&snapshot.league),
            dangerous_attack_rate: dangerous_attack_rate(snapshot, elapsed.minutes),
            player1: player_identity(&snapshot.home),
            player2: player_identity(&snapshot.away),
        }
    }
}
