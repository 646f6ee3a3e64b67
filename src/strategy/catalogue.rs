//! Gating conditions for each strategy

use super::{Candidate, MatchContext, StrategyKind};
use crate::h2h::HeadToHeadMetrics;
use crate::league::LeagueRollingStats;
use crate::metrics::{LeagueFamily, LeagueFormat};
use crate::types::Market;
use tracing::debug;

/// H2H percentage required where a rule demands "every meeting"
const ALL_MEETINGS: f64 = 100.0;
/// Minimum league rolling percentage to open the gate
const LEAGUE_GATE: f64 = 90.0;

const PLAYER_MIN_AVG_GOALS: f64 = 2.5;
const PLAYER_MIN_WIN_PCT: f64 = 60.0;

/// Closed when the league has no full sample
fn league_gate(ctx: &MatchContext<'_>, pick: fn(&LeagueRollingStats) -> f64) -> bool {
    ctx.league.map(|l| pick(l) >= LEAGUE_GATE).unwrap_or(false)
}

/// False when head-to-head data is unavailable
fn h2h_gate(ctx: &MatchContext<'_>, check: impl Fn(&HeadToHeadMetrics) -> bool) -> bool {
    ctx.h2h.map(check).unwrap_or(false)
}

/// Minutes past which the full-time rules open for this family
fn ft_threshold(family: LeagueFamily) -> f64 {
    if family.is_fast() {
        4.0
    } else {
        6.0
    }
}

pub(super) fn evaluate(kind: StrategyKind, ctx: &MatchContext<'_>) -> Vec<Candidate> {
    let candidates: Vec<Candidate> = match kind {
        StrategyKind::HtOver15Fast => ht_over_1_5(ctx, kind, true).into_iter().collect(),
        StrategyKind::HtOver15Slow => ht_over_1_5(ctx, kind, false).into_iter().collect(),
        StrategyKind::HtOver05Battle => ht_over_0_5_battle(ctx).into_iter().collect(),
        StrategyKind::HtOver05Pressure => ht_over_0_5_pressure(ctx).into_iter().collect(),
        StrategyKind::FtLine30 => ft_line_3(ctx).into_iter().collect(),
        StrategyKind::PlayerOver15 => player_over_1_5(ctx),
        StrategyKind::FtLine20 => ft_line_2(ctx).into_iter().collect(),
    };
    if !candidates.is_empty() {
        debug!("Match {}: {} OK", ctx.snapshot.id, kind);
    }
    candidates
}

fn ht_over_1_5(ctx: &MatchContext<'_>, kind: StrategyKind, fast: bool) -> Option<Candidate> {
    let m = ctx.metrics;
    if !ctx.snapshot.score.is_single_goal() || !m.first_half || !m.elapsed.is_running() {
        return None;
    }

    let (latest, min_over_2_5) = match (fast, m.format) {
        (true, LeagueFormat::EightMinute) => (3.0, 70.0),
        (false, LeagueFormat::TenMinute | LeagueFormat::TwelveMinute) => (5.0, 85.0),
        _ => return None,
    };
    if m.elapsed.minutes > latest {
        return None;
    }

    let h2h_ok = h2h_gate(ctx, |h| {
        h.over_1_5_ht_percentage >= ALL_MEETINGS && h.over_2_5_ht_percentage >= min_over_2_5
    });
    if !h2h_ok || !league_gate(ctx, |l| l.ht_over_1_5) {
        debug!(
            "Match {}: {} rejected at {:.2} (h2h: {}, league)",
            ctx.snapshot.id, kind, m.elapsed.minutes, h2h_ok
        );
        return None;
    }

    Some(Candidate::new(kind, "+1.5 HT", Market::HalfTimeOver { line: 1.5 }))
}

fn ht_over_0_5_battle(ctx: &MatchContext<'_>) -> Option<Candidate> {
    let m = ctx.metrics;
    if !ctx.snapshot.score.is_goalless()
        || m.family != Some(LeagueFamily::Battle8)
        || !m.first_half
        || !m.elapsed.known
        || !(2.0..=3.0).contains(&m.elapsed.minutes)
    {
        return None;
    }

    let h2h_ok = h2h_gate(ctx, |h| {
        h.over_1_5_ht_percentage >= ALL_MEETINGS && h.btts_ht_percentage >= ALL_MEETINGS
    });
    if !h2h_ok || !league_gate(ctx, |l| l.ht_over_0_5) {
        return None;
    }

    Some(Candidate::new(
        StrategyKind::HtOver05Battle,
        "+0.5 HT",
        Market::HalfTimeOver { line: 0.5 },
    ))
}

fn ht_over_0_5_pressure(ctx: &MatchContext<'_>) -> Option<Candidate> {
    let m = ctx.metrics;
    if !ctx.snapshot.score.is_goalless()
        || m.family == Some(LeagueFamily::Battle8)
        || !m.first_half
        || !m.elapsed.known
        || m.elapsed.minutes <= 3.0
    {
        return None;
    }

    if m.dangerous_attack_rate < 1.0 {
        debug!(
            "Match {}: +0.5 HT pressure too low ({:.2}/min)",
            ctx.snapshot.id, m.dangerous_attack_rate
        );
        return None;
    }

    let h2h_ok = h2h_gate(ctx, |h| {
        h.over_0_5_ht_percentage >= ALL_MEETINGS && h.over_1_5_ht_percentage >= 85.0
    });
    if !h2h_ok || !league_gate(ctx, |l| l.ht_over_0_5) {
        return None;
    }

    Some(Candidate::new(
        StrategyKind::HtOver05Pressure,
        "+0.5 HT",
        Market::HalfTimeOver { line: 0.5 },
    ))
}

fn ft_line_3(ctx: &MatchContext<'_>) -> Option<Candidate> {
    let m = ctx.metrics;
    let family = m.family?;
    if !ctx.snapshot.score.is_single_goal()
        || !m.elapsed.known
        || m.elapsed.minutes <= ft_threshold(family)
    {
        return None;
    }

    let h2h_ok = h2h_gate(ctx, |h| {
        h.avg_goals_sum() >= 4.0 && h.over_1_5_ht_percentage >= ALL_MEETINGS
    });
    if !h2h_ok || !league_gate(ctx, |l| l.ft_over_2_5) {
        return None;
    }

    Some(Candidate::new(
        StrategyKind::FtLine30,
        "2.5, 3.0 Goals FT",
        Market::FullTimeLine { push: 3 },
    ))
}

fn player_over_1_5(ctx: &MatchContext<'_>) -> Vec<Candidate> {
    let m = ctx.metrics;
    let Some(family) = m.family else {
        return Vec::new();
    };
    if !ctx.snapshot.score.is_goalless()
        || !m.elapsed.known
        || m.elapsed.minutes <= ft_threshold(family)
    {
        return Vec::new();
    }
    let Some(h2h) = ctx.h2h.filter(|h| h.over_0_5_ht_percentage >= ALL_MEETINGS) else {
        return Vec::new();
    };

    [
        (&m.player1, h2h.player1_avg_goals, h2h.player1_win_percentage),
        (&m.player2, h2h.player2_avg_goals, h2h.player2_win_percentage),
    ]
    .into_iter()
    .filter(|(_, avg, win)| *avg >= PLAYER_MIN_AVG_GOALS && *win >= PLAYER_MIN_WIN_PCT)
    .map(|(player, _, _)| {
        Candidate::new(
            StrategyKind::PlayerOver15,
            format!("+1.5 Goals {}", player),
            Market::PlayerOver {
                player: player.clone(),
                line: 1.5,
            },
        )
    })
    .collect()
}

fn ft_line_2(ctx: &MatchContext<'_>) -> Option<Candidate> {
    let m = ctx.metrics;
    if !ctx.snapshot.score.is_goalless()
        || m.family.is_none()
        || !m.elapsed.known
        || m.elapsed.minutes <= 4.0
    {
        return None;
    }

    let h2h_ok = h2h_gate(ctx, |h| {
        h.avg_goals_sum() >= 3.0 && h.over_1_5_ht_percentage >= ALL_MEETINGS
    });
    if !h2h_ok || !league_gate(ctx, |l| l.ft_over_1_5) {
        return None;
    }

    Some(Candidate::new(
        StrategyKind::FtLine20,
        "1.5, 2.0 Goals FT",
        Market::FullTimeLine { push: 2 },
    ))
}
