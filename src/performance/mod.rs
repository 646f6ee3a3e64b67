//! Performance aggregation
//!
//! Rolls settled signals into the daily green/red tally, a per-league
//! breakdown for diagnostics, and a summary message that is only re-sent
//! when its text changes.


use crate::error::Result;
use crate::notify::{escape_html, Notifier};
use crate::types::{DeliveryId, Signal, SignalStatus};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub green: usize,
    pub red: usize,
    pub refund: usize,
    pub pending: usize,
    /// Percentage of green over green + red, 2 dp. Refunds are excluded.
    pub green_rate: Option<Decimal>,
}

impl PerformanceSummary {
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut summary = Self::default();
        for signal in signals {
            match signal.status {
                SignalStatus::Green => summary.green += 1,
                SignalStatus::Red => summary.red += 1,
                SignalStatus::Refund => summary.refund += 1,
                SignalStatus::Pending => summary.pending += 1,
            }
        }
        summary.green_rate = green_rate(summary.green, summary.red);
        summary
    }

    pub fn settled(&self) -> usize {
        self.green + self.red + self.refund
    }

    /// Summary message, or `None` while nothing has settled green or red
    pub fn render(&self, title: &str) -> Option<String> {
        let rate = self.green_rate?;
        Some(format!(
            "\n\n<b>👑 {}</b>\n\n<b>✅ Green [{}] x [{}] Red ❌</b>\n↩️ Refund [{}]\n\n📊 <i>Performance: {:.2}%</i>\n\n",
            escape_html(title),
            self.green,
            self.red,
            self.refund,
            rate
        ))
    }
}

fn green_rate(green: usize, red: usize) -> Option<Decimal> {
    let decided = green + red;
    if decided == 0 {
        return None;
    }
    let rate = Decimal::from(green) * Decimal::ONE_HUNDRED / Decimal::from(decided);
    Some(rate.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Tally for one league
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueBreakdown {
    pub league: String,
    pub summary: PerformanceSummary,
}

/// Per-league tallies, ordered by league name
pub fn league_breakdown(signals: &[Signal]) -> Vec<LeagueBreakdown> {
    let mut by_league: BTreeMap<&str, Vec<Signal>> = BTreeMap::new();
    for signal in signals {
        by_league.entry(signal.league.as_str()).or_default().push(signal.clone());
    }
    by_league
        .into_iter()
        .map(|(league, group)| LeagueBreakdown {
            league: league.to_string(),
            summary: PerformanceSummary::from_signals(&group),
        })
        .collect()
}

pub fn log_breakdown(breakdown: &[LeagueBreakdown]) {
    for entry in breakdown {
        let s = &entry.summary;
        info!(
            "📊 {}: {} green / {} red / {} refund / {} pending ({})",
            entry.league,
            s.green,
            s.red,
            s.refund,
            s.pending,
            s.green_rate
                .map(|r| format!("{:.2}%", r))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }
}

/// Suppresses re-delivery of an unchanged summary
#[derive(Debug, Default)]
pub struct SummaryGate {
    last_text: Option<String>,
    last_delivery: Option<DeliveryId>,
    replace_previous: bool,
}

impl SummaryGate {
    pub fn new(replace_previous: bool) -> Self {
        Self {
            replace_previous,
            ..Self::default()
        }
    }

    pub fn is_new(&self, text: &str) -> bool {
        self.last_text.as_deref() != Some(text)
    }

    /// Deliver `text` unless it matches the last delivered summary.
    ///
    /// Returns whether a message was sent. The remembered text only changes
    /// on successful delivery, so a failed send is retried next cycle.
    pub async fn publish(&mut self, notifier: &dyn Notifier, text: &str) -> Result<bool> {
        if !self.is_new(text) {
            debug!("Summary unchanged, not re-sent");
            return Ok(false);
        }

        let id = notifier.deliver(text).await?;
        let previous = self.last_delivery.replace(id);
        self.last_text = Some(text.to_string());
        info!("📈 Summary delivered (#{})", id);

        if self.replace_previous {
            if let Some(old) = previous {
                if let Err(e) = notifier.delete(old).await {
                    warn!("Failed to delete previous summary #{}: {}", old, e);
                }
            }
        }
        Ok(true)
    }
}
