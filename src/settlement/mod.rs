//! Settlement resolver
//!
//! `pending → green | red | refund`, one way only. A signal settles when its
//! match shows up in the ended feed; until then it stays pending, with no
//! timeout.


use crate::notify::Notifier;
use crate::store::SignalStore;
use crate::types::{FinishedMatch, Market, MatchId, Signal, SignalStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of `signal` against a finished match. `None` unless the match
/// has ended.
pub fn resolve(signal: &Signal, result: &FinishedMatch) -> Option<SignalStatus> {
    if !result.is_ended() {
        return None;
    }

    let status = match &signal.market {
        Market::HalfTimeOver { line } => won(f64::from(result.half_time.total()) > *line),
        Market::FullTimeLine { push } => {
            let total = result.final_score.total();
            match total.cmp(push) {
                std::cmp::Ordering::Less => SignalStatus::Red,
                std::cmp::Ordering::Equal => SignalStatus::Refund,
                std::cmp::Ordering::Greater => SignalStatus::Green,
            }
        }
        Market::PlayerOver { player, line } => {
            match player_side(player, &signal.home, &signal.away) {
                Some(Side::Home) => won(f64::from(result.final_score.home) > *line),
                Some(Side::Away) => won(f64::from(result.final_score.away) > *line),
                None => {
                    debug!(
                        "Player {} not found in {} vs {}",
                        player, signal.home, signal.away
                    );
                    SignalStatus::Red
                }
            }
        }
    };
    Some(status)
}

fn won(hit: bool) -> SignalStatus {
    if hit {
        SignalStatus::Green
    } else {
        SignalStatus::Red
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Home,
    Away,
}

/// Which side's display name contains the player, home checked first
fn player_side(player: &str, home: &str, away: &str) -> Option<Side> {
    let player = player.trim().to_lowercase();
    if player.is_empty() {
        return None;
    }
    if home.to_lowercase().contains(&player) {
        Some(Side::Home)
    } else if away.to_lowercase().contains(&player) {
        Some(Side::Away)
    } else {
        None
    }
}

/// Applies finished results to the store and marks delivered messages
pub struct Settler {
    store: Arc<SignalStore>,
    notifier: Arc<dyn Notifier>,
}

impl Settler {
    pub fn new(store: Arc<SignalStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Settle today's pending signals against `results`. Returns the
    /// signals that moved to a terminal status in this pass.
    pub async fn settle(&self, results: &[FinishedMatch]) -> Vec<Signal> {
        let ended: HashMap<&MatchId, &FinishedMatch> = results
            .iter()
            .filter(|m| m.is_ended())
            .map(|m| (&m.event_id, m))
            .collect();

        let mut settled = Vec::new();
        for pending in self.store.pending_for_day(self.store.today()) {
            let Some(result) = ended.get(&pending.key.match_id) else {
                continue;
            };
            let Some(status) = resolve(&pending, result) else {
                continue;
            };

            let updated = match self.store.transition(&pending.id, status) {
                Ok(Some(updated)) => updated,
                Ok(None) => continue,
                Err(e) => {
                    error!("Failed to settle {}: {}", pending.key, e);
                    continue;
                }
            };

            info!(
                "🏁 {} {} ({}) => {} [HT {} | FT {}]",
                updated.key, updated.strategy, updated.league, status, result.half_time, result.final_score
            );

            // Edit failures leave the transition in place
            if let Err(e) = self
                .notifier
                .edit(updated.delivery_id, &updated.settled_text())
                .await
            {
                warn!("Failed to mark message #{}: {}", updated.delivery_id, e);
            }
            settled.push(updated);
        }
        settled
    }
}
