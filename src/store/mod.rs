//! Signal deduplicator and store
//!
//! Single owner of emitted signals and of the dedup key set. Every mutation
//! happens under one `parking_lot::Mutex`; the lock is never held across an
//! await, so persistence snapshots the state first and writes afterwards.
//!
//! Emission is "commit only after confirmed delivery":
//!
//! ```text
//! try_reserve(key) ──► deliver ──ok──► commit(signal)
//!                          └────err──► release(key)
//! ```

#[cfg(test)]
mod tests;

use crate::error::{BotError, Result};
use crate::performance::PerformanceSummary;
use crate::types::{Signal, SignalKey, SignalStatus};
use chrono::{FixedOffset, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// One reporting day in the persisted ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayLedger {
    pub total: usize,
    pub settled_green: usize,
    pub settled_red: usize,
    #[serde(default)]
    pub settled_refund: usize,
    pub entries: Vec<Signal>,
}

impl DayLedger {
    fn from_entries(entries: Vec<Signal>) -> Self {
        let summary = PerformanceSummary::from_signals(&entries);
        Self {
            total: entries.len(),
            settled_green: summary.green,
            settled_red: summary.red,
            settled_refund: summary.refund,
            entries,
        }
    }
}

/// Date-keyed ledger as stored on disk
pub type Ledger = BTreeMap<String, DayLedger>;

#[derive(Default)]
struct StoreState {
    committed: HashSet<SignalKey>,
    in_flight: HashSet<SignalKey>,
    signals: Vec<Signal>,
    /// Ledger days loaded from disk that are not held in `signals`
    history: Ledger,
}

/// Where the store persists itself, if anywhere
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub dedup_file: PathBuf,
    pub ledger_file: PathBuf,
}

pub struct SignalStore {
    state: Mutex<StoreState>,
    paths: Option<StorePaths>,
    offset: FixedOffset,
    /// Serializes `save` so snapshots land on disk in order
    save_lock: tokio::sync::Mutex<()>,
}

impl SignalStore {
    /// In-memory store; `save` is a no-op
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            paths: None,
            offset,
            save_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Disk-backed store. Loads the dedup key set and restores today's
    /// signals from the ledger; missing files start empty.
    pub async fn open(paths: StorePaths, offset: FixedOffset) -> Result<Self> {
        let keys: Vec<SignalKey> = read_json(&paths.dedup_file).await?.unwrap_or_default();
        let mut history: Ledger = read_json(&paths.ledger_file).await?.unwrap_or_default();

        let today = Utc::now().with_timezone(&offset).date_naive();
        let signals = history
            .remove(&today.format(DAY_FORMAT).to_string())
            .map(|day| day.entries)
            .unwrap_or_default();

        let mut committed: HashSet<SignalKey> = keys.into_iter().collect();
        committed.extend(signals.iter().map(|s| s.key.clone()));

        info!(
            "📂 Store opened: {} dedup keys, {} signals restored for {}",
            committed.len(),
            signals.len(),
            today
        );

        Ok(Self {
            state: Mutex::new(StoreState {
                committed,
                in_flight: HashSet::new(),
                signals,
                history,
            }),
            paths: Some(paths),
            offset,
            save_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Reporting day for the configured offset
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    pub fn day_of(&self, signal: &Signal) -> NaiveDate {
        signal.emitted_at.with_timezone(&self.offset).date_naive()
    }

    /// Atomic check-and-commit. True exactly once per key.
    pub fn register(&self, key: &SignalKey) -> bool {
        let mut state = self.state.lock();
        if state.in_flight.contains(key) {
            return false;
        }
        state.committed.insert(key.clone())
    }

    pub fn is_registered(&self, key: &SignalKey) -> bool {
        self.state.lock().committed.contains(key)
    }

    /// Claim a key for delivery. False if it is committed or already in
    /// flight, so concurrent evaluations of one key cannot both deliver.
    pub fn try_reserve(&self, key: &SignalKey) -> bool {
        let mut state = self.state.lock();
        if state.committed.contains(key) {
            return false;
        }
        state.in_flight.insert(key.clone())
    }

    /// Drop a reservation after a failed delivery so a later cycle may retry
    pub fn release(&self, key: &SignalKey) {
        let mut state = self.state.lock();
        if state.in_flight.remove(key) {
            debug!("Released {}", key);
        }
    }

    /// Record a delivered signal and commit its key
    pub fn commit(&self, signal: Signal) {
        let mut state = self.state.lock();
        state.in_flight.remove(&signal.key);
        if !state.committed.insert(signal.key.clone()) {
            warn!("Key {} committed twice; keeping first signal", signal.key);
            return;
        }
        state.signals.push(signal);
    }

    /// Move a pending signal to a terminal status.
    ///
    /// `Ok(None)` when the signal is already terminal or `status` is not
    /// terminal; status never moves backwards.
    pub fn transition(&self, signal_id: &str, status: SignalStatus) -> Result<Option<Signal>> {
        let mut state = self.state.lock();
        let signal = state
            .signals
            .iter_mut()
            .find(|s| s.id == signal_id)
            .ok_or_else(|| BotError::SignalNotFound(signal_id.to_string()))?;

        if signal.status.is_terminal() || !status.is_terminal() {
            return Ok(None);
        }
        signal.status = status;
        signal.settled_at = Some(Utc::now());
        Ok(Some(signal.clone()))
    }

    pub fn get(&self, signal_id: &str) -> Option<Signal> {
        self.state.lock().signals.iter().find(|s| s.id == signal_id).cloned()
    }

    pub fn signals_for_day(&self, day: NaiveDate) -> Vec<Signal> {
        self.state
            .lock()
            .signals
            .iter()
            .filter(|s| self.day_of(s) == day)
            .cloned()
            .collect()
    }

    pub fn pending_for_day(&self, day: NaiveDate) -> Vec<Signal> {
        self.signals_for_day(day)
            .into_iter()
            .filter(|s| s.status == SignalStatus::Pending)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ledger view: loaded history merged with in-memory days
    pub fn ledger(&self) -> Ledger {
        let state = self.state.lock();
        let mut ledger = state.history.clone();

        let mut by_day: BTreeMap<String, Vec<Signal>> = BTreeMap::new();
        for signal in &state.signals {
            by_day
                .entry(self.day_of(signal).format(DAY_FORMAT).to_string())
                .or_default()
                .push(signal.clone());
        }
        for (day, entries) in by_day {
            ledger.insert(day, DayLedger::from_entries(entries));
        }
        ledger
    }

    /// Persist dedup keys and ledger. Concurrent callers queue, and each
    /// snapshots the state only once it holds the save lock.
    pub async fn save(&self) -> Result<()> {
        let Some(paths) = &self.paths else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().await;

        let mut keys: Vec<SignalKey> = self.state.lock().committed.iter().cloned().collect();
        keys.sort();
        let ledger = self.ledger();

        write_json(&paths.dedup_file, &keys).await?;
        write_json(&paths.ledger_file, &ledger).await?;
        debug!("Store saved: {} keys, {} ledger days", keys.len(), ledger.len());
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => Ok(None),
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    // Write-then-rename so a crash never leaves a truncated file
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
