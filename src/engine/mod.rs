//! Signal engine
//!
//! Two cadences share the store:
//!
//! ```text
//! fast: links + live ──► metrics + H2H ──► rules ──► reserve ──► deliver ──► commit
//! slow: ended ──► league table ──► settle ──► summary ──► persist
//! ```
//!
//! The fast loop only reads the league table; the slow loop replaces it.


use crate::client::{HttpFeed, LinkMap, MatchFeed};
use crate::config::Config;
use crate::error::Result;
use crate::h2h::HeadToHeadMetrics;
use crate::league::LeagueTable;
use crate::metrics::DerivedMetrics;
use crate::notify::{build_notifier, render_signal, Notifier, SignalView};
use crate::performance::{league_breakdown, log_breakdown, PerformanceSummary, SummaryGate};
use crate::settlement::Settler;
use crate::store::{SignalStore, StorePaths};
use crate::strategy::{Candidate, MatchContext, RuleEngine};
use crate::types::{FinishedMatch, MatchSnapshot, Signal, SignalKey, SignalStatus};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Engine tunables
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub settle_interval: Duration,
    pub max_concurrent_matches: usize,
    pub summary_title: String,
    pub replace_previous_summary: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.schedule.poll_interval_secs.max(1)),
            settle_interval: Duration::from_secs(config.schedule.settle_interval_secs.max(1)),
            max_concurrent_matches: config.schedule.max_concurrent_matches.max(1),
            summary_title: config.performance.title.clone(),
            replace_previous_summary: config.performance.replace_previous_summary,
        }
    }
}

/// What one fast cycle did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub matches: usize,
    pub candidates: usize,
    pub emitted: usize,
    pub duplicates: usize,
    pub failed_deliveries: usize,
}

/// What one slow cycle did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlementReport {
    pub ended_matches: usize,
    pub leagues: usize,
    pub settled: usize,
    pub summary: PerformanceSummary,
    pub summary_sent: bool,
}

enum Emission {
    Emitted,
    Duplicate,
    Failed,
}

pub struct SignalEngine {
    feed: Arc<dyn MatchFeed>,
    notifier: Arc<dyn Notifier>,
    store: Arc<SignalStore>,
    rules: RuleEngine,
    settler: Settler,
    leagues: RwLock<Arc<LeagueTable>>,
    summary: Mutex<SummaryGate>,
    settings: EngineSettings,
}

impl SignalEngine {
    pub fn new(
        feed: Arc<dyn MatchFeed>,
        notifier: Arc<dyn Notifier>,
        store: Arc<SignalStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            settler: Settler::new(store.clone(), notifier.clone()),
            summary: Mutex::new(SummaryGate::new(settings.replace_previous_summary)),
            rules: RuleEngine::new(),
            leagues: RwLock::new(Arc::new(LeagueTable::default())),
            feed,
            notifier,
            store,
            settings,
        }
    }

    /// Wire the HTTP feeds, the configured notifier and the on-disk store
    pub async fn from_config(config: &Config, dry_run: bool) -> Result<Self> {
        let timeout = Duration::from_secs(config.feeds.timeout_secs);
        let feed = Arc::new(HttpFeed::new(config.feeds.clone())?.with_reporting_offset(config.utc_offset()));
        let notifier = build_notifier(config.telegram.as_ref(), dry_run, timeout)?;
        let paths = StorePaths {
            dedup_file: config.storage.dedup_path(),
            ledger_file: config.storage.ledger_path(),
        };
        let store = Arc::new(SignalStore::open(paths, config.utc_offset()).await?);
        Ok(Self::new(feed, notifier, store, EngineSettings::from_config(config)))
    }

    pub fn store(&self) -> &Arc<SignalStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub async fn league_table(&self) -> Arc<LeagueTable> {
        self.leagues.read().await.clone()
    }

    pub async fn replace_league_table(&self, table: LeagueTable) {
        *self.leagues.write().await = Arc::new(table);
    }

    /// Rebuild league stats from `ended`, returning how many leagues are
    /// gated. An empty batch is usually a failed fetch; the last good table
    /// is kept.
    async fn refresh_league_table(&self, ended: &[FinishedMatch]) -> usize {
        if !ended.is_empty() {
            self.replace_league_table(LeagueTable::compute(ended)).await;
        }
        self.league_table().await.len()
    }

    /// Fetch ended matches and rebuild league stats only. Nothing is
    /// settled, published or persisted.
    pub async fn warm_league_table(&self) -> usize {
        let ended = self.feed.ended_matches().await;
        self.refresh_league_table(&ended).await
    }

    /// Fast cadence: evaluate every live match and emit new signals
    pub async fn poll_cycle(&self) -> CycleReport {
        let (links, matches) = tokio::join!(self.feed.bet365_links(), self.feed.live_matches());
        let leagues = self.league_table().await;

        let mut report = CycleReport {
            matches: matches.len(),
            ..CycleReport::default()
        };

        let (leagues, links) = (leagues.as_ref(), &links);
        let outcomes: Vec<(usize, Vec<Emission>)> = stream::iter(matches)
            .map(|snapshot| async move { self.evaluate_match(&snapshot, leagues, links).await })
            .buffer_unordered(self.settings.max_concurrent_matches)
            .collect()
            .await;

        for (candidates, emissions) in outcomes {
            report.candidates += candidates;
            for emission in emissions {
                match emission {
                    Emission::Emitted => report.emitted += 1,
                    Emission::Duplicate => report.duplicates += 1,
                    Emission::Failed => report.failed_deliveries += 1,
                }
            }
        }

        if report.emitted > 0 {
            self.persist().await;
        }
        debug!(
            "Poll cycle: {} matches, {} candidates, {} emitted, {} duplicate, {} failed",
            report.matches, report.candidates, report.emitted, report.duplicates, report.failed_deliveries
        );
        report
    }

    async fn evaluate_match(
        &self,
        snapshot: &MatchSnapshot,
        leagues: &LeagueTable,
        links: &LinkMap,
    ) -> (usize, Vec<Emission>) {
        let metrics = DerivedMetrics::from_snapshot(snapshot);
        let h2h = self.feed.head_to_head(&metrics.player1, &metrics.player2).await;

        let ctx = MatchContext {
            snapshot,
            metrics: &metrics,
            h2h: h2h.as_ref(),
            league: leagues.get(&snapshot.league),
        };
        let candidates = self.rules.evaluate(&ctx);
        if candidates.is_empty() {
            return (0, Vec::new());
        }

        let link = links
            .get(&(metrics.player1.to_lowercase(), metrics.player2.to_lowercase()))
            .map(String::as_str);

        let mut emissions = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            emissions.push(self.emit(snapshot, &metrics, h2h.as_ref(), candidate, link).await);
        }
        (candidates.len(), emissions)
    }

    async fn emit(
        &self,
        snapshot: &MatchSnapshot,
        metrics: &DerivedMetrics,
        h2h: Option<&HeadToHeadMetrics>,
        candidate: &Candidate,
        link: Option<&str>,
    ) -> Emission {
        let key = SignalKey::new(snapshot.id.clone(), &candidate.market);
        if !self.store.try_reserve(&key) {
            debug!("{} already sent", key);
            return Emission::Duplicate;
        }

        let text = render_signal(&SignalView {
            snapshot,
            label: &candidate.label,
            player1: &metrics.player1,
            player2: &metrics.player2,
            h2h,
            bet365_event: link,
        });

        match self.notifier.deliver(&text).await {
            Ok(delivery_id) => {
                info!(
                    "🎯 {} {} | {} vs {} | {} @ {}",
                    key,
                    candidate.label,
                    snapshot.home,
                    snapshot.away,
                    snapshot.score,
                    snapshot.clock()
                );
                self.store.commit(Signal {
                    id: Uuid::new_v4().to_string(),
                    key,
                    strategy: candidate.label.clone(),
                    market: candidate.market.clone(),
                    league: snapshot.league.clone(),
                    home: snapshot.home.clone(),
                    away: snapshot.away.clone(),
                    emitted_at: Utc::now(),
                    delivery_id,
                    text,
                    status: SignalStatus::Pending,
                    settled_at: None,
                });
                Emission::Emitted
            }
            Err(e) => {
                warn!("Delivery of {} failed, will retry: {}", key, e);
                self.store.release(&key);
                Emission::Failed
            }
        }
    }

    /// Slow cadence: league stats, settlement, summary, persistence
    pub async fn settlement_cycle(&self) -> SettlementReport {
        let ended = self.feed.ended_matches().await;
        let leagues = self.refresh_league_table(&ended).await;

        let settled = self.settler.settle(&ended).await;
        let (summary, summary_sent) = match self.publish_summary().await {
            Ok(result) => result,
            Err(e) => {
                warn!("Summary delivery failed: {}", e);
                (self.today_summary(), false)
            }
        };
        self.persist().await;

        info!(
            "🔄 Settlement: {} ended, {} leagues gated, {} settled | G{} R{} RF{} P{}",
            ended.len(),
            leagues,
            settled.len(),
            summary.green,
            summary.red,
            summary.refund,
            summary.pending
        );

        SettlementReport {
            ended_matches: ended.len(),
            leagues,
            settled: settled.len(),
            summary,
            summary_sent,
        }
    }

    pub fn today_summary(&self) -> PerformanceSummary {
        PerformanceSummary::from_signals(&self.store.signals_for_day(self.store.today()))
    }

    /// Deliver today's summary if it changed since the last delivery
    pub async fn publish_summary(&self) -> Result<(PerformanceSummary, bool)> {
        let today = self.store.signals_for_day(self.store.today());
        log_breakdown(&league_breakdown(&today));

        let summary = PerformanceSummary::from_signals(&today);
        let Some(text) = summary.render(&self.settings.summary_title) else {
            debug!("No settled green/red signals yet");
            return Ok((summary, false));
        };
        let sent = self
            .summary
            .lock()
            .await
            .publish(self.notifier.as_ref(), &text)
            .await?;
        Ok((summary, sent))
    }

    async fn persist(&self) {
        if let Err(e) = self.store.save().await {
            error!("Failed to persist store: {}", e);
        }
    }

    /// Run both cadences until Ctrl-C
    pub async fn run(self: Arc<Self>) -> Result<()> {
        info!(
            "🚀 Engine started: poll every {:?}, settle every {:?}, {} signals restored",
            self.settings.poll_interval,
            self.settings.settle_interval,
            self.store.len()
        );

        let slow = {
            let engine = self.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(engine.settings.settle_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    engine.settlement_cycle().await;
                }
            })
        };

        let fast = {
            let engine = self.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(engine.settings.poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    engine.poll_cycle().await;
                }
            })
        };

        tokio::signal::ctrl_c().await?;
        info!("Shutting down");
        fast.abort();
        slow.abort();
        self.store.save().await
    }
}
