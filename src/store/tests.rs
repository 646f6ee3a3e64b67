//! Unit tests for the signal store

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::testing::{signal, signal_at, with_status};
    use crate::types::{Market, MatchId};
    use chrono::{Duration, Offset};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn key(match_id: &str) -> SignalKey {
        SignalKey::new(MatchId::new(match_id), &Market::HalfTimeOver { line: 1.5 })
    }

    #[test]
    fn test_register_is_exactly_once() {
        let store = SignalStore::new(utc());
        assert!(store.register(&key("1")));
        assert!(!store.register(&key("1")));
        assert!(!store.register(&key("1")));
        assert!(store.is_registered(&key("1")));
    }

    #[test]
    fn test_same_match_different_market_is_distinct() {
        let store = SignalStore::new(utc());
        let ht = SignalKey::new(MatchId::new("1"), &Market::HalfTimeOver { line: 0.5 });
        let ft = SignalKey::new(MatchId::new("1"), &Market::FullTimeLine { push: 2 });
        assert!(store.register(&ht));
        assert!(store.register(&ft));
    }

    #[test]
    fn test_reserve_commit_release() {
        let store = SignalStore::new(utc());
        let tip = signal("7", Market::HalfTimeOver { line: 1.5 });

        assert!(store.try_reserve(&tip.key));
        // A second evaluation of the same key while in flight is refused
        assert!(!store.try_reserve(&tip.key));
        assert!(!store.register(&tip.key));

        store.release(&tip.key);
        assert!(store.try_reserve(&tip.key));

        store.commit(tip.clone());
        assert!(!store.try_reserve(&tip.key));
        assert!(store.is_registered(&tip.key));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_commit_twice_keeps_single_signal() {
        let store = SignalStore::new(utc());
        let tip = signal("7", Market::HalfTimeOver { line: 1.5 });
        store.commit(tip.clone());
        store.commit(tip);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_reservation_admits_one() {
        let store = Arc::new(SignalStore::new(utc()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.try_reserve(&key("race")))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn test_transition_moves_forward_only() {
        let store = SignalStore::new(utc());
        let tip = signal("7", Market::FullTimeLine { push: 3 });
        let id = tip.id.clone();
        store.commit(tip);

        assert!(store.transition(&id, SignalStatus::Pending).unwrap().is_none());
        let settled = store.transition(&id, SignalStatus::Refund).unwrap().unwrap();
        assert_eq!(settled.status, SignalStatus::Refund);
        assert!(store.transition(&id, SignalStatus::Green).unwrap().is_none());
        assert_eq!(store.get(&id).unwrap().status, SignalStatus::Refund);
    }

    #[test]
    fn test_transition_unknown_signal() {
        let store = SignalStore::new(utc());
        let err = store.transition("missing", SignalStatus::Green).unwrap_err();
        assert!(matches!(err, BotError::SignalNotFound(_)));
    }

    #[test]
    fn test_day_scoping() {
        let store = SignalStore::new(utc());
        let today = store.today();
        store.commit(signal("1", Market::HalfTimeOver { line: 0.5 }));
        store.commit(signal_at(
            "2",
            Market::HalfTimeOver { line: 0.5 },
            Utc::now() - Duration::days(2),
        ));
        store.commit(with_status(
            signal("3", Market::HalfTimeOver { line: 0.5 }),
            SignalStatus::Green,
        ));

        assert_eq!(store.signals_for_day(today).len(), 2);
        let pending = store.pending_for_day(today);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].key.match_id, MatchId::new("1"));
    }

    #[test]
    fn test_day_uses_configured_offset() {
        let offset = FixedOffset::west_opt(4 * 3600).unwrap();
        let store = SignalStore::new(offset);
        // 02:00 UTC is still the previous day at UTC-4
        let emitted = chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 10, 18, 2, 0, 0).unwrap();
        let tip = signal_at("1", Market::HalfTimeOver { line: 0.5 }, emitted);
        assert_eq!(store.day_of(&tip), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
    }

    #[test]
    fn test_ledger_counts() {
        let store = SignalStore::new(utc());
        store.commit(with_status(signal("1", Market::HalfTimeOver { line: 0.5 }), SignalStatus::Green));
        store.commit(with_status(signal("2", Market::HalfTimeOver { line: 0.5 }), SignalStatus::Red));
        store.commit(with_status(signal("3", Market::FullTimeLine { push: 3 }), SignalStatus::Refund));
        store.commit(signal("4", Market::FullTimeLine { push: 2 }));

        let ledger = store.ledger();
        let day = ledger.get(&store.today().format("%Y-%m-%d").to_string()).unwrap();
        assert_eq!(day.total, 4);
        assert_eq!(day.settled_green, 1);
        assert_eq!(day.settled_red, 1);
        assert_eq!(day.settled_refund, 1);
        assert_eq!(day.entries.len(), 4);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            dedup_file: dir.path().join("data").join("sent_keys.json"),
            ledger_file: dir.path().join("data").join("ledger.json"),
        };

        let store = SignalStore::open(paths.clone(), utc()).await.unwrap();
        assert!(store.is_empty());
        assert!(store.register(&key("bare")));
        let today_tip = signal("1", Market::HalfTimeOver { line: 0.5 });
        let today_id = today_tip.id.clone();
        store.commit(today_tip);
        store.commit(signal_at(
            "2",
            Market::FullTimeLine { push: 3 },
            Utc::now() - Duration::days(3),
        ));
        store.save().await.unwrap();
        assert!(paths.dedup_file.exists());
        assert!(paths.ledger_file.exists());

        let reopened = SignalStore::open(paths.clone(), utc()).await.unwrap();
        // Only today's signals come back into memory
        assert_eq!(reopened.len(), 1);
        assert!(reopened.get(&today_id).is_some());
        assert!(!reopened.register(&key("bare")));
        assert!(!reopened.try_reserve(&SignalKey::new(
            MatchId::new("2"),
            &Market::FullTimeLine { push: 3 }
        )));

        // Older days survive a second save
        reopened.save().await.unwrap();
        let content = tokio::fs::read_to_string(&paths.ledger_file).await.unwrap();
        let ledger: Ledger = serde_json::from_str(&content).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_save_is_noop() {
        let store = SignalStore::new(utc());
        store.commit(signal("1", Market::HalfTimeOver { line: 0.5 }));
        assert!(store.save().await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            dedup_file: dir.path().join("sent_keys.json"),
            ledger_file: dir.path().join("ledger.json"),
        };
        tokio::fs::write(&paths.dedup_file, "{not json").await.unwrap();
        assert!(SignalStore::open(paths, utc()).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_keep_latest_state() {
        let dir = tempdir().unwrap();
        let paths = StorePaths {
            dedup_file: dir.path().join("sent_keys.json"),
            ledger_file: dir.path().join("ledger.json"),
        };
        let store = Arc::new(SignalStore::open(paths.clone(), utc()).await.unwrap());
        for i in 0..500 {
            store.commit(signal(&i.to_string(), Market::HalfTimeOver { line: 0.5 }));
        }

        for round in 0..20 {
            store.commit(signal(&format!("r{}", round), Market::FullTimeLine { push: 2 }));
            let (a, b) = tokio::join!(
                tokio::spawn({
                    let store = store.clone();
                    async move { store.save().await }
                }),
                tokio::spawn({
                    let store = store.clone();
                    async move { store.save().await }
                }),
            );
            assert!(a.unwrap().is_ok());
            assert!(b.unwrap().is_ok());
        }

        let reopened = SignalStore::open(paths, utc()).await.unwrap();
        assert_eq!(reopened.len(), 520);
        assert!(!reopened.try_reserve(&SignalKey::new(
            MatchId::new("r19"),
            &Market::FullTimeLine { push: 2 }
        )));
    }
}
