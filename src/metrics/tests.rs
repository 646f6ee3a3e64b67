//! Unit tests for derived metrics

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::types::{LiveStats, MatchId, Score, Timer};

    fn snapshot(league: &str, timer: Option<(f64, f64)>, da: Option<(u32, u32)>) -> MatchSnapshot {
        MatchSnapshot {
            id: MatchId::new("1"),
            league: league.to_string(),
            home: "Arsenal (Kray)".to_string(),
            away: "Chelsea (Boulevard)".to_string(),
            score: Score::default(),
            timer: timer.map(|(minutes, seconds)| Timer { minutes, seconds }),
            stats: da.map(|d| LiveStats { dangerous_attacks: Some(d) }),
        }
    }

    #[test]
    fn test_elapsed_minutes_with_seconds() {
        let snap = snapshot("Esoccer Battle - 8 mins play", Some((3.0, 30.0)), None);
        let elapsed = elapsed_minutes(&snap);
        assert_eq!(elapsed.minutes, 3.5);
        assert!(elapsed.known);
        assert!(elapsed.is_running());
    }

    #[test]
    fn test_elapsed_minutes_without_timer_is_unknown() {
        let snap = snapshot("Esoccer Battle - 8 mins play", None, None);
        let elapsed = elapsed_minutes(&snap);
        assert_eq!(elapsed.minutes, 0.0);
        assert!(!elapsed.known);
        assert!(!elapsed.is_running());
    }

    #[test]
    fn test_first_half_eight_minute_cutoff() {
        let league = "Esoccer Battle - 8 mins play";
        assert!(is_first_half(&snapshot(league, Some((3.0, 59.0)), None), league));
        assert!(!is_first_half(&snapshot(league, Some((4.0, 0.0)), None), league));
    }

    #[test]
    fn test_first_half_ten_and_twelve_minute_cutoff() {
        let gt = "Esoccer GT Leagues – 12 mins play";
        assert!(is_first_half(&snapshot(gt, Some((5.0, 30.0)), None), gt));
        assert!(!is_first_half(&snapshot(gt, Some((6.0, 0.0)), None), gt));

        let ten = "Esoccer Adriatic League - 10 mins play";
        assert!(is_first_half(&snapshot(ten, Some((2.0, 0.0)), None), ten));
    }

    #[test]
    fn test_unknown_league_is_never_first_half() {
        let league = "Esoccer Live Arena - 6 mins play";
        assert!(!is_first_half(&snapshot(league, Some((1.0, 0.0)), None), league));
    }

    #[test]
    fn test_dangerous_attack_rate() {
        let snap = snapshot("x", Some((4.0, 0.0)), Some((3, 5)));
        assert_eq!(dangerous_attack_rate(&snap, 4.0), 2.0);
    }

    #[test]
    fn test_dangerous_attack_rate_zero_cases() {
        let snap = snapshot("x", Some((4.0, 0.0)), Some((3, 5)));
        assert_eq!(dangerous_attack_rate(&snap, 0.0), 0.0);

        let no_stats = snapshot("x", Some((4.0, 0.0)), None);
        assert_eq!(dangerous_attack_rate(&no_stats, 4.0), 0.0);

        let mut malformed = snapshot("x", Some((4.0, 0.0)), None);
        malformed.stats = Some(LiveStats { dangerous_attacks: None });
        assert_eq!(dangerous_attack_rate(&malformed, 4.0), 0.0);
    }

    #[test]
    fn test_player_identity() {
        assert_eq!(player_identity("Arsenal (Kray)"), "Kray");
        assert_eq!(player_identity("Real Madrid (Boulevard) "), "Boulevard");
        assert_eq!(player_identity("Kray"), "Kray");
        assert_eq!(player_identity("A (B) (C)"), "C");
    }

    #[test]
    fn test_league_format_classify() {
        assert_eq!(LeagueFormat::classify("Esoccer Battle - 8 mins play"), LeagueFormat::EightMinute);
        assert_eq!(LeagueFormat::classify("Esoccer GT Leagues – 12 mins play"), LeagueFormat::TwelveMinute);
        assert_eq!(LeagueFormat::classify("Esoccer Adriatic League - 10 mins play"), LeagueFormat::TenMinute);
        assert_eq!(LeagueFormat::classify("Volta"), LeagueFormat::Other);
    }

    #[test]
    fn test_league_family_classify() {
        assert_eq!(LeagueFamily::classify("Esoccer Battle - 8 mins play"), Some(LeagueFamily::Battle8));
        assert_eq!(
            LeagueFamily::classify("Esoccer H2H GG League - 8 mins play"),
            Some(LeagueFamily::Gg8)
        );
        assert_eq!(LeagueFamily::classify("Esoccer GT Leagues – 12 mins play"), Some(LeagueFamily::Gt12));
        assert_eq!(LeagueFamily::classify("Esoccer GT Leagues - 12 mins play"), Some(LeagueFamily::Gt12));
        assert_eq!(LeagueFamily::classify("Esoccer Adriatic League - 10 mins play"), None);
        assert!(LeagueFamily::Gg8.is_fast());
        assert!(!LeagueFamily::Gt12.is_fast());
    }

    #[test]
    fn test_derived_metrics_from_snapshot() {
        let snap = snapshot("Esoccer Battle - 8 mins play", Some((2.0, 30.0)), Some((2, 3)));
        let m = DerivedMetrics::from_snapshot(&snap);
        assert_eq!(m.elapsed.minutes, 2.5);
        assert!(m.first_half);
        assert_eq!(m.family, Some(LeagueFamily::Battle8));
        assert_eq!(m.dangerous_attack_rate, 2.0);
        assert_eq!(m.player1, "Kray");
        assert_eq!(m.player2, "Boulevard");
    }

    #[test]
    fn test_dangerous_attack_rate_with_huge_counters() {
        let snap = snapshot("Esoccer Battle - 8 mins play", Some((2.0, 0.0)), Some((u32::MAX, u32::MAX)));
        let rate = dangerous_attack_rate(&snap, 2.0);
        assert_eq!(rate, f64::from(u32::MAX));
    }
}
