//! Unit tests for league rolling statistics

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::types::MatchId;
    use chrono::{TimeZone, Utc};

    const BATTLE: &str = "Esoccer Battle - 8 mins play";
    const GT: &str = "Esoccer GT Leagues – 12 mins play";

    fn finished(id: u32, league: &str, minute: u32, ht: (u32, u32), ft: (u32, u32)) -> FinishedMatch {
        FinishedMatch {
            event_id: MatchId::new(id.to_string()),
            status: "ended".to_string(),
            league: Some(league.to_string()),
            final_score: Score::new(ft.0, ft.1),
            half_time: Score::new(ht.0, ht.1),
            start_time: Utc.with_ymd_and_hms(2026, 10, 18, 10, minute, 0).single(),
        }
    }

    #[test]
    fn test_league_below_window_is_absent() {
        let matches: Vec<_> = (0..4).map(|i| finished(i, BATTLE, i, (1, 0), (2, 1))).collect();
        let table = LeagueTable::compute(&matches);
        assert!(table.get(BATTLE).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_window_takes_five_most_recent() {
        let mut matches: Vec<_> = (0..5)
            .map(|i| finished(i, BATTLE, 30 + i, (1, 1), (3, 1)))
            .collect();
        // Older goalless games must fall outside the window
        matches.extend((10..13).map(|i| finished(i, BATTLE, i, (0, 0), (0, 0))));

        let table = LeagueTable::compute(&matches);
        let stats = table.get(BATTLE).unwrap();
        assert_eq!(stats.sample_size, 5);
        assert_eq!(stats.ht_over_0_5, 100.0);
        assert_eq!(stats.ht_over_1_5, 100.0);
        assert_eq!(stats.ht_over_2_5, 0.0);
        assert_eq!(stats.ft_over_3_5, 0.0);
        assert_eq!(stats.ft_over_2_5, 100.0);
    }

    #[test]
    fn test_percentages_use_strict_comparison() {
        let matches = vec![
            finished(1, GT, 5, (0, 0), (0, 0)),
            finished(2, GT, 4, (1, 0), (1, 0)),
            finished(3, GT, 3, (1, 1), (2, 0)),
            finished(4, GT, 2, (2, 1), (3, 1)),
            finished(5, GT, 1, (0, 1), (4, 1)),
        ];
        let table = LeagueTable::compute(&matches);
        let stats = table.get(GT).unwrap();
        assert_eq!(stats.ht_over_0_5, 80.0);
        assert_eq!(stats.ht_over_1_5, 40.0);
        assert_eq!(stats.ht_over_2_5, 20.0);
        assert_eq!(stats.ft_over_0_5, 80.0);
        assert_eq!(stats.ft_over_1_5, 60.0);
        assert_eq!(stats.ft_over_2_5, 40.0);
        assert_eq!(stats.ft_over_3_5, 40.0);
        assert_eq!(stats.ft_over_4_5, 20.0);
    }

    #[test]
    fn test_only_ended_matches_with_league_qualify() {
        let mut matches: Vec<_> = (0..4).map(|i| finished(i, BATTLE, i, (1, 0), (1, 0))).collect();
        let mut live = finished(8, BATTLE, 9, (1, 0), (1, 0));
        live.status = "live".to_string();
        matches.push(live);
        let mut anonymous = finished(9, BATTLE, 9, (1, 0), (1, 0));
        anonymous.league = None;
        matches.push(anonymous);

        assert!(LeagueTable::compute(&matches).get(BATTLE).is_none());
    }

    #[test]
    fn test_undated_matches_sort_last() {
        let mut matches: Vec<_> = (0..5).map(|i| finished(i, BATTLE, i, (2, 0), (2, 0))).collect();
        let mut undated = finished(99, BATTLE, 0, (0, 0), (0, 0));
        undated.start_time = None;
        matches.insert(0, undated);

        let table = LeagueTable::compute(&matches);
        assert_eq!(table.get(BATTLE).unwrap().ht_over_1_5, 100.0);
    }

    #[test]
    fn test_leagues_are_independent() {
        let mut matches: Vec<_> = (0..5).map(|i| finished(i, BATTLE, i, (1, 0), (1, 0))).collect();
        matches.extend((5..8).map(|i| finished(i, GT, i, (1, 0), (1, 0))));
        let table = LeagueTable::compute(&matches);
        assert_eq!(table.len(), 1);
        assert!(table.get(BATTLE).is_some());
        assert!(table.get(GT).is_none());
    }

    #[test]
    fn test_saturated_scores_do_not_panic() {
        let matches: Vec<FinishedMatch> = (1..=5)
            .map(|i| finished(i, BATTLE, i, (u32::MAX, 1), (u32::MAX, u32::MAX)))
            .collect();
        let table = LeagueTable::compute(&matches);
        let stats = table.get(BATTLE).unwrap();
        assert_eq!(stats.ht_over_2_5, 100.0);
        assert_eq!(stats.ft_over_4_5, 100.0);
    }
}
