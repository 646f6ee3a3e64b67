//! Unit tests for head-to-head aggregation

#[cfg(test)]
mod tests {
    use super::super::*;
    use serde_json::json;

    #[test]
    fn test_two_meeting_scenario() {
        let body = json!({
            "matches": [
                {"halftime_score_home": 1, "halftime_score_away": 0, "final_score_home": 2, "final_score_away": 1},
                {"halftime_score_home": 0, "halftime_score_away": 0, "final_score_home": 1, "final_score_away": 1}
            ]
        });
        let m = from_response(&body).unwrap();
        assert_eq!(m.sample_size, 2);
        assert_eq!(m.over_0_5_ht_percentage, 50.0);
        assert_eq!(m.over_1_5_ht_percentage, 0.0);
        assert_eq!(m.player1_win_percentage, 50.0);
        assert_eq!(m.player2_win_percentage, 0.0);
        assert_eq!(m.player1_avg_goals, 1.5);
        assert_eq!(m.player2_avg_goals, 1.0);
        assert_eq!(m.avg_goals_sum(), 2.5);
    }

    #[test]
    fn test_ht_thresholds_are_nested() {
        let records: Vec<_> = (0..6u32)
            .flat_map(|h| (0..4u32).map(move |a| (h, a)))
            .map(|(h, a)| json!({"halftime_score_home": h, "halftime_score_away": a}))
            .collect();
        for window in records.windows(5) {
            let m = aggregate(window).unwrap();
            assert!(m.over_0_5_ht_percentage >= m.over_1_5_ht_percentage);
            assert!(m.over_1_5_ht_percentage >= m.over_2_5_ht_percentage);
        }
    }

    #[test]
    fn test_btts_requires_both_sides() {
        let records = vec![
            json!({"halftime_score_home": 1, "halftime_score_away": 1}),
            json!({"halftime_score_home": 2, "halftime_score_away": 0}),
            json!({"halftime_score_home": 0, "halftime_score_away": 3}),
            json!({"halftime_score_home": 2, "halftime_score_away": 2}),
        ];
        let m = aggregate(&records).unwrap();
        assert_eq!(m.btts_ht_percentage, 50.0);
        assert_eq!(m.over_2_5_ht_percentage, 50.0);
    }

    #[test]
    fn test_tie_counts_for_neither_side() {
        let records = vec![json!({"score_home": 2, "score_away": 2})];
        let m = aggregate(&records).unwrap();
        assert_eq!(m.player1_win_percentage, 0.0);
        assert_eq!(m.player2_win_percentage, 0.0);
    }

    #[test]
    fn test_missing_half_time_reads_as_zero() {
        let m = aggregate(&[json!({"home_score": 3, "away_score": 0})]).unwrap();
        assert_eq!(m.over_0_5_ht_percentage, 0.0);
        assert_eq!(m.player1_win_percentage, 100.0);
    }

    #[test]
    fn test_extractor_chain_each_step() {
        assert_eq!(final_goals(&json!({"final_score_home": 4, "final_score_away": 2})), (4, 2));
        assert_eq!(final_goals(&json!({"score_home": "3", "score_away": "1"})), (3, 1));
        assert_eq!(final_goals(&json!({"home_score": 2, "away_score": 5})), (2, 5));
        assert_eq!(final_goals(&json!({"score": {"home": 1, "away": 6}})), (1, 6));
        assert_eq!(final_goals(&json!({"final_score": {"home": 7, "away": 0}})), (7, 0));
        assert_eq!(final_goals(&json!({"result": {"home": 2, "away": 2}})), (2, 2));
        assert_eq!(final_goals(&json!({"result": {"home_score": 3, "away_score": 4}})), (3, 4));
        assert_eq!(final_goals(&json!({"ft_score_home": 5, "ft_score_away": 1})), (5, 1));
        assert_eq!(final_goals(&json!({"home_goals": 0, "away_goals": 3})), (0, 3));
        assert_eq!(final_goals(&json!({"score": "4-3"})), (4, 3));
    }

    #[test]
    fn test_extractor_precedence() {
        // Earlier steps win even when later fields disagree
        let record = json!({
            "final_score_home": 1,
            "final_score_away": 0,
            "score_home": 9,
            "score_away": 9,
            "score": "5-5"
        });
        assert_eq!(final_goals(&record), (1, 0));

        // A null home value falls through to the next step
        let record = json!({"final_score_home": null, "final_score_away": 3, "home_goals": 2, "away_goals": 2});
        assert_eq!(final_goals(&record), (2, 2));
    }

    #[test]
    fn test_extractor_defaults() {
        assert_eq!(final_goals(&json!({})), (0, 0));
        assert_eq!(final_goals(&json!({"score": "n/a"})), (0, 0));
        // Home found, away missing
        assert_eq!(final_goals(&json!({"score_home": 2})), (2, 0));
    }

    #[test]
    fn test_unavailable_responses() {
        assert!(from_response(&json!({"matches": []})).is_none());
        assert!(from_response(&json!({"data": [{"score_home": 1}]})).is_none());
        assert!(from_response(&json!({"matches": "none"})).is_none());
        assert!(aggregate(&[]).is_none());
    }

    #[test]
    fn test_huge_goal_counts_do_not_overflow() {
        let max = u64::from(u32::MAX);
        let records = vec![
            json!({"home_score": max, "away_score": 0, "halftime_score_home": max, "halftime_score_away": 1}),
            json!({"home_score": max, "away_score": 0, "halftime_score_home": 0, "halftime_score_away": 0}),
        ];
        let m = aggregate(&records).unwrap();
        assert_eq!(m.player1_avg_goals, f64::from(u32::MAX));
        assert_eq!(m.over_2_5_ht_percentage, 50.0);

        // Past u32 the value is malformed and reads as zero
        let bad = json!({"home_score": 4_294_967_298u64, "away_score": 2});
        assert_eq!(final_goals(&bad), (0, 2));
    }
}
