//! Message rendering for signals

use crate::h2h::HeadToHeadMetrics;
use crate::types::MatchSnapshot;
use std::fmt::Write;

const BET365_EVENT_URL: &str = "https://www.bet365.bet.br/#/IP/EV";

/// What a signal message shows
pub struct SignalView<'a> {
    pub snapshot: &'a MatchSnapshot,
    pub label: &'a str,
    pub player1: &'a str,
    pub player2: &'a str,
    pub h2h: Option<&'a HeadToHeadMetrics>,
    pub bet365_event: Option<&'a str>,
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render_signal(view: &SignalView<'_>) -> String {
    let snap = view.snapshot;
    let mut msg = format!(
        "\n\n<b>🏆 {}</b>\n\n<b>🎯 {}</b>\n\n⏳ Time: {}\n\n🎮 {} vs {}\n⚽ Score: {}\n",
        escape_html(&snap.league),
        escape_html(view.label),
        snap.clock(),
        escape_html(view.player1),
        escape_html(view.player2),
        snap.score,
    );

    // Writing to a String cannot fail
    match view.h2h {
        Some(h) => {
            let _ = write!(
                msg,
                "🏅 <i>{:.2}% vs {:.2}%</i>\n\n\
                 <b>📊 H2H (last {} games):</b>\n\n\
                 💠 Avg goals: <i>{:.2}</i> vs <i>{:.2}</i>\n\n\
                 ⚽ +0.5 HT: <i>{:.0}%</i> | +1.5 HT: <i>{:.0}%</i> | +2.5 HT: <i>{:.0}%</i>\n\n\
                 ⚽ BTTS HT: <i>{:.0}%</i>\n",
                h.player1_win_percentage,
                h.player2_win_percentage,
                h.sample_size,
                h.player1_avg_goals,
                h.player2_avg_goals,
                h.over_0_5_ht_percentage,
                h.over_1_5_ht_percentage,
                h.over_2_5_ht_percentage,
                h.btts_ht_percentage,
            );
        }
        None => msg.push_str("📊 H2H: <i>unavailable</i>"),
    }

    if let Some(event) = view.bet365_event {
        let _ = write!(
            msg,
            "\n\n🌐 <a href='{}{}'>🔗Bet365</a>\n\n",
            BET365_EVENT_URL, event
        );
    }
    msg
}
