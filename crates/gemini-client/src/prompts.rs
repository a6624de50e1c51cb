use brief_core::{RunClock, Snapshot, Topic};

/// Appended to every structured prompt.
pub const JSON_ONLY: &str = "Return ONLY valid JSON. No markdown, no explanation.";

/// Search prompt for one topic, with the expected reply shape spelled out.
pub fn topic_prompt(topic: Topic, clock: &RunClock) -> String {
    let today = clock.date_label();
    let time = clock.time_label();

    let body = match topic {
        Topic::Nifty => format!(
            "Search Nifty 50 current price, today's change, high, low as of {today} {time} IST. \
             Return JSON: {{\"price\":\"XXXXX\",\"change\":\"+/-XX.XX\",\"pct\":\"+/-X.XX%\",\"high\":\"XXXXX\",\"low\":\"XXXXX\",\"trend\":\"bullish/bearish/neutral\"}}"
        ),
        Topic::Vix => format!(
            "Search India VIX current value today {today}. \
             Return JSON: {{\"value\":\"XX.XX\",\"change\":\"+/-X.XX\",\"level\":\"low/moderate/elevated/high\"}}"
        ),
        Topic::News => format!(
            "Search latest 4 breaking news affecting Indian Nifty market right now {today} {time}. \
             Return JSON array: [{{\"tag\":\"GEO/MARKET/MACRO\",\"headline\":\"under 15 words\",\"impact\":\"positive/negative/neutral\",\"time\":\"HH:MM\"}}]"
        ),
        Topic::Gift => format!(
            "Search Gift Nifty pre-market value {today}. \
             Return JSON: {{\"value\":\"XXXXX\",\"change\":\"+/-XX\",\"pct\":\"+/-X.XX%\",\"gap_pts\":\"+/-XX\",\"signal\":\"gap_up/gap_down/flat\"}}"
        ),
        Topic::Crude => format!(
            "Search WTI crude oil price {today}. \
             Return JSON: {{\"price\":\"XX.XX\",\"change\":\"+/-X.XX\",\"pct\":\"+/-X.XX%\",\"signal\":\"bullish/bearish/neutral\"}}"
        ),
        Topic::Inr => format!(
            "Search USD INR exchange rate today {today}. \
             Return JSON: {{\"rate\":\"XX.XX\",\"change\":\"+/-X.XX\",\"signal\":\"rupee_strong/rupee_weak/stable\"}}"
        ),
        Topic::FiiDii => format!(
            "Search FII DII activity NSE India {today}. \
             Return JSON: {{\"fii\":{{\"buy\":\"XXXX\",\"sell\":\"XXXX\",\"net\":\"+/-XXXX\"}},\"dii\":{{\"buy\":\"XXXX\",\"sell\":\"XXXX\",\"net\":\"+/-XXXX\"}},\"signal\":\"both_buying/both_selling/mixed\"}}"
        ),
        Topic::Pivot => format!(
            "Search Nifty 50 yesterday OHLC calculate standard pivot points {today}. \
             Return JSON: {{\"prev_high\":\"XXXXX\",\"prev_low\":\"XXXXX\",\"prev_close\":\"XXXXX\",\"r3\":\"XXXXX\",\"r2\":\"XXXXX\",\"r1\":\"XXXXX\",\"pp\":\"XXXXX\",\"s1\":\"XXXXX\",\"s2\":\"XXXXX\",\"s3\":\"XXXXX\"}}"
        ),
        Topic::Oi => format!(
            "Search Nifty 50 options max pain PCR weekly expiry {today}. \
             Return JSON: {{\"max_pain\":\"XXXXX\",\"pcr\":\"X.XX\",\"pcr_signal\":\"bullish/bearish/neutral\",\"top_ce_strike\":\"XXXXX\",\"top_pe_strike\":\"XXXXX\"}}"
        ),
        Topic::GlobalMarkets => format!(
            "Search overnight Dow Jones Nasdaq Nikkei Hang Seng FTSE {today}. \
             Return JSON array: [{{\"name\":\"...\",\"value\":\"...\",\"change\":\"+/-XXX\",\"pct\":\"+/-X.XX%\"}}]"
        ),
        Topic::Sentiment => format!(
            "Rate overall Nifty 50 opening sentiment {today} based on Gift Nifty crude VIX FII global USD/INR. \
             Return JSON: {{\"score\":50,\"label\":\"Bullish\",\"summary\":\"2 sentences\"}}"
        ),
        Topic::Perspectives => format!(
            "Identify the single most important event for Nifty 50 today {today} and give bull, neutral and bear readings of it. \
             Return JSON: {{\"key_event\":\"under 12 words\",\"bull_view\":\"2 sentences\",\"neutral_view\":\"2 sentences\",\"bear_view\":\"2 sentences\"}}"
        ),
    };

    format!("{}\n\n{}", body, JSON_ONLY)
}

/// Sectioned pre-open brief.
pub fn morning_brief_prompt(clock: &RunClock) -> String {
    format!(
        "Write concise Nifty 50 morning brief for {}. Sections: \
         GIFT NIFTY: | CRUDE OIL: | USD/INR: | INDIA VIX: | GLOBAL MARKETS: | \
         FII+DII FLOWS: | PIVOT LEVELS: | OI & MAX PAIN: | TRADING VERDICT: \
         2-3 sentences each with numbers. TRADING VERDICT: gap expectation, bias, key levels, trade idea.",
        clock.date_label()
    )
}

/// Short commentary for an intraday run, grounded in the merged snapshot.
pub fn intraday_prompt(snapshot: &Snapshot, clock: &RunClock) -> String {
    let prediction = &snapshot.morning_prediction;
    format!(
        "Nifty 50 intraday update for {} on {}. \
         Current Nifty: {} ({}). \
         Morning prediction was {} with score {}. \
         VIX: {}. \
         In 3-4 sentences: Was the morning prediction correct? What is the current trend? \
         What should traders watch for in the next session? Any key pivot levels being tested?",
        snapshot.session.label(),
        clock.date_label(),
        snapshot.nifty.price.grouped(2),
        snapshot.nifty.change.signed(2),
        prediction.bias,
        prediction.score,
        snapshot.vix.value.grouped(2),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::Num;
    use chrono::{TimeZone, Utc};

    fn clock() -> RunClock {
        // 08:00 IST
        RunClock::at(Utc.with_ymd_and_hms(2024, 3, 18, 2, 30, 0).unwrap())
    }

    #[test]
    fn test_topic_prompts_carry_date_and_json_instruction() {
        let prompt = topic_prompt(Topic::Nifty, &clock());
        assert!(prompt.contains("Monday, 18 March 2024 08:00 IST"));
        assert!(prompt.contains("\"trend\":\"bullish/bearish/neutral\""));
        assert!(prompt.ends_with(JSON_ONLY));

        let prompt = topic_prompt(Topic::GlobalMarkets, &clock());
        assert!(prompt.contains("Return JSON array"));
    }

    #[test]
    fn test_intraday_prompt_uses_snapshot_values() {
        let mut snapshot = Snapshot::default();
        snapshot.session = brief_core::Session::Session2;
        snapshot.nifty.price = Num::Known(22450.5);
        snapshot.nifty.change = Num::Known(-12.0);
        snapshot.morning_prediction.bias = "Bullish".to_string();
        snapshot.morning_prediction.score = 68;

        let prompt = intraday_prompt(&snapshot, &clock());
        assert!(prompt.contains("Afternoon Update"));
        assert!(prompt.contains("Current Nifty: 22,450.50 (-12.00)"));
        assert!(prompt.contains("Bullish with score 68"));
        assert!(prompt.contains("VIX: N/A"));
    }

    #[test]
    fn test_morning_prompt_lists_verdict_section() {
        let prompt = morning_brief_prompt(&clock());
        assert!(prompt.contains("TRADING VERDICT:"));
        assert!(prompt.contains("Monday, 18 March 2024"));
    }
}
