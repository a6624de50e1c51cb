use crate::fetch::fetch_or_default;
use crate::{BriefPipeline, RunOutcome};
use async_trait::async_trait;
use brief_core::{
    BriefError, GiftNifty, IndexQuote, MarketDataSource, NarrativeKind, Num, RunClock, Session,
    Snapshot, Topic, Trend, Verdict, DEFAULT_BRIEF,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// In-memory data source with scripted replies.
struct FakeSource {
    replies: HashMap<Topic, Value>,
    failing: HashSet<Topic>,
    narrative: Result<String, String>,
    calls: Mutex<Vec<Topic>>,
}

impl FakeSource {
    fn new() -> Self {
        let mut replies = HashMap::new();
        replies.insert(
            Topic::Nifty,
            json!({"price": "22,000", "change": "+40.5", "pct": "+0.18%", "high": "22,050", "low": "21,930", "trend": "bullish"}),
        );
        replies.insert(Topic::Vix, json!({"value": "13.80", "change": "-0.40", "level": "low"}));
        replies.insert(
            Topic::News,
            json!([{"tag": "MACRO", "headline": "RBI holds rates", "impact": "positive", "time": "08:40"}]),
        );
        replies.insert(
            Topic::Gift,
            json!({"value": "22,060", "change": "+60", "pct": "+0.27%", "gap_pts": "+60", "signal": "gap_up"}),
        );
        replies.insert(Topic::Crude, json!({"price": "78.20", "change": "-0.6", "pct": "-0.76%", "signal": "bullish"}));
        replies.insert(Topic::Inr, json!({"rate": "83.12", "change": "-0.05", "signal": "rupee_strong"}));
        replies.insert(
            Topic::FiiDii,
            json!({"fii": {"buy": "12,000", "sell": "10,500", "net": "+1,500"}, "dii": {"buy": "9,000", "sell": "9,400", "net": "-400"}, "signal": "mixed"}),
        );
        replies.insert(
            Topic::Pivot,
            json!({"prev_high": "22,100", "prev_low": "21,800", "prev_close": "21,960", "r3": "22,460", "r2": "22,260", "r1": "22,120", "pp": "21,950", "s1": "21,820", "s2": "21,650", "s3": "21,450"}),
        );
        replies.insert(
            Topic::Oi,
            json!({"max_pain": "22,000", "pcr": "1.12", "pcr_signal": "bullish", "top_ce_strike": "22,500", "top_pe_strike": "21,500"}),
        );
        replies.insert(
            Topic::GlobalMarkets,
            json!([{"name": "Dow Jones", "value": "39,100", "change": "+210", "pct": "+0.54%"}]),
        );
        replies.insert(Topic::Sentiment, json!({"score": 70, "label": "Bullish", "summary": "Positive cues."}));
        replies.insert(
            Topic::Perspectives,
            json!({"key_event": "RBI policy outcome", "bull_view": "Rate pause lifts banks.", "neutral_view": "Priced in.", "bear_view": "Hawkish tone caps upside."}),
        );

        Self {
            replies,
            failing: HashSet::new(),
            narrative: Ok("GIFT NIFTY: up.\n\nTRADING VERDICT: Buy dips.".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_reply(mut self, topic: Topic, reply: Value) -> Self {
        self.replies.insert(topic, reply);
        self
    }

    fn failing(mut self, topic: Topic) -> Self {
        self.failing.insert(topic);
        self
    }

    fn with_narrative_error(mut self) -> Self {
        self.narrative = Err("quota exhausted".to_string());
        self
    }

    fn called(&self) -> Vec<Topic> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn fetch_topic(&self, topic: Topic, _clock: &RunClock) -> Result<Value, BriefError> {
        self.calls.lock().unwrap().push(topic);
        if self.failing.contains(&topic) {
            return Err(BriefError::Fetch(format!("{} unavailable", topic.key())));
        }
        self.replies
            .get(&topic)
            .cloned()
            .ok_or_else(|| BriefError::Fetch("no reply scripted".to_string()))
    }

    async fn narrate(
        &self,
        kind: NarrativeKind,
        _context: &Snapshot,
        _clock: &RunClock,
    ) -> Result<String, BriefError> {
        match (&self.narrative, kind) {
            (Ok(text), NarrativeKind::MorningBrief) => Ok(text.clone()),
            (Ok(_), NarrativeKind::IntradayUpdate) => Ok("Holding above PP.".to_string()),
            (Err(e), _) => Err(BriefError::Api(e.clone())),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// IST wall-clock on 18 March 2024 (or a later day).
fn ist(day: u32, hour: u32, minute: u32) -> RunClock {
    let local = chrono::FixedOffset::east_opt(brief_core::IST_OFFSET_SECS)
        .unwrap()
        .with_ymd_and_hms(2024, 3, day, hour, minute, 0)
        .unwrap();
    RunClock::at(local.with_timezone(&Utc))
}

fn run(source: FakeSource, previous: &Snapshot, clock: RunClock) -> (RunOutcome, Arc<FakeSource>) {
    let source = Arc::new(source);
    let pipeline = BriefPipeline::new(source.clone());
    let outcome = tokio_test::block_on(pipeline.run(previous, &clock));
    (outcome, source)
}

#[test]
fn test_intraday_run_carries_morning_topics_verbatim() {
    let mut previous = Snapshot::default();
    previous.gift = GiftNifty {
        value: Num::Known(100.0),
        ..GiftNifty::default()
    };
    previous.sentiment.label = "Bearish".to_string();
    previous.perspectives.key_event = "Budget day".to_string();

    let source = FakeSource::new().with_reply(
        Topic::Nifty,
        json!({"price": "22,210", "change": "+250", "trend": "bullish"}),
    );
    let (outcome, source) = run(source, &previous, ist(18, 11, 30));
    let snapshot = outcome.snapshot;

    assert_eq!(snapshot.session, Session::Session2);
    assert_eq!(snapshot.gift.value, Num::Known(100.0));
    assert_eq!(snapshot.gift, previous.gift);
    assert_eq!(snapshot.sentiment, previous.sentiment);
    assert_eq!(snapshot.perspectives, previous.perspectives);
    assert_eq!(snapshot.nifty.price, Num::Known(22210.0));

    let called = source.called();
    assert!(Topic::INTRADAY.iter().all(|t| called.contains(t)));
    assert!(Topic::MORNING.iter().all(|t| !called.contains(t)));
}

#[test]
fn test_morning_prediction_fixed_until_next_morning() {
    let (morning, _) = run(FakeSource::new(), &Snapshot::default(), ist(18, 8, 0));
    let morning = morning.snapshot;
    assert_eq!(morning.morning_prediction.bias, "Bullish");
    assert_eq!(morning.morning_prediction.score, 70);
    assert_eq!(morning.morning_prediction.nifty_open, Num::Known(22000.0));
    assert_eq!(morning.morning_prediction.pivot_pp, Num::Known(21950.0));
    assert_eq!(morning.morning_prediction.time, "08:00");

    let s1_source = FakeSource::new()
        .with_reply(Topic::Nifty, json!({"price": "22,100", "change": "+100"}))
        .with_reply(Topic::Sentiment, json!({"score": 20, "label": "Bearish"}));
    let (s1, _) = run(s1_source, &morning, ist(18, 9, 30));
    let s1 = s1.snapshot;

    let (s2, _) = run(FakeSource::new(), &s1, ist(18, 11, 30));
    let s2 = s2.snapshot;

    assert_eq!(s1.morning_prediction, morning.morning_prediction);
    assert_eq!(s2.morning_prediction, s1.morning_prediction);

    let next_source = FakeSource::new()
        .with_reply(Topic::Sentiment, json!({"score": 30, "label": "Bearish"}));
    let (next_morning, _) = run(next_source, &s2, ist(19, 8, 0));
    let next_morning = next_morning.snapshot;
    assert_ne!(next_morning.morning_prediction, s2.morning_prediction);
    assert_eq!(next_morning.morning_prediction.bias, "Bearish");
    assert_eq!(next_morning.morning_prediction.score, 30);
}

#[test]
fn test_intraday_run_derives_accuracy_and_alerts() {
    let (morning, _) = run(FakeSource::new(), &Snapshot::default(), ist(18, 8, 0));
    let morning = morning.snapshot;
    assert!(morning.accuracy.is_none());
    assert!(morning.pivot_alerts.is_empty());
    assert_eq!(morning.intraday_analysis, None);

    let source = FakeSource::new()
        .with_reply(Topic::Nifty, json!({"price": "22,130", "change": "+130", "trend": "bullish"}));
    let (s1, _) = run(source, &morning, ist(18, 9, 30));
    let s1 = s1.snapshot;

    let accuracy = s1.accuracy.expect("intraday runs score the morning call");
    assert_eq!(accuracy.move_pts, "+130");
    assert_eq!(accuracy.correct, Some(true));
    assert_eq!(accuracy.verdict, Verdict::OnTrack);

    // 22,130 sits 0.08% from R1 22,120
    assert_eq!(s1.pivot_alerts.len(), 1);
    assert_eq!(s1.pivot_alerts[0].level, brief_core::PivotLabel::R1);
    assert_eq!(s1.pivot_alerts[0].kind, brief_core::BreachKind::At);

    assert_eq!(s1.intraday_analysis.as_deref(), Some("Holding above PP."));
    assert_eq!(s1.brief, morning.brief);
}

#[test]
fn test_first_intraday_run_without_morning_is_tracking() {
    let (outcome, _) = run(FakeSource::new(), &Snapshot::default(), ist(18, 13, 40));
    let snapshot = outcome.snapshot;

    assert_eq!(snapshot.session, Session::Session3);
    let accuracy = snapshot.accuracy.unwrap();
    assert_eq!(accuracy.verdict, Verdict::Tracking);
    assert_eq!(accuracy.correct, None);
    assert!(snapshot.pivot_alerts.is_empty());
    assert_eq!(snapshot.brief, DEFAULT_BRIEF);
}

#[test]
fn test_morning_run_refreshes_perspectives() {
    let mut previous = Snapshot::default();
    previous.perspectives.key_event = "Yesterday's event".to_string();

    let (outcome, source) = run(FakeSource::new(), &previous, ist(18, 8, 0));
    let perspectives = &outcome.snapshot.perspectives;

    assert!(source.called().contains(&Topic::Perspectives));
    assert_eq!(perspectives.key_event, "RBI policy outcome");
    assert_eq!(perspectives.bear_view, "Hawkish tone caps upside.");
}

#[test]
fn test_failed_topics_degrade_without_aborting() {
    let source = FakeSource::new()
        .failing(Topic::Nifty)
        .failing(Topic::Pivot)
        .with_reply(Topic::Crude, json!("not an object"));
    let (outcome, _) = run(source, &Snapshot::default(), ist(18, 8, 0));

    assert_eq!(outcome.degraded, vec![Topic::Nifty, Topic::Crude, Topic::Pivot]);
    let snapshot = outcome.snapshot;
    assert_eq!(snapshot.nifty, IndexQuote::default());
    assert_eq!(snapshot.nifty.trend, Trend::Neutral);
    assert_eq!(snapshot.crude, brief_core::CrudeOil::default());
    assert_eq!(snapshot.pivot, brief_core::PivotLevels::default());
    assert_eq!(snapshot.morning_prediction.nifty_open, Num::Unknown);
    assert_eq!(snapshot.morning_prediction.pivot_pp, Num::Unknown);
    assert_eq!(snapshot.vix.value, Num::Known(13.8));
}

#[test]
fn test_narrative_failure_keeps_placeholder_brief() {
    let source = FakeSource::new().with_narrative_error();
    let (outcome, _) = run(source, &Snapshot::default(), ist(18, 8, 0));
    assert_eq!(outcome.snapshot.brief, DEFAULT_BRIEF);
    assert!(outcome.degraded.is_empty());
}

#[test]
fn test_timeline_keeps_one_row_per_session() {
    let (morning, _) = run(FakeSource::new(), &Snapshot::default(), ist(18, 8, 0));
    let (s1, _) = run(FakeSource::new(), &morning.snapshot, ist(18, 9, 30));
    let rerun_source =
        FakeSource::new().with_reply(Topic::Nifty, json!({"price": "22,080", "change": "+80"}));
    let (s1_again, _) = run(rerun_source, &s1.snapshot, ist(18, 10, 45));

    let timeline = &s1_again.snapshot.all_sessions;
    let sessions: Vec<Session> = timeline.iter().map(|e| e.session).collect();
    assert_eq!(sessions, vec![Session::MorningBrief, Session::Session1]);
    let last = timeline.last().unwrap();
    assert_eq!(last.time, "10:45");
    assert_eq!(last.nifty, Num::Known(22080.0));
}

#[test]
fn test_same_inputs_produce_identical_snapshot() {
    let (morning, _) = run(FakeSource::new(), &Snapshot::default(), ist(18, 8, 0));
    let (a, _) = run(FakeSource::new(), &morning.snapshot, ist(18, 11, 30));
    let (b, _) = run(FakeSource::new(), &morning.snapshot, ist(18, 11, 30));

    let a = serde_json::to_string_pretty(&a.snapshot).unwrap();
    let b = serde_json::to_string_pretty(&b.snapshot).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_snapshot_json_round_trip() {
    let (morning, _) = run(FakeSource::new(), &Snapshot::default(), ist(18, 8, 0));
    let (s1, _) = run(FakeSource::new(), &morning.snapshot, ist(18, 9, 30));
    let snapshot = s1.snapshot;

    let encoded = serde_json::to_string_pretty(&snapshot).unwrap();
    let decoded: Snapshot = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, snapshot);

    let value: Value = serde_json::from_str(&encoded).unwrap();
    for key in [
        "nifty", "vix", "news", "gift", "crude", "inr", "fiidii", "pivot", "oi",
        "global_markets", "sentiment", "perspectives", "morning_prediction", "accuracy", "pivot_alerts",
        "all_sessions", "session", "session_label", "updated_time", "updated_date",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    assert_eq!(value["session"], "session_1");
    assert_eq!(value["updated_date"], "Monday, 18 March 2024");
}

#[tokio::test]
async fn test_fetch_or_default_flags_fallbacks() {
    let source = FakeSource::new().failing(Topic::Vix);
    let clock = ist(18, 8, 0);

    let nifty: crate::Fetched<IndexQuote> =
        fetch_or_default(&source, Topic::Nifty, &clock).await;
    assert!(!nifty.used_default);
    assert_eq!(nifty.value.price, Num::Known(22000.0));

    let vix: crate::Fetched<brief_core::VixReading> =
        fetch_or_default(&source, Topic::Vix, &clock).await;
    assert!(vix.used_default);
    assert_eq!(vix.value, brief_core::VixReading::default());
}
