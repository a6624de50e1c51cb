use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::numeric::{lenient_score, Num};
use crate::session::Session;

fn normalize_label(text: &str) -> String {
    text.trim()
        .to_ascii_lowercase()
        .replace([' ', '-', '/'], "_")
}

/// Categorical market field decoded case-insensitively, with a neutral
/// fallback for anything unrecognised.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident (fallback = $fallback:ident) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$fallback
            }
        }

        impl From<String> for $name {
            fn from(text: String) -> Self {
                let normalized = normalize_label(&text);
                $(
                    if normalized == normalize_label($text) {
                        return $name::$variant;
                    }
                )+
                $name::$fallback
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum! {
    /// Direction of a market or instrument.
    Trend (fallback = Neutral) {
        Bullish => "bullish",
        Bearish => "bearish",
        Neutral => "neutral",
    }
}

labelled_enum! {
    VixLevel (fallback = Moderate) {
        Low => "low",
        Moderate => "moderate",
        Elevated => "elevated",
        High => "high",
    }
}

labelled_enum! {
    /// Expected opening gap implied by Gift Nifty.
    GapSignal (fallback = Flat) {
        GapUp => "gap_up",
        GapDown => "gap_down",
        Flat => "flat",
    }
}

labelled_enum! {
    RupeeSignal (fallback = Stable) {
        RupeeStrong => "rupee_strong",
        RupeeWeak => "rupee_weak",
        Stable => "stable",
    }
}

labelled_enum! {
    /// Combined direction of foreign and domestic institutional flows.
    FlowSignal (fallback = Mixed) {
        BothBuying => "both_buying",
        BothSelling => "both_selling",
        Mixed => "mixed",
    }
}

labelled_enum! {
    NewsTag (fallback = Market) {
        Geo => "GEO",
        Market => "MARKET",
        Macro => "MACRO",
    }
}

labelled_enum! {
    Impact (fallback = Neutral) {
        Positive => "positive",
        Negative => "negative",
        Neutral => "neutral",
    }
}

labelled_enum! {
    /// One of the seven standard floor-pivot levels.
    PivotLabel (fallback = Pp) {
        R3 => "R3",
        R2 => "R2",
        R1 => "R1",
        Pp => "PP",
        S1 => "S1",
        S2 => "S2",
        S3 => "S3",
    }
}

impl PivotLabel {
    /// Scan order, highest resistance first.
    pub const ORDER: [PivotLabel; 7] = [
        PivotLabel::R3,
        PivotLabel::R2,
        PivotLabel::R1,
        PivotLabel::Pp,
        PivotLabel::S1,
        PivotLabel::S2,
        PivotLabel::S3,
    ];

    pub fn is_resistance(&self) -> bool {
        self.as_str().starts_with('R')
    }

    pub fn is_support(&self) -> bool {
        self.as_str().starts_with('S')
    }
}

labelled_enum! {
    /// Where the current price sits relative to a pivot level.
    BreachKind (fallback = At) {
        At => "AT",
        Above => "ABOVE",
        Below => "BELOW",
    }
}

labelled_enum! {
    /// Outcome of checking the morning prediction against the live price.
    Verdict (fallback = Tracking) {
        OnTrack => "On Track",
        Reversed => "Reversed",
        Tracking => "Tracking",
    }
}

/// Nifty 50 live quote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexQuote {
    pub price: Num,
    pub change: Num,
    pub pct: Num,
    pub high: Num,
    pub low: Num,
    pub trend: Trend,
}

/// India VIX reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VixReading {
    pub value: Num,
    pub change: Num,
    pub level: VixLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    pub tag: NewsTag,
    pub headline: String,
    pub impact: Impact,
    pub time: String,
}

/// Gift Nifty pre-market indication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiftNifty {
    pub value: Num,
    pub change: Num,
    pub pct: Num,
    pub gap_pts: Num,
    pub signal: GapSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrudeOil {
    pub price: Num,
    pub change: Num,
    pub pct: Num,
    pub signal: Trend,
}

/// USD/INR rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RupeeRate {
    pub rate: Num,
    pub change: Num,
    pub signal: RupeeSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowLeg {
    pub buy: Num,
    pub sell: Num,
    pub net: Num,
}

/// FII/DII cash-market activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstitutionalFlows {
    pub fii: FlowLeg,
    pub dii: FlowLeg,
    pub signal: FlowSignal,
}

/// Previous-day OHLC and the floor pivots derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotLevels {
    pub prev_high: Num,
    pub prev_low: Num,
    pub prev_close: Num,
    pub r3: Num,
    pub r2: Num,
    pub r1: Num,
    pub pp: Num,
    pub s1: Num,
    pub s2: Num,
    pub s3: Num,
}

impl PivotLevels {
    pub fn level(&self, label: PivotLabel) -> Num {
        match label {
            PivotLabel::R3 => self.r3,
            PivotLabel::R2 => self.r2,
            PivotLabel::R1 => self.r1,
            PivotLabel::Pp => self.pp,
            PivotLabel::S1 => self.s1,
            PivotLabel::S2 => self.s2,
            PivotLabel::S3 => self.s3,
        }
    }

    /// Levels paired with their labels in scan order.
    pub fn ordered(&self) -> [(PivotLabel, Num); 7] {
        PivotLabel::ORDER.map(|label| (label, self.level(label)))
    }
}

/// Weekly options positioning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsPositioning {
    pub max_pain: Num,
    pub pcr: Num,
    pub pcr_signal: Trend,
    pub top_ce_strike: Num,
    pub top_pe_strike: Num,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalMarket {
    pub name: String,
    pub value: Num,
    pub change: Num,
    pub pct: Num,
}

/// Overall opening sentiment, 0 (very bearish) to 100 (very bullish).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentiment {
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,
    pub label: String,
    pub summary: String,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            score: 50,
            label: "Neutral".to_string(),
            summary: "N/A".to_string(),
        }
    }
}

/// Bull, neutral and bear readings of the day's key event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Perspectives {
    pub key_event: String,
    pub bull_view: String,
    pub neutral_view: String,
    pub bear_view: String,
}

impl Default for Perspectives {
    fn default() -> Self {
        Self {
            key_event: String::new(),
            bull_view: "Bullish perspective pending.".to_string(),
            neutral_view: "Neutral perspective pending.".to_string(),
            bear_view: "Bearish perspective pending.".to_string(),
        }
    }
}

/// Bias captured once per day by the morning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorningPrediction {
    pub bias: String,
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,
    pub pivot_pp: Num,
    pub nifty_open: Num,
    pub time: String,
}

impl Default for MorningPrediction {
    fn default() -> Self {
        Self {
            bias: "Neutral".to_string(),
            score: 50,
            pivot_pp: Num::Unknown,
            nifty_open: Num::Unknown,
            time: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub morning_bias: String,
    pub open_price: Num,
    pub current_price: Num,
    /// Signed whole points, e.g. `+100`, or `N/A`.
    pub move_pts: String,
    pub correct: Option<bool>,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotAlert {
    pub level: PivotLabel,
    pub value: Num,
    #[serde(rename = "type")]
    pub kind: BreachKind,
}

/// One row of the intraday timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub time: String,
    pub session: Session,
    pub label: String,
    pub nifty: Num,
    pub change: Num,
    #[serde(default)]
    pub trend: Trend,
}

pub const DEFAULT_BRIEF: &str = "Morning brief not yet generated.";

fn default_brief() -> String {
    DEFAULT_BRIEF.to_string()
}

/// Keep a malformed field from discarding the rest of the record.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_brief<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        _ => default_brief(),
    })
}

/// The persisted record for "today".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub nifty: IndexQuote,
    #[serde(default, deserialize_with = "lenient")]
    pub vix: VixReading,
    #[serde(default, deserialize_with = "lenient")]
    pub news: Vec<NewsItem>,
    #[serde(default, deserialize_with = "lenient")]
    pub gift: GiftNifty,
    #[serde(default, deserialize_with = "lenient")]
    pub crude: CrudeOil,
    #[serde(default, deserialize_with = "lenient")]
    pub inr: RupeeRate,
    #[serde(default, deserialize_with = "lenient")]
    pub fiidii: InstitutionalFlows,
    #[serde(default, deserialize_with = "lenient")]
    pub pivot: PivotLevels,
    #[serde(default, deserialize_with = "lenient")]
    pub oi: OptionsPositioning,
    #[serde(default, alias = "global", deserialize_with = "lenient")]
    pub global_markets: Vec<GlobalMarket>,
    #[serde(default, deserialize_with = "lenient")]
    pub sentiment: Sentiment,
    #[serde(default, deserialize_with = "lenient")]
    pub perspectives: Perspectives,
    #[serde(default = "default_brief", deserialize_with = "lenient_brief")]
    pub brief: String,
    #[serde(default, deserialize_with = "lenient")]
    pub morning_prediction: MorningPrediction,
    #[serde(default, deserialize_with = "lenient")]
    pub intraday_analysis: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub accuracy: Option<Accuracy>,
    #[serde(default, deserialize_with = "lenient")]
    pub pivot_alerts: Vec<PivotAlert>,
    #[serde(default, deserialize_with = "lenient")]
    pub session: Session,
    #[serde(default, deserialize_with = "lenient")]
    pub session_label: String,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_time: String,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_date: String,
    #[serde(default, deserialize_with = "lenient")]
    pub all_sessions: Vec<SessionEntry>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            nifty: IndexQuote::default(),
            vix: VixReading::default(),
            news: Vec::new(),
            gift: GiftNifty::default(),
            crude: CrudeOil::default(),
            inr: RupeeRate::default(),
            fiidii: InstitutionalFlows::default(),
            pivot: PivotLevels::default(),
            oi: OptionsPositioning::default(),
            global_markets: Vec::new(),
            sentiment: Sentiment::default(),
            perspectives: Perspectives::default(),
            brief: default_brief(),
            morning_prediction: MorningPrediction::default(),
            intraday_analysis: None,
            accuracy: None,
            pivot_alerts: Vec::new(),
            session: Session::default(),
            session_label: String::new(),
            updated_time: String::new(),
            updated_date: String::new(),
            all_sessions: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Text following "TRADING VERDICT" in the morning brief, up to the next
    /// blank line, whitespace-collapsed and capped at 280 characters.
    pub fn trading_verdict(&self) -> Option<String> {
        let lower = self.brief.to_ascii_lowercase();
        let start = lower.find("trading verdict")? + "trading verdict".len();
        let rest = self.brief[start..].trim_start_matches(':');
        let section = rest.split("\n\n").next().unwrap_or_default();
        let collapsed = section.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            return None;
        }
        Some(collapsed.chars().take(280).collect())
    }
}
