use brief_core::{Impact, Num, Perspectives, Snapshot, Verdict};
use serde::{Deserialize, Serialize};

const MAX_HEADLINES: usize = 3;
const MAX_VIEW_CHARS: usize = 120;

/// One headline as it appears in a push message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestHeadline {
    pub tag: String,
    pub headline: String,
    pub impact: Impact,
}

/// Everything a push channel needs, read straight off the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefDigest {
    pub session: String,
    pub is_morning: bool,
    pub date: String,
    pub time: String,
    pub nifty_price: Num,
    pub nifty_change: Num,
    pub nifty_pct: Num,
    pub sentiment_score: u8,
    pub sentiment_label: String,
    pub gift_gap: Num,
    pub gift_signal: String,
    pub vix: Num,
    pub vix_level: String,
    pub r1: Num,
    pub pp: Num,
    pub s1: Num,
    pub headlines: Vec<DigestHeadline>,
    /// Accuracy verdict and move, e.g. ("On Track", "+100").
    pub accuracy: Option<(Verdict, String)>,
    pub pivot_alerts: Vec<String>,
    pub trading_verdict: Option<String>,
    /// Morning-only three-view block, present when a key event was reported.
    pub perspectives: Option<Perspectives>,
    pub dashboard_url: Option<String>,
}

impl BriefDigest {
    pub fn from_snapshot(snapshot: &Snapshot, dashboard_url: Option<&str>) -> Self {
        let headlines = snapshot
            .news
            .iter()
            .take(MAX_HEADLINES)
            .map(|item| DigestHeadline {
                tag: item.tag.to_string(),
                headline: item.headline.clone(),
                impact: item.impact,
            })
            .collect();

        let pivot_alerts = snapshot
            .pivot_alerts
            .iter()
            .map(|alert| format!("{} {} {}", alert.kind, alert.level, alert.value.grouped(2)))
            .collect();

        Self {
            session: snapshot.session.short_label().to_string(),
            is_morning: snapshot.session.is_morning(),
            date: snapshot.updated_date.clone(),
            time: snapshot.updated_time.clone(),
            nifty_price: snapshot.nifty.price,
            nifty_change: snapshot.nifty.change,
            nifty_pct: snapshot.nifty.pct,
            sentiment_score: snapshot.sentiment.score,
            sentiment_label: snapshot.sentiment.label.clone(),
            gift_gap: snapshot.gift.gap_pts,
            gift_signal: snapshot.gift.signal.as_str().replace('_', " ").to_uppercase(),
            vix: snapshot.vix.value,
            vix_level: snapshot.vix.level.as_str().to_uppercase(),
            r1: snapshot.pivot.r1,
            pp: snapshot.pivot.pp,
            s1: snapshot.pivot.s1,
            headlines,
            accuracy: snapshot
                .accuracy
                .as_ref()
                .map(|a| (a.verdict, a.move_pts.clone())),
            pivot_alerts,
            trading_verdict: snapshot.trading_verdict(),
            perspectives: morning_perspectives(snapshot),
            dashboard_url: dashboard_url.map(str::to_string),
        }
    }

    /// Subject line shared by every channel.
    pub fn title(&self) -> String {
        format!(
            "{} Nifty {} | {} ({}) | {} {}/100",
            self.mood_marker(),
            self.session,
            self.nifty_price.grouped(2),
            self.nifty_change.signed(2),
            self.sentiment_label,
            self.sentiment_score
        )
    }

    /// Coloured circle keyed off the sentiment score.
    pub fn mood_marker(&self) -> &'static str {
        match self.sentiment_score {
            66.. => "🟢",
            56..=65 => "🟡",
            0..=34 => "🔴",
            35..=44 => "🟠",
            _ => "⚪",
        }
    }

    pub fn rising(&self) -> bool {
        self.nifty_change.value().is_some_and(|c| c >= 0.0)
    }
}

fn morning_perspectives(snapshot: &Snapshot) -> Option<Perspectives> {
    let p = &snapshot.perspectives;
    if !snapshot.session.is_morning() || p.key_event.trim().is_empty() {
        return None;
    }
    Some(Perspectives {
        key_event: p.key_event.trim().to_string(),
        bull_view: clip_view(&p.bull_view),
        neutral_view: clip_view(&p.neutral_view),
        bear_view: clip_view(&p.bear_view),
    })
}

/// First 120 characters followed by an ellipsis.
fn clip_view(view: &str) -> String {
    let clipped: String = view.trim().chars().take(MAX_VIEW_CHARS).collect();
    format!("{}...", clipped)
}

pub(crate) fn impact_marker(impact: Impact) -> &'static str {
    match impact {
        Impact::Positive => "🟢",
        Impact::Negative => "🔴",
        Impact::Neutral => "⚪",
    }
}

/// Minimal escaping for text placed inside HTML bodies.
pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
