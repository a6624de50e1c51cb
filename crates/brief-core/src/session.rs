use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// India Standard Time, UTC+5:30.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

const SESSION_1_START: u32 = 9 * 60 + 15;
const SESSION_2_START: u32 = 11 * 60 + 15;
const SESSION_3_START: u32 = 13 * 60 + 15;
const CLOSING_START: u32 = 15 * 60 + 15;

/// Trading-day window a scheduled run falls into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Session {
    #[default]
    MorningBrief,
    #[serde(rename = "session_1")]
    Session1,
    #[serde(rename = "session_2")]
    Session2,
    #[serde(rename = "session_3")]
    Session3,
    Closing,
}

impl Session {
    pub const ALL: [Session; 5] = [
        Session::MorningBrief,
        Session::Session1,
        Session::Session2,
        Session::Session3,
        Session::Closing,
    ];

    /// Classify a minute of the day (0..1440) using half-open windows.
    pub fn from_minute_of_day(minute: u32) -> Self {
        match minute {
            m if m < SESSION_1_START => Session::MorningBrief,
            m if m < SESSION_2_START => Session::Session1,
            m if m < SESSION_3_START => Session::Session2,
            m if m < CLOSING_START => Session::Session3,
            _ => Session::Closing,
        }
    }

    pub fn at(time: &impl Timelike) -> Self {
        Self::from_minute_of_day(time.hour() * 60 + time.minute())
    }

    pub fn is_morning(&self) -> bool {
        matches!(self, Session::MorningBrief)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Session::MorningBrief => "morning_brief",
            Session::Session1 => "session_1",
            Session::Session2 => "session_2",
            Session::Session3 => "session_3",
            Session::Closing => "closing",
        }
    }

    /// Dashboard label, including the scheduled slot.
    pub fn label(&self) -> &'static str {
        match self {
            Session::MorningBrief => "Morning Brief · 8:00 AM",
            Session::Session1 => "Mid-Morning Update · 9:15 AM",
            Session::Session2 => "Afternoon Update · 11:15 AM",
            Session::Session3 => "Post-Lunch Update · 1:15 PM",
            Session::Closing => "Pre-Close Update · 3:15 PM",
        }
    }

    /// Short label for push messages.
    pub fn short_label(&self) -> &'static str {
        match self {
            Session::MorningBrief => "Morning Brief",
            Session::Session1 => "Market Open",
            Session::Session2 => "Mid-Morning",
            Session::Session3 => "Post-Lunch",
            Session::Closing => "Pre-Close",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The single notion of "now" for one run, pinned to IST.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunClock {
    now: DateTime<FixedOffset>,
}

impl RunClock {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            now: instant.with_timezone(&ist()),
        }
    }

    pub fn local(&self) -> DateTime<FixedOffset> {
        self.now
    }

    pub fn session(&self) -> Session {
        Session::at(&self.now)
    }

    /// `HH:MM`
    pub fn time_label(&self) -> String {
        self.now.format("%H:%M").to_string()
    }

    /// e.g. `Monday, 18 March 2024`
    pub fn date_label(&self) -> String {
        self.now.format("%A, %d %B %Y").to_string()
    }
}

fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}
