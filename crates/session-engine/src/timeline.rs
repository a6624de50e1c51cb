use brief_core::{IndexQuote, RunClock, Session, SessionEntry};

/// Timeline row for the current run.
pub fn entry_for(clock: &RunClock, session: Session, nifty: &IndexQuote) -> SessionEntry {
    SessionEntry {
        time: clock.time_label(),
        session,
        label: session.label().to_string(),
        nifty: nifty.price,
        change: nifty.change,
        trend: nifty.trend,
    }
}

/// Replace any earlier row for the same session and append `entry` last.
///
/// Order is insertion order, not clock order: re-running an earlier session
/// after a later one moves its row to the end.
pub fn accumulate(mut timeline: Vec<SessionEntry>, entry: SessionEntry) -> Vec<SessionEntry> {
    timeline.retain(|existing| existing.session != entry.session);
    timeline.push(entry);
    timeline
}
