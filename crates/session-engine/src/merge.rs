use brief_core::{MorningPrediction, RunClock, Snapshot, DEFAULT_BRIEF};

use crate::fetch::{FreshData, MorningData};
use crate::{accuracy, pivots, timeline};

/// Build this run's snapshot from the previous one and the fresh fetches.
///
/// Nifty, VIX and news always come from `fresh`. The morning topics come from
/// `fresh.morning` on the morning run and are copied verbatim from `previous`
/// otherwise, along with the morning prediction and brief. Intraday runs also
/// derive the accuracy verdict and pivot alerts.
///
/// Pure apart from the timestamps carried by `clock`.
pub fn merge_snapshot(previous: &Snapshot, clock: &RunClock, fresh: FreshData) -> Snapshot {
    let session = clock.session();
    let intraday = fresh.intraday;

    let mut snapshot = Snapshot {
        nifty: intraday.nifty.value,
        vix: intraday.vix.value,
        news: intraday.news.value,
        ..Snapshot::default()
    };

    match fresh.morning.filter(|_| session.is_morning()) {
        Some(morning) => apply_morning(&mut snapshot, morning, clock),
        None => carry_forward(&mut snapshot, previous),
    }

    if !session.is_morning() {
        snapshot.accuracy = Some(accuracy::evaluate(
            &snapshot.morning_prediction,
            snapshot.nifty.price,
        ));
        snapshot.pivot_alerts = pivots::detect_breaches(snapshot.nifty.price, &snapshot.pivot);
    }

    snapshot.session = session;
    snapshot.session_label = session.label().to_string();
    snapshot.updated_time = clock.time_label();
    snapshot.updated_date = clock.date_label();

    let entry = timeline::entry_for(clock, session, &snapshot.nifty);
    snapshot.all_sessions = timeline::accumulate(previous.all_sessions.clone(), entry);

    snapshot
}

fn apply_morning(snapshot: &mut Snapshot, morning: MorningData, clock: &RunClock) {
    snapshot.gift = morning.gift.value;
    snapshot.crude = morning.crude.value;
    snapshot.inr = morning.inr.value;
    snapshot.fiidii = morning.fiidii.value;
    snapshot.pivot = morning.pivot.value;
    snapshot.oi = morning.oi.value;
    snapshot.global_markets = morning.global_markets.value;
    snapshot.sentiment = morning.sentiment.value;
    snapshot.perspectives = morning.perspectives.value;
    snapshot.brief = DEFAULT_BRIEF.to_string();

    snapshot.morning_prediction = MorningPrediction {
        bias: snapshot.sentiment.label.clone(),
        score: snapshot.sentiment.score,
        pivot_pp: snapshot.pivot.pp,
        nifty_open: snapshot.nifty.price,
        time: clock.time_label(),
    };
}

fn carry_forward(snapshot: &mut Snapshot, previous: &Snapshot) {
    snapshot.gift = previous.gift.clone();
    snapshot.crude = previous.crude.clone();
    snapshot.inr = previous.inr.clone();
    snapshot.fiidii = previous.fiidii.clone();
    snapshot.pivot = previous.pivot.clone();
    snapshot.oi = previous.oi.clone();
    snapshot.global_markets = previous.global_markets.clone();
    snapshot.sentiment = previous.sentiment.clone();
    snapshot.perspectives = previous.perspectives.clone();
    snapshot.morning_prediction = previous.morning_prediction.clone();
    snapshot.brief = previous.brief.clone();
}
