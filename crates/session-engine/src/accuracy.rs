use brief_core::{Accuracy, MorningPrediction, Num, Verdict, UNKNOWN_TEXT};

/// Moves smaller than this (in index points) count as flat.
pub const FLAT_MOVE_PTS: f64 = 30.0;
/// Scores above this are a bullish call.
pub const BULLISH_ABOVE: u8 = 55;
/// Scores below this are a bearish call.
pub const BEARISH_BELOW: u8 = 45;

/// Check the morning call against the live price.
///
/// Recomputed from scratch on every intraday run, so the verdict can flip as
/// the price moves. Returns the `Tracking` state when either price is unknown,
/// so an intraday run with no recorded morning open never reports `Reversed`.
pub fn evaluate(prediction: &MorningPrediction, current_price: Num) -> Accuracy {
    let (open, current) = match (prediction.nifty_open, current_price) {
        (Num::Known(open), Num::Known(current)) => (open, current),
        _ => return tracking(prediction, current_price),
    };

    let move_pts = current - open;
    let correct = prediction_holds(move_pts, prediction.score);

    Accuracy {
        morning_bias: prediction.bias.clone(),
        open_price: prediction.nifty_open,
        current_price,
        move_pts: format_move(move_pts),
        correct: Some(correct),
        verdict: if correct {
            Verdict::OnTrack
        } else {
            Verdict::Reversed
        },
    }
}

/// Bullish call and price up, bearish call and price down, or a neutral call
/// with a flat move.
pub fn prediction_holds(move_pts: f64, score: u8) -> bool {
    (move_pts > 0.0 && score > BULLISH_ABOVE)
        || (move_pts < 0.0 && score < BEARISH_BELOW)
        || (move_pts.abs() < FLAT_MOVE_PTS && (BEARISH_BELOW..=BULLISH_ABOVE).contains(&score))
}

fn tracking(prediction: &MorningPrediction, current_price: Num) -> Accuracy {
    Accuracy {
        morning_bias: prediction.bias.clone(),
        open_price: prediction.nifty_open,
        current_price,
        move_pts: UNKNOWN_TEXT.to_string(),
        correct: None,
        verdict: Verdict::Tracking,
    }
}

fn format_move(move_pts: f64) -> String {
    if move_pts >= 0.0 {
        format!("+{:.0}", move_pts)
    } else {
        format!("{:.0}", move_pts)
    }
}
