use brief_core::{BreachKind, Num, PivotAlert, PivotLevels};

/// Price within this percentage of a level counts as testing it.
pub const AT_LEVEL_PCT: f64 = 0.3;
pub const MAX_ALERTS: usize = 3;

/// Flag the pivot levels the current price is sitting on or has broken.
///
/// Levels are scanned R3 down to S3. Resistances only alert when broken to
/// the upside and supports only to the downside; PP only alerts when the
/// price is at it. An unknown price yields no alerts.
///
/// Unknown or non-positive levels are skipped one at a time: a zero PP or a
/// negative support drops only that level, and the remaining levels are still
/// checked against the price.
pub fn detect_breaches(current_price: Num, pivots: &PivotLevels) -> Vec<PivotAlert> {
    let Num::Known(price) = current_price else {
        return Vec::new();
    };

    pivots
        .ordered()
        .into_iter()
        .filter_map(|(label, level)| {
            let value = level.value().filter(|v| *v > 0.0)?;
            let pct_dist = (price - value).abs() / value * 100.0;

            let kind = if pct_dist < AT_LEVEL_PCT {
                BreachKind::At
            } else if price > value && label.is_resistance() {
                BreachKind::Above
            } else if price < value && label.is_support() {
                BreachKind::Below
            } else {
                return None;
            };

            Some(PivotAlert {
                level: label,
                value: level,
                kind,
            })
        })
        .take(MAX_ALERTS)
        .collect()
}
