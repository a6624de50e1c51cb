use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Sentinel written for values that could not be fetched or parsed.
pub const UNKNOWN_TEXT: &str = "N/A";

/// A market number that may be missing.
///
/// Upstream data arrives as loosely formatted text ("22,450.50", "+0.45%",
/// "N/A"). It is parsed once at the decode boundary; everything downstream
/// matches on `Known`/`Unknown` instead of re-parsing strings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Num {
    Known(f64),
    #[default]
    Unknown,
}

impl Num {
    /// Parse loosely formatted market text. Thousands separators, whitespace,
    /// a leading `+` and a trailing `%` are ignored.
    pub fn parse(text: &str) -> Self {
        let cleaned: String = text
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        let cleaned = cleaned.strip_suffix('%').unwrap_or(&cleaned);
        let cleaned = cleaned.strip_prefix('+').unwrap_or(cleaned);

        match cleaned.parse::<f64>() {
            Ok(v) => Self::from_f64(v),
            Err(_) => Num::Unknown,
        }
    }

    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Num::Known(value)
        } else {
            Num::Unknown
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Num::Known(v) => Some(*v),
            Num::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Num::Known(_))
    }

    /// Grouped thousands with up to `decimals` places, e.g. `22,450.50`.
    pub fn grouped(&self, decimals: usize) -> String {
        match self {
            Num::Known(v) => group_thousands(&format!("{:.*}", decimals, v)),
            Num::Unknown => UNKNOWN_TEXT.to_string(),
        }
    }

    /// Signed with an explicit `+` for non-negative values, e.g. `+12.35`.
    pub fn signed(&self, decimals: usize) -> String {
        match self {
            Num::Known(v) if *v >= 0.0 => format!("+{}", group_thousands(&format!("{:.*}", decimals, v))),
            Num::Known(v) => group_thousands(&format!("{:.*}", decimals, v)),
            Num::Unknown => UNKNOWN_TEXT.to_string(),
        }
    }

    /// Signed percentage, e.g. `+0.45%`.
    pub fn percent(&self) -> String {
        match self {
            Num::Known(_) => format!("{}%", self.signed(2)),
            Num::Unknown => UNKNOWN_TEXT.to_string(),
        }
    }
}

impl From<f64> for Num {
    fn from(value: f64) -> Self {
        Num::from_f64(value)
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::Known(v) => write!(f, "{}", v),
            Num::Unknown => f.write_str(UNKNOWN_TEXT),
        }
    }
}

fn group_thousands(formatted: &str) -> String {
    let (sign, rest) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

impl Serialize for Num {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Num::Known(v) => serializer.serialize_f64(*v),
            Num::Unknown => serializer.serialize_str(UNKNOWN_TEXT),
        }
    }
}

struct NumVisitor;

impl<'de> Visitor<'de> for NumVisitor {
    type Value = Num;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string or \"N/A\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Num, E> {
        Ok(Num::from_f64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Num, E> {
        Ok(Num::Known(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Num, E> {
        Ok(Num::Known(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Num, E> {
        Ok(Num::parse(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Num, E> {
        Ok(Num::Unknown)
    }

    fn visit_none<E: de::Error>(self) -> Result<Num, E> {
        Ok(Num::Unknown)
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Num, E> {
        Ok(Num::Unknown)
    }
}

impl<'de> Deserialize<'de> for Num {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumVisitor)
    }
}

/// Decode a 0-100 score that may arrive as a number or numeric text.
/// Out-of-range or unreadable scores fall back to the neutral 50.
pub fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let num = Num::deserialize(deserializer)?;
    Ok(match num.value() {
        Some(v) if (0.0..=100.0).contains(&v) => v.round() as u8,
        _ => 50,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market_text() {
        assert_eq!(Num::parse("22,450.50"), Num::Known(22450.5));
        assert_eq!(Num::parse("+0.45%"), Num::Known(0.45));
        assert_eq!(Num::parse("-120.3"), Num::Known(-120.3));
        assert_eq!(Num::parse(" 22000 "), Num::Known(22000.0));
        assert_eq!(Num::parse("N/A"), Num::Unknown);
        assert_eq!(Num::parse("+/-XX"), Num::Unknown);
        assert_eq!(Num::parse(""), Num::Unknown);
        assert_eq!(Num::parse("inf"), Num::Unknown);
    }

    #[test]
    fn test_presentation_formats() {
        assert_eq!(Num::Known(22450.5).grouped(2), "22,450.50");
        assert_eq!(Num::Known(1234567.0).grouped(0), "1,234,567");
        assert_eq!(Num::Known(-1520.0).grouped(0), "-1,520");
        assert_eq!(Num::Known(12.346).signed(2), "+12.35");
        assert_eq!(Num::Known(-8.0).signed(0), "-8");
        assert_eq!(Num::Known(0.45).percent(), "+0.45%");
        assert_eq!(Num::Unknown.grouped(2), "N/A");
        assert_eq!(Num::Unknown.percent(), "N/A");
    }

    #[test]
    fn test_serde_shapes() {
        assert_eq!(serde_json::to_string(&Num::Known(22000.0)).unwrap(), "22000.0");
        assert_eq!(serde_json::to_string(&Num::Unknown).unwrap(), "\"N/A\"");

        let decoded: Vec<Num> =
            serde_json::from_str(r#"[22000, "22,100.5", "N/A", null, 1.5]"#).unwrap();
        assert_eq!(
            decoded,
            vec![
                Num::Known(22000.0),
                Num::Known(22100.5),
                Num::Unknown,
                Num::Unknown,
                Num::Known(1.5)
            ]
        );
    }

    #[test]
    fn test_lenient_score() {
        #[derive(Deserialize)]
        struct Scored {
            #[serde(deserialize_with = "lenient_score")]
            score: u8,
        }

        let s: Scored = serde_json::from_str(r#"{"score": 70}"#).unwrap();
        assert_eq!(s.score, 70);
        let s: Scored = serde_json::from_str(r#"{"score": "62"}"#).unwrap();
        assert_eq!(s.score, 62);
        let s: Scored = serde_json::from_str(r#"{"score": "high"}"#).unwrap();
        assert_eq!(s.score, 50);
        let s: Scored = serde_json::from_str(r#"{"score": 140}"#).unwrap();
        assert_eq!(s.score, 50);
    }
}
