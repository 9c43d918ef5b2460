//! Parsing of gain values written either as linear numbers or as dB strings.

use serde::de::{Error as DeError, Visitor};
use serde::Deserializer;
use std::fmt;

/// Convert a dB value to linear gain.
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Deserialize a linear gain that may also be given as `"-6db"`.
pub fn deserialize_linear_gain<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    struct GainVisitor;

    impl<'de> Visitor<'de> for GainVisitor {
        type Value = f32;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a string like \"6db\"")
        }

        fn visit_f64<E: DeError>(self, value: f64) -> Result<Self::Value, E> {
            Ok(value as f32)
        }

        fn visit_i64<E: DeError>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value as f32)
        }

        fn visit_u64<E: DeError>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value as f32)
        }

        fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
            parse_linear_or_db(value)
                .ok_or_else(|| DeError::custom(format!("invalid gain value \"{}\"", value)))
        }
    }

    deserializer.deserialize_any(GainVisitor)
}

fn parse_linear_or_db(value: &str) -> Option<f32> {
    let lower = value.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    match lower.strip_suffix("db") {
        Some(db) => db.trim().parse::<f32>().ok().map(db_to_linear),
        None => lower.parse::<f32>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_db_and_linear_strings() {
        assert_eq!(parse_linear_or_db("0db"), Some(1.0));
        assert_eq!(parse_linear_or_db(" 0.5 "), Some(0.5));
        assert!((parse_linear_or_db("-6DB").unwrap() - 0.501_187).abs() < 1e-4);
        assert_eq!(parse_linear_or_db("loud"), None);
        assert_eq!(parse_linear_or_db(""), None);
    }
}
