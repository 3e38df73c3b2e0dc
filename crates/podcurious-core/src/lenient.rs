//! Forgiving deserializers for numbers and strings written by a language model.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn minutes<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(minutes_from_value(&v))
}

pub(crate) fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// `null` becomes empty; numbers and other scalars keep their JSON text.
pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(string_from_value(v))
}

/// A list of strings, or a single bare string; `null` entries are dropped.
pub(crate) fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::Array(items) => items
            .into_iter()
            .filter(|i| !i.is_null())
            .map(string_from_value)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![string_from_value(other)],
    })
}

/// `null` reads as the type's default.
pub(crate) fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn string_from_value(v: Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Whole minutes from whatever JSON the model (or a client) sent; unusable values become 0.
pub fn minutes_from_value(v: &Value) -> u32 {
    let clamp = |f: f64| -> u32 {
        if f.is_finite() && f > 0.0 {
            f.round().min(u32::MAX as f64) as u32
        } else {
            0
        }
    };
    match v {
        Value::Number(n) => match n.as_u64() {
            Some(u) => u.min(u32::MAX as u64) as u32,
            None => n.as_f64().map(clamp).unwrap_or(0),
        },
        Value::String(s) => s.trim().parse::<f64>().map(clamp).unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_accepts_numbers_and_numeric_strings() {
        assert_eq!(minutes_from_value(&serde_json::json!(42)), 42);
        assert_eq!(minutes_from_value(&serde_json::json!(42.6)), 43);
        assert_eq!(minutes_from_value(&serde_json::json!(" 30 ")), 30);
        assert_eq!(minutes_from_value(&serde_json::json!(-5)), 0);
        assert_eq!(minutes_from_value(&serde_json::json!("about an hour")), 0);
        assert_eq!(minutes_from_value(&Value::Null), 0);
    }

    #[test]
    fn strings_tolerate_null_and_scalars() {
        assert_eq!(string_from_value(Value::Null), "");
        assert_eq!(string_from_value(serde_json::json!(2024)), "2024");
        assert_eq!(string_from_value(serde_json::json!(true)), "true");
        assert_eq!(string_from_value(serde_json::json!("x")), "x");
    }
}
