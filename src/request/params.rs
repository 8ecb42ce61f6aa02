use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Coerce a raw parameter string.
///
/// Exact canonical integers and decimals become numbers; everything else is
/// returned trimmed as a string.
#[must_use]
pub fn coerce_value(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        if i.to_string() == raw {
            return Value::from(i);
        }
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() && f.to_string() == raw {
            if let Some(n) = Number::from_f64(f) {
                return Value::Number(n);
            }
        }
    }
    Value::String(raw.trim().to_string())
}

/// Split `name[key]` into `("name", Some("key"))`; `name[]` yields `Some("")`.
fn split_bracket(key: &str) -> (&str, Option<&str>) {
    if let Some(open) = key.find('[') {
        if key.ends_with(']') && open > 0 {
            return (&key[..open], Some(&key[open + 1..key.len() - 1]));
        }
    }
    (key, None)
}

/// Parse an `application/x-www-form-urlencoded` string into coerced parameters.
///
/// Scalar keys use "last write wins"; `a[]` keys append to a list and `a[k]`
/// keys insert into an object.
#[must_use]
pub fn parse_params(encoded: &str) -> HashMap<String, Value> {
    let mut params: HashMap<String, Value> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(encoded.as_bytes()) {
        if key.is_empty() {
            continue;
        }
        let coerced = coerce_value(&value);
        match split_bracket(&key) {
            (name, Some("")) => {
                let entry = params
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry {
                    Value::Array(items) => items.push(coerced),
                    other => *other = Value::Array(vec![coerced]),
                }
            }
            (name, Some(sub)) => {
                let entry = params
                    .entry(name.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                match entry {
                    Value::Object(map) => {
                        map.insert(sub.to_string(), coerced);
                    }
                    other => {
                        let mut map = Map::new();
                        map.insert(sub.to_string(), coerced);
                        *other = Value::Object(map);
                    }
                }
            }
            (name, None) => {
                params.insert(name.to_string(), coerced);
            }
        }
    }
    params
}

/// Parse a `Cookie` header value into name/value pairs.
///
/// Values are percent-decoded when they decode to valid UTF-8.
#[must_use]
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let raw = parts.next().unwrap_or("").trim();
            let value = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            Some((name.to_string(), value))
        })
        .collect()
}
