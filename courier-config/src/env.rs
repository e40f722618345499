// Environment layer

use serde_json::{Number, Value};

/// Keep `PREFIX_*` variables, strip the prefix and lower-case the rest.
pub fn prefixed<I>(prefix: &str, vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| {
            let rest = key.strip_prefix(prefix)?.strip_prefix('_')?;
            (!rest.is_empty()).then(|| (rest.to_lowercase(), value))
        })
        .collect()
}

/// Convert a raw string to the JSON type of the value it overrides.
///
/// Only numeric and boolean slots are converted; everything else, including
/// keys without a seeded value, stays a string. A value that does not parse
/// is kept as a string so deserialization reports it against its key.
pub(crate) fn coerce(seeded: Option<&Value>, raw: String) -> Value {
    match seeded {
        Some(Value::Number(_)) => match serde_json::from_str::<Number>(raw.trim()) {
            Ok(n) => Value::Number(n),
            Err(_) => Value::String(raw),
        },
        Some(Value::Bool(_)) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Value::Bool(true),
            "false" | "0" | "no" => Value::Bool(false),
            _ => Value::String(raw),
        },
        _ => Value::String(raw),
    }
}
