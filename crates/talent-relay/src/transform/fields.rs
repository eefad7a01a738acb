use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

static NULL: Value = Value::Null;

/// Read-only view over an upstream JSON object that never fails.
///
/// Missing keys, `null`, blank strings and values of the wrong type all read
/// as `None`. Navigating into a missing child yields an empty view.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    value: &'a Value,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|value| !value.is_null())
    }

    pub fn child(&self, key: &str) -> Fields<'a> {
        match self.raw(key) {
            Some(value @ Value::Object(_)) => Fields::new(value),
            _ => Fields::new(&NULL),
        }
    }

    /// First element of an array field.
    pub fn first(&self, key: &str) -> Fields<'a> {
        match self.raw(key).and_then(Value::as_array).and_then(|items| items.first()) {
            Some(value) => Fields::new(value),
            None => Fields::new(&NULL),
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_object()
    }

    /// Strings (trimmed, non-empty) and numbers, rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        self.raw(key).and_then(scalar_text)
    }

    /// First non-empty text among `keys`.
    pub fn text_any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.text(key))
    }

    /// Text that some APIs wrap as `{"label": ...}` or `{"name": ...}`.
    pub fn label(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::Object(_) => self.child(key).text_any(&["label", "name"]),
            other => scalar_text(other),
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.raw(key)? {
            Value::Bool(flag) => Some(*flag),
            Value::Number(number) => number.as_i64().map(|n| n != 0),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<Vec<Value>> {
        self.raw(key).and_then(Value::as_array).cloned()
    }

    /// First string (or `{"value": ...}` entry) of an array field.
    pub fn first_text(&self, key: &str) -> Option<String> {
        let items = self.raw(key).and_then(Value::as_array)?;
        items.iter().find_map(|item| match item {
            Value::Object(_) => Fields::new(item).text("value"),
            other => scalar_text(other),
        })
    }

    pub fn timestamp(&self, key: &str) -> Option<String> {
        self.text(key).map(|raw| normalize_timestamp(&raw))
    }

    pub fn timestamp_any(&self, keys: &[&str]) -> Option<String> {
        self.text_any(keys).map(|raw| normalize_timestamp(&raw))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// RFC 3339 in UTC when the input is a recognizable timestamp or date;
/// otherwise the input unchanged.
pub fn normalize_timestamp(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return to_rfc3339(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return to_rfc3339(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return to_rfc3339(midnight.and_utc());
        }
    }

    trimmed.to_string()
}

fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// "First Last" from whichever parts exist.
pub fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let joined = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}
