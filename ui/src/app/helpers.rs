use iced::keyboard;
use iced::Color;
use serde_json::Value;

use crate::app::types::Message;

const MAX_STATUS_LINES: usize = 40;
const MAX_VALUE_CHARS: usize = 80;

pub(crate) fn level_color(level: tracing::Level) -> Color {
    match level {
        tracing::Level::ERROR => Color::from_rgb8(0xe0, 0x4f, 0x4f),
        tracing::Level::WARN => Color::from_rgb8(0xe0, 0xb0, 0x4f),
        tracing::Level::INFO => Color::from_rgb8(0x3b, 0x82, 0xf6),
        tracing::Level::DEBUG => Color::from_rgb8(0x22, 0x7d, 0x64),
        tracing::Level::TRACE => Color::from_rgb8(0x6b, 0x72, 0x80),
    }
}

pub(crate) fn escape_key_event(
    key: keyboard::Key,
    _modifiers: keyboard::Modifiers,
) -> Option<Message> {
    match key {
        keyboard::Key::Named(keyboard::key::Named::Escape) => Some(Message::CancelDialog),
        _ => None,
    }
}

/// Flattens a status payload into `label: value` lines for display.
///
/// Objects become dotted paths, arrays of records are keyed by whichever name
/// field the record carries.
pub(crate) fn status_lines(value: &Value) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    flatten(value, String::new(), &mut lines);
    if lines.len() > MAX_STATUS_LINES {
        let hidden = lines.len() - MAX_STATUS_LINES;
        lines.truncate(MAX_STATUS_LINES);
        lines.push(("…".to_string(), format!("{hidden} more")));
    }
    lines
}

fn flatten(value: &Value, prefix: String, lines: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, path, lines);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (position, item) in items.iter().enumerate() {
                let label = record_name(item).unwrap_or_else(|| position.to_string());
                let path = if prefix.is_empty() {
                    label
                } else {
                    format!("{prefix}[{label}]")
                };
                flatten(item, path, lines);
            }
        }
        other => {
            let label = if prefix.is_empty() {
                "value".to_string()
            } else {
                prefix
            };
            lines.push((label, scalar_text(other)));
        }
    }
}

fn record_name(item: &Value) -> Option<String> {
    ["name", "instance_name", "device_name"]
        .iter()
        .find_map(|key| item.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

fn scalar_text(value: &Value) -> String {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Null => "none".to_string(),
        Value::Object(_) => "{}".to_string(),
        Value::Array(_) => "[]".to_string(),
        other => other.to_string(),
    };
    truncate(&text, MAX_VALUE_CHARS)
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}

pub(crate) fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{weight:.1}")
    } else {
        weight.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_objects_become_dotted_paths() {
        let lines = status_lines(&json!({"pool": {"active": 2, "limited": false}}));
        assert_eq!(
            lines,
            vec![
                ("pool.active".to_string(), "2".to_string()),
                ("pool.limited".to_string(), "false".to_string()),
            ]
        );
    }

    #[test]
    fn records_are_keyed_by_their_name_field() {
        let lines = status_lines(&json!([
            {"instance_name": "seedbox", "status": "online"},
            {"status": "auth_failed"}
        ]));
        assert!(lines.contains(&("seedbox.status".to_string(), "online".to_string())));
        assert!(lines.contains(&("1.status".to_string(), "auth_failed".to_string())));
    }

    #[test]
    fn scalars_and_empty_containers_render() {
        assert_eq!(status_lines(&json!(null)), vec![("value".to_string(), "none".to_string())]);
        assert_eq!(
            status_lines(&json!({"queue": []})),
            vec![("queue".to_string(), "[]".to_string())]
        );
    }

    #[test]
    fn long_payloads_are_capped() {
        let many: Vec<Value> = (0..60).map(|n| json!(n)).collect();
        let lines = status_lines(&Value::Array(many));
        assert_eq!(lines.len(), MAX_STATUS_LINES + 1);
        assert_eq!(lines[MAX_STATUS_LINES].1, "20 more");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("größere", 4), "grö…");
        assert_eq!(truncate("ok", 4), "ok");
    }

    #[test]
    fn weights_keep_one_decimal() {
        assert_eq!(format_weight(1.0), "1.0");
        assert_eq!(format_weight(1.5), "1.5");
    }
}
