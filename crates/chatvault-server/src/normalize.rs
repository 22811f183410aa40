//! Event normalization and text-command parsing.
//!
//! A message record is the event envelope, its source descriptor, and its
//! message payload flattened into one JSON object. Later parts win on key
//! collision, so the record's final `type` is the message kind. The two
//! marker commands are plain text prefixes, not a structured protocol.

use chatvault_line::events::MessageEvent;
use chatvault_store::SelfIntroduction;
use serde_json::{Map, Value};

/// Literal prefix opening a case-report message.
pub const CASE_START_MARKER: &str = "【::案件通報開始::】";

/// Literal prefix of a self-introduction message.
pub const SELF_INTRO_MARKER: &str = "【::自我介紹::】";

/// Case-report header parsed from a marker message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseStart<'a> {
    pub publisher: &'a str,
    pub case_name: &'a str,
}

/// Flatten an event, its source, and its message into one record.
///
/// Merge order matches the archive's historical layout: envelope first,
/// then source fields, then message fields, so message keys win.
pub fn merged_record(event: &MessageEvent) -> serde_json::Result<Map<String, Value>> {
    let mut record = as_object(serde_json::to_value(event)?);
    record.insert("type".to_string(), Value::String("message".to_string()));

    for part in [
        serde_json::to_value(&event.source)?,
        serde_json::to_value(&event.message)?,
    ] {
        if let Value::Object(fields) = part {
            for (key, value) in fields {
                record.insert(key, value);
            }
        }
    }

    Ok(record)
}

/// Parse a case-start command: marker line, publisher line, case-name line.
///
/// Returns `None` for ordinary messages and for truncated commands.
pub fn parse_case_start(text: &str) -> Option<CaseStart<'_>> {
    if !text.starts_with(CASE_START_MARKER) {
        return None;
    }

    let mut lines = text.lines();
    lines.next(); // marker line
    let publisher = lines.next()?;
    let case_name = lines.next()?;
    Some(CaseStart {
        publisher,
        case_name,
    })
}

/// Parse a self-introduction command: marker line followed by real name,
/// job title, organization, and email lines.
pub fn parse_self_intro(text: &str) -> Option<SelfIntroduction> {
    if !text.starts_with(SELF_INTRO_MARKER) {
        return None;
    }

    let mut lines = text.lines();
    lines.next(); // marker line
    Some(SelfIntroduction {
        real_name: lines.next()?.to_string(),
        job_title: lines.next()?.to_string(),
        organization: lines.next()?.to_string(),
        email: lines.next()?.to_string(),
    })
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use chatvault_line::{WebhookEvent, WebhookRequest};

    use super::*;

    fn message_event(json: &str) -> MessageEvent {
        let request: WebhookRequest = serde_json::from_str(json).unwrap();
        match request.events.into_iter().next().unwrap() {
            WebhookEvent::Message(ev) => ev,
            other => panic!("expected message event, got {other:?}"),
        }
    }

    #[test]
    fn merge_keeps_envelope_and_flattens_parts() {
        let event = message_event(
            r#"{
                "destination": "Ubot",
                "events": [{
                    "type": "message",
                    "mode": "active",
                    "replyToken": "rt-1",
                    "timestamp": 1000,
                    "source": {"type": "user", "userId": "u1"},
                    "message": {"id": "m1", "type": "text", "text": "hello"}
                }]
            }"#,
        );

        let record = merged_record(&event).unwrap();

        // Envelope fields survive, including ones this crate has no type for.
        assert_eq!(record["replyToken"], "rt-1");
        assert_eq!(record["timestamp"], 1000);
        assert_eq!(record["mode"], "active");
        // Nested objects remain alongside their flattened fields.
        assert_eq!(record["source"]["userId"], "u1");
        assert_eq!(record["message"]["id"], "m1");
        assert_eq!(record["userId"], "u1");
        assert_eq!(record["id"], "m1");
        assert_eq!(record["text"], "hello");
        // Message keys win the collision on `type`.
        assert_eq!(record["type"], "text");
    }

    #[test]
    fn case_start_parses_publisher_and_name() {
        let case = parse_case_start("【::案件通報開始::】\nAlice\nCase42").unwrap();
        assert_eq!(case.publisher, "Alice");
        assert_eq!(case.case_name, "Case42");
    }

    #[test]
    fn case_start_ignores_ordinary_text() {
        assert!(parse_case_start("hello").is_none());
        // Marker must open the message, not merely appear in it.
        assert!(parse_case_start("fyi 【::案件通報開始::】\nA\nB").is_none());
    }

    #[test]
    fn truncated_case_start_is_rejected() {
        assert!(parse_case_start("【::案件通報開始::】\nAlice").is_none());
        assert!(parse_case_start("【::案件通報開始::】").is_none());
    }

    #[test]
    fn self_intro_parses_four_lines() {
        let intro =
            parse_self_intro("【::自我介紹::】\nAlice Chen\nEngineer\nAcme\nalice@acme.example")
                .unwrap();
        assert_eq!(intro.real_name, "Alice Chen");
        assert_eq!(intro.job_title, "Engineer");
        assert_eq!(intro.organization, "Acme");
        assert_eq!(intro.email, "alice@acme.example");
    }

    #[test]
    fn truncated_self_intro_is_rejected() {
        assert!(parse_self_intro("【::自我介紹::】\nAlice\nEngineer").is_none());
    }
}
