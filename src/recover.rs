use serde_json::{json, Value};
use std::fmt;

/// Every recovery strategy failed. Carries the names of the strategies that
/// were tried so the caller can log a useful trail; the user-facing message
/// stays generic.
#[derive(Debug, Clone)]
pub struct MalformedPayload {
    pub attempts: Vec<&'static str>,
}

impl fmt::Display for MalformedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not recover a JSON object from the model response (tried: {})",
            self.attempts.join(", ")
        )
    }
}

type Strategy = fn(&str) -> Option<Value>;

// Ordered fallback chain; first success wins. Each tier only exists because
// generations commonly wrap valid JSON in markdown fences or prose.
const STRATEGIES: [(&str, Strategy); 5] = [
    ("direct", parse_direct),
    ("fenced_block", parse_fenced_block),
    ("first_object_span", parse_first_object_span),
    ("cleaned_span", parse_cleaned_span),
    ("timetable_key", parse_timetable_key),
];

/// Best-effort parse of a model response into a JSON object. A payload that
/// parses to a bare array or scalar does not count as a success for any
/// tier; a timetable is always an object.
pub fn recover_json(text: &str) -> Result<Value, MalformedPayload> {
    let mut attempts = Vec::with_capacity(STRATEGIES.len());
    if !text.trim().is_empty() {
        for (name, strategy) in STRATEGIES {
            attempts.push(name);
            if let Some(value) = strategy(text) {
                if attempts.len() > 1 {
                    log::debug!("payload recovered via {} strategy", name);
                }
                return Ok(value);
            }
        }
    }
    Err(MalformedPayload { attempts })
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

fn parse_direct(text: &str) -> Option<Value> {
    parse_object(text)
}

/// Content between ``` fences, with an optional `json` tag after the
/// opening fence.
fn parse_fenced_block(text: &str) -> Option<Value> {
    let open = text.find("```")?;
    let mut inner = &text[open + 3..];
    inner = inner.strip_prefix("json").unwrap_or(inner);
    if let Some(close) = inner.find("```") {
        inner = &inner[..close];
    }
    parse_object(inner.trim())
}

/// First balanced `{...}` span. Brace counting ignores string context; the
/// greedy cleanup tier below catches payloads this misreads.
fn parse_first_object_span(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (i, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return parse_object(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Trim, drop everything after the last `}` and before the first `{`.
fn parse_cleaned_span(text: &str) -> Option<Value> {
    let t = text.trim();
    let start = t.find('{')?;
    let end = t.rfind('}')?;
    if end < start {
        return None;
    }
    parse_object(&t[start..=end])
}

/// Hunt for a `"timetable": { ... }` span specifically and re-wrap it, for
/// responses whose outer object is too mangled to parse.
fn parse_timetable_key(text: &str) -> Option<Value> {
    let key = text.find("\"timetable\"")?;
    let after = &text[key + "\"timetable\"".len()..];
    let colon = after.find(':')?;
    let rest = &after[colon + 1..];
    let inner = parse_first_object_span(rest)?;
    Some(json!({ "timetable": inner }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_parse_wins_for_plain_json() {
        let v = recover_json(r#"{"Monday":{}}"#).expect("recover");
        assert_eq!(v, json!({ "Monday": {} }));
    }

    #[test]
    fn fenced_block_recovers_after_direct_fails() {
        let text = "Sure! ```json\n{\"Monday\":{}}\n```";
        assert!(parse_direct(text).is_none());
        let v = recover_json(text).expect("recover");
        assert_eq!(v, json!({ "Monday": {} }));
    }

    #[test]
    fn fence_without_language_tag_recovers() {
        let text = "```\n{\"Tuesday\":{}}\n```";
        let v = recover_json(text).expect("recover");
        assert_eq!(v, json!({ "Tuesday": {} }));
    }

    #[test]
    fn prose_wrapped_object_recovers_via_span() {
        let text = "Here is your timetable: {\"Friday\":{}} Hope it helps!";
        let v = recover_json(text).expect("recover");
        assert_eq!(v, json!({ "Friday": {} }));
    }

    #[test]
    fn trailing_garbage_after_last_brace_is_truncated() {
        let text = "  {\"Monday\":{\"a\":1}}\nRegards, the model";
        let v = recover_json(text).expect("recover");
        assert_eq!(v, json!({ "Monday": { "a": 1 } }));
    }

    #[test]
    fn timetable_key_span_is_rewrapped() {
        // Unbalanced prefix defeats the span tiers; the key hunt still lands.
        let text = "oops {{{ \"timetable\": {\"Monday\":{}}, and then it broke";
        let v = recover_json(text).expect("recover");
        assert_eq!(v, json!({ "timetable": { "Monday": {} } }));
    }

    #[test]
    fn bare_array_is_not_an_acceptable_payload() {
        let err = recover_json("[1, 2, 3]").expect_err("should fail");
        assert_eq!(err.attempts.len(), 5);
    }

    #[test]
    fn empty_and_whitespace_text_fail_without_attempts() {
        assert!(recover_json("").is_err());
        assert!(recover_json("   \n\t").is_err());
    }

    #[test]
    fn hopeless_text_reports_all_attempts() {
        let err = recover_json("no braces here at all").expect_err("should fail");
        assert_eq!(
            err.attempts,
            vec![
                "direct",
                "fenced_block",
                "first_object_span",
                "cleaned_span",
                "timetable_key"
            ]
        );
    }
}
