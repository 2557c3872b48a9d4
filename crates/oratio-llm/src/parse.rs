//! Extraction of the verdict object from free-form model text.
//!
//! The model is instructed to reply with a bare JSON object, but replies
//! arrive wrapped in markdown fences or prose often enough that the client
//! takes the first balanced `{…}` substring and parses known fields with
//! defaults. Keeping the heuristic behind this narrow module means a
//! stricter reply contract can replace it without touching the client.

use serde::Deserialize;

/// Verdict fields as the model writes them.
#[derive(Debug, Deserialize)]
struct WireVerdict {
    #[serde(default)]
    has_brexit_relation: bool,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

/// A successfully extracted verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedVerdict {
    pub related: bool,
    pub confidence: f64,
    pub reasoning: String,
}

/// Parse the verdict out of raw reply text, or `None` when no usable JSON
/// object is present.
pub fn parse_verdict(text: &str) -> Option<ParsedVerdict> {
    let object = first_json_object(text)?;
    let wire: WireVerdict = serde_json::from_str(object).ok()?;
    Some(ParsedVerdict {
        related: wire.has_brexit_relation,
        confidence: wire.confidence,
        reasoning: wire.reasoning,
    })
}

/// The first balanced `{…}` substring, honouring strings and escapes.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    // Brace bytes are ASCII, so the slice ends on a char boundary.
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_parses() {
        let parsed = parse_verdict(
            r#"{"has_brexit_relation": true, "confidence": 0.85, "reasoning": "Debate is about Article 50."}"#,
        )
        .unwrap();
        assert!(parsed.related);
        assert!((parsed.confidence - 0.85).abs() < 1e-9);
        assert_eq!(parsed.reasoning, "Debate is about Article 50.");
    }

    #[test]
    fn fenced_object_parses() {
        let text = "```json\n{\"has_brexit_relation\": false, \"confidence\": 0.1, \"reasoning\": \"Routine business.\"}\n```";
        let parsed = parse_verdict(text).unwrap();
        assert!(!parsed.related);
        assert!((parsed.confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn surrounding_prose_is_ignored() {
        let text = "Here is my analysis: {\"has_brexit_relation\": true, \"confidence\": 0.9, \"reasoning\": \"x\"} Hope that helps!";
        assert!(parse_verdict(text).unwrap().related);
    }

    #[test]
    fn missing_fields_default() {
        let parsed = parse_verdict("{}").unwrap();
        assert!(!parsed.related);
        assert_eq!(parsed.confidence, 0.0);
        assert!(parsed.reasoning.is_empty());
    }

    #[test]
    fn integer_confidence_parses() {
        let parsed = parse_verdict(r#"{"has_brexit_relation": true, "confidence": 1}"#).unwrap();
        assert_eq!(parsed.confidence, 1.0);
    }

    #[test]
    fn no_object_yields_none() {
        assert!(parse_verdict("I cannot answer that.").is_none());
        assert!(parse_verdict("").is_none());
    }

    #[test]
    fn unbalanced_object_yields_none() {
        assert!(parse_verdict("{\"has_brexit_relation\": true").is_none());
    }

    #[test]
    fn malformed_object_yields_none() {
        assert!(parse_verdict("{not json}").is_none());
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_object() {
        let text = r#"{"has_brexit_relation": true, "confidence": 0.7, "reasoning": "mentions {withdrawal}"}"#;
        let parsed = parse_verdict(text).unwrap();
        assert_eq!(parsed.reasoning, "mentions {withdrawal}");
    }

    #[test]
    fn nested_objects_stay_balanced() {
        let object = first_json_object(r#"noise {"a": {"b": 1}} trailing"#).unwrap();
        assert_eq!(object, r#"{"a": {"b": 1}}"#);
    }
}
