use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{Label, OracleVerdict};
use crate::taxonomy::roles::MAX_ROLES;

const DEFAULT_CONFIDENCE: f32 = 0.7;

#[derive(Deserialize)]
struct RawVerdict {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    confidence: Option<Value>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    issue_title: Option<String>,
    #[serde(default)]
    roles: Option<Value>,
}

/// Parse and validate an oracle answer. Unknown labels are rejected, never passed through.
pub fn parse_oracle_response(response: &str) -> Result<OracleVerdict> {
    let json_str = extract_json(response)?;
    let raw: RawVerdict = serde_json::from_str(&json_str)
        .map_err(|e| Error::ParseError(format!("Failed to parse oracle response: {}", e)))?;

    let label: Label = raw.label.as_deref().unwrap_or_default().parse()?;

    let confidence = match raw.confidence {
        Some(Value::Number(n)) => n.as_f64().map(|v| v as f32),
        Some(Value::String(s)) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
    .filter(|c| c.is_finite() && *c > 0.0)
    .unwrap_or(DEFAULT_CONFIDENCE)
    .clamp(0.0, 1.0);

    let reason = raw
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| "LLM classification.".to_string());

    let issue_title = raw
        .issue_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let mut roles: Vec<String> = Vec::new();
    if let Some(Value::Array(items)) = raw.roles {
        for item in items {
            let role = match item {
                Value::String(s) => s.trim().to_string(),
                Value::Null => continue,
                other => other.to_string().trim().to_string(),
            };
            if !role.is_empty() && !roles.contains(&role) {
                roles.push(role);
            }
            if roles.len() >= MAX_ROLES {
                break;
            }
        }
    }

    Ok(OracleVerdict {
        label,
        confidence,
        reason,
        issue_title,
        roles,
    })
}

fn extract_json(text: &str) -> Result<String> {
    // Try to find JSON block in markdown code blocks
    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return Ok(text[start..start + end].trim().to_string());
        }
    }

    // Try plain code block
    if let Some(start) = text.find("```") {
        let start = start + 3;
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            let content = text[start..start + end].trim();
            if content.starts_with('{') {
                return Ok(content.to_string());
            }
        }
    }

    // Try to find raw JSON object
    if let Some(start) = text.find('{') {
        let mut depth = 0;
        let mut end = start;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, c) in text[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }

        if depth == 0 && end > start {
            return Ok(text[start..end].to_string());
        }
    }

    Err(Error::ParseError("No valid JSON found in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_markdown() {
        let input = r#"Here's the verdict:
```json
{"label": "problem"}
```
"#;
        let result = extract_json(input).unwrap();
        assert_eq!(result, r#"{"label": "problem"}"#);
    }

    #[test]
    fn test_extract_raw_json_with_multibyte_prefix() {
        let input = r#"Résumé → {"label": "solution", "roles": []} done"#;
        let result = extract_json(input).unwrap();
        assert_eq!(result, r#"{"label": "solution", "roles": []}"#);
    }

    #[test]
    fn test_parse_full_verdict() {
        let verdict = parse_oracle_response(
            r#"{"label": "Solution", "confidence": 0.83, "reason": "Suggests a tool",
                "issue_title": "Invoice Chasing", "roles": [" Backend Engineer ", "", "Backend Engineer", "Designer"]}"#,
        )
        .unwrap();
        assert_eq!(verdict.label, Label::Solution);
        assert!((verdict.confidence - 0.83).abs() < 1e-6);
        assert_eq!(verdict.issue_title.as_deref(), Some("Invoice Chasing"));
        assert_eq!(verdict.roles, vec!["Backend Engineer", "Designer"]);
    }

    #[test]
    fn test_parse_defaults_missing_fields() {
        let verdict = parse_oracle_response(r#"{"label": "problem", "roles": "nope"}"#).unwrap();
        assert_eq!(verdict.label, Label::Problem);
        assert!((verdict.confidence - 0.7).abs() < 1e-6);
        assert_eq!(verdict.reason, "LLM classification.");
        assert!(verdict.issue_title.is_none());
        assert!(verdict.roles.is_empty());
    }

    #[test]
    fn test_parse_string_confidence_is_clamped() {
        let verdict = parse_oracle_response(r#"{"label": "problem", "confidence": "3"}"#).unwrap();
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_parse_rejects_unknown_label() {
        let err = parse_oracle_response(r#"{"label": "maybe"}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidLabel(_)));
        assert!(parse_oracle_response(r#"{"confidence": 0.9}"#).is_err());
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(
            parse_oracle_response("I think it's a problem"),
            Err(Error::ParseError(_))
        ));
    }
}
