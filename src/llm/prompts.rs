pub const SYSTEM_PROMPT: &str = r#"You classify a single social-media comment for a catalog of business problems.

Pick exactly one label:
- "problem": the author describes a pain point, complaint or recurring friction
- "solution": the author proposes, recommends or reports a fix or approach
- "not_related": anything else (chit-chat, moderation notices, off-topic remarks)

Respond with compact JSON using exactly these keys:
{
    "label": "problem|solution|not_related",
    "confidence": 0.0-1.0,
    "reason": "one short sentence",
    "issue_title": "short title of the underlying issue (2-5 words)",
    "roles": ["professional roles needed to deliver the solution, empty unless label is solution"]
}"#;

#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub text: String,
    pub sector_hint: String,
}

impl ClassificationRequest {
    pub fn new(text: impl Into<String>, sector_hint: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sector_hint: sector_hint.into(),
        }
    }

    pub fn to_prompt(&self) -> String {
        serde_json::json!({
            "sector_hint": self.sector_hint,
            "comment": self.text,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_escapes_comment() {
        let request = ClassificationRequest::new("they said \"late\" again", "FinTech");
        let value: serde_json::Value = serde_json::from_str(&request.to_prompt()).unwrap();
        assert_eq!(value["comment"], "they said \"late\" again");
        assert_eq!(value["sector_hint"], "FinTech");
    }
}
