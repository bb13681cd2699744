//! Defensive parsing of LLM text output. Providers are asked for bare JSON
//! but routinely wrap it in markdown fences or chat around it.

use anyhow::{Context, Result, bail};
use serde_json::Value;

/// Strip a leading/trailing markdown code fence (```json ... ``` or ``` ... ```).
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line
    let rest = rest
        .split_once('\n')
        .map_or(rest.trim_start_matches(|c: char| c.is_alphanumeric()), |(_, body)| body);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract the first balanced JSON object from free-form text and parse it.
pub fn extract_json_object(text: &str) -> Result<Value> {
    let text = strip_code_fences(text);
    let start = text.find('{').context("No JSON object in response")?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..=start + i];
                    return serde_json::from_str(candidate)
                        .context("Malformed JSON object in response");
                }
            }
            _ => {}
        }
    }
    bail!("Unbalanced JSON object in response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_text() {
        assert_eq!(strip_code_fences(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn test_strip_fence_with_language() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fence_without_language() {
        let fenced = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_object_with_chatter() {
        let text = "Sure! Here is your plan:\n{\"milk\": 3.49, \"eggs\": 4.25}\nEnjoy!";
        let v = extract_json_object(text).unwrap();
        assert_eq!(v["milk"], 3.49);
    }

    #[test]
    fn test_extract_nested_object() {
        let text = r#"{"breakfast": {"name": "Oatmeal", "ingredients": ["oats"]}}"#;
        let v = extract_json_object(text).unwrap();
        assert_eq!(v["breakfast"]["name"], "Oatmeal");
    }

    #[test]
    fn test_extract_ignores_braces_in_strings() {
        let text = r#"{"note": "use {this} pan", "x": 1}"#;
        let v = extract_json_object(text).unwrap();
        assert_eq!(v["x"], 1);
    }

    #[test]
    fn test_extract_no_object() {
        assert!(extract_json_object("no json here").is_err());
    }

    #[test]
    fn test_extract_unbalanced() {
        assert!(extract_json_object(r#"{"a": 1"#).is_err());
    }

    #[test]
    fn test_extract_fenced_object() {
        let text = "```json\n{\"rice\": 2.99}\n```";
        let v = extract_json_object(text).unwrap();
        assert_eq!(v["rice"], 2.99);
    }
}
