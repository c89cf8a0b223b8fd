//! Structured extraction of the upstream payload into the outbound product
//! card.
//!
//! Models are asked for JSON but routinely wrap it in markdown fences or
//! return prose. Fence stripping is an exact global replace (every
//! ` ```json ` and ` ``` ` marker removed, then trimmed). A candidate that
//! still fails to parse into the expected shape is recovered locally by
//! synthesizing a card from the raw text — a lossy fallback, not an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Outbound success body: at least a commercial name and a specs list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCard {
    pub name: String,
    pub specs: String,
}

/// Pull the first candidate's text out of a generate response.
///
/// An absent or empty `candidates` array is an empty-result failure (safety
/// block or refusal) — distinct from an HTTP error. A candidate without text
/// degrades to `"{}"` so downstream parsing takes the synthesis path.
pub fn candidate_text(payload: &Value) -> Result<String> {
    let candidates = payload
        .get("candidates")
        .and_then(Value::as_array)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| Error::EmptyResult {
            message: "generation returned no candidates (possible safety block or unknown model)"
                .to_string(),
        })?;

    Ok(candidates[0]
        .pointer("/content/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or("{}")
        .to_string())
}

/// Remove every markdown code-fence marker and trim the remainder.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

impl ProductCard {
    /// Parse model output into a card, synthesizing one from the raw text
    /// when the output is not the expected JSON shape.
    pub fn from_model_text(raw: &str, brand: Option<&str>, model: &str) -> Self {
        let cleaned = strip_code_fences(raw);
        match serde_json::from_str::<ProductCard>(&cleaned) {
            Ok(card) => card,
            Err(e) => {
                tracing::warn!(error = %e, "model output was not a product card, synthesizing");
                let name = match brand {
                    Some(b) if !b.trim().is_empty() => format!("{} {}", b.trim(), model),
                    _ => model.to_string(),
                };
                ProductCard {
                    name,
                    specs: cleaned,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_round_trips_exactly() {
        let raw = "```json\n{\"name\":\"X\",\"specs\":\"- a.\"}\n```";
        let card = ProductCard::from_model_text(raw, Some("Acme"), "Z1");
        assert_eq!(
            card,
            ProductCard {
                name: "X".to_string(),
                specs: "- a.".to_string()
            }
        );
    }

    #[test]
    fn bare_json_parses() {
        let card = ProductCard::from_model_text(
            r#"{"name":"Widget Pro","specs":"- 10 W.\n- 2 kg."}"#,
            None,
            "wp-1",
        );
        assert_eq!(card.name, "Widget Pro");
        assert!(card.specs.starts_with("- 10 W."));
    }

    #[test]
    fn prose_synthesizes_card_from_raw_text() {
        let card = ProductCard::from_model_text("A fine widget indeed.", Some("Acme"), "Z1");
        assert_eq!(card.name, "Acme Z1");
        assert_eq!(card.specs, "A fine widget indeed.");
    }

    #[test]
    fn synthesis_without_brand_uses_model_only() {
        let card = ProductCard::from_model_text("text", None, "Z1");
        assert_eq!(card.name, "Z1");
        let card = ProductCard::from_model_text("text", Some("  "), "Z1");
        assert_eq!(card.name, "Z1");
    }

    #[test]
    fn stray_fences_inside_text_are_all_removed() {
        assert_eq!(strip_code_fences("```json\n{}\n``` trailing ```"), "{}\n trailing");
        assert_eq!(strip_code_fences("``` ```json x ```"), "x");
    }

    #[test]
    fn candidate_text_happy_path() {
        let payload = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "hello" }], "role": "model" },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(candidate_text(&payload).unwrap(), "hello");
    }

    #[test]
    fn missing_candidates_is_empty_result() {
        let err = candidate_text(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, Error::EmptyResult { .. }));

        let err = candidate_text(&serde_json::json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, Error::EmptyResult { .. }));
    }

    #[test]
    fn candidate_without_text_degrades_to_empty_object() {
        let payload = serde_json::json!({"candidates": [{"finishReason": "SAFETY"}]});
        assert_eq!(candidate_text(&payload).unwrap(), "{}");
    }
}
